//! CLI utilities for the `snmp-lab` binary.
//!
//! Argument parsing, output formatting and OID name hints.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod hints;
pub mod output;
