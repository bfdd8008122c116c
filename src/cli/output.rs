//! Output formatting for the CLI.
//!
//! Supports human-readable, JSON, and raw output formats.

use std::io::{self, Write};
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::cli::hints;
use crate::clock::unix_millis;
use crate::device::StatusTransition;
use crate::manager::SnmpResult;
use crate::trap::TrapEvent;
use crate::{Oid, Value};

/// Results of one command, ready for output.
#[derive(Debug, Serialize)]
pub struct Report {
    pub device: String,
    pub operation: String,
    pub results: Vec<ResultRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_ms: Option<f64>,
}

/// One result row.
#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub success: bool,
    pub oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp_ms: u64,
}

/// A trap, ready for output.
#[derive(Debug, Serialize)]
pub struct TrapRecord {
    pub id: String,
    pub source: String,
    pub oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub value: String,
    pub message: String,
    pub severity: String,
    pub timestamp_ms: u64,
    pub variables: Vec<(String, String)>,
}

/// A device status change, ready for output.
#[derive(Debug, Serialize)]
pub struct TransitionRecord {
    pub device: String,
    pub from: String,
    pub to: String,
    pub timestamp_ms: u64,
}

/// Output context for formatting.
#[derive(Debug, Clone)]
pub struct OutputContext {
    pub format: OutputFormat,
    pub show_hints: bool,
    pub show_timing: bool,
}

impl OutputContext {
    /// Create a new output context with default settings.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_hints: true,
            show_timing: false,
        }
    }

    /// Write operation results to stdout.
    pub fn write_results(
        &self,
        device: &str,
        operation: &str,
        results: &[SnmpResult],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let report = self.build_report(device, operation, results, elapsed);
        let mut stdout = io::stdout().lock();
        self.write_report(&mut stdout, &report)
    }

    /// Write a received trap to stdout.
    pub fn write_trap(&self, event: &TrapEvent) -> io::Result<()> {
        let record = self.trap_record(event);
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Json => writeln!(
                stdout,
                "{}",
                serde_json::to_string(&record).map_err(io::Error::other)?
            ),
            OutputFormat::Raw => writeln!(
                stdout,
                "TRAP\t{}\t{}\t{}\t{}",
                record.source, record.severity, record.oid, record.value
            ),
            OutputFormat::Human => {
                write!(stdout, "[{}] trap from {}: ", record.severity, record.source)?;
                match &record.hint {
                    Some(hint) => write!(stdout, "{} ({})", record.oid, hint)?,
                    None => write!(stdout, "{}", record.oid)?,
                }
                writeln!(stdout, " = \"{}\" ({})", record.value, record.message)
            }
        }
    }

    /// Write a device status change to stdout.
    pub fn write_transition(&self, transition: &StatusTransition) -> io::Result<()> {
        let record = TransitionRecord {
            device: transition.device_id.clone(),
            from: transition.from.to_string(),
            to: transition.to.to_string(),
            timestamp_ms: millis(transition.at),
        };
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Json => writeln!(
                stdout,
                "{}",
                serde_json::to_string(&record).map_err(io::Error::other)?
            ),
            OutputFormat::Raw => writeln!(
                stdout,
                "STATUS\t{}\t{}\t{}",
                record.device, record.from, record.to
            ),
            OutputFormat::Human => writeln!(
                stdout,
                "device {} is now {} (was {})",
                record.device, record.to, record.from
            ),
        }
    }

    fn build_report(
        &self,
        device: &str,
        operation: &str,
        results: &[SnmpResult],
        elapsed: Option<Duration>,
    ) -> Report {
        Report {
            device: device.to_string(),
            operation: operation.to_string(),
            results: results.iter().map(|r| self.format_row(r)).collect(),
            timing_ms: elapsed.map(|d| d.as_secs_f64() * 1000.0),
        }
    }

    fn format_row(&self, result: &SnmpResult) -> ResultRow {
        let hint = if self.show_hints {
            hints::lookup(&result.oid)
        } else {
            None
        };
        let (value_type, value, formatted) = match &result.value {
            Some(v) => {
                let (t, json, formatted) = format_value(v);
                (Some(t), json, formatted)
            }
            None => (None, serde_json::Value::Null, None),
        };
        ResultRow {
            success: result.success,
            oid: result.oid.to_string(),
            hint,
            value_type,
            value,
            formatted,
            error_kind: result.error.as_ref().map(|e| e.kind.to_string()),
            error: result.error.as_ref().map(|e| e.detail.clone()),
            timestamp_ms: millis(result.timestamp),
        }
    }

    fn trap_record(&self, event: &TrapEvent) -> TrapRecord {
        TrapRecord {
            id: event.id.to_string(),
            source: event.source_id.clone(),
            oid: event.oid.to_string(),
            hint: if self.show_hints {
                hints::lookup(&event.oid)
            } else {
                None
            },
            value: event.value.to_string(),
            message: event.message.clone(),
            severity: event.severity.to_string(),
            timestamp_ms: millis(event.timestamp),
            variables: event
                .variables
                .iter()
                .map(|(oid, value)| (oid.to_string(), value.to_string()))
                .collect(),
        }
    }

    fn write_report<W: Write>(&self, w: &mut W, report: &Report) -> io::Result<()> {
        match self.format {
            OutputFormat::Human => self.write_human(w, report),
            OutputFormat::Json => self.write_json(w, report),
            OutputFormat::Raw => self.write_raw(w, report),
        }
    }

    fn write_human<W: Write>(&self, w: &mut W, report: &Report) -> io::Result<()> {
        for row in &report.results {
            if let Some(ref hint) = row.hint {
                write!(w, "{} ({})", row.oid, hint)?;
            } else {
                write!(w, "{}", row.oid)?;
            }

            if !row.success {
                writeln!(
                    w,
                    " ! {}: {}",
                    row.error_kind.as_deref().unwrap_or("error"),
                    row.error.as_deref().unwrap_or_default()
                )?;
                continue;
            }

            write!(w, " = {}: ", row.value_type.as_deref().unwrap_or("NULL"))?;
            if let Some(ref formatted) = row.formatted {
                writeln!(w, "{}", formatted)?;
            } else {
                match &row.value {
                    serde_json::Value::String(s) => writeln!(w, "\"{}\"", s)?,
                    serde_json::Value::Null => writeln!(w)?,
                    other => writeln!(w, "{}", other)?,
                }
            }
        }

        if self.show_timing
            && let Some(ms) = report.timing_ms
        {
            writeln!(w, "\nTiming: {:.1}ms", ms)?;
        }

        Ok(())
    }

    fn write_json<W: Write>(&self, w: &mut W, report: &Report) -> io::Result<()> {
        let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
        writeln!(w, "{}", json)
    }

    fn write_raw<W: Write>(&self, w: &mut W, report: &Report) -> io::Result<()> {
        for row in &report.results {
            let value_str = match &row.value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => row.error.clone().unwrap_or_default(),
                other => other.to_string(),
            };
            writeln!(w, "{}\t{}", row.oid, value_str)?;
        }
        Ok(())
    }
}

/// Format a value, returning (type_name, json_value, formatted_string).
fn format_value(value: &Value) -> (String, serde_json::Value, Option<String>) {
    match value {
        Value::Integer(v) => ("INTEGER".into(), (*v).into(), None),

        Value::OctetString(bytes) => {
            if is_printable(bytes) {
                let s = String::from_utf8_lossy(bytes);
                ("STRING".into(), serde_json::Value::String(s.to_string()), None)
            } else {
                (
                    "Hex-STRING".into(),
                    serde_json::Value::String(hex_string(bytes)),
                    Some(format_hex_string(bytes)),
                )
            }
        }

        Value::ObjectIdentifier(oid) => (
            "OID".into(),
            serde_json::Value::String(oid.to_string()),
            oid_hint(oid),
        ),

        Value::Counter32(v) => ("Counter32".into(), (*v).into(), None),

        Value::Gauge32(v) => ("Gauge32".into(), (*v).into(), None),

        Value::TimeTicks(v) => (
            "TimeTicks".into(),
            (*v).into(),
            Some(format!("({}) {}", v, format_timeticks(*v))),
        ),

        Value::Null => ("NULL".into(), serde_json::Value::Null, None),

        Value::NoSuchObject => (
            "NoSuchObject".into(),
            serde_json::Value::Null,
            Some("No Such Object available".into()),
        ),

        Value::NoSuchInstance => (
            "NoSuchInstance".into(),
            serde_json::Value::Null,
            Some("No Such Instance currently exists".into()),
        ),

        Value::EndOfMibView => (
            "EndOfMibView".into(),
            serde_json::Value::Null,
            Some("No more variables left in this MIB View".into()),
        ),
    }
}

fn millis(t: SystemTime) -> u64 {
    u64::try_from(unix_millis(t)).unwrap_or(u64::MAX)
}

fn oid_hint(oid: &Oid) -> Option<String> {
    hints::lookup(oid).map(|h| format!("{} ({})", oid, h))
}

/// Check if bytes are printable ASCII/UTF-8.
fn is_printable(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(s) => s
            .chars()
            .all(|c| c.is_ascii_graphic() || c.is_ascii_whitespace()),
        Err(_) => false,
    }
}

/// Format bytes as hex string (lowercase, no separator).
fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Format bytes as spaced hex for display.
fn format_hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format TimeTicks as human-readable duration.
fn format_timeticks(centiseconds: u32) -> String {
    let total_seconds = centiseconds / 100;
    let cs = centiseconds % 100;

    let days = total_seconds / 86400;
    let hours = (total_seconds % 86400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!(
            "{}d {:02}:{:02}:{:02}.{:02}",
            days, hours, minutes, seconds, cs
        )
    } else {
        format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, cs)
    }
}

/// Write an error message to stderr.
pub fn write_error(err: impl std::fmt::Display) {
    eprintln!("Error: {}", err);
}
