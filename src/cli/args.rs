//! Command-line arguments shared by the `snmp-lab` subcommands.

use std::time::Duration;

use clap::{Args, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::Version;
use crate::agent::{AccessPolicy, AgentConfig};
use crate::device::SnmpDevice;
use crate::manager::ManagerConfig;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `OID (name) = TYPE: value` lines.
    #[default]
    Human,
    /// Pretty-printed JSON document.
    Json,
    /// Tab-separated `OID<TAB>value` lines.
    Raw,
}

/// SNMP version selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SnmpVersion {
    #[value(name = "1")]
    V1,
    #[default]
    #[value(name = "2c")]
    V2c,
    #[value(name = "3")]
    V3,
}

impl From<SnmpVersion> for Version {
    fn from(v: SnmpVersion) -> Self {
        match v {
            SnmpVersion::V1 => Version::V1,
            SnmpVersion::V2c => Version::V2c,
            SnmpVersion::V3 => Version::V3,
        }
    }
}

/// In-process agent options.
#[derive(Debug, Args)]
pub struct AgentArgs {
    /// Number of agents to start (`agent-001`, `agent-002`, ...).
    #[arg(long = "agents", default_value = "1", value_name = "N")]
    pub agents: usize,

    /// Read community accepted by the agents.
    #[arg(short = 'c', long = "community", default_value = "public")]
    pub community: String,

    /// Write community accepted by the agents.
    #[arg(long = "write-community", default_value = "private")]
    pub write_community: String,

    /// Seconds between uptime/counter refreshes.
    #[arg(long = "refresh-interval", default_value = "30", value_name = "SECS")]
    pub refresh_interval: u64,

    /// Seconds between simulated traps.
    #[arg(long = "trap-interval", default_value = "60", value_name = "SECS")]
    pub trap_interval: u64,

    /// Do not send simulated traps.
    #[arg(long = "no-simulate")]
    pub no_simulate: bool,
}

impl AgentArgs {
    /// Ids of the agents to start.
    pub fn agent_ids(&self) -> Vec<String> {
        (1..=self.agents).map(|i| format!("agent-{:03}", i)).collect()
    }

    /// Configuration for agent `id`.
    pub fn config(&self, id: &str, v3: &V3Args) -> AgentConfig {
        let mut access = AccessPolicy::new(self.community.clone(), self.write_community.clone());
        if let (Some(user), Some(key)) = (&v3.username, &v3.auth_key) {
            access = access.user(user.clone(), key.clone(), true);
        }
        let trap_interval = (!self.no_simulate).then(|| Duration::from_secs(self.trap_interval));
        AgentConfig::new(id)
            .access(access)
            .refresh_interval(Duration::from_secs(self.refresh_interval))
            .trap_interval(trap_interval)
    }
}

/// Manager options.
#[derive(Debug, Args)]
pub struct ManagerArgs {
    /// SNMP version the manager speaks.
    #[arg(short = 'v', long = "snmp-version", default_value = "2c")]
    pub snmp_version: SnmpVersion,

    /// Community the manager presents (defaults to the agents' read community).
    #[arg(long = "manager-community", value_name = "COMMUNITY")]
    pub community: Option<String>,

    /// Request timeout in seconds.
    #[arg(short = 't', long = "timeout", default_value = "5", value_name = "SECS")]
    pub timeout: f64,

    /// Seconds between monitoring rounds.
    #[arg(long = "poll-interval", default_value = "30", value_name = "SECS")]
    pub poll_interval: u64,
}

impl ManagerArgs {
    /// Request timeout as a Duration.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout.max(0.0))
    }

    pub fn config(&self) -> ManagerConfig {
        ManagerConfig::default()
            .timeout(self.timeout_duration())
            .poll_interval(Duration::from_secs(self.poll_interval))
    }

    /// The device the manager registers for agent `id`.
    pub fn device(&self, id: &str, agents: &AgentArgs, v3: &V3Args) -> Result<SnmpDevice, String> {
        let community = self
            .community
            .clone()
            .unwrap_or_else(|| agents.community.clone());
        let version = if v3.is_v3() {
            SnmpVersion::V3
        } else {
            self.snmp_version
        };
        Ok(match version {
            SnmpVersion::V1 => SnmpDevice::v1(id, id, community),
            SnmpVersion::V2c => SnmpDevice::v2c(id, id, community),
            SnmpVersion::V3 => {
                let (Some(user), Some(key)) = (&v3.username, &v3.auth_key) else {
                    return Err("SNMPv3 requires --username and --auth-key".into());
                };
                SnmpDevice::v3(id, id, user.clone(), key.clone())
            }
        })
    }
}

/// SNMPv3 user options.
#[derive(Debug, Args)]
pub struct V3Args {
    /// Security name. Enables SNMPv3.
    #[arg(short = 'u', long = "username")]
    pub username: Option<String>,

    /// Authentication key.
    #[arg(short = 'A', long = "auth-key")]
    pub auth_key: Option<String>,
}

impl V3Args {
    /// Whether SNMPv3 was requested.
    pub fn is_v3(&self) -> bool {
        self.username.is_some()
    }

    /// Check the v3 options are complete.
    pub fn validate(&self) -> Result<(), String> {
        if self.username.is_some() && self.auth_key.is_none() {
            return Err("--auth-key is required with --username".into());
        }
        if self.auth_key.is_some() && self.username.is_none() {
            return Err("--auth-key requires --username".into());
        }
        Ok(())
    }
}

/// Output and logging options.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format.
    #[arg(short = 'O', long = "output", default_value = "human")]
    pub format: OutputFormat,

    /// More logging (repeat for trace).
    #[arg(long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Do not annotate OIDs with well-known names.
    #[arg(long = "no-hints")]
    pub no_hints: bool,

    /// Show how long the operation took.
    #[arg(long = "timing")]
    pub timing: bool,
}

impl OutputArgs {
    /// Install the tracing subscriber.
    ///
    /// `RUST_LOG` wins when set; otherwise the level follows `-q`/`--verbose`.
    pub fn init_tracing(&self) {
        let level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("snmp_lab={}", level))
        });
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
