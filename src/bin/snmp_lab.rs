//! snmp-lab: run in-process SNMP agents and drive them from a manager.
//!
//! Agents and the manager talk over the loopback engine. Each subcommand
//! starts the agents, registers them with the manager, runs and exits.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use snmp_lab::agent::{Agent, DEFAULT_TRAP_PORT};
use snmp_lab::cli::args::{AgentArgs, ManagerArgs, OutputArgs, V3Args};
use snmp_lab::cli::hints::parse_oid;
use snmp_lab::cli::output::{OutputContext, write_error};
use snmp_lab::manager::{Manager, SnmpResult};
use snmp_lab::{LoopbackEngine, Oid};

/// Address the manager receives traps on.
const MANAGER_ADDRESS: &str = "manager";

/// Run SNMP agents in-process and query them from a manager.
#[derive(Debug, Parser)]
#[command(name = "snmp-lab", version, about)]
struct Args {
    #[command(flatten)]
    agents: AgentArgs,

    #[command(flatten)]
    manager: ManagerArgs,

    #[command(flatten)]
    v3: V3Args,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// GET one or more OIDs.
    Get {
        /// Device id (agent-001, ...).
        device: String,
        /// OIDs (dotted notation or well-known names).
        #[arg(required = true, value_name = "OID")]
        oids: Vec<String>,
    },
    /// GETNEXT after an OID.
    Getnext {
        device: String,
        #[arg(value_name = "OID")]
        oid: String,
    },
    /// SET an OID.
    Set {
        device: String,
        #[arg(value_name = "OID")]
        oid: String,
        /// integer, string, oid, counter, gauge or timeticks.
        #[arg(value_name = "TYPE")]
        type_tag: String,
        value: String,
    },
    /// Walk a subtree.
    Walk {
        device: String,
        /// Subtree root (defaults to system).
        #[arg(value_name = "OID", default_value = "system")]
        oid: String,
        /// Maximum number of rows.
        #[arg(long = "max-results", default_value = "50")]
        max_results: usize,
    },
    /// Monitor the agents and print traps until Ctrl-C.
    Run {
        /// Stop after this many seconds.
        #[arg(long = "duration", value_name = "SECS")]
        duration: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    if let Err(e) = args.v3.validate() {
        write_error(e);
        return ExitCode::FAILURE;
    }

    let engine = LoopbackEngine::new();
    let mut agents = Vec::new();
    for id in args.agents.agent_ids() {
        let agent = Agent::new(args.agents.config(&id, &args.v3), Arc::new(engine.clone()));
        if let Err(e) = agent.serve_loopback(&engine) {
            write_error(e);
            return ExitCode::FAILURE;
        }
        agent.add_trap_destination(MANAGER_ADDRESS, DEFAULT_TRAP_PORT);
        agents.push(agent);
    }

    let manager = Manager::new(Arc::new(engine.clone()), args.manager.config());
    for id in args.agents.agent_ids() {
        let added = args
            .manager
            .device(&id, &args.agents, &args.v3)
            .map_err(|e| e.to_string())
            .and_then(|device| manager.add_device(device).map_err(|e| e.to_string()));
        if let Err(e) = added {
            write_error(e);
            return ExitCode::FAILURE;
        }
    }

    let ctx = OutputContext {
        format: args.output.format,
        show_hints: !args.output.no_hints,
        show_timing: args.output.timing,
    };

    let code = match run(&args.command, &manager, &engine, &agents, &ctx).await {
        Ok(code) => code,
        Err(e) => {
            write_error(e);
            ExitCode::FAILURE
        }
    };

    manager.shutdown().await;
    for agent in &agents {
        agent.shutdown().await;
    }
    code
}

async fn run(
    command: &Command,
    manager: &Manager,
    engine: &LoopbackEngine,
    agents: &[Agent],
    ctx: &OutputContext,
) -> Result<ExitCode, String> {
    let start = Instant::now();
    let (device, operation, results) = match command {
        Command::Get { device, oids } => {
            let oids: Vec<Oid> = oids.iter().map(|s| parse_oid(s)).collect::<Result<_, _>>()?;
            let mut results = Vec::with_capacity(oids.len());
            for oid in &oids {
                results.push(manager.get(device, oid).await);
            }
            (device, "get", results)
        }
        Command::Getnext { device, oid } => {
            let oid = parse_oid(oid)?;
            (device, "getnext", vec![manager.get_next(device, &oid).await])
        }
        Command::Set {
            device,
            oid,
            type_tag,
            value,
        } => {
            let oid = parse_oid(oid)?;
            (
                device,
                "set",
                vec![manager.set(device, &oid, value, type_tag).await],
            )
        }
        Command::Walk {
            device,
            oid,
            max_results,
        } => {
            let oid = parse_oid(oid)?;
            (
                device,
                "walk",
                manager.walk(device, &oid, Some(*max_results)).await,
            )
        }
        Command::Run { duration } => {
            return monitor(manager, engine, agents, ctx, duration.map(Duration::from_secs)).await;
        }
    };

    let elapsed = ctx.show_timing.then(|| start.elapsed());
    ctx.write_results(device, operation, &results, elapsed)
        .map_err(|e| format!("writing output: {}", e))?;
    Ok(exit_code(&results))
}

fn exit_code(results: &[SnmpResult]) -> ExitCode {
    if results.iter().all(|r| r.success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn monitor(
    manager: &Manager,
    engine: &LoopbackEngine,
    agents: &[Agent],
    ctx: &OutputContext,
    duration: Option<Duration>,
) -> Result<ExitCode, String> {
    let printer = ctx.clone();
    manager.add_trap_listener("stdout", move |event| {
        printer.write_trap(event).map_err(snmp_lab::Error::from)
    });
    manager.listen_loopback(engine, MANAGER_ADDRESS, DEFAULT_TRAP_PORT, 64);

    let mut status = manager.subscribe_status();
    manager.start();
    for agent in agents {
        agent.start();
    }

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            _ = &mut deadline => break,
            transition = status.recv() => match transition {
                Ok(transition) => {
                    ctx.write_transition(&transition)
                        .map_err(|e| format!("writing output: {}", e))?;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "status output lagging");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    Ok(ExitCode::SUCCESS)
}
