//! Tracing setup and structured logging of simulation events
//!
//! Every event that crosses the channel is also written to the tracing
//! pipeline with structured fields, so a `--debug` log holds the full run
//! even when the console only shows the stable lines.

use std::path::Path;

use dlsim_events::{
    AllocationEvent, AppEvent, DetectionEvent, EventMessage, GeneralEvent, ProcessEvent,
    SimulationEvent,
};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

const DEBUG_FILTER: &str = "info,dlsim=debug,dlsim_sim=debug,dlsim_detector=debug";
const QUIET_FILTER: &str = "warn";

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize tracing/logging
///
/// Normal runs log warnings to stderr. `--debug` (or `RUST_LOG`) writes JSON
/// to `dlsim-<timestamp>.log` under `log_dir`, falling back to stderr when
/// the file cannot be created. JSON mode keeps stdout and stderr clean
/// unless debug logging goes to a file.
pub fn init_tracing(json_mode: bool, debug_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_flag;

    if debug_enabled {
        match create_log_file(log_dir) {
            Ok((file, path)) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(filter_or(DEBUG_FILTER))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", path.display());
                }
                return;
            }
            Err(e) if !json_mode => {
                eprintln!("Warning: Failed to create log file: {e}");
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(filter_or(DEBUG_FILTER))
                    .init();
                return;
            }
            Err(_) => {}
        }
    }

    if json_mode {
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter_or(QUIET_FILTER))
            .init();
    }
}

fn create_log_file(log_dir: &Path) -> std::io::Result<(std::fs::File, std::path::PathBuf)> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!(
        "dlsim-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&path)?;
    Ok((file, path))
}

/// Log an `AppEvent` using the tracing infrastructure with structured fields
#[allow(clippy::too_many_lines)]
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;

    match event {
        AppEvent::Allocation(allocation_event) => match allocation_event {
            AllocationEvent::Granted {
                mode,
                process,
                request,
                allocation,
                available,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    mode = %mode,
                    process = process.index(),
                    request = %request,
                    allocation = %allocation,
                    available = %available,
                    "Request granted"
                );
            }
            AllocationEvent::Deferred {
                mode,
                process,
                request,
                need,
                available,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    mode = %mode,
                    process = process.index(),
                    request = %request,
                    need = %need,
                    available = %available,
                    "Request deferred"
                );
            }
            AllocationEvent::Released {
                process,
                released,
                available,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    process = process.index(),
                    released = %released,
                    available = %available,
                    "Allocation released"
                );
            }
        },

        AppEvent::Process(process_event) => match process_event {
            ProcessEvent::Started {
                process,
                max_demand,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    process = process.index(),
                    max_demand = %max_demand,
                    "Process started"
                );
            }
            ProcessEvent::Finished { process } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    process = process.index(),
                    "Process finished"
                );
            }
            ProcessEvent::Aborted {
                process,
                reason,
                released,
                available,
            } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    process = process.index(),
                    reason = ?reason,
                    released = %released,
                    available = %available,
                    "Process aborted"
                );
            }
            ProcessEvent::Exiting { process } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    process = process.index(),
                    "Agent exiting after abort"
                );
            }
        },

        AppEvent::Detection(detection_event) => match detection_event {
            DetectionEvent::ScanCompleted { waiting, edges } => {
                trace!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    waiting = waiting,
                    edges = edges,
                    "Wait-for graph scanned"
                );
            }
            DetectionEvent::CycleDetected { cycle, victim } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    cycle = ?cycle,
                    victim = victim.index(),
                    "Deadlock cycle detected"
                );
            }
            DetectionEvent::FinalSweep { remaining } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    remaining = ?remaining,
                    "Run deadline passed, sweeping"
                );
            }
        },

        AppEvent::Simulation(simulation_event) => match simulation_event {
            SimulationEvent::Started {
                mode,
                seed,
                total,
                max_demand,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    mode = %mode,
                    seed = seed,
                    total = %total,
                    processes = max_demand.len(),
                    "Simulation started"
                );
            }
            SimulationEvent::Completed {
                finished,
                aborted,
                duration_ms,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    finished = finished,
                    aborted = aborted,
                    duration_ms = duration_ms,
                    "Simulation completed"
                );
            }
            SimulationEvent::Failed { failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Simulation failed"
                );
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::Warning { message, context } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    message = %message,
                    context = ?context,
                    "Warning"
                );
            }
            GeneralEvent::Error { message, details } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    message = %message,
                    details = ?details,
                    "Error"
                );
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    message = %message,
                    context = ?context,
                    "Debug log"
                );
            }
        },
    }
}
