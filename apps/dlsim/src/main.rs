//! dlsim - Deadlock avoidance and detection simulator
//!
//! Loads layered configuration, runs one simulation on the chosen runtime
//! and renders its event stream and final report.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::Cli;
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use dlsim_config::{parse_resource_list, Config};
use dlsim_events::EventReceiver;
use dlsim_sim::Simulation;
use dlsim_types::{ColorChoice, SimulationReport};
use std::process;
use tokio::runtime::Runtime;
use tokio::select;
use tracing::{error, info};

fn main() {
    // Usage errors exit with clap's status 2 here.
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(e) = run(cli) {
        if e.is_fatal() {
            error!(fatal = true, "Invariant violated: {}", e);
        } else {
            error!("Application error: {}", e);
        }
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
fn run(cli: Cli) -> Result<(), CliError> {
    // 1. File config (or defaults), 2. environment, 3. CLI flags
    let mut config = load_config(&cli)?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli)?;

    logging::init_tracing(cli.json, cli.debug, &config.log_dir());
    info!("Starting dlsim v{}", env!("CARGO_PKG_VERSION"));

    let (event_sender, event_receiver) = dlsim_events::channel();
    // Validates before anything is emitted.
    let simulation = Simulation::from_config(&config, event_sender)?;

    let renderer = OutputRenderer::new(cli.json, config.general.color);
    let colors_enabled = match config.general.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stdout().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.json, cli.debug);

    let runtime = build_runtime(config.timing.virtual_clock)?;
    let report = runtime.block_on(run_with_events(
        simulation,
        event_receiver,
        &mut event_handler,
    ))?;

    renderer.render_report(&report)?;
    info!("Simulation completed successfully");
    Ok(())
}

/// Read the config file on a throwaway runtime
fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Setup(e.to_string()))?;
    Ok(runtime.block_on(Config::load_or_default(cli.config.as_deref()))?)
}

/// Paused single-threaded runtime for reproducible runs, or the
/// multi-threaded runtime on real time
fn build_runtime(virtual_clock: bool) -> Result<Runtime, CliError> {
    let runtime = if virtual_clock {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
    } else {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
    };
    runtime.map_err(|e| CliError::Setup(e.to_string()))
}

/// Run the simulation while draining its events
async fn run_with_events(
    simulation: Simulation,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<SimulationReport, CliError> {
    let mut run_future = Box::pin(simulation.run());

    loop {
        select! {
            biased;

            result = &mut run_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return Ok(result?);
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for the run to finish */ }
                }
            }
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, cli: &Cli) -> Result<(), CliError> {
    if let Some(mode) = cli.mode {
        config.simulation.mode = mode;
    }
    if let Some(resources) = &cli.resources {
        config.simulation.resources = parse_resource_list(resources)?.as_slice().to_vec();
    }
    if let Some(processes) = cli.processes {
        config.simulation.processes = processes;
    }
    if let Some(seed) = cli.seed {
        config.simulation.seed = seed;
    }
    if let Some(interval) = cli.poll_interval_ms {
        config.timing.poll_interval_ms = interval;
    }
    if let Some(timeout) = cli.run_timeout_ms {
        config.timing.run_timeout_ms = timeout;
    }
    if cli.wall_clock {
        config.timing.virtual_clock = false;
    }
    if let Some(color) = cli.color {
        config.general.color = color;
    }
    Ok(())
}
