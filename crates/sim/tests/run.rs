//! End-to-end runs on the paused clock

use dlsim_config::Config;
use dlsim_events::{channel, EventReceiver};
use dlsim_sim::Simulation;
use dlsim_types::{Mode, ProcessState, SimulationReport};

fn config(mode: Mode, seed: u64) -> Config {
    let mut config = Config::default();
    config.simulation.mode = mode;
    config.simulation.seed = seed;
    config
}

fn drain(mut rx: EventReceiver) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let Some(line) = msg.event.console_line() {
            lines.push(line);
        }
    }
    lines
}

async fn run(config: &Config) -> (SimulationReport, Vec<String>) {
    let (tx, rx) = channel();
    let report = Simulation::from_config(config, tx)
        .unwrap()
        .run()
        .await
        .unwrap();
    (report, drain(rx))
}

#[tokio::test(start_paused = true)]
async fn avoidance_finishes_every_process() {
    for seed in [123, 1, 42] {
        let (report, lines) = run(&config(Mode::Avoidance, seed)).await;

        assert_eq!(report.count(ProcessState::Finished), 5, "seed {seed}");
        assert!(report.victims.is_empty());
        assert!(report.swept.is_empty());
        assert_eq!(report.available, report.total);
        assert!(lines.iter().all(|l| !l.starts_with("[detect]")));
        assert!(lines.iter().all(|l| !l.contains("abort")));
        assert!(lines[0].starts_with("Mode=avoidance total=[3, 3, 2] n=5"));
        assert_eq!(lines.last().map(String::as_str), Some("All done."));
    }
}

#[tokio::test(start_paused = true)]
async fn detection_runs_terminate_cleanly() {
    for seed in 0..8 {
        let (report, lines) = run(&config(Mode::Detection, seed)).await;

        assert!(report.all_terminal(), "seed {seed}");
        assert_eq!(report.available, report.total);
        assert_eq!(report.cycles.len(), report.victims.len());
        for (cycle, victim) in report.cycles.iter().zip(&report.victims) {
            assert!(cycle.contains(victim));
        }

        assert_resolves_follow_cycles(&lines);
        assert!(lines.iter().all(|l| !l.starts_with("[avoid]")));
    }
}

#[tokio::test(start_paused = true)]
async fn detection_breaks_the_seeded_deadlock() {
    let (report, lines) = run(&config(Mode::Detection, 42)).await;

    assert!(lines.iter().any(|l| l.starts_with("[detect][block]")));
    assert_eq!(report.cycles.len(), 1);
    assert_eq!(report.victims.len(), 1);
    assert!(report.cycles[0].contains(&report.victims[0]));
    assert_eq!(report.count(ProcessState::Aborted), 1);
    assert_eq!(report.count(ProcessState::Finished), 4);
    assert!(report.swept.is_empty());
    assert_eq!(report.available, report.total);

    let found: Vec<&String> = lines
        .iter()
        .filter(|l| l.contains("Deadlock cycle found:"))
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(lines.iter().filter(|l| l.starts_with("[resolve] abort proc")).count(), 1);
    assert_resolves_follow_cycles(&lines);
    assert_eq!(lines.last().map(String::as_str), Some("All done."));
}

/// Every `[resolve]` line comes straight after the cycle report it answers
fn assert_resolves_follow_cycles(lines: &[String]) {
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("[resolve]") {
            let previous = i.checked_sub(1).and_then(|j| lines.get(j));
            assert!(
                previous.is_some_and(|p| p.contains("Deadlock cycle found:")),
                "{line}"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn identical_inputs_give_identical_events() {
    for mode in [Mode::Avoidance, Mode::Detection] {
        let cfg = config(mode, 7);
        let (first_report, first) = run(&cfg).await;
        let (second_report, second) = run(&cfg).await;

        assert_eq!(first, second);
        assert_eq!(first_report.victims, second_report.victims);
        assert_eq!(first_report.duration_ms, second_report.duration_ms);
    }
}

#[tokio::test(start_paused = true)]
async fn deadline_sweeps_stragglers() {
    let mut cfg = config(Mode::Avoidance, 123);
    // Shorter than the minimum think time, so nobody can finish.
    cfg.timing.run_timeout_ms = 5;
    let (report, lines) = run(&cfg).await;

    assert!(!report.swept.is_empty());
    assert!(report.all_terminal());
    assert_eq!(report.count(ProcessState::Aborted), report.swept.len());
    assert_eq!(report.available, report.total);

    let sweep = lines
        .iter()
        .position(|l| l.starts_with("[final] Forcing abort of remaining:"))
        .expect("sweep line");
    assert!(lines[sweep + 1].starts_with("[final] abort proc"));
}

#[tokio::test]
async fn invalid_config_never_starts() {
    let mut cfg = Config::default();
    cfg.simulation.processes = 0;
    let (tx, mut rx) = channel();
    assert!(Simulation::from_config(&cfg, tx).is_err());
    assert!(rx.try_recv().is_err());
}
