//! Final report rendering

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use dlsim_events::events::format_ids;
use dlsim_types::{ColorChoice, ProcessState, SimulationReport};
use std::io;

/// Output renderer for the run report
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    color_choice: ColorChoice,
    term: Term,
}

impl OutputRenderer {
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render the final report
    pub fn render_report(&self, report: &SimulationReport) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        println!();
        println!("{}", self.build_table(report));
        for line in summary_lines(report) {
            println!("{}", self.style_summary(&line));
        }
        Ok(())
    }

    fn build_table(&self, report: &SimulationReport) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Proc").add_attribute(Attribute::Bold),
            Cell::new("Max demand").add_attribute(Attribute::Bold),
            Cell::new("State").add_attribute(Attribute::Bold),
            Cell::new("Grants").add_attribute(Attribute::Bold),
            Cell::new("Waits").add_attribute(Attribute::Bold),
        ]);

        for process in &report.processes {
            table.add_row(vec![
                Cell::new(process.id),
                Cell::new(&process.max_demand),
                self.format_state(process.state),
                Cell::new(process.grants),
                Cell::new(process.waits),
            ]);
        }
        table
    }

    fn format_state(&self, state: ProcessState) -> Cell {
        let cell = Cell::new(state.as_str());
        if !self.supports_color() {
            return cell;
        }
        match state {
            ProcessState::Finished => cell.fg(Color::Green),
            ProcessState::Aborted => cell.fg(Color::Red),
            ProcessState::Running | ProcessState::Waiting => cell.fg(Color::Yellow),
        }
    }

    fn style_summary(&self, line: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(line).to_string()
        } else {
            line.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

/// Plain summary lines printed under the process table
fn summary_lines(report: &SimulationReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Mode: {}  seed: {}  simulated time: {} ms",
            report.mode, report.seed, report.duration_ms
        ),
        format!(
            "Finished: {}  Aborted: {}",
            report.count(ProcessState::Finished),
            report.count(ProcessState::Aborted)
        ),
        format!("Available: {}  Total: {}", report.available, report.total),
    ];
    if !report.cycles.is_empty() {
        lines.push(format!(
            "Deadlocks resolved: {}  victims: {}",
            report.cycles.len(),
            format_ids(&report.victims)
        ));
    }
    if !report.swept.is_empty() {
        lines.push(format!("Aborted at deadline: {}", format_ids(&report.swept)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlsim_types::{Mode, ProcessId, ProcessSummary, ResourceVector};

    fn report() -> SimulationReport {
        SimulationReport {
            mode: Mode::Detection,
            seed: 5,
            total: ResourceVector::from([2, 1]),
            available: ResourceVector::from([2, 1]),
            processes: vec![
                ProcessSummary {
                    id: ProcessId(0),
                    max_demand: ResourceVector::from([1, 1]),
                    state: ProcessState::Aborted,
                    grants: 1,
                    waits: 1,
                },
                ProcessSummary {
                    id: ProcessId(1),
                    max_demand: ResourceVector::from([2, 1]),
                    state: ProcessState::Finished,
                    grants: 3,
                    waits: 1,
                },
            ],
            cycles: vec![vec![ProcessId(0), ProcessId(1)]],
            victims: vec![ProcessId(0)],
            swept: Vec::new(),
            duration_ms: 640,
        }
    }

    #[test]
    fn test_summary_lines() {
        let lines = summary_lines(&report());
        assert_eq!(lines[1], "Finished: 1  Aborted: 1");
        assert_eq!(lines[3], "Deadlocks resolved: 1  victims: [0]");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_table_has_a_row_per_process() {
        let renderer = OutputRenderer::new(false, ColorChoice::Never);
        let table = renderer.build_table(&report());
        let rendered = table.to_string();
        assert!(rendered.contains("aborted"));
        assert!(rendered.contains("[2, 1]"));
    }
}
