//! Event handling and console output

use console::Style;
use dlsim_events::{AppEvent, EventMessage, GeneralEvent};

use crate::logging::log_event_with_tracing;

/// Turns events into console lines and tracing records
pub struct EventHandler {
    colors_enabled: bool,
    /// Suppress console lines entirely (`--json`)
    quiet: bool,
    /// Surface debug events on stderr as well
    debug_enabled: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, quiet: bool, debug_enabled: bool) -> Self {
        Self {
            colors_enabled,
            quiet,
            debug_enabled,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);
        if self.quiet {
            return;
        }

        match &message.event {
            AppEvent::General(GeneralEvent::Warning { message, context }) => {
                let text = match context {
                    Some(context) => format!("Warning: {message} ({context})"),
                    None => format!("Warning: {message}"),
                };
                self.show_error(&text, &Style::new().yellow());
            }
            AppEvent::General(GeneralEvent::Error { message, details }) => {
                let text = match details {
                    Some(details) => format!("Error: {message}: {details}"),
                    None => format!("Error: {message}"),
                };
                self.show_error(&text, &Style::new().red().bold());
            }
            AppEvent::General(GeneralEvent::DebugLog { message, .. }) if self.debug_enabled => {
                self.show_error(&format!("debug: {message}"), &Style::new().dim());
            }
            event => {
                if let Some(line) = event.console_line() {
                    self.show_status(&line);
                }
            }
        }
    }

    /// Print a stable console line on stdout
    fn show_status(&self, line: &str) {
        if self.colors_enabled {
            println!("{}", LineKind::of(line).style().apply_to(line));
        } else {
            println!("{line}");
        }
    }

    fn show_error(&self, text: &str, style: &Style) {
        if self.colors_enabled {
            eprintln!("{}", style.apply_to(text));
        } else {
            eprintln!("{text}");
        }
    }
}

/// Console line categories, keyed on the line tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Grant,
    Deferred,
    Deadlock,
    Sweep,
    Finished,
    Banner,
    Plain,
}

impl LineKind {
    fn of(line: &str) -> Self {
        if line.contains("][grant]") {
            Self::Grant
        } else if line.contains("][wait ]") || line.contains("][block]") {
            Self::Deferred
        } else if line.starts_with("[detect]") || line.starts_with("[resolve]") {
            Self::Deadlock
        } else if line.starts_with("[final]") {
            Self::Sweep
        } else if line.ends_with("finished") {
            Self::Finished
        } else if line.starts_with("Mode=") || line == "All done." {
            Self::Banner
        } else {
            Self::Plain
        }
    }

    fn style(self) -> Style {
        match self {
            Self::Grant => Style::new().green(),
            Self::Deferred => Style::new().yellow(),
            Self::Deadlock => Style::new().red().bold(),
            Self::Sweep => Style::new().magenta(),
            Self::Finished => Style::new().cyan(),
            Self::Banner => Style::new().bold(),
            Self::Plain => Style::new(),
        }
    }
}
