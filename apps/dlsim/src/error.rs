//! CLI error handling

use std::fmt;

use dlsim_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration or simulation error
    Sim(dlsim_errors::Error),
    /// Runtime could not be built
    Setup(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Sim(e) => {
                let message = e.user_message();
                if e.is_fatal() {
                    write!(f, "fatal invariant violation: {message}")?;
                    write!(f, "\n  The ledger no longer balances; this run's results are invalid.")?;
                } else {
                    write!(f, "{message}")?;
                }
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this run.")?;
                }
                Ok(())
            }
            CliError::Setup(msg) => write!(f, "Runtime setup error: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl CliError {
    /// Whether the run ended on a broken invariant rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, CliError::Sim(e) if e.is_fatal())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Sim(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Setup(_) => None,
        }
    }
}

impl From<dlsim_errors::Error> for CliError {
    fn from(e: dlsim_errors::Error) -> Self {
        CliError::Sim(e)
    }
}

impl From<dlsim_errors::ConfigError> for CliError {
    fn from(e: dlsim_errors::ConfigError) -> Self {
        CliError::Sim(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlsim_errors::{ConfigError, SimulationError};

    #[test]
    fn test_invariant_violation_is_fatal() {
        let err = CliError::from(dlsim_errors::Error::from(
            SimulationError::InvariantViolated {
                message: "available [2, 3, 2] != total [3, 3, 2]".into(),
            },
        ));
        assert!(err.is_fatal());
        let text = err.to_string();
        assert!(text.starts_with("fatal invariant violation:"), "{text}");
        assert!(text.contains("results are invalid"));
    }

    #[test]
    fn test_config_error_is_not_fatal() {
        let err = CliError::from(ConfigError::InvalidValue {
            field: "simulation.processes".into(),
            value: "0".into(),
        });
        assert!(!err.is_fatal());
        assert!(!err.to_string().contains("fatal"));
        assert!(!CliError::Setup("no runtime".into()).is_fatal());
    }
}
