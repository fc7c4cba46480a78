//! CLI error handling

use std::fmt;

use stagehook_errors::UserFacingError;
use stagehook_events::FailureContext;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(stagehook_errors::ConfigError),
    /// Hook or pipeline error
    Hooks(stagehook_errors::Error),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => {
                write!(f, "Configuration error: {e}")?;
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::Hooks(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl CliError {
    /// Structured form used for `--json` output
    pub fn failure(&self) -> FailureContext {
        match self {
            CliError::Config(e) => FailureContext::from_error(e),
            CliError::Hooks(e) => FailureContext::from_error(e),
            CliError::Io(e) => {
                FailureContext::new(Some("error.io"), e.to_string(), None::<String>, false)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Hooks(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<stagehook_errors::ConfigError> for CliError {
    fn from(e: stagehook_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<stagehook_errors::Error> for CliError {
    fn from(e: stagehook_errors::Error) -> Self {
        match e {
            stagehook_errors::Error::Config(e) => CliError::Config(e),
            other => CliError::Hooks(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
