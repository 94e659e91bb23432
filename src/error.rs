//! Error types for the simulation engine.
//!
//! This module provides custom error types that improve error handling throughout
//! the engine. All errors implement the standard `Error` trait and provide
//! clear, descriptive error messages.
//!
//! Only *fatal* conditions surface as errors: configuration problems that
//! prevent a game from starting, market-resolution failures that would corrupt
//! cross-team consistency, and wall-clock budget overruns. Recoverable
//! problems (a malformed decision, an unaffordable purchase, a module panic)
//! never abort a round; they are reported as warnings on the round report.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Custom error type for the simulation engine.
///
/// This enum represents all possible fatal errors that can occur during
/// configuration, round processing, and result output.
#[derive(Debug)]
pub enum SimulationError {
    /// Error occurred while reading a configuration file
    ConfigFileRead(io::Error),

    /// Error occurred while parsing YAML configuration
    YamlParse(String),

    /// Error occurred while parsing TOML configuration
    TomlParse(String),

    /// Configuration file has an unsupported extension
    UnsupportedConfigFormat(String),

    /// Configuration validation failed
    ValidationError(String),

    /// The config bundle was built for a different engine schema
    ConfigVersionMismatch { expected: u32, found: u32 },

    /// A required config field or referenced id is missing
    ConfigError(String),

    /// Non-recoverable failure inside cross-team market resolution.
    /// The round is aborted and no input state is mutated.
    RoundFailed(String),

    /// The round exceeded its wall-clock budget and was not committed
    RoundTimedOut { budget_ms: u64 },

    /// Error occurred while writing output files
    IoError(io::Error),

    /// Error occurred while serializing JSON output
    JsonSerialize(String),

    /// Error occurred while reading or writing a decision log
    DecisionLogIo(io::Error),

    /// Error occurred while serializing or deserializing a decision log
    DecisionLogSerde(serde_json::Error),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::ConfigFileRead(e) => {
                write!(f, "Failed to read configuration file: {}", e)
            },
            SimulationError::YamlParse(msg) => {
                write!(f, "Failed to parse YAML configuration: {}", msg)
            },
            SimulationError::TomlParse(msg) => {
                write!(f, "Failed to parse TOML configuration: {}", msg)
            },
            SimulationError::UnsupportedConfigFormat(ext) => {
                write!(
                    f,
                    "Unsupported configuration file format: '{}'. Use .yaml, .yml, or .toml",
                    ext
                )
            },
            SimulationError::ValidationError(msg) => {
                write!(f, "Configuration validation failed: {}", msg)
            },
            SimulationError::ConfigVersionMismatch { expected, found } => {
                write!(
                    f,
                    "Config schema version mismatch: engine expects {}, config carries {}",
                    expected, found
                )
            },
            SimulationError::ConfigError(msg) => {
                write!(f, "Configuration error: {}", msg)
            },
            SimulationError::RoundFailed(msg) => {
                write!(f, "Round aborted during market resolution: {}", msg)
            },
            SimulationError::RoundTimedOut { budget_ms } => {
                write!(f, "Round exceeded its wall-clock budget of {} ms", budget_ms)
            },
            SimulationError::IoError(e) => {
                write!(f, "I/O error: {}", e)
            },
            SimulationError::JsonSerialize(msg) => {
                write!(f, "Failed to serialize JSON: {}", msg)
            },
            SimulationError::DecisionLogIo(e) => {
                write!(f, "Failed to read or write decision log: {}", e)
            },
            SimulationError::DecisionLogSerde(e) => {
                write!(f, "Failed to (de)serialize decision log: {}", e)
            },
        }
    }
}

impl StdError for SimulationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SimulationError::ConfigFileRead(e)
            | SimulationError::IoError(e)
            | SimulationError::DecisionLogIo(e) => Some(e),
            SimulationError::DecisionLogSerde(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SimulationError {
    fn from(err: io::Error) -> Self {
        SimulationError::IoError(err)
    }
}

/// Type alias for Result with SimulationError
pub type Result<T> = std::result::Result<T, SimulationError>;
