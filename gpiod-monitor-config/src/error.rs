use std::fmt;

/// Why a monitor config file was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read from disk
    FileRead { path: String, message: String },
    /// The file is not valid TOML or does not match the monitor sections
    TomlParse { path: String, message: String },
    /// A setting parsed fine but cannot drive the monitor
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileRead { path, message } => {
                write!(f, "cannot read monitor config {}: {}", path, message)
            }
            ConfigError::TomlParse { path, message } => {
                write!(f, "malformed monitor config {}: {}", path, message)
            }
            ConfigError::InvalidValue { field, value, expected } => {
                write!(f, "`{}` = {} is not usable, expected {}", field, value, expected)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = Result<T, ConfigError>;
