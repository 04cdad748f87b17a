//! Error types for Wayfarer
//!
//! Reducers never produce errors: malformed actions degrade to defaults at the
//! wire boundary. These types cover the fallible edges around the store:
//! configuration, storage backends and caller input.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WayfarerError>;

#[derive(Error, Debug)]
pub enum WayfarerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WayfarerError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            WayfarerError::InvalidInput(_) => 3,
            WayfarerError::Config(_) => 1,
            WayfarerError::Storage(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Slice '{slice}' has no field '{field}' to whitelist")]
    UnknownWhitelistField { slice: String, field: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database operation failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = WayfarerError::InvalidInput("missing action type".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_config_error() {
        let error = WayfarerError::Config(ConfigError::MissingField("storage.path".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_storage_error() {
        let error = WayfarerError::Storage(StorageError::InvalidKey("../auth".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_invalid_input() {
        let error = WayfarerError::InvalidInput("Action must carry a type".to_string());
        assert_eq!(error.to_string(), "Invalid input: Action must carry a type");
    }

    #[test]
    fn test_error_message_formatting_whitelist() {
        let error = WayfarerError::Config(ConfigError::UnknownWhitelistField {
            slice: "tab".to_string(),
            field: "lastTab".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Configuration error: Slice 'tab' has no field 'lastTab' to whitelist"
        );
    }

    #[test]
    fn test_error_message_formatting_storage_key() {
        let error = WayfarerError::Storage(StorageError::InvalidKey("a/b".to_string()));
        assert_eq!(error.to_string(), "Storage error: Invalid storage key: 'a/b'");
    }

    #[test]
    fn test_error_conversion_from_storage_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let error: WayfarerError = StorageError::Io(io_error).into();

        match error {
            WayfarerError::Storage(StorageError::Io(_)) => {}
            _ => panic!("Expected WayfarerError::Storage"),
        }
    }

    #[test]
    fn test_config_error_read_error_formatting() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let config_error = ConfigError::ReadError(io_error);
        assert!(config_error.to_string().contains("Failed to read config file"));
    }
}
