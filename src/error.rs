//! Error types for the particle playground.

use std::fmt;

/// Errors raised while applying configuration, rendering, or touching config files.
#[derive(Debug)]
pub enum SimError {
    /// A configuration value was rejected; the previous configuration is kept.
    InvalidConfiguration { field: &'static str, reason: String },
    /// The render surface is missing or has no drawable area.
    SurfaceUnavailable,
    /// Failed to read or write a config/preset file.
    Io(std::io::Error),
    /// Failed to (de)serialize a config/preset file.
    Json(serde_json::Error),
}

impl SimError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidConfiguration { field, reason } => {
                write!(f, "Invalid configuration for '{}': {}", field, reason)
            }
            SimError::SurfaceUnavailable => write!(f, "Render surface is unavailable"),
            SimError::Io(e) => write!(f, "Config file I/O failed: {}", e),
            SimError::Json(e) => write!(f, "Config file is malformed: {}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            SimError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_configuration_message_names_field() {
        let err = SimError::invalid("particle_size", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'particle_size': must be greater than 0"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err: SimError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.source().is_some());
    }
}
