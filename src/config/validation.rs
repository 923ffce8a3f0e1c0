use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::models::ServerConfig;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Invalid route prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    #[error("Invalid status code {code} for '{entry}': must be within 400..=599")]
    InvalidStatus { entry: String, code: u16 },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire configuration, reporting every problem found.
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let errors = Self::collect_errors(config);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(&errors),
            })
        }
    }

    /// Every individual problem with `config`, in field order.
    pub fn collect_errors(config: &ServerConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_prefix(&config.prefix) {
            errors.push(e);
        }

        if config.max_body_bytes == 0 {
            errors.push(ValidationError::InvalidField {
                field: "max_body_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        for (entry, code) in config.status.entries() {
            if !(400..=599).contains(&code) {
                errors.push(ValidationError::InvalidStatus {
                    entry: format!("status.{entry}"),
                    code,
                });
            }
        }

        if let Err(e) = EnvFilter::try_new(&config.logging.level) {
            errors.push(ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: e.to_string(),
            });
        }

        errors
    }

    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_prefix(prefix: &str) -> ValidationResult<()> {
        let invalid = |reason: &str| {
            Err(ValidationError::InvalidPrefix {
                prefix: prefix.to_string(),
                reason: reason.to_string(),
            })
        };

        if !prefix.starts_with('/') {
            return invalid("must start with '/'");
        }
        if prefix.ends_with('/') {
            return invalid("must not end with '/'");
        }
        if prefix.contains(['{', '}']) {
            return invalid("must not contain '{' or '}'");
        }
        Ok(())
    }

    fn format_multiple_errors(errors: &[ValidationError]) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_defaults() {
        assert!(ServerConfigValidator::validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_bad_listen_address() {
        let config = ServerConfig {
            listen_addr: "localhost".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            ServerConfigValidator::collect_errors(&config)[..],
            [ValidationError::InvalidListenAddress { .. }]
        ));
    }

    #[test]
    fn validate_rejects_bad_prefixes() {
        for prefix in ["posts", "/posts/", "/", "/posts/{id}", ""] {
            let config = ServerConfig {
                prefix: prefix.to_string(),
                ..ServerConfig::default()
            };
            assert!(
                ServerConfigValidator::validate(&config).is_err(),
                "prefix {prefix:?} should be rejected"
            );
        }
    }

    #[test]
    fn validate_accepts_nested_prefix() {
        let config = ServerConfig {
            prefix: "/api/v1/posts".to_string(),
            ..ServerConfig::default()
        };
        assert!(ServerConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_status() {
        let mut config = ServerConfig::default();
        config.status.not_found = 200;
        config.status.fallback = 600;
        let errors = ServerConfigValidator::collect_errors(&config);
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidStatus {
                    entry: "status.not_found".to_string(),
                    code: 200,
                },
                ValidationError::InvalidStatus {
                    entry: "status.fallback".to_string(),
                    code: 600,
                },
            ]
        );
    }

    #[test]
    fn validate_collects_all_errors() {
        let mut config = ServerConfig {
            listen_addr: "nope".to_string(),
            prefix: "posts".to_string(),
            max_body_bytes: 0,
            ..ServerConfig::default()
        };
        config.status.internal = 302;

        assert_eq!(ServerConfigValidator::collect_errors(&config).len(), 4);
        let message = ServerConfigValidator::validate(&config)
            .unwrap_err()
            .to_string();
        assert!(message.contains("Found 4 validation errors"));
    }
}
