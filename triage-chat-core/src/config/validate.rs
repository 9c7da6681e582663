//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.model.api_base.trim().is_empty() {
        errors.push("model.api_base must not be empty".to_string());
    }
    if config.model.model.trim().is_empty() {
        errors.push("model.model must not be empty".to_string());
    }
    if !(0.0..=2.0).contains(&config.model.temperature) {
        errors.push("model.temperature must be in [0.0, 2.0]".to_string());
    }
    if !(0.0..=1.0).contains(&config.model.top_p) {
        errors.push("model.top_p must be in [0.0, 1.0]".to_string());
    }
    if config.model.timeout_secs == 0 {
        errors.push("model.timeout_secs must be > 0".to_string());
    }

    if config.session.key.trim().is_empty() {
        errors.push("session.key must not be empty".to_string());
    }
    if config.session.dir.trim().is_empty() {
        errors.push("session.dir must not be empty".to_string());
    }
    if config.session.context_limit == 0 {
        errors.push("session.context_limit must be > 0".to_string());
    }

    if config.server.host.parse::<std::net::IpAddr>().is_err() {
        errors.push("server.host must be an IP address".to_string());
    }
    if config.server.port == 0 {
        errors.push("server.port must be > 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
