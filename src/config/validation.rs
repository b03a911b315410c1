//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (scenarios and ping reference existing profiles)
//! - Validate value ranges (budgets > 0, chunk sizes > 0)
//! - Detect duplicate profile names and scenario ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HarnessConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::HarnessConfig;
use crate::gateway::Direction;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &HarnessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.target.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(_) => errors.push(ValidationError::new(
            "target.base_url",
            "scheme must be http or https",
        )),
        Err(e) => errors.push(ValidationError::new("target.base_url", e.to_string())),
    }

    let mut seen = HashSet::new();
    for (i, profile) in config.profiles.iter().enumerate() {
        let field = format!("profiles[{}]", i);
        if profile.name.is_empty() {
            errors.push(ValidationError::new(&field, "name must not be empty"));
        }
        if !seen.insert(profile.name.as_str()) {
            errors.push(ValidationError::new(
                &field,
                format!("duplicate profile name '{}'", profile.name),
            ));
        }
        for (name, value) in [
            ("connect_ms", profile.connect_ms),
            ("read_ms", profile.read_ms),
            ("write_ms", profile.write_ms),
        ] {
            if value == 0 {
                errors.push(ValidationError::new(
                    format!("{}.{}", field, name),
                    "must be greater than 0",
                ));
            }
        }
    }

    let known: HashSet<String> = config
        .client_profiles()
        .into_iter()
        .map(|p| p.name)
        .collect();

    if !known.contains(&config.target.ping_profile) {
        errors.push(ValidationError::new(
            "target.ping_profile",
            format!("unknown profile '{}'", config.target.ping_profile),
        ));
    }

    if config.run.upload_size_bytes == 0 {
        errors.push(ValidationError::new(
            "run.upload_size_bytes",
            "must be greater than 0",
        ));
    }

    let mut ids = HashSet::new();
    for (i, scenario) in config.scenarios.iter().enumerate() {
        let field = format!("scenarios[{}]", i);
        if !ids.insert(scenario.id.as_str()) {
            errors.push(ValidationError::new(
                &field,
                format!("duplicate scenario id '{}'", scenario.id),
            ));
        }
        if !known.contains(&scenario.profile) {
            errors.push(ValidationError::new(
                format!("{}.profile", field),
                format!("unknown profile '{}'", scenario.profile),
            ));
        }
        if scenario.route.direction() == Direction::Probe {
            errors.push(ValidationError::new(
                format!("{}.route", field),
                "ping is a precondition, not a scenario",
            ));
        }
        if scenario.rate.chunk_size == 0 {
            errors.push(ValidationError::new(
                format!("{}.rate.chunk_size", field),
                "must be greater than 0",
            ));
        }
        if scenario.payload_bytes == Some(0) && scenario.route.direction() == Direction::Upload {
            errors.push(ValidationError::new(
                format!("{}.payload_bytes", field),
                "upload payload must not be empty",
            ));
        }
    }

    let available: HashSet<String> = config.all_scenarios().into_iter().map(|s| s.id).collect();
    for id in &config.run.only {
        if !available.contains(id) {
            errors.push(ValidationError::new(
                "run.only",
                format!("unknown scenario id '{}'", id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
