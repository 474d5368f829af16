// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Declared property validation shared by the reconcilers.
//!
//! Properties arrive as loosely typed JSON (CloudFormation stringifies scalars), so each
//! helper accepts the shapes the orchestrator actually sends and reports anything else as
//! a [`ReconcileError::Validation`].

use crate::constants::{PROP_DOMAINS, PROP_VALIDATION_DOMAIN, PROP_VALIDATION_OPTIONS};
use crate::errors::ReconcileError;
use crate::providers::DomainValidationOption;
use crate::request::ResourceRequest;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

fn invalid(reason: String) -> ReconcileError {
    error!("{}", reason);
    ReconcileError::Validation(reason)
}

fn missing(request: &ResourceRequest, name: &str) -> ReconcileError {
    invalid(format!(
        "ERROR: No property '{name}' on {} request for {}",
        request.request_type, request.logical_resource_id
    ))
}

/// Require a non-empty string property.
///
/// # Errors
///
/// Returns a validation error if the property is absent, null, not a string, or empty.
pub fn require_string(request: &ResourceRequest, name: &str) -> Result<String, ReconcileError> {
    match request.property(name) {
        None | Some(Value::Null) => Err(missing(request, name)),
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
        Some(other) => Err(invalid(format!(
            "ERROR: Property '{name}' must be a non-empty string, got {other}"
        ))),
    }
}

/// Require `Domains` to be a non-empty list of non-empty strings.
///
/// Order is preserved: the first entry becomes the primary domain.
///
/// # Errors
///
/// Returns a validation error if `Domains` is missing, not a list, empty, or contains
/// anything other than non-empty strings.
pub fn require_domains(request: &ResourceRequest) -> Result<Vec<String>, ReconcileError> {
    let value = match request.property(PROP_DOMAINS) {
        None | Some(Value::Null) => return Err(missing(request, PROP_DOMAINS)),
        Some(value) => value,
    };

    info!(domains = %value, "Got domains");

    let not_a_list = || {
        invalid(format!(
            "ERROR: {PROP_DOMAINS} is not a list of domain names in {} request for {}, got {value}",
            request.request_type, request.logical_resource_id
        ))
    };

    let entries = value.as_array().ok_or_else(not_a_list)?;
    if entries.is_empty() {
        return Err(not_a_list());
    }

    entries
        .iter()
        .map(|entry| match entry.as_str() {
            Some(domain) if !domain.trim().is_empty() => Ok(domain.to_string()),
            _ => Err(not_a_list()),
        })
        .collect()
}

/// Parse an optional boolean flag.
///
/// Accepts JSON booleans and the strings `"true"`/`"false"` in any case. Absent or null
/// means `false`.
///
/// # Errors
///
/// Returns a validation error for any other value.
pub fn optional_flag(request: &ResourceRequest, name: &str) -> Result<bool, ReconcileError> {
    match request.property(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::String(text)) if text.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(text)) if text.eq_ignore_ascii_case("false") => Ok(false),
        Some(other) => Err(invalid(format!(
            "ERROR: Property '{name}' must be true or false, got {other}"
        ))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValidationOptionsValue {
    One(DomainValidationOption),
    Many(Vec<DomainValidationOption>),
}

/// True when `validation_domain` is `domain` or one of its parent domains.
fn is_parent_domain(domain: &str, validation_domain: &str) -> bool {
    let domain = domain.trim_start_matches("*.");
    domain == validation_domain || domain.ends_with(&format!(".{validation_domain}"))
}

/// Parse validation domain overrides.
///
/// `ValidationOptions` may be a single `{DomainName, ValidationDomain}` object or a list
/// of them. Every `DomainName` must be one of the declared `domains` and its
/// `ValidationDomain` must be that domain or a parent of it. When `ValidationOptions` is
/// absent, a `ValidationDomain` string applies to the primary domain.
///
/// # Errors
///
/// Returns a validation error for malformed structures or overrides that do not match
/// the declared domains.
pub fn validation_options(
    request: &ResourceRequest,
    domains: &[String],
) -> Result<Vec<DomainValidationOption>, ReconcileError> {
    let options = match request.property(PROP_VALIDATION_OPTIONS) {
        None | Some(Value::Null) => match request.property(PROP_VALIDATION_DOMAIN) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(_) => {
                let validation_domain = require_string(request, PROP_VALIDATION_DOMAIN)?;
                let primary = domains.first().cloned().unwrap_or_default();
                vec![DomainValidationOption {
                    domain_name: primary,
                    validation_domain,
                }]
            }
        },
        Some(value) => {
            match serde_json::from_value::<ValidationOptionsValue>(value.clone()) {
                Ok(ValidationOptionsValue::One(option)) => vec![option],
                Ok(ValidationOptionsValue::Many(options)) => options,
                Err(_) => {
                    return Err(invalid(format!(
                        "ERROR: {PROP_VALIDATION_OPTIONS} must be an object or list of objects \
                         with DomainName and ValidationDomain, got {value}"
                    )))
                }
            }
        }
    };

    for option in &options {
        if !domains.contains(&option.domain_name) {
            return Err(invalid(format!(
                "ERROR: Validation option for '{}' does not match any declared domain",
                option.domain_name
            )));
        }
        if !is_parent_domain(&option.domain_name, &option.validation_domain) {
            return Err(invalid(format!(
                "ERROR: Validation domain '{}' is not '{}' or a parent of it",
                option.validation_domain, option.domain_name
            )));
        }
    }

    Ok(options)
}
