//! Collects every violated rule of a request before failing it.

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, Result};

/// Accumulator for rule violations found by derive rules and by
/// database-backed checks
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    /// Start from the derive rules of `input`
    pub fn of<T: Validate>(input: &T) -> Self {
        match input.validate() {
            Ok(()) => Self::default(),
            Err(errors) => Self(messages(&errors)),
        }
    }

    pub fn push(&mut self, rule: impl Into<String>) {
        self.0.push(rule.into());
    }

    /// Record `rule` when `violated` holds
    pub fn check(&mut self, violated: bool, rule: impl Into<String>) {
        if violated {
            self.push(rule);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

/// Flatten field errors into readable messages, ordered by field name
pub fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid ({})", field, e.code),
            })
        })
        .collect()
}

/// Permission keys are dot-separated segments of `[a-z0-9_]`, at least two
pub fn is_valid_permission_key(key: &str) -> bool {
    let segments: Vec<&str> = key.split('.').collect();
    segments.len() >= 2
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
}

/// `validator` custom rule wrapping [`is_valid_permission_key`]
pub fn validate_permission_key(key: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_permission_key(key) {
        Ok(())
    } else {
        Err(ValidationError::new("permission_key").with_message(Cow::Borrowed(
            "Permission key must be lowercase dot-separated segments, e.g. users.view",
        )))
    }
}

/// Menu names are machine identifiers: `[a-z0-9_-]`, starting with a letter
pub fn validate_identifier(name: &str) -> std::result::Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("identifier").with_message(Cow::Borrowed(
            "Name must start with a lowercase letter and contain only a-z, 0-9, '_' or '-'",
        )))
    }
}
