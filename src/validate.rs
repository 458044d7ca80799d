//! Field validation shared by every store.
//!
//! A [`Validator`] collects all failing fields so a client sees every problem
//! with a submission at once, not just the first one.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.fail(field, message);
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, !value.trim().is_empty(), "is required")
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.check(field, is_valid_email(value), "must be a valid email address");
        }
        self
    }

    pub fn phone(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
            self.check(field, (10..=11).contains(&digits), "must have 10 or 11 digits");
        }
        self
    }

    /// Parses a `YYYY-MM-DD` date, recording an error when it is missing or malformed.
    pub fn date(&mut self, field: &str, value: Option<&str>) -> Option<NaiveDate> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match value {
            None => {
                self.fail(field, "is required");
                None
            }
            Some(v) => match NaiveDate::parse_from_str(v, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    self.fail(field, "must be a date formatted as YYYY-MM-DD");
                    None
                }
            },
        }
    }

    /// Parses an `HH:MM` time of day.
    pub fn time(&mut self, field: &str, value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        if value.is_empty() {
            self.fail(field, "is required");
            return None;
        }
        match NaiveTime::parse_from_str(value, TIME_FORMAT) {
            Ok(time) => Some(time),
            Err(_) => {
                self.fail(field, "must be a time formatted as HH:MM");
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> StoreResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(self.errors))
        }
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2 && !host.ends_with('.'),
        None => false,
    }
}

/// Trims a required text field.
pub fn clean(value: &str) -> String {
    value.trim().to_string()
}

/// Trims optional text, collapsing blank input to `None`.
pub fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Keeps only the digits of a phone number.
pub fn digits_only(value: Option<String>) -> Option<String> {
    clean_opt(value).map(|v| v.chars().filter(|c| c.is_ascii_digit()).collect())
}

pub fn split_comma_separated_string(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
