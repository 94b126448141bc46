//! Rule interpreter over field descriptors.
//!
//! Validation is field-independent: every descriptor is checked against its
//! own raw value and every failing field contributes exactly one message.
//! Checks run in a fixed order (required, length, pattern, range) and the
//! first failure supplies the message.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::fields::{FieldDescriptor, Pattern, PatternRule, RangeRule};

/// Raw field values keyed by wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    /// Value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Store `value` under `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// One human-readable message per failing field, keyed by wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Message recorded for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate failures in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, message)| (name.as_str(), message.as_str()))
    }

    pub(crate) fn set(&mut self, name: &str, message: String) {
        self.0.insert(name.to_owned(), message);
    }

    pub(crate) fn clear_field(&mut self, name: &str) {
        self.0.remove(name);
    }
}

impl<K, V> FromIterator<(K, V)> for FieldErrors
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, message)| (name.into(), message.into()))
                .collect(),
        )
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            1 => write!(f, "1 field failed validation"),
            count => write!(f, "{count} fields failed validation"),
        }
    }
}

impl std::error::Error for FieldErrors {}

/// Validate `values` against every descriptor.
///
/// Keys that are not schema fields are ignored and absent keys count as
/// empty. On success the returned values hold exactly one entry per
/// descriptor.
///
/// # Examples
/// ```
/// use client::domain::{FormValues, UserFields, validate};
///
/// let values: FormValues = [("firstName", "J")].into_iter().collect();
/// let errors = validate(UserFields::FIELDS, &values).expect_err("invalid");
/// assert_eq!(
///     errors.get("firstName"),
///     Some("First name must be at least 2 characters"),
/// );
/// ```
pub fn validate(
    descriptors: &[FieldDescriptor],
    values: &FormValues,
) -> Result<FormValues, FieldErrors> {
    let mut accepted = FormValues::default();
    let mut errors = FieldErrors::default();
    for descriptor in descriptors {
        let raw = values.get(descriptor.name()).unwrap_or_default();
        match validate_field(descriptor, raw) {
            Ok(()) => {
                accepted.insert(descriptor.name(), raw);
            }
            Err(message) => errors.set(descriptor.name(), message),
        }
    }
    if errors.is_empty() {
        Ok(accepted)
    } else {
        Err(errors)
    }
}

/// Validate one raw value, returning the first failing check's message.
pub fn validate_field(descriptor: &FieldDescriptor, raw: &str) -> Result<(), String> {
    let rule = descriptor.rule();
    let subject = rule.subject();

    if raw.trim().is_empty() {
        return if descriptor.is_required() {
            Err(format!("{subject} is required"))
        } else {
            Ok(())
        };
    }

    let length = raw.chars().count();
    if let Some(min) = rule.min_len() {
        if length < min {
            return Err(format!("{subject} must be at least {min} characters"));
        }
    }
    if let Some(max) = rule.max_len() {
        if length > max {
            return Err(format!("{subject} must not exceed {max} characters"));
        }
    }

    if let Some(PatternRule { pattern, message }) = rule.pattern_rule() {
        if !matches_pattern(*pattern, raw) {
            return Err((*message).to_owned());
        }
    }

    if let Some(range) = rule.range_rule() {
        check_range(subject, range, raw)?;
    }

    Ok(())
}

fn check_range(subject: &str, range: &RangeRule, raw: &str) -> Result<(), String> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{subject} must be a number"))?;
    if value < range.min {
        return Err(format!("{subject} must be at least {}", range.min));
    }
    if value > range.max {
        return Err(format!("{subject} must not exceed {}", range.max));
    }
    Ok(())
}

fn matches_pattern(pattern: Pattern, raw: &str) -> bool {
    match pattern {
        Pattern::LettersAndSpaces => letters_regex().is_match(raw),
        Pattern::Digits { count } => {
            raw.len() == count && raw.bytes().all(|byte| byte.is_ascii_digit())
        }
        Pattern::Email => is_email(raw),
        Pattern::IsoDate => {
            raw.len() == 10 && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
        }
    }
}

static LETTERS_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn letters_regex() -> &'static Regex {
    LETTERS_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z\s]+$")
            .unwrap_or_else(|error| panic!("letters regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Local part may not end in '.'; leading and doubled dots are
        // rejected separately.
        let pattern = r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@(?:[A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn is_email(raw: &str) -> bool {
    !raw.starts_with('.') && !raw.contains("..") && email_regex().is_match(raw)
}
