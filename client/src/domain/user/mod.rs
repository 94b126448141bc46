//! User record model.
//!
//! The record's attributes, their descriptors, and their validation rules
//! all come from the [`UserFields`] schema definition. A [`UserPayload`] is
//! a validated attribute set without identity; a [`User`] is a persisted
//! record carrying the backend-assigned [`UserId`].

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fields::{FieldDescriptor, FieldKind, FieldRule, Pattern};
use super::schema::define_record_schema;
use super::validation::{FieldErrors, FormValues, validate};

/// Minimum length of a first or last name, in characters.
pub const NAME_MIN_LEN: usize = 2;
/// Maximum length of a first or last name, in characters.
pub const NAME_MAX_LEN: usize = 50;
/// Number of digits in a phone number.
pub const PHONE_DIGITS: usize = 10;

/// Backend-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

define_record_schema! {
    /// Editable attributes of a user record, in render order.
    pub struct UserFields {
        first_name: "firstName" => FieldDescriptor::new(
            FieldKind::ShortText,
            "First Name",
            FieldRule::new("First name")
                .length(NAME_MIN_LEN, NAME_MAX_LEN)
                .pattern(Pattern::LettersAndSpaces, "First name can only contain letters"),
        )
        .placeholder("Enter first name")
        .width(6),
        last_name: "lastName" => FieldDescriptor::new(
            FieldKind::ShortText,
            "Last Name",
            FieldRule::new("Last name")
                .length(NAME_MIN_LEN, NAME_MAX_LEN)
                .pattern(Pattern::LettersAndSpaces, "Last name can only contain letters"),
        )
        .placeholder("Enter last name")
        .width(6),
        email: "email" => FieldDescriptor::new(
            FieldKind::Email,
            "Email Address",
            FieldRule::new("Email").pattern(Pattern::Email, "Please enter a valid email address"),
        )
        .placeholder("example@email.com")
        .width(6),
        phone: "phone" => FieldDescriptor::new(
            FieldKind::Phone,
            "Phone Number",
            FieldRule::new("Phone number").pattern(
                Pattern::Digits { count: PHONE_DIGITS },
                "Phone number must be exactly 10 digits",
            ),
        )
        .placeholder("1234567890")
        .width(6),
    }
}

/// Validated user attributes ready to send to the backend.
///
/// Serialises as the record JSON without `id`; the client never assigns
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UserPayload(UserFields);

impl UserPayload {
    /// Validate raw form values against [`UserFields::FIELDS`].
    ///
    /// # Examples
    /// ```
    /// use client::domain::{FormValues, UserPayload};
    ///
    /// let values: FormValues = [
    ///     ("firstName", "Jo"),
    ///     ("lastName", "Lee"),
    ///     ("email", "jo@x.com"),
    ///     ("phone", "1234567890"),
    /// ]
    /// .into_iter()
    /// .collect();
    /// let payload = UserPayload::validate(&values).expect("valid user");
    /// assert_eq!(payload.fields().first_name, "Jo");
    /// ```
    pub fn validate(values: &FormValues) -> Result<Self, FieldErrors> {
        let accepted = validate(UserFields::FIELDS, values)?;
        Ok(Self(UserFields::from_values(&accepted)))
    }

    /// Validated attributes.
    #[must_use]
    pub const fn fields(&self) -> &UserFields {
        &self.0
    }

    /// Consume the payload, returning its attributes.
    #[must_use]
    pub fn into_fields(self) -> UserFields {
        self.0
    }
}

impl TryFrom<UserFields> for UserPayload {
    type Error = FieldErrors;

    fn try_from(value: UserFields) -> Result<Self, Self::Error> {
        Self::validate(&value.to_values())
    }
}

/// Errors raised while decoding a backend record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserDecodeError {
    /// The record carried no `id`.
    MissingId,
}

impl fmt::Display for UserDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => write!(f, "user record is missing an id"),
        }
    }
}

impl std::error::Error for UserDecodeError {}

/// Persisted user record.
///
/// ## Invariants
/// - `id` was assigned by the backend.
///
/// Attributes are stored as received; the backend may hold records that
/// predate the current rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    id: UserId,
    fields: UserFields,
}

impl User {
    /// Build a persisted user.
    #[must_use]
    pub const fn new(id: UserId, fields: UserFields) -> Self {
        Self { id, fields }
    }

    /// Backend-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Current attributes.
    #[must_use]
    pub const fn fields(&self) -> &UserFields {
        &self.fields
    }

    /// Given and family name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.fields.first_name, self.fields.last_name)
    }
}

#[derive(Serialize, Deserialize)]
struct UserDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<UserId>,
    #[serde(flatten)]
    fields: UserFields,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        let User { id, fields } = value;
        Self {
            id: Some(id),
            fields,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserDecodeError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        let id = value.id.ok_or(UserDecodeError::MissingId)?;
        Ok(Self::new(id, value.fields))
    }
}
