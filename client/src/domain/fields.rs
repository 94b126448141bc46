//! Field descriptors and the validation rules they carry.
//!
//! A [`FieldDescriptor`] is presentation metadata (label, input kind, layout
//! hint) plus the [`FieldRule`] that validates the field. Keeping the rule on
//! the descriptor means the rule set and the field set cannot disagree.
//! Descriptors are built with `const` builders so a record schema can expose
//! them as a `'static` slice.

use serde::Serialize;

/// Input kind used by presentation layers to pick a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    /// Single-line free text.
    ShortText,
    /// Email address input.
    Email,
    /// Telephone number input.
    Phone,
    /// Calendar date input (`YYYY-MM-DD`).
    Date,
    /// Integer input.
    Number,
    /// Multi-line free text.
    LongText,
}

/// Character-level shape a non-empty value must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Pattern {
    /// ASCII letters and whitespace only.
    LettersAndSpaces,
    /// Exactly `count` ASCII digits.
    Digits {
        /// Required number of digits.
        count: usize,
    },
    /// An email address.
    Email,
    /// An ISO 8601 calendar date (`YYYY-MM-DD`).
    IsoDate,
}

/// Pattern constraint with its failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternRule {
    /// Shape the value must match.
    pub pattern: Pattern,
    /// Message reported when the value does not match.
    pub message: &'static str,
}

/// Inclusive integer bounds for numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeRule {
    /// Smallest accepted value.
    pub min: i64,
    /// Largest accepted value.
    pub max: i64,
}

/// Validation rule for one field.
///
/// `subject` is the sentence-case noun used in generated messages, for
/// example `"First name"` yields `"First name must be at least 2
/// characters"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    subject: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<PatternRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<RangeRule>,
}

impl FieldRule {
    /// Rule with no constraints beyond required-ness.
    #[must_use]
    pub const fn new(subject: &'static str) -> Self {
        Self {
            subject,
            min_length: None,
            max_length: None,
            pattern: None,
            range: None,
        }
    }

    /// Bound the value length, in characters, to `[min, max]`.
    #[must_use]
    pub const fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    /// Cap the value length, in characters.
    #[must_use]
    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Require the value to match `pattern`, reporting `message` otherwise.
    #[must_use]
    pub const fn pattern(mut self, pattern: Pattern, message: &'static str) -> Self {
        self.pattern = Some(PatternRule { pattern, message });
        self
    }

    /// Require the value to parse as an integer within `[min, max]`.
    #[must_use]
    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.range = Some(RangeRule { min, max });
        self
    }

    /// Noun used in generated messages.
    #[must_use]
    pub const fn subject(&self) -> &'static str {
        self.subject
    }

    /// Minimum length in characters, if bounded.
    #[must_use]
    pub const fn min_len(&self) -> Option<usize> {
        self.min_length
    }

    /// Maximum length in characters, if bounded.
    #[must_use]
    pub const fn max_len(&self) -> Option<usize> {
        self.max_length
    }

    /// Pattern constraint, if any.
    #[must_use]
    pub const fn pattern_rule(&self) -> Option<&PatternRule> {
        self.pattern.as_ref()
    }

    /// Integer range constraint, if any.
    #[must_use]
    pub const fn range_rule(&self) -> Option<&RangeRule> {
        self.range.as_ref()
    }
}

/// Metadata describing one editable record attribute.
///
/// ## Invariants
/// - `name` is the attribute's wire name and is unique within a schema.
/// - `layout_hint`, when present, is a column count out of 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout_hint: Option<u8>,
    rule: FieldRule,
}

/// Grid columns available to layout hints.
pub const LAYOUT_COLUMNS: u8 = 12;

impl FieldDescriptor {
    /// Required field of `kind` captioned `label`, validated by `rule`.
    ///
    /// The wire name is assigned by the record schema that owns the
    /// descriptor.
    #[must_use]
    pub const fn new(kind: FieldKind, label: &'static str, rule: FieldRule) -> Self {
        Self {
            name: "",
            label,
            kind,
            required: true,
            placeholder: None,
            layout_hint: None,
            rule,
        }
    }

    /// Mark the field optional: empty values pass without further checks.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attach placeholder text.
    #[must_use]
    pub const fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Attach a layout width in grid columns, clamped to [`LAYOUT_COLUMNS`].
    #[must_use]
    pub const fn width(mut self, columns: u8) -> Self {
        self.layout_hint = Some(if columns > LAYOUT_COLUMNS {
            LAYOUT_COLUMNS
        } else {
            columns
        });
        self
    }

    /// Bind the descriptor to its wire name.
    #[must_use]
    pub const fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Wire name of the attribute.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Human-readable caption.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Input kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether an empty value is a validation failure.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Placeholder text, if any.
    #[must_use]
    pub const fn placeholder_text(&self) -> Option<&'static str> {
        self.placeholder
    }

    /// Layout width in grid columns, if any.
    #[must_use]
    pub const fn layout_hint(&self) -> Option<u8> {
        self.layout_hint
    }

    /// Validation rule for the field.
    #[must_use]
    pub const fn rule(&self) -> &FieldRule {
        &self.rule
    }
}

/// Find the descriptor called `name` in `descriptors`.
#[must_use]
pub fn find_descriptor<'a>(
    descriptors: &'a [FieldDescriptor],
    name: &str,
) -> Option<&'a FieldDescriptor> {
    descriptors
        .iter()
        .find(|descriptor| descriptor.name() == name)
}
