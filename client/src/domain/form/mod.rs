//! Form controller binding user records to editable field state.
//!
//! The controller owns the values of one editing session. Switching the
//! target record always replaces the values wholesale and opens a new
//! session; completions carrying an older session ticket are discarded.

use tracing::debug;

use super::error::{FormError, SubmitError};
use super::mutation::{MutationIntent, MutationOutcome};
use super::ports::DataAccessError;
use super::record_cache::RecordCache;
use super::user::{User, UserFields, UserId, UserPayload};
use super::validation::{FieldErrors, FormValues, validate_field};

/// What the current session edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// A new record without identity.
    Create,
    /// An existing record.
    Edit {
        /// Record being edited.
        id: UserId,
    },
}

/// Ticket identifying one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormSession(u64);

impl FormSession {
    const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// How [`FormController::complete`] treated an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The outcome succeeded; the form was cleared for a new record.
    Applied,
    /// The outcome failed; values were kept for a retry.
    Retained,
    /// The outcome belonged to an earlier session and was ignored.
    Stale,
}

/// A validated intent tagged with the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSubmit {
    session: FormSession,
    intent: MutationIntent,
}

impl PreparedSubmit {
    /// Session that produced the intent.
    #[must_use]
    pub const fn session(&self) -> FormSession {
        self.session
    }

    /// Intent to hand to the data layer.
    #[must_use]
    pub const fn intent(&self) -> &MutationIntent {
        &self.intent
    }

    /// Split into session ticket and intent.
    #[must_use]
    pub fn into_parts(self) -> (FormSession, MutationIntent) {
        (self.session, self.intent)
    }
}

/// Editable state for one user form.
#[derive(Debug, Clone)]
pub struct FormController {
    mode: FormMode,
    session: FormSession,
    initial: FormValues,
    values: FormValues,
    errors: FieldErrors,
    submitted: bool,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    /// Controller in create mode with empty defaults.
    #[must_use]
    pub fn new() -> Self {
        let initial = UserFields::default().to_values();
        Self {
            mode: FormMode::Create,
            session: FormSession(0),
            values: initial.clone(),
            initial,
            errors: FieldErrors::default(),
            submitted: false,
        }
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    /// Current session ticket.
    #[must_use]
    pub const fn session(&self) -> FormSession {
        self.session
    }

    /// Current field values.
    #[must_use]
    pub const fn values(&self) -> &FormValues {
        &self.values
    }

    /// Current value of `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name)
    }

    /// Field errors from the last validation.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Open a create session with empty defaults.
    pub fn start_create(&mut self) -> FormSession {
        self.begin(FormMode::Create, UserFields::default().to_values())
    }

    /// Open an edit session seeded from `user`.
    pub fn start_edit(&mut self, user: &User) -> FormSession {
        self.begin(
            FormMode::Edit { id: user.id() },
            user.fields().to_values(),
        )
    }

    /// Open an edit session for `id` whose record is still being fetched.
    ///
    /// Values stay empty until [`apply_record`](Self::apply_record) delivers
    /// the record for this session.
    pub fn request_edit(&mut self, id: UserId) -> FormSession {
        self.begin(FormMode::Edit { id }, UserFields::default().to_values())
    }

    /// Seed the values of a requested edit session.
    pub fn apply_record(&mut self, session: FormSession, user: &User) -> Completion {
        let current = FormMode::Edit { id: user.id() };
        if session != self.session || self.mode != current {
            debug!(id = %user.id(), "discarding record for a superseded form session");
            return Completion::Stale;
        }
        self.initial = user.fields().to_values();
        self.values = self.initial.clone();
        Completion::Applied
    }

    /// Set one field's raw value.
    ///
    /// After a failed submit the field is re-validated so its error tracks
    /// the new value.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        let Some(descriptor) = UserFields::descriptor(name) else {
            return Err(FormError::UnknownField {
                name: name.to_owned(),
            });
        };
        let raw: String = value.into();
        if self.submitted {
            match validate_field(descriptor, &raw) {
                Ok(()) => self.errors.clear_field(name),
                Err(message) => self.errors.set(name, message),
            }
        }
        self.values.insert(name, raw);
        Ok(())
    }

    /// Restore the session's initial values and clear errors.
    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.errors = FieldErrors::default();
        self.submitted = false;
    }

    /// Validate the values and build the intent for the current mode.
    ///
    /// On failure the error map is recorded and returned.
    pub fn prepare(&mut self) -> Result<PreparedSubmit, FieldErrors> {
        self.submitted = true;
        let payload = match UserPayload::validate(&self.values) {
            Ok(payload) => payload,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(errors);
            }
        };
        self.errors = FieldErrors::default();
        let intent = match self.mode {
            FormMode::Create => MutationIntent::Create { payload },
            FormMode::Edit { id } => MutationIntent::Update { id, payload },
        };
        Ok(PreparedSubmit {
            session: self.session,
            intent,
        })
    }

    /// Apply the data layer's answer to a prepared submit.
    pub fn complete(
        &mut self,
        session: FormSession,
        outcome: &Result<MutationOutcome, DataAccessError>,
    ) -> Completion {
        if session != self.session {
            debug!(?session, current = ?self.session, "discarding stale form completion");
            return Completion::Stale;
        }
        match outcome {
            Ok(_) => {
                self.start_create();
                Completion::Applied
            }
            Err(error) => {
                debug!(%error, "form submit failed; keeping values");
                Completion::Retained
            }
        }
    }

    /// Validate, run the mutation through `cache`, and apply the outcome.
    ///
    /// Nothing reaches the network when validation fails.
    pub async fn submit(&mut self, cache: &RecordCache) -> Result<MutationOutcome, SubmitError> {
        let (session, intent) = self.prepare()?.into_parts();
        let outcome = cache.execute(intent).await;
        self.complete(session, &outcome);
        outcome.map_err(SubmitError::from)
    }

    fn begin(&mut self, mode: FormMode, initial: FormValues) -> FormSession {
        self.session = self.session.next();
        self.mode = mode;
        self.values = initial.clone();
        self.initial = initial;
        self.errors = FieldErrors::default();
        self.submitted = false;
        self.session
    }
}
