//! Domain model and services for the user administration client.
//!
//! Purpose: define the user record schema, validate form input against it,
//! and keep a synchronised cache of records behind the [`ports::UserGateway`]
//! port. Nothing here knows about HTTP; adapters live under `outbound`.
//!
//! Public surface:
//! - `FieldDescriptor` / `FieldRule`: presentation metadata and validation
//!   rules, generated per record by `define_record_schema!`.
//! - `validate`: rule interpreter producing a payload or a `FieldErrors` map.
//! - `FormController`: editing sessions with stale-completion guarding.
//! - `RecordCache`: list cache with coalescing refetch and mutation status.

mod error;
mod fields;
mod form;
mod mutation;
pub mod ports;
mod record_cache;
mod schema;
mod user;
mod validation;

pub use self::error::{FormError, SubmitError};
pub use self::fields::{
    FieldDescriptor, FieldKind, FieldRule, LAYOUT_COLUMNS, Pattern, PatternRule, RangeRule,
    find_descriptor,
};
pub use self::form::{Completion, FormController, FormMode, FormSession, PreparedSubmit};
pub use self::mutation::{MutationIntent, MutationKind, MutationOutcome};
pub use self::record_cache::{
    CacheEntry, CacheStatus, CacheView, MutationStatus, MutationStatuses, RecordCache,
    RecordCacheConfig, RecordCacheRuntime, RefetchSleeper, TokioSleeper,
};
pub use self::user::{
    NAME_MAX_LEN, NAME_MIN_LEN, PHONE_DIGITS, User, UserDecodeError, UserFields, UserId,
    UserPayload,
};
pub use self::validation::{FieldErrors, FormValues, validate, validate_field};
