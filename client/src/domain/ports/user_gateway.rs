//! Driven port for the user REST backend.
//!
//! Adapters translate transport and protocol failures into one opaque
//! [`DataAccessError`] per operation. Detail belongs in the adapter's logs,
//! never in the error value.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{User, UserId, UserPayload};

define_port_error! {
    /// Operation-scoped data access failure with a fixed user-facing message.
    pub enum DataAccessError {
        /// Listing users failed.
        List => "Failed to fetch users. Please try again.",
        /// Fetching one user failed.
        Fetch => "Failed to fetch user details. Please try again.",
        /// Creating a user failed.
        Create => "Failed to create user. Please try again.",
        /// Updating a user failed.
        Update => "Failed to update user. Please try again.",
        /// Deleting a user failed.
        Delete => "Failed to delete user. Please try again.",
    }
}

/// Port for CRUD operations on user records.
///
/// Implementations do no retries and keep no state across calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserGateway: Send + Sync {
    /// All users, in backend order.
    async fn list(&self) -> Result<Vec<User>, DataAccessError>;

    /// One user by identifier.
    async fn fetch(&self, id: UserId) -> Result<User, DataAccessError>;

    /// Persist a new user; the backend assigns its identifier.
    async fn create(&self, payload: &UserPayload) -> Result<User, DataAccessError>;

    /// Replace the attributes of an existing user.
    async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, DataAccessError>;

    /// Remove a user.
    async fn delete(&self, id: UserId) -> Result<(), DataAccessError>;
}

#[derive(Debug, Default)]
struct FixtureStore {
    users: Vec<User>,
    last_id: u64,
}

/// In-memory gateway assigning sequential identifiers.
///
/// # Examples
/// ```
/// use client::domain::ports::{FixtureUserGateway, UserGateway};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let gateway = FixtureUserGateway::default();
/// assert!(gateway.list().await.expect("list").is_empty());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct FixtureUserGateway {
    store: Mutex<FixtureStore>,
}

impl FixtureUserGateway {
    /// Gateway pre-populated with `users`.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users: Vec<User> = users.into_iter().collect();
        let last_id = users.iter().map(|user| user.id().get()).max().unwrap_or(0);
        Self {
            store: Mutex::new(FixtureStore { users, last_id }),
        }
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut FixtureStore) -> T) -> T {
        let mut guard = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[async_trait]
impl UserGateway for FixtureUserGateway {
    async fn list(&self) -> Result<Vec<User>, DataAccessError> {
        Ok(self.with_store(|store| store.users.clone()))
    }

    async fn fetch(&self, id: UserId) -> Result<User, DataAccessError> {
        self.with_store(|store| store.users.iter().find(|user| user.id() == id).cloned())
            .ok_or_else(DataAccessError::fetch)
    }

    async fn create(&self, payload: &UserPayload) -> Result<User, DataAccessError> {
        Ok(self.with_store(|store| {
            store.last_id += 1;
            let user = User::new(UserId::new(store.last_id), payload.fields().clone());
            store.users.push(user.clone());
            user
        }))
    }

    async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, DataAccessError> {
        self.with_store(|store| {
            let slot = store.users.iter_mut().find(|user| user.id() == id)?;
            *slot = User::new(id, payload.fields().clone());
            Some(slot.clone())
        })
        .ok_or_else(DataAccessError::update)
    }

    async fn delete(&self, id: UserId) -> Result<(), DataAccessError> {
        self.with_store(|store| {
            let before = store.users.len();
            store.users.retain(|user| user.id() != id);
            (store.users.len() < before).then_some(())
        })
        .ok_or_else(DataAccessError::delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FormValues, UserFields};
    use rstest::{fixture, rstest};

    #[fixture]
    fn payload() -> UserPayload {
        let values: FormValues = [
            ("firstName", "Jo"),
            ("lastName", "Lee"),
            ("email", "jo@x.com"),
            ("phone", "1234567890"),
        ]
        .into_iter()
        .collect();
        UserPayload::validate(&values).expect("valid payload")
    }

    #[rstest]
    #[case(DataAccessError::list(), "Failed to fetch users. Please try again.")]
    #[case(DataAccessError::fetch(), "Failed to fetch user details. Please try again.")]
    #[case(DataAccessError::create(), "Failed to create user. Please try again.")]
    #[case(DataAccessError::update(), "Failed to update user. Please try again.")]
    #[case(DataAccessError::delete(), "Failed to delete user. Please try again.")]
    fn messages_are_fixed_per_operation(#[case] error: DataAccessError, #[case] message: &str) {
        assert_eq!(error.to_string(), message);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_assigns_sequential_ids(payload: UserPayload) {
        let gateway = FixtureUserGateway::default();
        let first = gateway.create(&payload).await.expect("first create");
        let second = gateway.create(&payload).await.expect("second create");

        assert_eq!(first.id(), UserId::new(1));
        assert_eq!(second.id(), UserId::new(2));
        let ids: Vec<_> = gateway
            .list()
            .await
            .expect("list")
            .iter()
            .map(User::id)
            .collect();
        assert_eq!(ids, [UserId::new(1), UserId::new(2)]);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_reports_missing_records(payload: UserPayload) {
        let gateway = FixtureUserGateway::with_users([User::new(
            UserId::new(9),
            UserFields::default(),
        )]);
        let missing = UserId::new(4);

        assert_eq!(gateway.fetch(missing).await, Err(DataAccessError::Fetch));
        assert_eq!(
            gateway.update(missing, &payload).await,
            Err(DataAccessError::Update)
        );
        assert_eq!(gateway.delete(missing).await, Err(DataAccessError::Delete));

        let created = gateway.create(&payload).await.expect("create");
        assert_eq!(created.id(), UserId::new(10));
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_updates_and_deletes_in_place(payload: UserPayload) {
        let id = UserId::new(1);
        let gateway = FixtureUserGateway::with_users([User::new(id, UserFields::default())]);

        let updated = gateway.update(id, &payload).await.expect("update");
        assert_eq!(updated.fields(), payload.fields());
        assert_eq!(gateway.fetch(id).await.expect("fetch"), updated);

        gateway.delete(id).await.expect("delete");
        assert!(gateway.list().await.expect("list").is_empty());
    }
}
