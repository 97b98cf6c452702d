//! Storage for pending handshakes and sessions.
//!
//! The handshake only talks to the [`PendingHandshakeStore`] and
//! [`SessionStore`] traits. [`memory`] provides the in-process
//! implementations used by the binary and by tests; a shared backend
//! (Redis, Postgres) would implement the same traits.
//!
//! # Consumption
//!
//! [`PendingHandshakeStore::take`] must be an atomic take-and-delete: when
//! two callbacks race with the same state, exactly one of them receives the
//! record.

pub mod memory;

use std::future::Future;

use thiserror::Error;

use crate::auth::oauth::PendingHandshake;
use crate::auth::session::{Session, SessionId};
use crate::config::ShopDomain;

pub use memory::{MemoryPendingStore, MemorySessionStore};

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Pending handshakes, keyed by their state.
pub trait PendingHandshakeStore: Send + Sync + 'static {
    /// Persist a freshly started handshake.
    fn insert(
        &self,
        pending: PendingHandshake,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove and return the record for `state`, if any.
    ///
    /// Must be atomic. Expiry is not checked here.
    fn take(
        &self,
        state: &str,
    ) -> impl Future<Output = Result<Option<PendingHandshake>, StoreError>> + Send;

    /// Drop records whose lifetime has passed. Best effort.
    fn reclaim_expired(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Sessions, keyed by their id.
pub trait SessionStore: Send + Sync + 'static {
    /// Persist a new session.
    fn insert(&self, session: Session) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Look up a session. Expired sessions may still be returned; the caller
    /// checks expiry.
    fn get(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Delete a session. Deleting an unknown id is not an error.
    fn delete(&self, id: &SessionId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete every session of `shop`, returning how many were removed.
    fn delete_shop(
        &self,
        shop: &ShopDomain,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
