//! # Storage Scopes
//!
//! How a repository call gets a connection, and how it gives it back.
//!
//! ## Scope Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  repository call                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Session ── shared slot holds a transaction? ──yes──► Scope::Shared     │
//! │       │     (unit of work after begin)                 runs inside it,  │
//! │       │                                                 never commits   │
//! │       no                                                                │
//! │       │                                                                 │
//! │       ├── read  ──► Scope::Connection  (pooled connection)             │
//! │       └── write ──► Scope::Transaction (local BEGIN ... COMMIT)        │
//! │                                                                         │
//! │  finish(result):                                                       │
//! │    Transaction + Ok  → COMMIT                                          │
//! │    Transaction + Err → ROLLBACK, original error returned               │
//! │    Shared + Ok       → counted as one pending write                    │
//! │                                                                         │
//! │  Dropping any scope returns its connection to the pool.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The shared slot is a `tokio::sync::Mutex`, so one call at a time uses the
//! unit-of-work transaction. A repository method acquires at most one scope;
//! the mutex is not reentrant.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::warn;

use crate::error::DbResult;

// =============================================================================
// Shared Transaction Slot
// =============================================================================

/// The transaction a unit of work opened, plus the writes it has carried.
#[derive(Default)]
pub(crate) struct SharedTransaction {
    pub(crate) slot: Mutex<Option<Transaction<'static, Sqlite>>>,
    pub(crate) writes: AtomicU64,
}

impl fmt::Debug for SharedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTransaction")
            .field("writes", &self.writes.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Session
// =============================================================================

/// A pool plus, for repositories owned by a unit of work, the shared slot.
#[derive(Clone)]
pub(crate) struct Session {
    pool: SqlitePool,
    shared: Option<Arc<SharedTransaction>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("pool", &self.pool)
            .field("shared", &self.shared.is_some())
            .finish()
    }
}

impl Session {
    /// Every call gets its own connection or transaction.
    pub(crate) fn standalone(pool: SqlitePool) -> Self {
        Session { pool, shared: None }
    }

    /// Calls join the shared transaction while one is open.
    pub(crate) fn shared(pool: SqlitePool, shared: Arc<SharedTransaction>) -> Self {
        Session {
            pool,
            shared: Some(shared),
        }
    }

    /// Scope for statements that only read.
    pub(crate) async fn read(&self) -> DbResult<Scope<'_>> {
        if let Some(scope) = self.join_shared().await {
            return Ok(scope);
        }
        Ok(Scope::Connection(self.pool.acquire().await?))
    }

    /// Scope for statements that write.
    pub(crate) async fn write(&self) -> DbResult<Scope<'_>> {
        if let Some(scope) = self.join_shared().await {
            return Ok(scope);
        }
        Ok(Scope::Transaction(self.pool.begin().await?))
    }

    async fn join_shared(&self) -> Option<Scope<'_>> {
        let shared = self.shared.as_ref()?;
        let guard = shared.slot.lock().await;
        MutexGuard::try_map(guard, |slot| slot.as_mut())
            .ok()
            .map(|tx| Scope::Shared(tx, &shared.writes))
    }
}

// =============================================================================
// Scope
// =============================================================================

/// A connection borrowed for the duration of one repository call.
pub(crate) enum Scope<'a> {
    Shared(MappedMutexGuard<'a, Transaction<'static, Sqlite>>, &'a AtomicU64),
    Connection(PoolConnection<Sqlite>),
    Transaction(Transaction<'static, Sqlite>),
}

impl Scope<'_> {
    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            Scope::Shared(tx, _) => &mut ***tx,
            Scope::Connection(conn) => &mut **conn,
            Scope::Transaction(tx) => &mut **tx,
        }
    }

    /// Ends the scope according to the outcome of the work done in it.
    pub(crate) async fn finish<T>(self, result: DbResult<T>) -> DbResult<T> {
        match self {
            Scope::Transaction(tx) => match result {
                Ok(value) => {
                    tx.commit().await?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "Rollback failed");
                    }
                    Err(err)
                }
            },
            Scope::Shared(_, writes) => {
                if result.is_ok() {
                    writes.fetch_add(1, Ordering::Relaxed);
                }
                result
            }
            Scope::Connection(_) => result,
        }
    }
}
