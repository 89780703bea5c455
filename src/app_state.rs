//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The config that controls the default page size of list endpoints.
    pub pagination_config: PaginationConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, pagination_config: PaginationConfig) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

/// The state needed by the resource handlers.
#[derive(Debug, Clone)]
pub struct ResourceState {
    /// The database connection for managing resources.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The default page size for list endpoints.
    pub pagination_config: PaginationConfig,
}

impl ResourceState {
    /// Lock the database connection.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the lock is poisoned.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

impl FromRef<AppState> for ResourceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

#[cfg(test)]
impl ResourceState {
    /// A state backed by a fresh, initialized in-memory database.
    pub(crate) fn in_memory() -> Self {
        let connection =
            Connection::open_in_memory().expect("could not open in-memory SQLite database");
        initialize(&connection).expect("could not initialize test database");

        Self {
            db_connection: Arc::new(Mutex::new(connection)),
            pagination_config: PaginationConfig::default(),
        }
    }
}
