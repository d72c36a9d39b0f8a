use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Error as SqliteError, Transaction, TransactionBehavior, ffi::ErrorCode};

use crate::{ClientError, ClientResult};

pub const HOME_ENV_VAR: &str = "BANKREC_HOME";

pub fn resolve_store_home(home_override: Option<&Path>) -> ClientResult<PathBuf> {
    let candidate = match home_override {
        Some(path) => path.to_path_buf(),
        None => {
            if let Some(override_path) = std::env::var_os(HOME_ENV_VAR) {
                PathBuf::from(override_path)
            } else if let Some(home_path) = home::home_dir() {
                home_path.join(".bankrec")
            } else {
                return Err(ClientError::ledger_failure(
                    Path::new("."),
                    "Could not resolve a home directory for the reconciliation store.",
                ));
            }
        }
    };

    absolutize(&candidate)
}

pub fn ensure_store_directory(path: &Path) -> ClientResult<()> {
    fs::create_dir_all(path).map_err(|error| map_io_error(path, &error))?;
    set_private_permissions_best_effort(path);
    Ok(())
}

pub fn store_db_path(home: &Path) -> PathBuf {
    home.join("bankrec.db")
}

pub fn open_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection =
        Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .busy_timeout(Duration::from_millis(250))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

/// Explicit handle to the reconciliation database.
///
/// Every component receives the store it works against; nothing reaches for
/// a shared global connection. Writes go through [`Store::immediate`], whose
/// transaction rolls back when dropped without an explicit commit.
#[derive(Debug)]
pub struct Store {
    connection: Connection,
    db_path: PathBuf,
}

impl Store {
    pub fn open(db_path: &Path) -> ClientResult<Self> {
        let connection = open_connection(db_path)?;
        Ok(Self {
            connection,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn immediate(&mut self) -> ClientResult<Transaction<'_>> {
        let db_path = self.db_path.clone();
        self.connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|error| map_sqlite_error(&db_path, &error))
    }
}

pub fn commit(transaction: Transaction<'_>, db_path: &Path) -> ClientResult<()> {
    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub fn map_io_error(path: &Path, error: &std::io::Error) -> ClientError {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        return ClientError::ledger_permission_denied(path, &error.to_string());
    }

    ClientError::ledger_failure(path, &error.to_string())
}

pub fn map_sqlite_error(path: &Path, error: &SqliteError) -> ClientError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => ClientError::ledger_locked(path),
        Some(ErrorCode::NotADatabase) => ClientError::ledger_corrupt(path),
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly) => {
            ClientError::ledger_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_failure(path, &error.to_string()),
    }
}

pub(crate) fn is_unique_violation(error: &SqliteError) -> bool {
    matches!(
        error,
        SqliteError::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn absolutize(path: &Path) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| ClientError::ledger_failure(path, &error.to_string()))
}

#[cfg(unix)]
fn set_private_permissions_best_effort(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o700));
}

#[cfg(not(unix))]
fn set_private_permissions_best_effort(_path: &Path) {}
