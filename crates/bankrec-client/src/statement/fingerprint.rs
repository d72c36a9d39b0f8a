use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::ClientResult;
use crate::state::map_sqlite_error;

/// SHA-256 of the raw file bytes, hex encoded.
pub fn file_fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub(crate) fn find_statement_by_fingerprint(
    connection: &Connection,
    db_path: &Path,
    file_hash: &str,
) -> ClientResult<Option<String>> {
    connection
        .query_row(
            "SELECT statement_id FROM bank_statements WHERE file_hash = ?1 LIMIT 1",
            [file_hash],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}
