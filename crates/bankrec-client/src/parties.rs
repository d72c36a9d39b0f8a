use std::path::Path;

use rusqlite::{Connection, params};

use crate::ClientResult;
use crate::state::map_sqlite_error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub id: i64,
    pub name: String,
}

pub(crate) fn list_parties(connection: &Connection, db_path: &Path) -> ClientResult<Vec<Party>> {
    let mut statement = connection
        .prepare("SELECT id, name FROM parties ORDER BY id ASC")
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map([], |row| {
            Ok(Party {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut parties = Vec::new();
    for row in rows_iter {
        parties.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(parties)
}

pub(crate) fn upsert_party(connection: &Connection, db_path: &Path, party: &Party) -> ClientResult<()> {
    connection
        .execute(
            "INSERT INTO parties (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![party.id, &party.name],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}
