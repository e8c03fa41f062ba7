use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;

/// Open the roster database at `path` ready for shared use.
///
/// Several connections may point at the same file (one per subsystem);
/// `busy_timeout` makes a writer wait for a competing transaction instead
/// of failing with `SQLITE_BUSY`.
pub fn open(path: &str, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    // journal_mode answers with the mode now in effect, so read it back.
    let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    tracing::debug!(%path, %mode, "roster database opened");
    Ok(conn)
}

/// Initialise the roster schema in `conn`.
///
/// Safe to call on every startup — uses `IF NOT EXISTS` throughout.
/// `doctor_id` points at the doctors table owned elsewhere in the clinic
/// system, so no foreign key is declared here.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS rosters (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            date          INTEGER NOT NULL,   -- CE day number, 0001-01-01 = 1
            shift_status  TEXT    NOT NULL,   -- 'Full Duty' | 'Morning' | 'Evening' | 'Off'
            start_time    TEXT,               -- HH:MM:SS or NULL on a day off
            end_time      TEXT,
            doctor_id     INTEGER NOT NULL,
            created_at    TEXT    NOT NULL,
            updated_at    TEXT    NOT NULL,
            UNIQUE (doctor_id, date)
        );
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM rosters", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn doctor_and_date_are_unique() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        let insert = "INSERT INTO rosters
                      (date, shift_status, start_time, end_time, doctor_id, created_at, updated_at)
                      VALUES (738642, 'Off', NULL, NULL, 7, 'x', 'x')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
