use std::sync::{Mutex, MutexGuard};

use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use rusqlite::{types::Type, Connection, OptionalExtension, TransactionBehavior};
use tracing::instrument;

use crate::{
    db::init_db,
    error::Result,
    types::{DoctorRef, NormalizedRoster, Roster, SaveOutcome, SavedRoster, ShiftStatus},
};

const TIME_FMT: &str = "%H:%M:%S";

const ROSTER_COLUMNS: &str = "id, date, shift_status, start_time, end_time, doctor_id";

// Insert-or-update keyed by the (doctor_id, date) unique constraint. A
// single statement, so two writers can never both insert the same pair.
const UPSERT_SQL: &str = "
    INSERT INTO rosters
        (date, shift_status, start_time, end_time, doctor_id, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
    ON CONFLICT (doctor_id, date) DO UPDATE SET
        shift_status = excluded.shift_status,
        start_time   = excluded.start_time,
        end_time     = excluded.end_time,
        updated_at   = excluded.updated_at
    RETURNING id, date, shift_status, start_time, end_time, doctor_id";

/// Storage access needed by the roster service.
pub trait RosterStore: Send + Sync {
    /// Insert or update the record for `(row.doctor_id, row.date)`.
    fn upsert(&self, row: &NormalizedRoster) -> Result<SavedRoster>;

    /// Upsert every row inside one transaction; all or nothing.
    fn upsert_batch(&self, rows: &[NormalizedRoster]) -> Result<Vec<SavedRoster>>;

    fn find_one(&self, doctor_id: i64, date: NaiveDate) -> Result<Option<Roster>>;

    fn find_by_doctor(&self, doctor_id: i64) -> Result<Vec<Roster>>;

    /// Records with `from <= date <= to`.
    fn find_between(&self, doctor_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Roster>>;
}

/// SQLite-backed [`RosterStore`].
///
/// Wraps a single connection in a `Mutex`. Other processes or subsystems
/// may hold their own connections to the same file; the upsert runs in an
/// IMMEDIATE transaction so it is serialised against them too.
pub struct SqliteRosterStore {
    conn: Mutex<Connection>,
}

impl SqliteRosterStore {
    /// Wrap `conn`, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-query cannot leave the connection half-written:
        // uncommitted transactions roll back when dropped.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn query_rosters(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Roster>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, row_to_roster)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl RosterStore for SqliteRosterStore {
    #[instrument(skip(self, row), fields(doctor_id = row.doctor_id, date = %row.date))]
    fn upsert(&self, row: &NormalizedRoster) -> Result<SavedRoster> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let saved = upsert_in(&tx, row)?;
        tx.commit()?;
        Ok(saved)
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    fn upsert_batch(&self, rows: &[NormalizedRoster]) -> Result<Vec<SavedRoster>> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut saved = rows
            .iter()
            .map(|row| upsert_in(&tx, row))
            .collect::<Result<Vec<_>>>()?;
        // A date repeated within the batch leaves earlier snapshots stale;
        // report what is actually stored once every row is written.
        for s in saved.iter_mut() {
            s.roster = tx.query_row(
                &format!("SELECT {ROSTER_COLUMNS} FROM rosters WHERE id = ?1"),
                [s.roster.id],
                row_to_roster,
            )?;
        }
        tx.commit()?;
        Ok(saved)
    }

    #[instrument(skip(self))]
    fn find_one(&self, doctor_id: i64, date: NaiveDate) -> Result<Option<Roster>> {
        let conn = self.conn();
        let roster = conn
            .query_row(
                &format!("SELECT {ROSTER_COLUMNS} FROM rosters WHERE doctor_id = ?1 AND date = ?2"),
                rusqlite::params![doctor_id, day_number(date)],
                row_to_roster,
            )
            .optional()?;
        Ok(roster)
    }

    #[instrument(skip(self))]
    fn find_by_doctor(&self, doctor_id: i64) -> Result<Vec<Roster>> {
        self.query_rosters(
            &format!("SELECT {ROSTER_COLUMNS} FROM rosters WHERE doctor_id = ?1 ORDER BY date"),
            rusqlite::params![doctor_id],
        )
    }

    #[instrument(skip(self))]
    fn find_between(&self, doctor_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Roster>> {
        self.query_rosters(
            &format!(
                "SELECT {ROSTER_COLUMNS} FROM rosters
                 WHERE doctor_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date"
            ),
            rusqlite::params![doctor_id, day_number(from), day_number(to)],
        )
    }
}

/// Run the upsert on an open transaction.
///
/// The existence probe only decides the reported outcome; uniqueness comes
/// from the constraint, and the IMMEDIATE transaction keeps the probe and
/// the write consistent with each other.
fn upsert_in(conn: &Connection, row: &NormalizedRoster) -> Result<SavedRoster> {
    let date = day_number(row.date);
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM rosters WHERE doctor_id = ?1 AND date = ?2",
            rusqlite::params![row.doctor_id, date],
            |r| r.get(0),
        )
        .optional()?;

    let now = Utc::now().to_rfc3339();
    let roster = conn.query_row(
        UPSERT_SQL,
        rusqlite::params![
            date,
            row.shift_status.as_str(),
            row.start_time.map(|t| t.format(TIME_FMT).to_string()),
            row.end_time.map(|t| t.format(TIME_FMT).to_string()),
            row.doctor_id,
            now,
        ],
        row_to_roster,
    )?;

    let outcome = if existing.is_some() {
        SaveOutcome::Updated
    } else {
        SaveOutcome::Created
    };
    Ok(SavedRoster { roster, outcome })
}

/// Map a row selected with [`ROSTER_COLUMNS`] to a `Roster`.
///
/// Undecodable values fail the whole query rather than being skipped.
fn row_to_roster(row: &rusqlite::Row<'_>) -> rusqlite::Result<Roster> {
    let days: i32 = row.get(1)?;
    let shift: String = row.get(2)?;
    let start: Option<String> = row.get(3)?;
    let end: Option<String> = row.get(4)?;

    Ok(Roster {
        id: row.get(0)?,
        date: NaiveDate::from_num_days_from_ce_opt(days).ok_or_else(|| {
            conversion(1, Type::Integer, format!("day number {days} out of range"))
        })?,
        shift_status: shift
            .parse::<ShiftStatus>()
            .map_err(|e| conversion(2, Type::Text, e))?,
        start_time: start.as_deref().map(|s| parse_time(3, s)).transpose()?,
        end_time: end.as_deref().map(|s| parse_time(4, s)).transpose()?,
        doctor: DoctorRef { id: row.get(5)? },
    })
}

fn parse_time(idx: usize, s: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT).map_err(|e| conversion(idx, Type::Text, e))
}

fn conversion(idx: usize, ty: Type, e: impl std::fmt::Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, e.to_string().into())
}

/// Dates are stored as days since the start of the common era so that
/// ordering and range comparisons hold for every representable year,
/// including negative years and years past 9999.
fn day_number(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}
