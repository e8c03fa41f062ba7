use chrono::{NaiveDate, NaiveTime};
use tracing::{info, instrument};

use crate::{
    error::{Result, RosterError},
    store::{RosterStore, SqliteRosterStore},
    types::{NormalizedRoster, Roster, RosterEntry, RosterSubmission, SaveOutcome, SavedRoster, ShiftStatus},
};

/// Doctor duty roster operations.
///
/// Every write normalises the shift code to its fixed working window
/// before touching storage, so an invalid code never reaches the store.
pub struct RosterService<S = SqliteRosterStore> {
    store: S,
}

impl<S: RosterStore> RosterService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Save the roster for `(doctor, date)`, creating it on first save and
    /// rewriting shift and times in place on later ones.
    #[instrument(skip(self, submission), fields(doctor_id = submission.doctor.id, date = %submission.date))]
    pub fn save_roster(&self, submission: &RosterSubmission) -> Result<Roster> {
        let shift: ShiftStatus = submission.shift_status.parse()?;
        let row = NormalizedRoster::new(submission.doctor.id, submission.date, shift);
        let saved = self.store.upsert(&row)?;
        log_saved(&saved);
        Ok(saved.roster)
    }

    /// Save several days for one doctor in a single transaction.
    ///
    /// Every shift code is checked first; one bad entry rejects the whole
    /// batch before anything is written. Results follow input order; when a
    /// date repeats, every result for it shows the last entry's shift.
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    pub fn save_rosters(&self, doctor_id: i64, entries: &[RosterEntry]) -> Result<Vec<Roster>> {
        let rows = entries
            .iter()
            .map(|e| -> Result<NormalizedRoster> {
                let shift: ShiftStatus = e.shift_status.parse()?;
                Ok(NormalizedRoster::new(doctor_id, e.date, shift))
            })
            .collect::<Result<Vec<_>>>()?;

        let saved = self.store.upsert_batch(&rows)?;
        saved.iter().for_each(log_saved);
        Ok(saved.into_iter().map(|s| s.roster).collect())
    }

    /// All rosters of `doctor_id` in date order; empty when there are none.
    pub fn get_roster_by_doctor(&self, doctor_id: i64) -> Result<Vec<Roster>> {
        self.store.find_by_doctor(doctor_id)
    }

    pub fn get_roster_for_date(&self, doctor_id: i64, date: NaiveDate) -> Result<Option<Roster>> {
        self.store.find_one(doctor_id, date)
    }

    /// Rosters of `doctor_id` with `from <= date <= to`. An inverted range
    /// is not an error; it simply matches nothing.
    pub fn get_roster_between(
        &self,
        doctor_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Roster>> {
        self.store.find_between(doctor_id, from, to)
    }

    /// Open appointment slots for a doctor on a date.
    ///
    /// The slot rules (working window minus booked appointments) are not
    /// defined yet, so every call returns [`RosterError::NotImplemented`].
    pub fn get_available_slots(&self, _doctor_id: i64, _date: NaiveDate) -> Result<Vec<NaiveTime>> {
        Err(RosterError::NotImplemented("available slot lookup"))
    }
}

fn log_saved(saved: &SavedRoster) {
    let r = &saved.roster;
    match saved.outcome {
        SaveOutcome::Created => {
            info!(roster_id = r.id, doctor_id = r.doctor.id, date = %r.date, shift = %r.shift_status, "roster created")
        }
        SaveOutcome::Updated => {
            info!(roster_id = r.id, doctor_id = r.doctor.id, date = %r.date, shift = %r.shift_status, "roster updated")
        }
    }
}
