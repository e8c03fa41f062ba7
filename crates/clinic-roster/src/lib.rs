//! `clinic-roster` — doctor duty rosters with SQLite persistence.
//!
//! # Overview
//!
//! A roster is one doctor's shift for one calendar date. Saving a roster
//! derives its working window from the shift code and upserts it keyed by
//! `(doctor_id, date)`; a `UNIQUE` constraint on that pair and a single
//! `INSERT … ON CONFLICT DO UPDATE` keep at most one record per pair even
//! under concurrent writers.
//!
//! # Shift codes
//!
//! | Code        | Window        |
//! |-------------|---------------|
//! | `Full Duty` | 09:00 – 17:00 |
//! | `Morning`   | 09:00 – 13:00 |
//! | `Evening`   | 13:00 – 17:00 |
//! | `Off`       | none          |

pub mod db;
pub mod error;
pub mod service;
pub mod store;
pub mod types;

pub use error::{Result, RosterError};
pub use service::RosterService;
pub use store::{RosterStore, SqliteRosterStore};
pub use types::{DoctorRef, Roster, RosterEntry, RosterSubmission, ShiftStatus};
