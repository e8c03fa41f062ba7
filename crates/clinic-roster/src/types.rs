use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::RosterError;

/// Duty shift a doctor can be rostered on for a single day.
///
/// The wire names are the exact codes clients submit (`"Full Duty"`,
/// `"Morning"`, `"Evening"`, `"Off"`); parsing is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftStatus {
    #[serde(rename = "Full Duty")]
    FullDuty,
    Morning,
    Evening,
    Off,
}

impl ShiftStatus {
    pub const ALL: [ShiftStatus; 4] = [
        ShiftStatus::FullDuty,
        ShiftStatus::Morning,
        ShiftStatus::Evening,
        ShiftStatus::Off,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::FullDuty => "Full Duty",
            ShiftStatus::Morning => "Morning",
            ShiftStatus::Evening => "Evening",
            ShiftStatus::Off => "Off",
        }
    }

    /// Working-hour window for the shift, `None` for a day off.
    ///
    /// | Shift     | Start | End   |
    /// |-----------|-------|-------|
    /// | Full Duty | 09:00 | 17:00 |
    /// | Morning   | 09:00 | 13:00 |
    /// | Evening   | 13:00 | 17:00 |
    /// | Off       | —     | —     |
    pub fn window(&self) -> Option<ShiftWindow> {
        let (start, end) = match self {
            ShiftStatus::FullDuty => (9, 17),
            ShiftStatus::Morning => (9, 13),
            ShiftStatus::Evening => (13, 17),
            ShiftStatus::Off => return None,
        };
        Some(ShiftWindow {
            start: hour(start),
            end: hour(end),
        })
    }
}

fn hour(h: u32) -> NaiveTime {
    // Table hours are all in 0..24.
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default()
}

impl std::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = RosterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Full Duty" => Ok(ShiftStatus::FullDuty),
            "Morning" => Ok(ShiftStatus::Morning),
            "Evening" => Ok(ShiftStatus::Evening),
            "Off" => Ok(ShiftStatus::Off),
            other => Err(RosterError::InvalidArgument(format!(
                "invalid shift type: {other:?}"
            ))),
        }
    }
}

/// Start and end of a working shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Reference to a doctor owned by another part of the clinic system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoctorRef {
    pub id: i64,
}

/// A persisted duty assignment for one doctor on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    /// Storage-assigned primary key.
    pub id: i64,
    pub date: NaiveDate,
    pub shift_status: ShiftStatus,
    /// Derived from `shift_status`; `None` on a day off.
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub doctor: DoctorRef,
}

/// Inbound save request.
///
/// `shift_status` stays a raw string so an unknown code surfaces as
/// [`RosterError::InvalidArgument`] from the service rather than as a
/// deserialisation failure. Any `id`, `startTime` or `endTime` a client
/// sends is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSubmission {
    pub doctor: DoctorRef,
    pub date: NaiveDate,
    pub shift_status: String,
}

impl RosterSubmission {
    pub fn new(doctor_id: i64, date: NaiveDate, shift_status: impl Into<String>) -> Self {
        Self {
            doctor: DoctorRef { id: doctor_id },
            date,
            shift_status: shift_status.into(),
        }
    }
}

/// One day of a batch submission for a single doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub date: NaiveDate,
    pub shift_status: String,
}

/// A validated row ready to be written: the shift is parsed and the
/// window already derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedRoster {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub shift_status: ShiftStatus,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl NormalizedRoster {
    pub fn new(doctor_id: i64, date: NaiveDate, shift_status: ShiftStatus) -> Self {
        let window = shift_status.window();
        Self {
            doctor_id,
            date,
            shift_status,
            start_time: window.map(|w| w.start),
            end_time: window.map(|w| w.end),
        }
    }
}

/// Whether an upsert inserted a new row or rewrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRoster {
    pub roster: Roster,
    pub outcome: SaveOutcome,
}
