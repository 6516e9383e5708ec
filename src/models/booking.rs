use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of one bookable slot: a calendar day plus a 1-based desk position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingKey {
    pub date: NaiveDate,
    pub desk_position: u32,
}

impl BookingKey {
    pub fn new(date: NaiveDate, desk_position: u32) -> Self {
        Self {
            date,
            desk_position,
        }
    }
}

impl fmt::Display for BookingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} desk {}", self.date, self.desk_position)
    }
}

/// External shape of one booking, as stored by a backend and exported to CSV.
/// Field names match the original booking sheet's columns, so a file backend
/// row, a sheet row and a CSV export row all read the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Desk")]
    pub desk_label: String,
    #[serde(rename = "Booked By")]
    pub occupant: String,
}

impl BookingRecord {
    pub fn new(date: NaiveDate, desk_label: impl Into<String>, occupant: impl Into<String>) -> Self {
        Self {
            date,
            desk_label: desk_label.into(),
            occupant: occupant.into(),
        }
    }
}
