//! Shift catalog.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ShiftRef;

/// A named working window. Windows may wrap past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: String,
    pub name: String,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Shift {
    /// Display window, e.g. `07:00 - 15:00`.
    pub fn window(&self) -> String {
        format!("{} - {}", self.start, self.end)
    }

    pub fn to_ref(&self) -> ShiftRef {
        ShiftRef {
            name: self.name.clone(),
            time: self.window(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidConfig("shift id cannot be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation("shift name is required".to_string()));
        }
        parse_clock(&self.start)?;
        parse_clock(&self.end)?;
        Ok(())
    }
}

fn parse_clock(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        Error::Validation(format!("invalid shift time '{raw}' (expected HH:MM)"))
    })
}

pub fn default_shifts() -> Vec<Shift> {
    vec![
        Shift {
            id: "1".to_string(),
            name: "Morning Shift".to_string(),
            start: "07:00".to_string(),
            end: "15:00".to_string(),
            description: "First Shift".to_string(),
        },
        Shift {
            id: "2".to_string(),
            name: "Afternoon Shift".to_string(),
            start: "14:00".to_string(),
            end: "22:00".to_string(),
            description: "Second Shift".to_string(),
        },
        Shift {
            id: "3".to_string(),
            name: "Night Shift".to_string(),
            start: "22:00".to_string(),
            end: "07:00".to_string(),
            description: "Maintenance and cleaning shift".to_string(),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftCatalog {
    shifts: Vec<Shift>,
}

impl ShiftCatalog {
    pub fn new(shifts: Vec<Shift>) -> Self {
        Self { shifts }
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    pub fn into_shifts(self) -> Vec<Shift> {
        self.shifts
    }

    /// Look up by exact id, then by case-insensitive name.
    pub fn find(&self, key: &str) -> Option<&Shift> {
        let key = key.trim();
        self.shifts
            .iter()
            .find(|shift| shift.id == key)
            .or_else(|| {
                self.shifts
                    .iter()
                    .find(|shift| shift.name.eq_ignore_ascii_case(key))
            })
    }

    /// Add a shift; the id is `shift-<epoch millis>`.
    pub fn add(
        &mut self,
        name: &str,
        start: &str,
        end: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<&Shift> {
        let name = name.trim();
        if self
            .shifts
            .iter()
            .any(|shift| shift.name.eq_ignore_ascii_case(name))
        {
            return Err(Error::Validation(format!("shift '{name}' already exists")));
        }
        let shift = Shift {
            id: format!("shift-{}", now.timestamp_millis()),
            name: name.to_string(),
            start: start.trim().to_string(),
            end: end.trim().to_string(),
            description: description.trim().to_string(),
        };
        shift.validate()?;
        self.shifts.push(shift);
        Ok(&self.shifts[self.shifts.len() - 1])
    }
}

impl Default for ShiftCatalog {
    fn default() -> Self {
        Self::new(default_shifts())
    }
}
