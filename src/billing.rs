//! Attendance and billing lookup.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Placeholder for missing attendance values.
pub const MISSING: &str = "-";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub first_in: Option<String>,
    #[serde(default)]
    pub last_out: Option<String>,
    #[serde(default)]
    pub gross_time: Option<String>,
    #[serde(default)]
    pub out_of_office_time: Option<String>,
    #[serde(default)]
    pub out_of_office_count: Option<u32>,
    #[serde(default)]
    pub net_office_time: Option<String>,
}

impl Attendance {
    /// Display cells in table order: department, first in, last out, gross,
    /// net, out-of-office time, out-of-office count.
    pub fn cells(&self) -> [String; 7] {
        [
            cell(self.department.as_deref()),
            cell(self.first_in.as_deref()),
            cell(self.last_out.as_deref()),
            cell(self.gross_time.as_deref()),
            cell(self.net_office_time.as_deref()),
            cell(self.out_of_office_time.as_deref()),
            self.out_of_office_count
                .map(|count| count.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
        ]
    }
}

fn cell(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => MISSING.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub name: String,
    #[serde(default)]
    pub team: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub attendance: Attendance,
}

/// Search term plus an optional inclusive date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingQuery {
    search: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl BillingQuery {
    pub fn new(search: &str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        let search = search.trim();
        if search.is_empty() {
            return Err(Error::Validation(
                "billing search needs a name or ADID".to_string(),
            ));
        }
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(Error::InvalidArgument(format!(
                    "--from {from} is after --to {to}"
                )));
            }
        }
        Ok(Self {
            search: search.to_string(),
            from,
            to,
        })
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Inclusive date window check.
    pub fn in_window(&self, record: &BillingRecord) -> bool {
        let after_from = self.from.map_or(true, |from| record.date >= from);
        let before_to = self.to.map_or(true, |to| record.date <= to);
        after_from && before_to
    }

    /// Name substring (case-insensitive) plus the date window. Used for local
    /// exports, which carry no ADID to match on.
    pub fn matches(&self, record: &BillingRecord) -> bool {
        let needle = self.search.to_lowercase();
        record.name.to_lowercase().contains(&needle) && self.in_window(record)
    }

    pub fn apply<'a>(&self, records: &'a [BillingRecord]) -> Vec<&'a BillingRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }

    /// Date window only. The backend has already matched the search term,
    /// by name or by ADID.
    pub fn apply_window<'a>(&self, records: &'a [BillingRecord]) -> Vec<&'a BillingRecord> {
        records.iter().filter(|record| self.in_window(record)).collect()
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidArgument(format!("invalid date '{raw}' (expected YYYY-MM-DD)")))
}

/// Parse a billing response: either a bare array or `{"billingRecords": [...]}`.
/// Records that do not fit are skipped.
pub fn parse_billing(body: &Value) -> Result<Vec<BillingRecord>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("billingRecords") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::DataShape(
                    "billing response has no billingRecords array".to_string(),
                ))
            }
        },
        _ => {
            return Err(Error::DataShape(
                "billing response is not an array".to_string(),
            ))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<BillingRecord>(item.clone()) {
            Ok(mut record) => {
                record.name = record.name.trim().to_string();
                records.push(record);
            }
            Err(err) => tracing::warn!(index, error = %err, "skipping malformed billing record"),
        }
    }
    Ok(records)
}

/// Read billing records from a local JSON export.
pub fn load_billing_file(path: &Path) -> Result<Vec<BillingRecord>> {
    let raw = std::fs::read_to_string(path).map_err(|err| Error::ReadFailed {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let body: Value = serde_json::from_str(&raw)?;
    parse_billing(&body)
}
