//! Roster ingestion and the review-report export
//!
//! The roster is tabular data with at least the named columns `Name` and
//! `Email`, one row per recipient. Rows failing validation are exportable
//! as a CSV table for manual review.

use crate::validate::{is_valid_email, is_valid_name};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// One roster entry: a recipient's display name and address.
///
/// Validity is computed from the validators on demand and never stored, so
/// the flags cannot drift from the underlying fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RosterRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
}

impl RosterRow {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn valid_name(&self) -> bool {
        is_valid_name(&self.name)
    }

    pub fn valid_email(&self) -> bool {
        is_valid_email(&self.email)
    }

    /// A row is sendable only when both fields pass
    pub fn is_valid(&self) -> bool {
        self.valid_name() && self.valid_email()
    }

    /// First whitespace-delimited token of the name, for greeting
    /// substitution. Falls back to the full name for degenerate input.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Read a roster from CSV with `Name` and `Email` header columns
pub fn read_roster<R: io::Read>(reader: R) -> Result<Vec<RosterRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        let row: RosterRow = record?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read a roster from a CSV file path
pub fn read_roster_file<P: AsRef<Path>>(path: P) -> Result<Vec<RosterRow>> {
    let file = std::fs::File::open(path)?;
    read_roster(file)
}

/// Write rows that failed validation as a CSV review table.
///
/// Columns: `Name, Email, Valid Name, Valid Email`. Only invalid rows are
/// written; returns how many.
pub fn export_review_report<W: io::Write>(rows: &[RosterRow], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Name", "Email", "Valid Name", "Valid Email"])?;

    let mut written = 0;
    for row in rows.iter().filter(|r| !r.is_valid()) {
        csv_writer.write_record([
            row.name.as_str(),
            row.email.as_str(),
            if row.valid_name() { "true" } else { "false" },
            if row.valid_email() { "true" } else { "false" },
        ])?;
        written += 1;
    }
    csv_writer.flush()?;
    Ok(written)
}
