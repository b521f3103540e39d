//! CSV batch import types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One raw CSV record. Every column is read as an optional string so a
/// malformed value surfaces as a per-row error instead of aborting the
/// whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookCsvRow {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_date: Option<String>,
    pub copies_total: Option<String>,
}

/// A validated row, ready to be upserted by ISBN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_date: Option<chrono::NaiveDate>,
    pub copies_total: i64,
}

/// Outcome of upserting a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Inserted,
    Updated,
}

/// A rejected row with its 1-based data row number
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RowError {
    /// Row number, counting the first data row (after the header) as 1
    pub row: usize,
    /// Why the row was rejected
    pub reason: String,
}

/// Summary of a CSV import run
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    /// Rows that created a new book
    pub inserted: usize,
    /// Rows that updated an existing book (matched by ISBN)
    pub updated: usize,
    /// Rows rejected with an error
    pub skipped: usize,
    /// Per-row rejection reasons
    pub errors: Vec<RowError>,
}

impl ImportSummary {
    pub fn record(&mut self, action: ImportAction) {
        match action {
            ImportAction::Inserted => self.inserted += 1,
            ImportAction::Updated => self.updated += 1,
        }
    }

    pub fn reject(&mut self, row: usize, reason: impl Into<String>) {
        self.skipped += 1;
        self.errors.push(RowError {
            row,
            reason: reason.into(),
        });
    }
}
