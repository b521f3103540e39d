//! CSV batch import service

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{
        batch::{BookCsvRow, ImportBook, ImportSummary},
        book::{is_valid_isbn, normalize_isbn},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BatchService {
    repository: Repository,
}

impl BatchService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Import books from CSV data with columns
    /// `title,author,isbn,published_date,copies_total`.
    ///
    /// Rows are matched to existing books by ISBN and upserted one at a
    /// time. A bad row is skipped and reported in the summary without
    /// touching the rest of the batch; only infrastructure failures abort
    /// the import.
    pub async fn import_books(&self, data: &[u8]) -> AppResult<ImportSummary> {
        let text = std::str::from_utf8(data)
            .map_err(|_| AppError::Validation("CSV payload is not valid UTF-8".to_string()))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        // Column names are matched case-insensitively ("Title" == "title")
        let headers = reader
            .headers()
            .map_err(|e| AppError::Validation(format!("Unreadable CSV header: {}", e)))?
            .iter()
            .map(str::to_lowercase)
            .collect::<csv::StringRecord>();
        reader.set_headers(headers);

        let mut summary = ImportSummary::default();

        for (idx, record) in reader.deserialize::<BookCsvRow>().enumerate() {
            // First data row after the header is row 1
            let row_no = idx + 1;

            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    summary.reject(row_no, format!("Malformed row: {}", e));
                    continue;
                }
            };

            match prepare_row(&row) {
                Ok(book) => {
                    let action = self.repository.books.upsert_by_isbn(&book).await?;
                    summary.record(action);
                }
                Err(reason) => summary.reject(row_no, reason),
            }
        }

        tracing::info!(
            "CSV import finished: {} inserted, {} updated, {} skipped",
            summary.inserted,
            summary.updated,
            summary.skipped
        );

        Ok(summary)
    }
}

/// Validate one raw CSV row. The error string becomes the row's rejection
/// reason in the import summary.
fn prepare_row(row: &BookCsvRow) -> Result<ImportBook, String> {
    let title = row.title.as_deref().unwrap_or("").trim();
    if title.is_empty() {
        return Err("Missing title".to_string());
    }

    let author = row.author.as_deref().unwrap_or("").trim();
    if author.is_empty() {
        return Err("Missing author".to_string());
    }

    let raw_isbn = row.isbn.as_deref().unwrap_or("").trim();
    if raw_isbn.is_empty() {
        return Err("Missing ISBN".to_string());
    }
    let isbn = normalize_isbn(raw_isbn);
    if !is_valid_isbn(&isbn) {
        return Err(format!("Invalid ISBN: {}", raw_isbn));
    }

    let published_date = match row
        .published_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(s) => Some(
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| format!("Invalid published_date: {}", s))?,
        ),
        None => None,
    };

    let copies_total = match row
        .copies_total
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| format!("Invalid copies_total: {}", s))?,
        None => 1,
    };
    if copies_total < 0 {
        return Err("copies_total must not be negative".to_string());
    }

    Ok(ImportBook {
        title: title.to_string(),
        author: author.to_string(),
        isbn,
        published_date,
        copies_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        title: &str,
        author: &str,
        isbn: &str,
        published_date: &str,
        copies_total: &str,
    ) -> BookCsvRow {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        BookCsvRow {
            title: opt(title),
            author: opt(author),
            isbn: opt(isbn),
            published_date: opt(published_date),
            copies_total: opt(copies_total),
        }
    }

    #[test]
    fn accepts_complete_row() {
        let book = prepare_row(&raw(
            "Dune",
            "Frank Herbert",
            "978-0-441-17271-9",
            "1965-08-01",
            "3",
        ))
        .unwrap();
        assert_eq!(book.isbn, "9780441172719");
        assert_eq!(book.copies_total, 3);
        assert_eq!(
            book.published_date,
            Some(NaiveDate::from_ymd_opt(1965, 8, 1).unwrap())
        );
    }

    #[test]
    fn copies_total_defaults_to_one() {
        let book = prepare_row(&raw("Dune", "Frank Herbert", "9780441172719", "", "")).unwrap();
        assert_eq!(book.copies_total, 1);
    }

    #[test]
    fn rejects_missing_fields() {
        assert_eq!(
            prepare_row(&raw("", "Frank Herbert", "9780441172719", "", "")),
            Err("Missing title".to_string())
        );
        assert_eq!(
            prepare_row(&raw("Dune", "", "9780441172719", "", "")),
            Err("Missing author".to_string())
        );
        assert_eq!(
            prepare_row(&raw("Dune", "Frank Herbert", "", "", "")),
            Err("Missing ISBN".to_string())
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(prepare_row(&raw("Dune", "F. Herbert", "not-an-isbn", "", ""))
            .unwrap_err()
            .starts_with("Invalid ISBN"));
        assert!(
            prepare_row(&raw("Dune", "F. Herbert", "9780441172719", "August 1965", ""))
                .unwrap_err()
                .starts_with("Invalid published_date")
        );
        assert!(
            prepare_row(&raw("Dune", "F. Herbert", "9780441172719", "", "many"))
                .unwrap_err()
                .starts_with("Invalid copies_total")
        );
        assert_eq!(
            prepare_row(&raw("Dune", "F. Herbert", "9780441172719", "", "-2")),
            Err("copies_total must not be negative".to_string())
        );
    }
}
