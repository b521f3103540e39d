//! Metrics and CSV export service

use std::collections::HashMap;

use sqlx::Row;

use crate::{
    api::stats::{CsvExport, ExportGranularity, MetricsSnapshot, TopBorrowedBook},
    error::AppResult,
    repository::Repository,
};

/// How many books the per-book breakdown and top list include
const TOP_BORROWED_LIMIT: i64 = 5;
const PER_BOOK_EXPORT_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get aggregate library metrics.
    ///
    /// All counts run in one transaction so the snapshot is consistent:
    /// active_loans never disagrees with copies_available because a borrow
    /// committed between two counts.
    pub async fn get_metrics(&self) -> AppResult<MetricsSnapshot> {
        let mut tx = self.repository.pool.begin().await?;

        let total_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&mut *tx)
            .await?;

        let (total_copies, copies_available): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(copies_total), 0), COALESCE(SUM(copies_available), 0) FROM books",
        )
        .fetch_one(&mut *tx)
        .await?;

        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;

        let active_loans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE returned_at IS NULL")
                .fetch_one(&mut *tx)
                .await?;

        let returned_loans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE returned_at IS NOT NULL")
                .fetch_one(&mut *tx)
                .await?;

        let overdue_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE returned_at IS NULL AND due_date < DATE('now')",
        )
        .fetch_one(&mut *tx)
        .await?;

        let top_borrowed = sqlx::query(&format!(
            r#"
            SELECT COALESCE(b.title, '') as title, COUNT(*) as count
            FROM loans l
            LEFT JOIN books b ON b.id = l.book_id
            GROUP BY l.book_id
            ORDER BY count DESC, title
            LIMIT {}
            "#,
            TOP_BORROWED_LIMIT
        ))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| TopBorrowedBook {
            title: row.get("title"),
            count: row.get("count"),
        })
        .collect();

        tx.commit().await?;

        Ok(MetricsSnapshot {
            total_books,
            total_copies,
            copies_available,
            total_users,
            active_loans,
            returned_loans,
            overdue_loans,
            top_borrowed,
        })
    }

    /// Build the CSV export for a granularity: a header plus data rows,
    /// ready to be streamed out one record at a time.
    pub async fn export_csv(&self, granularity: ExportGranularity) -> AppResult<CsvExport> {
        match granularity {
            ExportGranularity::Summary => self.export_summary().await,
            ExportGranularity::PerBook => self.export_per_book().await,
            ExportGranularity::Day => self.export_time_series("%Y-%m-%d").await,
            ExportGranularity::Week => self.export_time_series("%Y-W%W").await,
            ExportGranularity::Month => self.export_time_series("%Y-%m").await,
            ExportGranularity::Year => self.export_time_series("%Y").await,
        }
    }

    /// One metric,value row per aggregate counter
    async fn export_summary(&self) -> AppResult<CsvExport> {
        let metrics = self.get_metrics().await?;

        let rows = vec![
            ("total_books", metrics.total_books),
            ("total_copies", metrics.total_copies),
            ("copies_available", metrics.copies_available),
            ("total_users", metrics.total_users),
            ("active_loans", metrics.active_loans),
            ("returned_loans", metrics.returned_loans),
            ("overdue_loans", metrics.overdue_loans),
        ]
        .into_iter()
        .map(|(metric, value)| vec![metric.to_string(), value.to_string()])
        .collect();

        Ok(CsvExport {
            header: vec!["metric".to_string(), "value".to_string()],
            rows,
        })
    }

    /// Most borrowed books, all-time, busiest first
    async fn export_per_book(&self) -> AppResult<CsvExport> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT COALESCE(b.title, '') as title, COALESCE(b.author, '') as author,
                   COUNT(*) as borrow_count
            FROM loans l
            LEFT JOIN books b ON b.id = l.book_id
            GROUP BY l.book_id
            ORDER BY borrow_count DESC, title
            LIMIT {}
            "#,
            PER_BOOK_EXPORT_LIMIT
        ))
        .fetch_all(&self.repository.pool)
        .await?
        .into_iter()
        .map(|row| {
            vec![
                row.get::<String, _>("title"),
                row.get::<String, _>("author"),
                row.get::<i64, _>("borrow_count").to_string(),
            ]
        })
        .collect();

        Ok(CsvExport {
            header: vec![
                "title".to_string(),
                "author".to_string(),
                "borrow_count".to_string(),
            ],
            rows,
        })
    }

    /// Loans and returns bucketed by period. Borrows bucket on borrowed_at,
    /// returns on returned_at, merged per period.
    async fn export_time_series(&self, period_format: &str) -> AppResult<CsvExport> {
        let mut tx = self.repository.pool.begin().await?;

        let loans_query = format!(
            "SELECT strftime('{}', borrowed_at) as period, COUNT(*) as count FROM loans GROUP BY period",
            period_format
        );
        let loans_data: Vec<(String, i64)> = sqlx::query(&loans_query)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| (row.get("period"), row.get("count")))
            .collect();

        let returns_query = format!(
            "SELECT strftime('{}', returned_at) as period, COUNT(*) as count FROM loans WHERE returned_at IS NOT NULL GROUP BY period",
            period_format
        );
        let returns_data: Vec<(String, i64)> = sqlx::query(&returns_query)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| (row.get("period"), row.get("count")))
            .collect();

        tx.commit().await?;

        let mut period_map: HashMap<String, (i64, i64)> = HashMap::new();
        for (period, count) in loans_data {
            period_map.entry(period).or_insert((0, 0)).0 += count;
        }
        for (period, count) in returns_data {
            period_map.entry(period).or_insert((0, 0)).1 += count;
        }

        let mut entries: Vec<(String, (i64, i64))> = period_map.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let rows = entries
            .into_iter()
            .map(|(period, (loans, returns))| {
                vec![period, loans.to_string(), returns.to_string()]
            })
            .collect();

        Ok(CsvExport {
            header: vec![
                "period".to_string(),
                "loans".to_string(),
                "returns".to_string(),
            ],
            rows,
        })
    }
}
