//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::{
        batch::{ImportAction, ImportBook},
        book::{Book, BookQuery, CreateBook, UpdateBook},
    },
};

const BOOK_COLUMNS: &str =
    "id, title, author, isbn, published_date, copies_total, copies_available, created_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS);

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Check if ISBN already exists
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ? AND id != ?)")
                .bind(isbn)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ?)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?
        };

        Ok(exists)
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Search books with pagination. Returns the page of books and the total
    /// count of matches before paging.
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).max(1);
        let offset = (page - 1) * per_page;

        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref q) = query.q {
            conditions.push("(LOWER(title) LIKE ? OR LOWER(author) LIKE ?)");
            let term = format!("%{}%", q.to_lowercase());
            params.push(term.clone());
            params.push(term);
        }

        if let Some(ref title) = query.title {
            conditions.push("LOWER(title) LIKE ?");
            params.push(format!("%{}%", title.to_lowercase()));
        }

        if let Some(ref author) = query.author {
            conditions.push("LOWER(author) LIKE ?");
            params.push(format!("%{}%", author.to_lowercase()));
        }

        if let Some(ref isbn) = query.isbn {
            conditions.push("isbn = ?");
            params.push(isbn.clone());
        }

        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };

        let count_query = format!("SELECT COUNT(*) FROM books WHERE {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count = count.bind(param);
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT {} FROM books WHERE {} ORDER BY title, id LIMIT {} OFFSET {}",
            BOOK_COLUMNS, where_clause, per_page, offset
        );
        let mut select = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select = select.bind(param);
        }
        let books = select.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Create a new book. All copies start available.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO books (title, author, isbn, published_date, copies_total, copies_available, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.published_date)
        .bind(book.copies_total)
        .bind(book.copies_total)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Update a book. When copies_total changes, copies_available moves by the
    /// same delta, clamped to [0, copies_total].
    pub async fn update(&self, id: i64, changes: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS);
        let current = sqlx::query_as::<_, Book>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let title = changes.title.clone().unwrap_or(current.title);
        let author = changes.author.clone().unwrap_or(current.author);
        let isbn = changes.isbn.clone().or(current.isbn);
        let published_date = changes.published_date.or(current.published_date);

        let (copies_total, copies_available) = match changes.copies_total {
            Some(new_total) => {
                let delta = new_total - current.copies_total;
                let available = (current.copies_available + delta).clamp(0, new_total);
                (new_total, available)
            }
            None => (current.copies_total, current.copies_available),
        };

        sqlx::query(
            r#"
            UPDATE books
            SET title = ?, author = ?, isbn = ?, published_date = ?,
                copies_total = ?, copies_available = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&author)
        .bind(&isbn)
        .bind(published_date)
        .bind(copies_total)
        .bind(copies_available)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let book = sqlx::query_as::<_, Book>(&select)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(book)
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Delete a book. Fails with a conflict while the book has active loans;
    /// returned loans stay behind as history.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = ? AND returned_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            return Err(AppError::Conflict(
                "Cannot delete book with active loans".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // UPSERT (CSV import)
    // =========================================================================

    /// Insert a book, or update the existing one matched by ISBN.
    ///
    /// On update, title, author and published_date are refreshed and
    /// copies_available moves by the copies_total delta, clamped to
    /// [0, copies_total].
    pub async fn upsert_by_isbn(&self, book: &ImportBook) -> AppResult<ImportAction> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64, i64, i64)> = sqlx::query_as(
            "SELECT id, copies_total, copies_available FROM books WHERE isbn = ?",
        )
        .bind(&book.isbn)
        .fetch_optional(&mut *tx)
        .await?;

        let action = match existing {
            Some((id, old_total, old_available)) => {
                let delta = book.copies_total - old_total;
                let available = (old_available + delta).clamp(0, book.copies_total);

                sqlx::query(
                    r#"
                    UPDATE books
                    SET title = ?, author = ?, published_date = ?,
                        copies_total = ?, copies_available = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&book.title)
                .bind(&book.author)
                .bind(book.published_date)
                .bind(book.copies_total)
                .bind(available)
                .bind(id)
                .execute(&mut *tx)
                .await?;

                ImportAction::Updated
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO books (title, author, isbn, published_date, copies_total, copies_available, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&book.title)
                .bind(&book.author)
                .bind(&book.isbn)
                .bind(book.published_date)
                .bind(book.copies_total)
                .bind(book.copies_total)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                ImportAction::Inserted
            }
        };

        tx.commit().await?;

        Ok(action)
    }
}
