//! Book catalog service

use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::book::{is_valid_isbn, normalize_isbn, Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    pagination: PaginationConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            pagination,
        }
    }

    /// List books with filters and pagination
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let mut query = query.clone();
        query.page = Some(query.page.unwrap_or(1).max(1));
        query.per_page = Some(
            query
                .per_page
                .unwrap_or(self.pagination.default_page_size)
                .clamp(1, self.pagination.max_page_size),
        );
        if let Some(ref isbn) = query.isbn {
            query.isbn = Some(normalize_isbn(isbn));
        }

        self.repository.books.search(&query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book
    pub async fn create_book(&self, mut book: CreateBook) -> AppResult<Book> {
        book.title = book.title.trim().to_string();
        book.author = book.author.trim().to_string();
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        book.isbn = self.prepare_isbn(book.isbn.as_deref(), None).await?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Created book {} '{}'", created.id, created.title);
        Ok(created)
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i64, mut changes: UpdateBook) -> AppResult<Book> {
        if let Some(ref title) = changes.title {
            changes.title = Some(title.trim().to_string());
        }
        if let Some(ref author) = changes.author {
            changes.author = Some(author.trim().to_string());
        }
        changes
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if changes.isbn.is_some() {
            changes.isbn = self.prepare_isbn(changes.isbn.as_deref(), Some(id)).await?;
        }

        self.repository.books.update(id, &changes).await
    }

    /// Delete a book. Refused while the book has active loans.
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    /// Normalize and check an ISBN: well-formed and not taken by another book.
    async fn prepare_isbn(
        &self,
        isbn: Option<&str>,
        exclude_id: Option<i64>,
    ) -> AppResult<Option<String>> {
        let Some(raw) = isbn.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let isbn = normalize_isbn(raw);
        if !is_valid_isbn(&isbn) {
            return Err(AppError::Validation(format!("Invalid ISBN: {}", raw)));
        }
        if self.repository.books.isbn_exists(&isbn, exclude_id).await? {
            return Err(AppError::Validation("ISBN already exists".to_string()));
        }

        Ok(Some(isbn))
    }
}
