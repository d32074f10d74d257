//! Catalogue management service: categories, authors and books.
//!
//! All cross-field validation happens here, before any write reaches the
//! repository; the first failing check is reported and nothing is applied.

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{self, Author, CreateAuthor, UpdateAuthor},
        book::{self, Book, BookQuery, CreateBook, UpdateBook},
        category::{Category, CreateCategory, UpdateCategory},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    pub async fn list_categories(&self, name: Option<&str>) -> AppResult<Vec<Category>> {
        self.repository.categories.list(name).await
    }

    pub async fn get_category(&self, id: i32) -> AppResult<Category> {
        self.repository.categories.get_by_id(id).await
    }

    pub async fn create_category(&self, category: CreateCategory) -> AppResult<Category> {
        category.validate()?;
        if self.repository.categories.name_exists(&category.name, None).await? {
            return Err(AppError::Conflict(format!(
                "Category \"{}\" already exists",
                category.name
            )));
        }
        self.repository.categories.create(&category).await
    }

    pub async fn update_category(&self, id: i32, category: UpdateCategory) -> AppResult<Category> {
        category.validate()?;
        if let Some(ref name) = category.name {
            if self.repository.categories.name_exists(name, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "Category \"{}\" already exists",
                    name
                )));
            }
        }
        self.repository.categories.update(id, &category).await
    }

    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        self.repository.categories.delete(id).await
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, name: Option<&str>) -> AppResult<Vec<Author>> {
        self.repository.authors.list(name).await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        author.validate()?;
        if !author::dates_ordered(author.birth_date, author.death_date) {
            return Err(AppError::Validation(
                "death_date: Death date cannot precede birth date".to_string(),
            ));
        }
        self.repository.authors.create(&author).await
    }

    pub async fn update_author(&self, id: i32, author: UpdateAuthor) -> AppResult<Author> {
        author.validate()?;
        let existing = self.repository.authors.get_by_id(id).await?;
        let birth = author.birth_date.or(existing.birth_date);
        let death = author.death_date.or(existing.death_date);
        if !author::dates_ordered(birth, death) {
            return Err(AppError::Validation(
                "death_date: Death date cannot precede birth date".to_string(),
            ));
        }
        self.repository.authors.update(id, &author).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, request: CreateBook) -> AppResult<Book> {
        request.validate()?;
        if !book::publication_date_valid(request.publication_date, Utc::now().date_naive()) {
            return Err(AppError::Validation(
                "publication_date: Publication date cannot be in the future".to_string(),
            ));
        }
        if self.repository.books.isbn_exists(&request.isbn, None).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                request.isbn
            )));
        }
        if !self.repository.authors.all_exist(&request.author_ids).await? {
            return Err(AppError::Validation(
                "author_ids: Unknown author in list".to_string(),
            ));
        }
        if let Some(category_id) = request.category_id {
            self.repository.categories.get_by_id(category_id).await?;
        }
        self.repository.books.create(&request).await
    }

    /// Update a book. `available_copies` is never written from a read
    /// snapshot; a `total_copies` change is applied as a guarded delta in the
    /// repository so loan decrements committed in between are preserved.
    pub async fn update_book(&self, id: i32, request: UpdateBook) -> AppResult<Book> {
        request.validate()?;
        let mut book = self.repository.books.get_by_id(id).await?;

        if let Some(publication_date) = request.publication_date {
            if !book::publication_date_valid(Some(publication_date), Utc::now().date_naive()) {
                return Err(AppError::Validation(
                    "publication_date: Publication date cannot be in the future".to_string(),
                ));
            }
            book.publication_date = Some(publication_date);
        }

        if let Some(ref isbn) = request.isbn {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "A book with ISBN {} already exists",
                    isbn
                )));
            }
            book.isbn = isbn.clone();
        }

        if let Some(ref author_ids) = request.author_ids {
            if !self.repository.authors.all_exist(author_ids).await? {
                return Err(AppError::Validation(
                    "author_ids: Unknown author in list".to_string(),
                ));
            }
        }

        if let Some(category_id) = request.category_id {
            self.repository.categories.get_by_id(category_id).await?;
            book.category_id = Some(category_id);
        }

        if let Some(total_copies) = request.total_copies {
            self.repository.books.set_total_copies(id, total_copies).await?;
        }

        if let Some(title) = request.title {
            book.title = title;
        }
        if let Some(summary) = request.summary {
            book.summary = summary;
        }

        self.repository
            .books
            .update(&book, request.author_ids.as_deref())
            .await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }
}
