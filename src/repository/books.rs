//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder, Row, Transaction};
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookQuery, CreateBook},
        category::Category,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search books with conjunctive filters and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM books b WHERE 1=1");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select_qb = QueryBuilder::new("SELECT b.* FROM books b WHERE 1=1");
        push_filters(&mut select_qb, query);
        select_qb.push(" ORDER BY b.title LIMIT ");
        select_qb.push_bind(per_page);
        select_qb.push(" OFFSET ");
        select_qb.push_bind(offset);

        let mut books: Vec<Book> = select_qb
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        self.load_relations(&mut books).await?;

        Ok((books, total))
    }

    /// Get book by ID with authors and category loaded
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let mut books = vec![book];
        self.load_relations(&mut books).await?;
        Ok(books.remove(0))
    }

    /// Check whether an ISBN is already in the catalogue
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new book with its author links in one transaction.
    /// Available copies start equal to total copies.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (
                title, isbn, category_id, summary,
                total_copies, available_copies, publication_date,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $7)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.category_id)
        .bind(&book.summary)
        .bind(book.total_copies)
        .bind(book.publication_date)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sync_authors(&mut tx, id, &book.author_ids).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Write back a merged book record and optionally replace its author
    /// links, in one transaction. The copy counters are never written here;
    /// `total_copies` changes go through [`Self::set_total_copies`] and
    /// `available_copies` moves only through loan transitions.
    pub async fn update(&self, book: &Book, author_ids: Option<&[i32]>) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE books
            SET title = $2, isbn = $3, category_id = $4, summary = $5,
                publication_date = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.category_id)
        .bind(&book.summary)
        .bind(book.publication_date)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if let Some(ids) = author_ids {
            sync_authors(&mut tx, book.id, ids).await?;
        }
        tx.commit().await?;

        self.get_by_id(book.id).await
    }

    /// Change the shelf count. The matching `available_copies` delta is
    /// applied in the same guarded statement, so a loan decrement committed
    /// between a read and this write is never overwritten; shrinking below
    /// the number of copies currently out on loan is rejected.
    pub async fn set_total_copies(&self, id: i32, total_copies: i32) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE books
            SET total_copies = $2,
                available_copies = available_copies + ($2 - total_copies),
                updated_at = $3
            WHERE id = $1 AND available_copies + ($2 - total_copies) >= 0
            "#,
        )
        .bind(id)
        .bind(total_copies)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            return if exists {
                Err(AppError::Validation(
                    "total_copies: cannot reduce below the number of copies out on loan"
                        .to_string(),
                ))
            } else {
                Err(AppError::NotFound(format!("Book with id {} not found", id)))
            };
        }
        Ok(())
    }

    /// Delete a book. Loans referencing it are removed by cascade.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Load authors and categories for a batch of books
    async fn load_relations(&self, books: &mut [Book]) -> AppResult<()> {
        if books.is_empty() {
            return Ok(());
        }
        let book_ids: Vec<i32> = books.iter().map(|b| b.id).collect();

        let author_rows = sqlx::query(
            r#"
            SELECT ba.book_id, a.id, a.first_name, a.last_name,
                   a.biography, a.birth_date, a.death_date
            FROM book_authors ba
            JOIN authors a ON a.id = ba.author_id
            WHERE ba.book_id = ANY($1)
            ORDER BY a.last_name, a.first_name
            "#,
        )
        .bind(&book_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut authors_by_book: HashMap<i32, Vec<Author>> = HashMap::new();
        for row in author_rows {
            let book_id: i32 = row.get("book_id");
            authors_by_book.entry(book_id).or_default().push(Author {
                id: row.get("id"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                biography: row.get("biography"),
                birth_date: row.get("birth_date"),
                death_date: row.get("death_date"),
            });
        }

        let category_ids: Vec<i32> = books.iter().filter_map(|b| b.category_id).collect();
        let categories: HashMap<i32, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ANY($1)")
                .bind(&category_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        for book in books.iter_mut() {
            book.authors = authors_by_book.remove(&book.id).unwrap_or_default();
            book.category = book.category_id.and_then(|id| categories.get(&id).cloned());
        }
        Ok(())
    }
}

/// Replace the author links of a book inside the caller's transaction
async fn sync_authors(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i32,
    author_ids: &[i32],
) -> AppResult<()> {
    sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut **tx)
        .await?;

    for author_id in author_ids {
        sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2)")
            .bind(book_id)
            .bind(author_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Append the conjunctive WHERE predicates shared by the count and select queries
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
    if let Some(ref term) = query.query {
        if !term.trim().is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            qb.push(" AND (LOWER(b.title) LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR b.isbn LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(
                " OR EXISTS (SELECT 1 FROM book_authors ba \
                 JOIN authors a ON a.id = ba.author_id \
                 WHERE ba.book_id = b.id AND (LOWER(a.first_name) LIKE ",
            );
            qb.push_bind(pattern.clone());
            qb.push(" OR LOWER(a.last_name) LIKE ");
            qb.push_bind(pattern);
            qb.push(")))");
        }
    }

    if let Some(category) = query.category {
        qb.push(" AND b.category_id = ");
        qb.push_bind(category);
    }

    if query.available_only.unwrap_or(false) {
        qb.push(" AND b.available_copies > 0");
    }
}
