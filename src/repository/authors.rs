//! Authors repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor, UpdateAuthor},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List authors, optionally filtered by a name substring
    pub async fn list(&self, name: Option<&str>) -> AppResult<Vec<Author>> {
        let authors = match name {
            Some(name) if !name.trim().is_empty() => {
                sqlx::query_as::<_, Author>(
                    r#"
                    SELECT * FROM authors
                    WHERE LOWER(first_name) LIKE $1 OR LOWER(last_name) LIKE $1
                    ORDER BY last_name, first_name
                    "#,
                )
                .bind(format!("%{}%", name.to_lowercase()))
                .fetch_all(&self.pool)
                .await?
            }
            _ => {
                sqlx::query_as::<_, Author>(
                    "SELECT * FROM authors ORDER BY last_name, first_name",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(authors)
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Check that every ID in the list refers to an existing author
    pub async fn all_exist(&self, ids: &[i32]) -> AppResult<bool> {
        if ids.is_empty() {
            return Ok(true);
        }
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE id = ANY($1)")
                .bind(ids)
                .fetch_one(&self.pool)
                .await?;
        Ok(count == ids.len() as i64)
    }

    /// Create a new author
    pub async fn create(&self, author: &CreateAuthor) -> AppResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, biography, birth_date, death_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.biography)
        .bind(author.birth_date)
        .bind(author.death_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Update an existing author
    pub async fn update(&self, id: i32, author: &UpdateAuthor) -> AppResult<Author> {
        let updated = sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                biography = COALESCE($4, biography),
                birth_date = COALESCE($5, birth_date),
                death_date = COALESCE($6, death_date)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.biography)
        .bind(author.birth_date)
        .bind(author.death_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;
        Ok(updated)
    }

    /// Delete an author. Book links are removed by cascade.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        Ok(())
    }
}
