//! Transactional bookkeeping tests against a real database.
//! They expect DATABASE_URL to point at a migrated test database.
//! Run with: cargo test -- --ignored

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use bibliotheque_server::{
    error::AppError,
    models::loan::LoanStatus,
    repository::Repository,
};

async fn connect() -> Pool<Postgres> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to database")
}

fn unique_isbn() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64;
    format!("978{:010}", nanos % 10_000_000_000)
}

/// Insert a borrower and a book with the given copy counts
async fn fixture(pool: &Pool<Postgres>, total_copies: i32) -> (i32, i32) {
    let username = format!("borrower-{}", unique_isbn());
    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (username, password_hash) VALUES ($1, 'x') RETURNING id",
    )
    .bind(&username)
    .fetch_one(pool)
    .await
    .expect("Failed to insert user");

    let book_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO books (title, isbn, total_copies, available_copies)
        VALUES ('Bookkeeping fixture', $1, $2, $2)
        RETURNING id
        "#,
    )
    .bind(unique_isbn())
    .bind(total_copies)
    .fetch_one(pool)
    .await
    .expect("Failed to insert book");

    (book_id, user_id)
}

async fn available_copies(pool: &Pool<Postgres>, book_id: i32) -> i32 {
    sqlx::query_scalar("SELECT available_copies FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read available_copies")
}

async fn cleanup(pool: &Pool<Postgres>, book_id: i32, user_id: i32) {
    let _ = sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(book_id)
        .execute(pool)
        .await;
    let _ = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await;
}

#[tokio::test]
#[ignore]
async fn reserve_then_return_restores_the_count() {
    let pool = connect().await;
    let repo = Repository::new(pool.clone());
    let (book_id, user_id) = fixture(&pool, 3).await;
    let due = Utc::now() + Duration::days(1);

    let loan = repo
        .loans
        .create(book_id, user_id, due, LoanStatus::Reserved)
        .await
        .expect("Reservation should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 2);

    let details = repo.loans.close(loan.id).await.expect("Return should succeed");
    assert_eq!(details.status, LoanStatus::Completed);
    assert!(details.return_date.is_some());
    assert_eq!(available_copies(&pool, book_id).await, 3);

    cleanup(&pool, book_id, user_id).await;
}

#[tokio::test]
#[ignore]
async fn returning_twice_is_rejected_and_does_not_increment() {
    let pool = connect().await;
    let repo = Repository::new(pool.clone());
    let (book_id, user_id) = fixture(&pool, 2).await;
    let due = Utc::now() + Duration::days(14);

    let loan = repo
        .loans
        .create(book_id, user_id, due, LoanStatus::Borrowed)
        .await
        .expect("Borrow should succeed");

    repo.loans.close(loan.id).await.expect("First return should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 2);

    let second = repo.loans.close(loan.id).await;
    assert!(matches!(second, Err(AppError::AlreadyReturned(_))));
    // available_copies must not exceed total_copies
    assert_eq!(available_copies(&pool, book_id).await, 2);

    cleanup(&pool, book_id, user_id).await;
}

#[tokio::test]
#[ignore]
async fn borrowing_with_no_copies_left_is_rejected() {
    let pool = connect().await;
    let repo = Repository::new(pool.clone());
    let (book_id, user_id) = fixture(&pool, 1).await;
    let due = Utc::now() + Duration::days(7);

    repo.loans
        .create(book_id, user_id, due, LoanStatus::Borrowed)
        .await
        .expect("First borrow should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 0);

    let second = repo
        .loans
        .create(book_id, user_id, due, LoanStatus::Borrowed)
        .await;
    assert!(matches!(second, Err(AppError::NotAvailable(_))));
    assert_eq!(available_copies(&pool, book_id).await, 0);

    cleanup(&pool, book_id, user_id).await;
}

#[tokio::test]
#[ignore]
async fn concurrent_requests_for_the_last_copy_admit_exactly_one() {
    let pool = connect().await;
    let repo = Repository::new(pool.clone());
    let (book_id, user_id) = fixture(&pool, 1).await;
    let due = Utc::now() + Duration::days(1);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.loans
                .create(book_id, user_id, due, LoanStatus::Reserved)
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.expect("Task panicked").is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(available_copies(&pool, book_id).await, 0);

    cleanup(&pool, book_id, user_id).await;
}

#[tokio::test]
#[ignore]
async fn book_update_does_not_overwrite_a_loan_decrement() {
    let pool = connect().await;
    let repo = Repository::new(pool.clone());
    let (book_id, user_id) = fixture(&pool, 3).await;

    // Stale snapshot taken before the loan commits its decrement
    let mut stale = repo.books.get_by_id(book_id).await.expect("Book should exist");
    assert_eq!(stale.available_copies, 3);

    let due = Utc::now() + Duration::days(7);
    repo.loans
        .create(book_id, user_id, due, LoanStatus::Borrowed)
        .await
        .expect("Borrow should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 2);

    // A title-only update from the stale snapshot must leave the counter alone
    stale.title = "Renamed fixture".to_string();
    repo.books.update(&stale, None).await.expect("Update should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 2);

    cleanup(&pool, book_id, user_id).await;
}

#[tokio::test]
#[ignore]
async fn total_copies_change_follows_the_loan_count() {
    let pool = connect().await;
    let repo = Repository::new(pool.clone());
    let (book_id, user_id) = fixture(&pool, 3).await;
    let due = Utc::now() + Duration::days(7);

    repo.loans
        .create(book_id, user_id, due, LoanStatus::Borrowed)
        .await
        .expect("Borrow should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 2);

    // Growing to 5 keeps 1 copy out on loan
    repo.books.set_total_copies(book_id, 5).await.expect("Grow should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 4);

    // Shrinking to 1 leaves the loaned copy accounted for
    repo.books.set_total_copies(book_id, 1).await.expect("Shrink should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 0);

    // Shrinking below the on-loan count is rejected and changes nothing
    let result = repo.books.set_total_copies(book_id, 0).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(available_copies(&pool, book_id).await, 0);

    cleanup(&pool, book_id, user_id).await;
}

#[tokio::test]
#[ignore]
async fn failed_author_link_rolls_back_the_book_insert() {
    let pool = connect().await;
    let repo = Repository::new(pool.clone());

    let isbn = unique_isbn();
    let request = bibliotheque_server::models::book::CreateBook {
        title: "Orphan link fixture".to_string(),
        isbn: isbn.clone(),
        author_ids: vec![i32::MAX],
        category_id: None,
        summary: String::new(),
        total_copies: 1,
        publication_date: None,
    };

    let result = repo.books.create(&request).await;
    assert!(result.is_err());

    // The insert must not survive the failed author link
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE isbn = $1")
        .bind(&isbn)
        .fetch_one(&pool)
        .await
        .expect("Failed to count books");
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore]
async fn deleting_an_open_loan_releases_its_copy() {
    let pool = connect().await;
    let repo = Repository::new(pool.clone());
    let (book_id, user_id) = fixture(&pool, 2).await;
    let due = Utc::now() + Duration::days(7);

    let loan = repo
        .loans
        .create(book_id, user_id, due, LoanStatus::Borrowed)
        .await
        .expect("Borrow should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 1);

    repo.loans.delete(loan.id).await.expect("Delete should succeed");
    assert_eq!(available_copies(&pool, book_id).await, 2);

    cleanup(&pool, book_id, user_id).await;
}
