//! Data models for the Bibliotheque catalogue

pub mod author;
pub mod book;
pub mod category;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookQuery};
pub use category::Category;
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use user::{User, UserClaims};
