//! Data models for the e-library

pub mod batch;
pub mod book;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use batch::{ImportAction, ImportSummary};
pub use book::{Book, CreateBook, UpdateBook};
pub use loan::{Loan, LoanDetails};
pub use user::{CreateUser, UpdateUser, User};
