//! API handlers for the e-library REST endpoints

pub mod batch;
pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod stats;
pub mod users;
