pub mod admin;
pub mod application;
pub mod loans;
pub mod members;
