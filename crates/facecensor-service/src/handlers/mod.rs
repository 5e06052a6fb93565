//! HTTP request handlers.

pub mod accounts;
pub mod credits;
pub mod health;
pub mod images;
