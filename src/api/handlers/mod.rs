//! HTTP request handlers

pub mod health;
pub mod extract;
pub mod frontend;
