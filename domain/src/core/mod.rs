//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: model endpoint identifiers (council members, chairman)
//! - [`question::Question`]: a validated question to put to the council
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: text helpers for previews

pub mod error;
pub mod model;
pub mod question;
pub mod string;
