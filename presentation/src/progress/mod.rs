//! Progress display while a deliberation runs

pub mod reporter;
