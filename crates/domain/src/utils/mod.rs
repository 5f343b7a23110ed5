//! Pure helpers shared by the connector crates

pub mod datetime;
pub mod dot_path;
