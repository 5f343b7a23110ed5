//! # Alyante Domain
//!
//! Pure types shared by the TeamSystem/Alyante connector.
//!
//! This crate contains:
//! - Credential, entity and activity models
//! - Sync run types (resource addressing, modes, counters)
//! - The connector error type and Result alias
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other connector crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

pub use config::*;
pub use errors::*;
pub use types::*;
