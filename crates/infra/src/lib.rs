//! # Alyante Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - SQLite persistence (credential store, activities, entities)
//! - HTTP client and the TeamSystem Alyante webservice adapters
//! - Configuration loading and tracing setup
//! - [`ConnectorContext`], which wires everything together
//!
//! ## Architecture
//! - Implements traits defined in `alyante-core`
//! - Contains all I/O

pub mod config;
pub mod context;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

pub use context::ConnectorContext;
pub use database::{
    DbManager, SqliteActivityRepository, SqliteCredentialStore, SqliteEntityRepository,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::teamsystem::{HttpAuthApi, ReqwestTransport};
pub use observability::{init_tracing, LogFormat};
