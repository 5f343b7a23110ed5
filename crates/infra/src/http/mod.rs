//! HTTP client plumbing shared by the webservice adapters

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
