//! Authentication: token lifecycle over the credential store

pub mod ports;
pub mod token_provider;

pub use token_provider::TokenProvider;
