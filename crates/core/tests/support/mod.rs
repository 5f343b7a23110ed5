//! Shared test helpers for `alyante-core` integration tests.
//!
//! In-memory implementations of every port plus fixtures for wiring a
//! session, so each test can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;
