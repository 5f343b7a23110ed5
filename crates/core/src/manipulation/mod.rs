//! Local rewrites applied to entities between download and upload

pub mod date_format;

pub use date_format::DateFormatManipulator;
