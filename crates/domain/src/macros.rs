//! Macro for implementing Display and FromStr for wire-valued enums
//!
//! Several configuration values travel as plain strings (HTTP methods, sort
//! orders). This macro generates both conversions from a single mapping so the
//! textual form cannot drift between parsing and rendering.
//!
//! # Example
//!
//! ```rust
//! use alyante_domain::impl_wire_value_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Direction {
//!     Up,
//!     Down,
//! }
//!
//! impl_wire_value_conversions!(Direction {
//!     Up => "up",
//!     Down => "down",
//! });
//!
//! assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
//! assert_eq!(Direction::Down.to_string(), "down");
//! ```

/// Implements Display and FromStr traits for enums with a fixed wire value.
///
/// Parsing is ASCII case-insensitive; rendering always yields the mapped
/// string verbatim.
#[macro_export]
macro_rules! impl_wire_value_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
