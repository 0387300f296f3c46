//! Conversion Rate Engine
//!
//! Pure decision logic, deterministic, no I/O.
//! Takes validated input → Returns a rounded rate or a classified error.

#![warn(clippy::all)]

pub mod calculator;

pub use calculator::{round_percentage, ConversionRateCalculator};
