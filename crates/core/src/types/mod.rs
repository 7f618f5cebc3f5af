//! Core types for Cartwheel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod timestamp;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use timestamp::UnixTimestamp;
