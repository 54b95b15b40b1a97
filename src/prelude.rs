//! Commonly used imports
//!
//! Use `use chainwrap::prelude::*;` for quick access to the most common types and functions.

// Core types
pub use crate::{Deferred, Error, Value, Wrapped};

// Entry point
pub use crate::wrap;

// Settling
pub use crate::{settle, settle_all, settle_blocking};
