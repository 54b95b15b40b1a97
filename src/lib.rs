//! # Chainwrap: Transparent Chaining Through Deferred Values
//!
//! Wrap any value and keep reading members and calling functions on it, whether
//! the value is available now or settles later. Accesses on a pending value are
//! recorded as derived pending values, so a whole chain can be written up front
//! and awaited once at the end.
//!
//! ## Core Types
//!
//! - **[`Value`]**: The dynamic values being wrapped
//! - **[`Deferred`]**: A handle to a value that settles later
//! - **[`Wrapped`]**: A value as seen through the wrapper, returned by [`wrap`]
//!
//! ## Example
//!
//! ```
//! use chainwrap::*;
//!
//! let fetch = Value::function("fetch", |_, args| {
//!     let id = args.first().cloned().unwrap_or_default();
//!     Ok(Deferred::resolved(Value::object([("id", id)])).into())
//! });
//! let api = Value::object([("fetch", fetch)]);
//!
//! // `fetch` returns a pending value, yet `id` can be read off it right away
//! let id = wrap(api).get("fetch")?.call(vec![Value::from(7)])?.get("id")?;
//! assert!(id.is_deferred());
//! assert_eq!(settle_blocking(id)?, Value::from(7));
//! # Ok::<(), chainwrap::Error>(())
//! ```
//!
//! ## Common Functions
//!
//! **Wrapping:**
//! - [`wrap(value)`] - Classify a value and wrap it for chaining
//! - [`classify(value)`] - Report how a value would be wrapped
//!
//! **Settling:**
//! - [`settle(wrapped)`] - Wait for a wrapped chain to settle
//! - [`settle_all(items)`] - Wait for several chains, keeping their order
//! - [`settle_blocking(wrapped)`] - Settle from synchronous code

mod classify;
mod deferred;
mod error;
pub mod prelude;
mod queue;
mod settle;
mod state;
pub mod value;
mod wrap;
pub mod wrapper;

pub use classify::*;
pub use deferred::*;
pub use error::*;
pub use settle::*;
pub use state::*;
pub use value::{Array, Function, Object, Value, ITERATOR_KEY};
pub use wrap::*;
pub use wrapper::{CallableWrapper, ContainerWrapper, DeferredWrapper};
