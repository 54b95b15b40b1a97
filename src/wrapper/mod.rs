//! Interception façades, one per class of value.
//!
//! Each wrapper forwards a subset of operations to the value it wraps and passes
//! every result back through [`wrap`](crate::wrap).

mod callable;
mod container;
mod deferred;
pub(crate) mod sequence;

pub use callable::CallableWrapper;
pub use container::ContainerWrapper;
pub use deferred::DeferredWrapper;
