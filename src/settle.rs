//! Functions for driving wrapped chains to settlement.
//!
//! Continuations run as soon as the values they wait on settle. These drivers
//! wait for the end of a chain, either from async code or from a synchronous caller.

use futures::{executor, future};

use crate::{error::Error, wrap::Wrapped};

/// Waits for `wrapped` to settle.
///
/// Pending wrappers resolve to the wrapper of their settled value; anything else
/// is already settled and comes back unchanged.
pub async fn settle(wrapped: Wrapped) -> Result<Wrapped, Error> {
    wrapped.settle().await
}

/// Waits for every wrapper in `items` to settle.
///
/// Results keep the input order. The first failure observed is returned.
pub async fn settle_all<I>(items: I) -> Result<Vec<Wrapped>, Error>
where
    I: IntoIterator<Item = Wrapped>,
{
    future::try_join_all(items.into_iter().map(Wrapped::settle)).await
}

/// Blocking version of [`settle`].
///
/// Drives the chain on the current thread until it settles.
///
/// ```rust
/// use chainwrap::{settle_blocking, wrap, Deferred, Value};
///
/// let settled = settle_blocking(wrap(Deferred::resolved("done")))?;
/// assert_eq!(settled, Value::from("done"));
/// # Ok::<(), chainwrap::Error>(())
/// ```
pub fn settle_blocking(wrapped: Wrapped) -> Result<Wrapped, Error> {
    executor::block_on(settle(wrapped))
}
