use crate::{error::Error, value::Value};

/// Where a [`Deferred`](crate::Deferred) is in its lifecycle.
///
/// A handle starts `Pending` and moves exactly once to `Fulfilled` or `Rejected`.
/// Both settled states are terminal.
///
/// # Examples
///
/// ```rust
/// use chainwrap::{Deferred, State, Value};
///
/// let (handle, settle) = Deferred::channel();
/// assert!(handle.state().is_pending());
///
/// settle.resolve(1);
/// let _ = futures::executor::block_on(async { (&handle).await });
/// assert_eq!(handle.state().fulfilled_value(), Some(Value::from(1)));
/// ```
#[derive(Debug, Clone)]
pub enum State {
    /// Not settled yet
    Pending,
    /// Settled-success with a value
    Fulfilled(Value),
    /// Settled-failure with a reason
    Rejected(Error),
}

impl State {
    /// Returns `true` if the handle has not settled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chainwrap::State;
    ///
    /// assert!(State::Pending.is_pending());
    /// assert!(!State::Fulfilled(3.into()).is_pending());
    /// ```
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    /// Returns `true` once the handle settled, either way.
    #[inline]
    pub const fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// Returns `true` if the handle settled-success.
    #[inline]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, State::Fulfilled(_))
    }

    /// Returns `true` if the handle settled-failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chainwrap::{Error, State, Value};
    ///
    /// let state = State::Rejected(Error::Rejected(Value::from("e")));
    /// assert!(state.is_rejected());
    /// assert!(!state.is_fulfilled());
    /// ```
    #[inline]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, State::Rejected(_))
    }

    /// Converts into the settled value, discarding a failure.
    #[inline]
    pub fn fulfilled_value(self) -> Option<Value> {
        match self {
            State::Fulfilled(value) => Some(value),
            State::Pending | State::Rejected(_) => None,
        }
    }

    /// Converts into the failure, discarding a settled value.
    #[inline]
    pub fn rejected_error(self) -> Option<Error> {
        match self {
            State::Rejected(error) => Some(error),
            State::Pending | State::Fulfilled(_) => None,
        }
    }

    /// Converts into the outcome of a settled handle, or `None` while pending.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chainwrap::{State, Value};
    ///
    /// assert_eq!(State::Fulfilled(Value::Null).into_outcome().unwrap().unwrap(), Value::Null);
    /// assert!(State::Pending.into_outcome().is_none());
    /// ```
    #[inline]
    pub fn into_outcome(self) -> Option<Result<Value, Error>> {
        match self {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value)),
            State::Rejected(error) => Some(Err(error)),
        }
    }

    /// Maps the settled value, leaving `Pending` and `Rejected` untouched.
    #[inline]
    pub fn map_fulfilled<F>(self, f: F) -> State
    where
        F: FnOnce(Value) -> Value,
    {
        match self {
            State::Fulfilled(value) => State::Fulfilled(f(value)),
            other => other,
        }
    }
}
