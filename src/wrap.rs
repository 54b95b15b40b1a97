//! The entry routine and the union it returns.
//!
//! [`wrap`] classifies a value and hands it to the matching wrapper. Every wrapper
//! passes its results back through here, so pending-ness and callability survive
//! chains of any length.

use crate::{
    classify::{classify, classify_settled, Class},
    error::Error,
    value::Value,
    wrapper::{sequence, CallableWrapper, ContainerWrapper, DeferredWrapper},
};

/// A value as seen through the wrapper.
///
/// Interact with it through [`Wrapped::get`], [`Wrapped::call`] and [`Wrapped::set`];
/// each variant decides which of them it intercepts.
#[derive(Debug, Clone)]
pub enum Wrapped {
    /// A primitive, or a raw member read off a callable. Nothing is intercepted.
    Plain(Value),
    /// Invocation is intercepted.
    Callable(CallableWrapper),
    /// Member access is intercepted.
    Container(ContainerWrapper),
    /// Member access and invocation go through the pending computation.
    Deferred(DeferredWrapper),
}

/// Wraps any value for transparent chaining.
///
/// Primitives come back as [`Wrapped::Plain`]. Callables, containers, sequences
/// and pending values come back as the wrapper for their class.
///
/// ```rust
/// use chainwrap::{settle_blocking, wrap, Deferred, Value};
///
/// let profile = Value::object([("name", Value::from("ada"))]);
/// let user = Value::object([("profile", Deferred::resolved(profile).into())]);
///
/// let name = wrap(Deferred::resolved(user)).get("profile")?.get("name")?;
/// assert!(name.is_deferred());
/// assert_eq!(settle_blocking(name)?, Value::from("ada"));
/// # Ok::<(), chainwrap::Error>(())
/// ```
pub fn wrap(value: impl Into<Value>) -> Wrapped {
    let value = value.into();
    let class = classify(&value);
    tracing::trace!(?class, "wrapping value");
    dispatch(value, class)
}

/// Wraps a value a handle settled to, without checking for pending-ness again.
pub(crate) fn wrap_settled(value: Value) -> Wrapped {
    let class = classify_settled(&value);
    tracing::trace!(?class, "wrapping settled value");
    dispatch(value, class)
}

fn dispatch(value: Value, class: Class) -> Wrapped {
    match class {
        Class::Callable => Wrapped::Callable(CallableWrapper::new(value)),
        Class::Primitive => Wrapped::Plain(value),
        Class::Sequence => sequence::aggregate(value),
        Class::Deferred => Wrapped::Deferred(DeferredWrapper::from_value(value)),
        Class::Container => Wrapped::Container(ContainerWrapper::new(value)),
    }
}

impl Wrapped {
    /// Reads member `name`.
    ///
    /// Plain values and callables answer with the raw member. Containers wrap it.
    /// Pending values answer with a new pending value, so this only fails
    /// synchronously for plain `undefined` and `null`.
    pub fn get(&self, name: &str) -> Result<Wrapped, Error> {
        match self {
            Wrapped::Plain(value) => value.get(name).map(Wrapped::Plain),
            Wrapped::Callable(callable) => callable.get(name).map(Wrapped::Plain),
            Wrapped::Container(container) => container.get(name),
            Wrapped::Deferred(deferred) => Ok(deferred.get(name)),
        }
    }

    /// Invokes the value with `args`.
    pub fn call(&self, args: Vec<Value>) -> Result<Wrapped, Error> {
        match self {
            Wrapped::Plain(value) => value.call(args).map(Wrapped::Plain),
            Wrapped::Callable(callable) => callable.call(args),
            Wrapped::Container(container) => container.call(args),
            Wrapped::Deferred(deferred) => Ok(deferred.call(args)),
        }
    }

    /// Writes member `name`.
    ///
    /// Wrappers accept every write and report success without mutating anything.
    /// Plain values are not writable and report `false`.
    pub fn set(&self, name: &str, value: Value) -> bool {
        match self {
            Wrapped::Plain(_) => false,
            Wrapped::Callable(callable) => callable.set(name, value),
            Wrapped::Container(container) => container.set(name, value),
            Wrapped::Deferred(deferred) => deferred.set(name, value),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Wrapped::Deferred(_))
    }

    /// The raw value behind a settled wrapper; `None` for pending ones.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Wrapped::Plain(value) => Some(value),
            Wrapped::Callable(callable) => Some(callable.target()),
            Wrapped::Container(container) => Some(container.target()),
            Wrapped::Deferred(_) => None,
        }
    }

    /// Waits for a pending wrapper to settle; any other wrapper is returned as is.
    pub async fn settle(self) -> Result<Wrapped, Error> {
        match self {
            Wrapped::Deferred(deferred) => deferred.await,
            settled => Ok(settled),
        }
    }
}

impl From<Wrapped> for Value {
    fn from(wrapped: Wrapped) -> Self {
        match wrapped {
            Wrapped::Plain(value) => value,
            Wrapped::Callable(callable) => callable.into_target(),
            Wrapped::Container(container) => container.into_target(),
            Wrapped::Deferred(deferred) => deferred.into(),
        }
    }
}

/// Structural comparison of settled wrappers; pending wrappers never compare equal.
impl PartialEq for Wrapped {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_value(), other.as_value()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<Value> for Wrapped {
    fn eq(&self, other: &Value) -> bool {
        self.as_value() == Some(other)
    }
}
