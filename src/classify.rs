//! Classification of raw values.
//!
//! The order of the checks is fixed. In particular a value that is both iterable
//! and thenable is a [`Class::Sequence`]: its `then` member stays an ordinary member.

use crate::value::Value;

/// How the entry routine treats a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    /// Invocable; invocation is intercepted.
    Callable,
    /// Absent or not compound; passed through unwrapped.
    Primitive,
    /// Iterable; scanned for pending elements.
    Sequence,
    /// A pending handle or a thenable.
    Deferred,
    /// Any other compound value; member access is intercepted.
    Container,
}

/// Classifies `value`, first match wins.
///
/// ```rust
/// use chainwrap::{classify, Class, Deferred, Value};
///
/// assert_eq!(classify(&Value::from(1)), Class::Primitive);
/// assert_eq!(classify(&Value::array([])), Class::Sequence);
/// assert_eq!(classify(&Deferred::resolved(1).into()), Class::Deferred);
/// assert_eq!(classify(&Value::object([("a", Value::Null)])), Class::Container);
/// ```
pub fn classify(value: &Value) -> Class {
    if matches!(value, Value::Function(_)) {
        Class::Callable
    } else if !value.is_compound() {
        Class::Primitive
    } else if value.is_iterable() {
        Class::Sequence
    } else if value.is_pending_like() {
        Class::Deferred
    } else {
        Class::Container
    }
}

/// Classifies a value a handle settled to.
///
/// Settlements are already flattened, so pending-ness is not checked again.
pub fn classify_settled(value: &Value) -> Class {
    match classify(value) {
        Class::Deferred => Class::Container,
        class => class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        value::{Function, ITERATOR_KEY},
        Deferred,
    };

    fn noop(name: &str) -> Value {
        Value::function(name, |_, _| Ok(Value::Undefined))
    }

    #[test]
    fn test_primitives() {
        for value in [
            Value::Undefined,
            Value::Null,
            Value::Bool(false),
            Value::from(0),
            Value::from(""),
        ] {
            assert_eq!(classify(&value), Class::Primitive);
        }
    }

    #[test]
    fn test_callable_wins_over_other_capabilities() {
        let f = Function::new("f", |_, _| Ok(Value::Undefined))
            .with_property("then", noop("then"))
            .with_property(ITERATOR_KEY, noop("iterate"));
        assert_eq!(classify(&Value::Function(f)), Class::Callable);
    }

    #[test]
    fn test_sequence_wins_over_deferred() {
        let both = Value::object([(ITERATOR_KEY, noop("iterate")), ("then", noop("then"))]);
        assert_eq!(classify(&both), Class::Sequence);
    }

    #[test]
    fn test_thenable_is_deferred() {
        assert_eq!(classify(&Value::object([("then", noop("then"))])), Class::Deferred);
        assert_eq!(classify(&Value::object([("then", Value::from(1))])), Class::Container);
    }

    #[test]
    fn test_settled_never_deferred() {
        let thenable = Value::object([("then", noop("then"))]);
        assert_eq!(classify_settled(&thenable), Class::Container);
        assert_eq!(classify_settled(&Deferred::resolved(1).into()), Class::Container);
        assert_eq!(classify_settled(&Value::array([])), Class::Sequence);
    }
}
