//! Dynamic values that wrappers intercept.
//!
//! A [`Value`] is cheap to clone: compound variants share their contents through
//! reference counting and are never mutated in place.

mod array;
mod function;

use std::{collections::BTreeMap, fmt, ops::Deref, rc::Rc};

use crate::{deferred::Deferred, error::Error};

pub use array::ITERATOR_KEY;
pub(crate) use array::realize;
pub use function::Function;

/// Any value a wrapper may be handed.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Array),
    Object(Object),
    Function(Function),
    /// A computation that settles later.
    Pending(Deferred),
}

/// Ordered, multi-pass sequence of values.
#[derive(Clone, Default, PartialEq)]
pub struct Array(Rc<[Value]>);

/// Record of named members.
///
/// Cloning shares the members; [`Object::insert`] copies them first if they are shared.
#[derive(Clone, Default, PartialEq)]
pub struct Object(Rc<BTreeMap<String, Value>>);

impl Value {
    /// Builds an [`Value::Object`] from `(name, value)` pairs.
    pub fn object<K, I>(members: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(members.into_iter().collect())
    }

    /// Builds an [`Value::Array`] from its elements.
    pub fn array<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Array(items.into_iter().collect())
    }

    /// Builds a [`Value::Function`] from a native body.
    pub fn function<F>(name: &str, body: F) -> Value
    where
        F: Fn(&Value, &[Value]) -> Result<Value, Error> + 'static,
    {
        Value::Function(Function::new(name, body))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Compound values may be intercepted; everything else is a primitive.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Pending(_)
        )
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Arrays, and objects exposing a callable [`ITERATOR_KEY`] member.
    pub fn is_iterable(&self) -> bool {
        match self {
            Value::Array(_) => true,
            Value::Object(members) => {
                matches!(members.get(ITERATOR_KEY), Some(Value::Function(_)))
            }
            _ => false,
        }
    }

    /// Pending handles, and thenables: values whose `then` member is callable.
    pub fn is_pending_like(&self) -> bool {
        matches!(self, Value::Pending(_)) || self.then_member().is_some()
    }

    /// The callable `then` member of an object or function, if it has one.
    pub(crate) fn then_member(&self) -> Option<Function> {
        let then = match self {
            Value::Object(members) => members.get("then"),
            Value::Function(function) => function.property("then"),
            _ => None,
        };
        then.and_then(Value::as_function).cloned()
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_pending(&self) -> Option<&Deferred> {
        match self {
            Value::Pending(handle) => Some(handle),
            _ => None,
        }
    }

    /// Reads a member without any wrapping.
    ///
    /// Missing members read as [`Value::Undefined`]; reading from `undefined` or
    /// `null` fails with [`Error::MemberOfAbsent`]. Methods of arrays and pending
    /// handles come back bound to the value they were read from.
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        let member = match self {
            Value::Undefined => return Err(Error::member_of_absent("undefined", name)),
            Value::Null => return Err(Error::member_of_absent("null", name)),
            Value::String(s) => match name {
                "length" => Some(Value::Number(s.chars().count() as f64)),
                _ => name
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| s.chars().nth(index))
                    .map(|c| Value::from(c.to_string())),
            },
            Value::Array(items) => match name {
                "length" => Some(Value::Number(items.len() as f64)),
                _ => match name.parse::<usize>() {
                    Ok(index) => items.get(index).cloned(),
                    Err(_) => array::method(self, name).map(Value::Function),
                },
            },
            Value::Object(members) => members.get(name).cloned(),
            Value::Function(function) => match name {
                "name" => Some(Value::from(function.name())),
                _ => function.property(name).cloned(),
            },
            Value::Pending(handle) => handle.method(name).map(Value::Function),
            Value::Bool(_) | Value::Number(_) => None,
        };
        Ok(member.unwrap_or_default())
    }

    /// Invokes the value under its bound receiver, if any.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, Error> {
        match self {
            Value::Function(function) => function.invoke(args),
            other => Err(Error::NotCallable(other.describe())),
        }
    }

    /// Short rendering used in error messages: strings are quoted.
    pub fn describe(&self) -> String {
        match self {
            Value::String(s) => format!("{s:?}"),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Pending(a), Value::Pending(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => f.write_str(&items.join(",")),
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Function(function) => write!(f, "function {}", function.name()),
            Value::Pending(_) => f.write_str("[object Promise]"),
        }
    }
}

impl Array {
    /// Renders the elements separated by `separator`; `undefined` and `null` render empty.
    pub fn join(&self, separator: &str) -> String {
        self.iter()
            .map(|item| match item {
                Value::Undefined | Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl Deref for Array {
    type Target = [Value];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Array(iter.into_iter().collect())
    }
}

impl Object {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        Rc::make_mut(&mut self.0).insert(name.into(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Object(Rc::new(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        ))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }
}

impl From<Array> for Value {
    fn from(items: Array) -> Self {
        Value::Array(items)
    }
}

impl From<Object> for Value {
    fn from(members: Object) -> Self {
        Value::Object(members)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Deferred> for Value {
    fn from(handle: Deferred) -> Self {
        Value::Pending(handle)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Undefined, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_member_is_undefined() {
        let value = Value::object([("foo", Value::from("bar"))]);
        assert_eq!(value.get("foo").ok(), Some(Value::from("bar")));
        assert_eq!(value.get("baz").ok(), Some(Value::Undefined));
    }

    #[test]
    fn test_get_from_absent_fails() {
        let error = Value::Undefined.get("bar").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Cannot read properties of undefined (reading 'bar')"
        );
        assert!(Value::Null.get("bar").is_err());
    }

    #[test]
    fn test_primitive_members() {
        assert_eq!(Value::from("abc").get("length").ok(), Some(Value::from(3)));
        assert_eq!(Value::from("abc").get("1").ok(), Some(Value::from("b")));
        assert_eq!(Value::from(4).get("length").ok(), Some(Value::Undefined));
    }

    #[test]
    fn test_array_members() {
        let value = Value::array([Value::from(1), Value::from(2)]);
        assert_eq!(value.get("length").ok(), Some(Value::from(2)));
        assert_eq!(value.get("1").ok(), Some(Value::from(2)));
        assert_eq!(value.get("7").ok(), Some(Value::Undefined));
        assert!(matches!(value.get("map"), Ok(Value::Function(_))));
    }

    #[test]
    fn test_call_non_function_fails() {
        let error = Value::from("bar").call(vec![]).unwrap_err();
        assert_eq!(error.to_string(), "\"bar\" is not a function");
    }

    #[test]
    fn test_structural_equality() {
        let a = Value::object([("xs", Value::array([Value::from(1), Value::Null]))]);
        let b = Value::object([("xs", Value::array([Value::from(1), Value::Null]))]);
        assert_eq!(a, b);
        assert_ne!(a, Value::object([("xs", Value::array([]))]));
        assert_ne!(Value::Undefined, Value::Null);
    }

    #[test]
    fn test_display_matches_script_rendering() {
        assert_eq!(Value::from(2.0).to_string(), "2");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(
            Value::array([Value::from(1), Value::Undefined, Value::from("x")]).to_string(),
            "1,,x"
        );
        assert_eq!(Value::object([("a", Value::Null)]).to_string(), "[object Object]");
    }

    #[test]
    fn test_object_insert_does_not_touch_clones() {
        let mut members: Object = [("a", Value::from(1))].into_iter().collect();
        let shared = members.clone();
        members.insert("b", Value::from(2));
        assert_eq!(members.len(), 2);
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn test_capabilities() {
        let thenable = Value::object([("then", Value::function("then", |_, _| Ok(Value::Undefined)))]);
        assert!(thenable.is_pending_like());
        assert!(!thenable.is_iterable());

        let iterable = Value::object([(
            ITERATOR_KEY,
            Value::function("iter", |_, _| Ok(Value::array([]))),
        )]);
        assert!(iterable.is_iterable());
        assert!(!Value::from("abc").is_compound());
        assert!(Value::Pending(Deferred::resolved(1)).is_pending_like());
    }
}
