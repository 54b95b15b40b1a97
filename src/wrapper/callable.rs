use crate::{
    error::Error,
    value::Value,
    wrap::{wrap, Wrapped},
};

/// Intercepts invocation of a callable.
///
/// Member access is not intercepted: [`CallableWrapper::get`] returns the raw member.
#[derive(Debug, Clone)]
pub struct CallableWrapper {
    target: Value,
}

impl CallableWrapper {
    pub(crate) fn new(target: Value) -> Self {
        CallableWrapper { target }
    }

    /// Invokes the callable under its own receiver binding and wraps the result.
    pub fn call(&self, args: Vec<Value>) -> Result<Wrapped, Error> {
        Ok(wrap(self.target.call(args)?))
    }

    /// Reads a raw, unwrapped member of the callable.
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        self.target.get(name)
    }

    /// Accepts the write and drops it.
    pub fn set(&self, _name: &str, _value: Value) -> bool {
        true
    }

    pub fn target(&self) -> &Value {
        &self.target
    }

    pub(crate) fn into_target(self) -> Value {
        self.target
    }
}
