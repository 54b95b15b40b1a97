use std::{fmt, rc::Rc};

use super::{Object, Value};
use crate::error::Error;

type Body = dyn Fn(&Value, &[Value]) -> Result<Value, Error>;

/// A native callable value.
///
/// The body receives the receiver it was invoked under and the call arguments.
/// [`Function::bind`] fixes the receiver, the way a method read off a value keeps
/// pointing at that value.
///
/// ```rust
/// use chainwrap::{Function, Value};
///
/// let greet = Function::new("greet", |this, _| Ok(this.get("name")?));
/// let ada = Value::object([("name", Value::from("ada"))]);
///
/// let bound = greet.bind(ada);
/// assert_eq!(bound.invoke(vec![]).unwrap(), Value::from("ada"));
/// ```
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    body: Rc<Body>,
    receiver: Option<Rc<Value>>,
    properties: Object,
}

impl Function {
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, Error> + 'static,
    {
        Function {
            name: name.into(),
            body: Rc::new(body),
            receiver: None,
            properties: Object::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches an own property, readable through [`Value::get`].
    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name, value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Returns a copy invoked under `receiver`.
    ///
    /// Binding an already bound function keeps the first receiver.
    pub fn bind(&self, receiver: Value) -> Function {
        let mut bound = self.clone();
        if bound.receiver.is_none() {
            bound.receiver = Some(Rc::new(receiver));
        }
        bound
    }

    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_deref()
    }

    /// Invokes under the bound receiver, or `undefined` when unbound.
    pub fn invoke(&self, args: Vec<Value>) -> Result<Value, Error> {
        self.call(Value::Undefined, args)
    }

    /// Invokes under `receiver` unless a receiver is already bound.
    pub fn call(&self, receiver: Value, args: Vec<Value>) -> Result<Value, Error> {
        match &self.receiver {
            Some(bound) => (self.body)(bound, &args),
            None => (self.body)(&receiver, &args),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && self.receiver == other.receiver
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}
