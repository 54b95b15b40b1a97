use crate::{
    error::Error,
    value::Value,
    wrap::{wrap, Wrapped},
};

/// Intercepts member access on a compound value that is neither pending nor callable.
///
/// Methods are bound to the container before being wrapped, so they keep their
/// receiver once detached. Writes are accepted and dropped.
#[derive(Debug, Clone)]
pub struct ContainerWrapper {
    target: Value,
}

impl ContainerWrapper {
    pub(crate) fn new(target: Value) -> Self {
        ContainerWrapper { target }
    }

    /// Reads member `name` and wraps it.
    pub fn get(&self, name: &str) -> Result<Wrapped, Error> {
        let member = match self.target.get(name)? {
            Value::Function(method) => Value::Function(method.bind(self.target.clone())),
            other => other,
        };
        Ok(wrap(member))
    }

    /// Containers are not invocable.
    pub fn call(&self, _args: Vec<Value>) -> Result<Wrapped, Error> {
        Err(Error::NotCallable(self.target.describe()))
    }

    /// Accepts the write and drops it; the container is never mutated.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{settle_blocking, Deferred};

    fn counter() -> Value {
        Value::object([
            ("count", Value::from(2)),
            ("nested", Value::object([("deep", Value::from(true))])),
            (
                "current",
                Value::function("current", |this, _| this.get("count")),
            ),
        ])
    }

    #[test]
    fn test_members_are_wrapped_recursively() {
        let wrapped = wrap(counter());
        for name in ["count", "nested", "missing"] {
            assert_eq!(
                wrapped.get(name).unwrap(),
                wrap(counter().get(name).unwrap())
            );
        }
        assert!(matches!(wrapped.get("nested").unwrap(), Wrapped::Container(_)));
        assert_eq!(
            wrapped.get("nested").unwrap().get("deep").unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_methods_are_bound_to_the_container() {
        let method = wrap(counter()).get("current").unwrap();
        assert!(matches!(method, Wrapped::Callable(_)));
        assert_eq!(method.call(vec![]).unwrap(), Value::from(2));
    }

    #[test]
    fn test_pending_member_is_deferred() {
        let wrapped = wrap(Value::object([("later", Deferred::resolved(5).into())]));
        let later = wrapped.get("later").unwrap();
        assert!(later.is_deferred());
        assert_eq!(settle_blocking(later).unwrap(), Value::from(5));
    }

    #[test]
    fn test_container_is_not_callable() {
        let error = wrap(counter()).call(vec![]).unwrap_err();
        assert!(matches!(error, Error::NotCallable(_)));
    }

    #[test]
    fn test_set_reports_success_without_mutating() {
        let target = counter();
        let wrapped = wrap(target.clone());
        assert!(wrapped.set("count", Value::from(100)));
        assert_eq!(wrapped.get("count").unwrap(), Value::from(2));
        assert_eq!(target.get("count").unwrap(), Value::from(2));
    }
}
