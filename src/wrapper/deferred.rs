use std::{fmt, future::IntoFuture, rc::Rc};

use futures::future::{FutureExt, LocalBoxFuture};

use crate::{
    deferred::{Deferred, PENDING_METHODS},
    error::Error,
    value::Value,
    wrap::{wrap, wrap_settled, Wrapped},
};

use super::CallableWrapper;

type Resolver = Rc<dyn Fn() -> Deferred>;

/// Intercepts member access and invocation on a pending value.
///
/// Every access derives a new pending value from the one the resolver yields, so
/// chains are built without waiting. The handle itself is never handed out: only
/// its native combinators are reachable, as callables.
#[derive(Clone)]
pub struct DeferredWrapper {
    resolver: Resolver,
}

impl DeferredWrapper {
    /// Wraps a resolver that yields the handle to observe on each access.
    pub(crate) fn new(resolver: Resolver) -> Self {
        DeferredWrapper { resolver }
    }

    pub(crate) fn from_handle(handle: Deferred) -> Self {
        DeferredWrapper::new(Rc::new(move || handle.clone()))
    }

    /// Wraps a pending value or a thenable.
    pub(crate) fn from_value(value: Value) -> Self {
        DeferredWrapper::from_handle(Deferred::from_value(value))
    }

    fn handle(&self) -> Deferred {
        (self.resolver)()
    }

    /// Reads member `name` once the handle settles-success.
    ///
    /// `then`, `catch` and `finally` answer immediately with the handle's own
    /// combinator. Any other name answers with a new pending value; a failure of
    /// the handle passes through to it untouched.
    pub fn get(&self, name: &str) -> Wrapped {
        let handle = self.handle();
        if PENDING_METHODS.contains(&name) {
            if let Some(method) = handle.method(name) {
                return Wrapped::Callable(CallableWrapper::new(method.into()));
            }
        }

        tracing::trace!(name, "deriving member access");
        let name = name.to_owned();
        let derived = handle.then(move |settled| Ok(wrap_settled(settled).get(&name)?.into()));
        Wrapped::Deferred(DeferredWrapper::from_handle(derived))
    }

    /// Invokes the settled value with `args` once the handle settles-success.
    pub fn call(&self, args: Vec<Value>) -> Wrapped {
        tracing::trace!(args = args.len(), "deriving invocation");
        let derived = self
            .handle()
            .then(move |callee| Ok(wrap(callee.call(args)?).into()));
        Wrapped::Deferred(DeferredWrapper::from_handle(derived))
    }

    /// Accepts the write and drops it.
    pub fn set(&self, _name: &str, _value: Value) -> bool {
        true
    }
}

impl IntoFuture for DeferredWrapper {
    type Output = Result<Wrapped, Error>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let handle = self.handle();
        async move { handle.await.map(wrap_settled) }.boxed_local()
    }
}

impl From<DeferredWrapper> for Value {
    fn from(wrapper: DeferredWrapper) -> Self {
        Value::Pending(wrapper.handle())
    }
}

impl fmt::Debug for DeferredWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredWrapper")
            .field("handle", &self.handle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use futures::executor::block_on;

    use super::*;
    use crate::settle_blocking;

    fn identity() -> Value {
        Value::function("identity", |_, args| Ok(args.first().cloned().unwrap_or_default()))
    }

    #[test]
    fn test_combinators_are_callable() {
        let wrapper = DeferredWrapper::from_handle(Deferred::resolved(1));
        for name in PENDING_METHODS {
            assert!(matches!(wrapper.get(name), Wrapped::Callable(_)), "{name}");
        }
        let then = wrapper.get("then").call(vec![identity()]).unwrap();
        assert!(then.is_deferred());
        assert_eq!(settle_blocking(then).unwrap(), Value::from(1));
    }

    #[test]
    fn test_member_access_is_derived() {
        let wrapper = DeferredWrapper::from_handle(Deferred::resolved(Value::object([(
            "a",
            Value::object([("b", Value::from("deep"))]),
        )])));
        let deep = wrapper.get("a").get("b").unwrap();
        assert!(deep.is_deferred());
        assert_eq!(settle_blocking(deep).unwrap(), Value::from("deep"));
    }

    #[test]
    fn test_failure_propagates_untouched() {
        let (handle, settle) = Deferred::channel();
        let wrapper = DeferredWrapper::from_handle(handle);
        let derived = wrapper.get("a").call(vec![]).unwrap().get("b").unwrap();
        settle.reject("original");
        assert_eq!(settle_blocking(derived).unwrap_err().reason(), Value::from("original"));
    }

    #[test]
    fn test_resolver_runs_per_access() {
        let resolved = Rc::new(Cell::new(0));
        let wrapper = DeferredWrapper::new(Rc::new({
            let resolved = resolved.clone();
            move || {
                resolved.set(resolved.get() + 1);
                Deferred::resolved(Value::object([("x", Value::from(1))]))
            }
        }));
        let _ = wrapper.get("x");
        let _ = wrapper.get("then");
        let _ = wrapper.call(vec![]);
        assert_eq!(resolved.get(), 3);
    }

    #[test]
    fn test_settled_value_is_rewrapped() {
        let f = Value::function("f", |_, _| Ok(Value::from("called")));
        let settled = settle_blocking(Wrapped::Deferred(DeferredWrapper::from_handle(
            Deferred::resolved(f),
        )))
        .unwrap();
        assert!(matches!(settled, Wrapped::Callable(_)));
        assert_eq!(settled.call(vec![]).unwrap(), Value::from("called"));
    }

    #[test]
    fn test_handle_escapes_only_as_pending_value() {
        let wrapper = DeferredWrapper::from_handle(Deferred::resolved(2));
        let handle = match Value::from(wrapper) {
            Value::Pending(handle) => handle,
            other => panic!("expected a pending value, got {other:?}"),
        };
        assert_eq!(block_on(async { handle.await }).unwrap(), Value::from(2));
    }

    #[test]
    fn test_dropped_chain_still_runs_its_callbacks() {
        let ran = Rc::new(Cell::new(false));
        let (handle, settle) = Deferred::channel();
        let observed = wrap(handle);

        let on_settle = Value::function("onSettle", {
            let ran = ran.clone();
            move |_, _| {
                ran.set(true);
                Ok(Value::Undefined)
            }
        });
        drop(observed.get("finally").unwrap().call(vec![on_settle]).unwrap());

        settle.resolve(1);
        assert!(ran.get());
        assert_eq!(settle_blocking(observed).unwrap(), Value::from(1));
    }

    #[test]
    fn test_derived_accesses_settle_in_attachment_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (handle, settle) = Deferred::channel();
        let observed = wrap(handle);
        let record = |entry: &'static str| {
            let log = log.clone();
            Value::function(entry, move |_, _| {
                log.borrow_mut().push(entry);
                Ok(Value::Undefined)
            })
        };

        let first = observed.get("then").unwrap().call(vec![record("first")]).unwrap();
        let member = observed.get("a").unwrap();
        let second = observed.get("then").unwrap().call(vec![record("second")]).unwrap();

        settle.resolve(Value::object([("a", Value::from("member"))]));
        assert_eq!(settle_blocking(second).unwrap(), Value::Undefined);
        assert_eq!(settle_blocking(member).unwrap(), Value::from("member"));
        assert_eq!(settle_blocking(first).unwrap(), Value::Undefined);
        assert_eq!(*log.borrow(), ["first", "second"]);
    }
}
