//! Deferred handles: single-assignment slots that settle later.
//!
//! A [`Deferred`] settles exactly once, to a value or to an [`Error`], and may be
//! observed by any number of derived handles. Derived handles are built with the
//! chaining combinators [`Deferred::then`], [`Deferred::catch`] and
//! [`Deferred::finally`], or joined with [`Deferred::all`].
//!
//! Settlement always flattens: a handle never settles to another pending value.
//! Pending and thenable results are adopted until a plain value is reached.
//!
//! Continuations are scheduled when they are attached, not when a derived handle
//! is awaited. Once a handle settles its continuations run on a thread-local
//! queue in attachment order; dropping a derived handle only stops observing it.
//!
//! # Examples
//!
//! ```rust
//! use chainwrap::{Deferred, Value};
//! use futures::executor::block_on;
//!
//! let doubled = Deferred::resolved(21).then(|n| match n {
//!     Value::Number(n) => Ok(Value::from(n * 2.0)),
//!     other => Ok(other),
//! });
//! assert_eq!(block_on(async { doubled.await }).unwrap(), Value::from(42));
//! ```

use std::{
    cell::{Cell, RefCell},
    fmt,
    future::{Future, IntoFuture},
    pin::Pin,
    rc::{Rc, Weak},
    sync::{Arc, Mutex, PoisonError},
    task::{Context, Poll, Waker},
};

use futures::{
    future::{FutureExt, LocalBoxFuture},
    task::{self, ArcWake},
};

use crate::{
    error::Error,
    queue::enqueue,
    state::State,
    value::{Function, Value},
};

/// Names of the chaining combinators a pending value exposes as members.
pub const PENDING_METHODS: [&str; 3] = ["then", "catch", "finally"];

type Outcome = Result<Value, Error>;
type Continuation = Box<dyn FnOnce(Outcome)>;

/// Handle to a value that settles later.
///
/// Cloning a handle adds an observer; every clone sees the same settlement.
/// Continuations are registered on the handle when they are attached and run in
/// attachment order once it settles, whether or not anyone keeps the derived
/// handles around.
#[derive(Clone)]
pub struct Deferred {
    slot: Rc<RefCell<Slot>>,
}

struct Slot {
    outcome: Option<Outcome>,
    continuations: Vec<Continuation>,
    /// Foreign future still settling this handle, see [`Deferred::from_future`].
    source: Option<LocalBoxFuture<'static, ()>>,
    observers: Arc<Observers>,
}

/// Wakers of tasks awaiting a handle.
#[derive(Default)]
struct Observers(Mutex<Vec<Waker>>);

/// Future observing a [`Deferred`] settlement.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Settlement {
    handle: Deferred,
}

/// Settling side of [`Deferred::channel`].
///
/// Dropping it without settling fails the handle with [`Error::Abandoned`].
pub struct Settle {
    target: Option<Deferred>,
}

impl Deferred {
    fn unsettled() -> Self {
        Deferred {
            slot: Rc::new(RefCell::new(Slot {
                outcome: None,
                continuations: Vec::new(),
                source: None,
                observers: Arc::default(),
            })),
        }
    }

    /// Settles with the outcome of `future`, flattened.
    ///
    /// The future is polled right away, then again whenever it wakes a task
    /// awaiting the handle.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Outcome> + 'static,
    {
        let handle = Deferred::unsettled();
        let slot = Rc::downgrade(&handle.slot);
        let source = async move {
            let outcome = future.await;
            if let Some(slot) = Weak::upgrade(&slot) {
                Deferred { slot }.complete(outcome);
            }
        };
        handle.slot.borrow_mut().source = Some(source.boxed_local());
        handle.drive();
        handle
    }

    pub fn resolved(value: impl Into<Value>) -> Self {
        let handle = Deferred::unsettled();
        handle.resolve(value.into());
        handle
    }

    /// Settles-failure with an arbitrary reason.
    pub fn rejected(reason: impl Into<Value>) -> Self {
        Deferred::failed(Error::Rejected(reason.into()))
    }

    pub fn failed(error: Error) -> Self {
        let handle = Deferred::unsettled();
        handle.settle(Err(error));
        handle
    }

    /// A handle settled from the outside through the returned [`Settle`].
    ///
    /// ```rust
    /// use chainwrap::{Deferred, Value};
    /// use futures::executor::block_on;
    ///
    /// let (handle, settle) = Deferred::channel();
    /// assert!(handle.state().is_pending());
    ///
    /// settle.resolve("done");
    /// assert_eq!(block_on(async { handle.await }).unwrap(), Value::from("done"));
    /// ```
    pub fn channel() -> (Deferred, Settle) {
        let handle = Deferred::unsettled();
        let settle = Settle {
            target: Some(handle.clone()),
        };
        (handle, settle)
    }

    /// The handle `value` stands for.
    ///
    /// Pending values are returned as they are, thenables are assimilated and
    /// everything else becomes an already settled handle.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Pending(handle) => handle,
            other => Deferred::resolved(other),
        }
    }

    /// Continues with `on_success` once this handle settles-success.
    ///
    /// A failure passes through untouched.
    pub fn then<F>(&self, on_success: F) -> Deferred
    where
        F: FnOnce(Value) -> Outcome + 'static,
    {
        self.derive(move |outcome| outcome.and_then(on_success))
    }

    /// Continues with `on_failure` once this handle settles-failure.
    ///
    /// A success passes through untouched.
    pub fn catch<F>(&self, on_failure: F) -> Deferred
    where
        F: FnOnce(Error) -> Outcome + 'static,
    {
        self.derive(move |outcome| outcome.or_else(on_failure))
    }

    /// Runs `on_settle` once this handle settles either way.
    ///
    /// The original outcome passes through unless `on_settle` fails, in which case
    /// its failure wins. A pending result of `on_settle` is awaited first.
    pub fn finally<F>(&self, on_settle: F) -> Deferred
    where
        F: FnOnce() -> Outcome + 'static,
    {
        let derived = Deferred::unsettled();
        let target = derived.clone();
        self.subscribe(move |outcome| match on_settle() {
            Err(error) => target.settle(Err(error)),
            Ok(value) => Deferred::from_value(value).subscribe(move |settled| match settled {
                Err(error) => target.settle(Err(error)),
                Ok(_) => target.settle(outcome),
            }),
        });
        derived
    }

    /// Joins `values` into one handle settling to the array of their settlements.
    ///
    /// Order follows the input regardless of which element settles first. The
    /// first failure observed settles the join.
    pub fn all<I>(values: I) -> Deferred
    where
        I: IntoIterator<Item = Value>,
    {
        let handles: Vec<Deferred> = values.into_iter().map(Deferred::from_value).collect();
        let joined = Deferred::unsettled();
        if handles.is_empty() {
            joined.settle(Ok(Value::array([])));
            return joined;
        }

        let settled = Rc::new(RefCell::new(vec![None; handles.len()]));
        let remaining = Rc::new(Cell::new(handles.len()));
        for (index, handle) in handles.iter().enumerate() {
            let joined = joined.clone();
            let settled = settled.clone();
            let remaining = remaining.clone();
            handle.subscribe(move |outcome| match outcome {
                Err(error) => joined.settle(Err(error)),
                Ok(value) => {
                    settled.borrow_mut()[index] = Some(value);
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        let items = settled.take().into_iter().map(Option::unwrap_or_default);
                        joined.settle(Ok(Value::array(items)));
                    }
                }
            });
        }
        joined
    }

    /// Peeks at the settlement without waiting for it.
    pub fn state(&self) -> State {
        match &self.slot.borrow().outcome {
            None => State::Pending,
            Some(Ok(value)) => State::Fulfilled(value.clone()),
            Some(Err(error)) => State::Rejected(error.clone()),
        }
    }

    /// Whether both handles observe the same settlement.
    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }

    /// Native combinator `name`, bound to this handle.
    ///
    /// `then(onSuccess, onFailure)`, `catch(onFailure)` and `finally(onSettle)`
    /// take callable arguments; anything else is ignored as if absent.
    pub(crate) fn method(&self, name: &str) -> Option<Function> {
        let function = match name {
            "then" => Function::new("then", |this, args| {
                let handle = receiver(this)?;
                Ok(handle.observe(callable(args, 0), callable(args, 1)).into())
            }),
            "catch" => Function::new("catch", |this, args| {
                let handle = receiver(this)?;
                Ok(handle.observe(None, callable(args, 0)).into())
            }),
            "finally" => Function::new("finally", |this, args| {
                let handle = receiver(this)?;
                let on_settle = callable(args, 0);
                Ok(handle
                    .finally(move || match on_settle {
                        Some(on_settle) => on_settle.invoke(vec![]),
                        None => Ok(Value::Undefined),
                    })
                    .into())
            }),
            _ => return None,
        };
        Some(function.bind(Value::Pending(self.clone())))
    }

    fn observe(&self, on_success: Option<Function>, on_failure: Option<Function>) -> Deferred {
        self.derive(move |outcome| match outcome {
            Ok(value) => match on_success {
                Some(on_success) => on_success.invoke(vec![value]),
                None => Ok(value),
            },
            Err(error) => match on_failure {
                Some(on_failure) => on_failure.invoke(vec![error.reason()]),
                None => Err(error),
            },
        })
    }

    /// A new handle completed by `step` once this one settles.
    fn derive<F>(&self, step: F) -> Deferred
    where
        F: FnOnce(Outcome) -> Outcome + 'static,
    {
        let derived = Deferred::unsettled();
        let target = derived.clone();
        self.subscribe(move |outcome| target.complete(step(outcome)));
        derived
    }

    /// Registers `continuation` to run with the settlement, after every
    /// continuation attached before it.
    fn subscribe<F>(&self, continuation: F)
    where
        F: FnOnce(Outcome) + 'static,
    {
        let settled = self.slot.borrow().outcome.clone();
        match settled {
            Some(outcome) => enqueue(Box::new(move || continuation(outcome))),
            None => self.slot.borrow_mut().continuations.push(Box::new(continuation)),
        }
    }

    fn complete(&self, outcome: Outcome) {
        match outcome {
            Ok(value) => self.resolve(value),
            Err(error) => self.settle(Err(error)),
        }
    }

    /// Settles with `value`, following pending values and thenables first.
    fn resolve(&self, value: Value) {
        match value {
            Value::Pending(inner) if inner.ptr_eq(self) => {
                let cycle = Error::type_error("Chaining cycle detected for deferred value");
                self.settle(Err(cycle));
            }
            Value::Pending(inner) => {
                let target = self.clone();
                inner.subscribe(move |outcome| target.settle(outcome));
            }
            other => match other.then_member() {
                Some(then) => {
                    let target = self.clone();
                    enqueue(Box::new(move || assimilate(target, other, then)));
                }
                None => self.settle(Ok(other)),
            },
        }
    }

    /// Stores a flattened outcome and schedules every continuation. Only the first
    /// call has any effect.
    fn settle(&self, outcome: Outcome) {
        let (continuations, observers, source) = {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_some() {
                return;
            }
            slot.outcome = Some(outcome.clone());
            let continuations = std::mem::take(&mut slot.continuations);
            (continuations, slot.observers.clone(), slot.source.take())
        };
        drop(source);

        tracing::trace!(continuations = continuations.len(), "deferred value settled");
        for continuation in continuations {
            let outcome = outcome.clone();
            enqueue(Box::new(move || continuation(outcome)));
        }
        observers.wake_all();
    }

    /// Polls the foreign future settling this handle, if any.
    fn drive(&self) {
        let (source, observers) = {
            let mut slot = self.slot.borrow_mut();
            (slot.source.take(), slot.observers.clone())
        };
        let Some(mut source) = source else {
            return;
        };

        let waker = task::waker(observers);
        let mut cx = Context::from_waker(&waker);
        if source.poll_unpin(&mut cx).is_pending() {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_none() {
                slot.source = Some(source);
            }
        }
    }
}

impl IntoFuture for Deferred {
    type Output = Outcome;
    type IntoFuture = Settlement;

    fn into_future(self) -> Self::IntoFuture {
        Settlement { handle: self }
    }
}

impl IntoFuture for &Deferred {
    type Output = Outcome;
    type IntoFuture = Settlement;

    fn into_future(self) -> Self::IntoFuture {
        Settlement {
            handle: self.clone(),
        }
    }
}

impl Future for Settlement {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.handle.drive();
        let slot = self.handle.slot.borrow();
        match &slot.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                slot.observers.register(cx.waker());
                Poll::Pending
            }
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").field("state", &self.state()).finish()
    }
}

impl Observers {
    fn register(&self, waker: &Waker) {
        let mut wakers = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !wakers.iter().any(|known| known.will_wake(waker)) {
            wakers.push(waker.clone());
        }
    }

    fn wake_all(&self) {
        let wakers = std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner));
        wakers.into_iter().for_each(Waker::wake);
    }
}

impl ArcWake for Observers {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.wake_all();
    }
}

impl Settle {
    pub fn resolve(mut self, value: impl Into<Value>) {
        if let Some(target) = self.target.take() {
            target.resolve(value.into());
        }
    }

    pub fn reject(self, reason: impl Into<Value>) {
        self.fail(Error::Rejected(reason.into()));
    }

    pub fn fail(mut self, error: Error) {
        if let Some(target) = self.target.take() {
            target.settle(Err(error));
        }
    }
}

impl Drop for Settle {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            target.settle(Err(Error::Abandoned));
        }
    }
}

/// Observes a thenable by handing its `then` member a resolve and a reject callback.
///
/// Only the first callback invoked counts. A failure raised by `then` itself settles
/// the handle unless a callback already did. If both callbacks are dropped unused
/// the handle is abandoned.
fn receiver(this: &Value) -> Result<&Deferred, Error> {
    this.as_pending()
        .ok_or_else(|| Error::type_error(format!("deferred method called on {}", this.describe())))
}

fn callable(args: &[Value], index: usize) -> Option<Function> {
    match args.get(index) {
        Some(Value::Function(function)) => Some(function.clone()),
        _ => None,
    }
}

fn assimilate(target: Deferred, thenable: Value, then: Function) {
    let settle = Rc::new(RefCell::new(Some(Settle {
        target: Some(target),
    })));

    let resolve = Function::new("resolve", {
        let settle = settle.clone();
        move |_, args| {
            let unsettled = settle.borrow_mut().take();
            if let Some(settle) = unsettled {
                settle.resolve(args.first().cloned().unwrap_or_default());
            }
            Ok(Value::Undefined)
        }
    });
    let reject = Function::new("reject", {
        let settle = settle.clone();
        move |_, args| {
            let unsettled = settle.borrow_mut().take();
            if let Some(settle) = unsettled {
                settle.reject(args.first().cloned().unwrap_or_default());
            }
            Ok(Value::Undefined)
        }
    });

    if let Err(error) = then.call(thenable, vec![resolve.into(), reject.into()]) {
        let unsettled = settle.borrow_mut().take();
        if let Some(settle) = unsettled {
            settle.fail(error);
        }
    }
}
