//! Thread-local run queue for continuation jobs.
//!
//! Jobs run in the order they were enqueued. The first caller to enqueue drains
//! the queue before returning; jobs enqueued while draining are appended and run
//! by that same drain, so continuations never recurse into each other.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

pub(crate) type Job = Box<dyn FnOnce()>;

thread_local! {
    static JOBS: RefCell<VecDeque<Job>> = RefCell::new(VecDeque::new());
    static DRAINING: Cell<bool> = const { Cell::new(false) };
}

/// Resets the draining flag even if a job unwinds.
struct Draining;

impl Drop for Draining {
    fn drop(&mut self) {
        DRAINING.with(|draining| draining.set(false));
    }
}

/// Runs `job` after every job enqueued before it.
pub(crate) fn enqueue(job: Job) {
    JOBS.with(|jobs| jobs.borrow_mut().push_back(job));
    if DRAINING.with(|draining| draining.replace(true)) {
        return;
    }

    let _draining = Draining;
    while let Some(job) = JOBS.with(|jobs| jobs.borrow_mut().pop_front()) {
        job();
    }
}
