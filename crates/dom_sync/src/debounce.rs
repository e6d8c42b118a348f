//! Trailing-edge debouncing on the local task set.
//!
//! A [`Debouncer`] is a clonable handle. Each `invoke` (re)arms a single timer
//! task carrying the latest argument; when the timer fires the same task runs
//! the work. Tasks only hold a weak reference back to the debouncer, so once
//! the last handle is dropped every pending and running task is aborted.

use core::cell::RefCell;
use core::fmt;
use core::future::Future;
use core::time::Duration;
use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use log::trace;
use std::rc::{Rc, Weak};
use tokio::task::{AbortHandle, spawn_local};
use tokio::time::sleep;

type Work<T> = Rc<dyn Fn(T) -> LocalBoxFuture<'static, ()>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DebounceState {
    /// Nothing armed and nothing running.
    Idle,
    /// A timer is armed; the latest argument is held by it.
    Pending,
    /// The work is executing and no newer timer is armed.
    Running,
}

#[derive(Debug)]
struct Task {
    id: u64,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
struct Slots {
    next_id: u64,
    pending: Option<Task>,
    running: Vec<Task>,
}

impl Slots {
    fn abort_all(&mut self) {
        if let Some(task) = self.pending.take() {
            task.handle.abort();
        }
        for task in self.running.drain(..) {
            task.handle.abort();
        }
    }
}

struct Shared<T> {
    wait: Duration,
    work: Work<T>,
    slots: RefCell<Slots>,
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        self.slots.get_mut().abort_all();
    }
}

pub struct Debouncer<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Debouncer")
            .field("wait", &self.shared.wait)
            .field("state", &self.state())
            .finish()
    }
}

impl<T> Debouncer<T> {
    pub fn wait(&self) -> Duration {
        self.shared.wait
    }

    pub fn state(&self) -> DebounceState {
        let slots = self.shared.slots.borrow();
        if slots.pending.is_some() {
            DebounceState::Pending
        } else if slots.running.is_empty() {
            DebounceState::Idle
        } else {
            DebounceState::Running
        }
    }

    /// Drop the armed timer and abort any run in flight. Idempotent.
    pub fn cancel(&self) {
        self.shared.slots.borrow_mut().abort_all();
    }
}

impl<T: 'static> Debouncer<T> {
    pub fn new<F, Fut>(wait: Duration, work: F) -> Self
    where
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let work: Work<T> = Rc::new(move |arg| work(arg).boxed_local());
        Self {
            shared: Rc::new(Shared {
                wait,
                work,
                slots: RefCell::new(Slots::default()),
            }),
        }
    }

    /// Arm (or re-arm) the timer with `arg`. A run that is already executing
    /// is left alone; the new timer fires independently of it.
    pub fn invoke(&self, arg: T) {
        let weak = Rc::downgrade(&self.shared);
        let mut slots = self.shared.slots.borrow_mut();
        if let Some(previous) = slots.pending.take() {
            previous.handle.abort();
        }
        let id = slots.next_id;
        slots.next_id = slots.next_id.wrapping_add(1);
        let handle = spawn_local(fire(weak, id, arg)).abort_handle();
        slots.pending = Some(Task { id, handle });
    }
}

async fn fire<T: 'static>(weak: Weak<Shared<T>>, id: u64, arg: T) {
    let Some(wait) = weak.upgrade().map(|shared| shared.wait) else {
        return;
    };
    sleep(wait).await;

    let Some(shared) = weak.upgrade() else {
        return;
    };
    if Rc::strong_count(&shared) == 1 {
        // Every handle is gone; dropping `shared` aborts this task.
        return;
    }
    let started = {
        let mut slots = shared.slots.borrow_mut();
        match slots.pending.take() {
            Some(task) if task.id == id => {
                slots.running.push(task);
                true
            }
            other => {
                // Superseded between the timer firing and this poll.
                slots.pending = other;
                false
            }
        }
    };
    if !started {
        return;
    }
    let work = Rc::clone(&shared.work);
    drop(shared);
    let run = work(arg);
    trace!("debounced run {id} started");
    run.await;

    if let Some(shared) = weak.upgrade() {
        shared.slots.borrow_mut().running.retain(|task| task.id != id);
    }
}
