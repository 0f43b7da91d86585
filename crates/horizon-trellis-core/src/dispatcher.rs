//! The dispatch thread executor.
//!
//! All widget mutation runs on a single owning thread, the *dispatch
//! thread*. A [`Dispatcher`] is the queue feeding that thread: any thread
//! may [`post`](Dispatcher::post) a closure, and the owning thread drains
//! the queue with [`run_pending`](Dispatcher::run_pending) or
//! [`run`](Dispatcher::run). One-shot timers ride the same queue via
//! [`post_delayed`](Dispatcher::post_delayed).
//!
//! # Proof of thread
//!
//! Operations that must only run on the dispatch thread take a
//! [`DispatchToken`] argument. A token can only be minted on the owning
//! thread ([`Dispatcher::token`]) and is not `Send`, so holding one *is*
//! proof of being on that thread. Closures handed to `post` receive a
//! token when they run.
//!
//! # Ordering
//!
//! Closures posted from one thread run in FIFO order. Closures posted from
//! different threads are unordered relative to each other, but each runs
//! to completion before the next begins.
//!
//! # Example
//!
//! ```
//! use horizon_trellis_core::Dispatcher;
//!
//! let dispatcher = Dispatcher::new();
//! let token = dispatcher.token();
//!
//! dispatcher.post(|_token| println!("ran on the dispatch thread")).unwrap();
//! dispatcher.run_pending(&token);
//! ```

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use slotmap::{SlotMap, new_key_type};

use crate::error::{DispatchError, TimerError};

new_key_type! {
    /// A unique identifier for a pending one-shot timer.
    pub struct TimerId;
}

/// A closure queued for execution on the dispatch thread.
pub type Invocation = Box<dyn FnOnce(&DispatchToken) + Send + 'static>;

/// Proof that the current thread is a dispatcher's owning thread.
///
/// Not `Send` and not constructible outside this module, so a `&DispatchToken`
/// parameter statically restricts a function to the dispatch thread.
pub struct DispatchToken {
    _not_send: PhantomData<*const ()>,
}

impl std::fmt::Debug for DispatchToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DispatchToken")
    }
}

/// Internal one-shot timer record.
struct TimerData {
    fire_at: Instant,
    /// Taken when the timer fires; `None` after firing.
    callback: Option<Invocation>,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

struct DispatchState {
    queue: VecDeque<Invocation>,
    timers: SlotMap<TimerId, TimerData>,
    timer_queue: BinaryHeap<TimerQueueEntry>,
    stopped: bool,
}

struct DispatcherInner {
    owner: ThreadId,
    state: Mutex<DispatchState>,
    wakeup: Condvar,
}

/// The queue feeding a dispatch thread.
///
/// `Dispatcher` is cheaply cloneable; all clones share the same queue and
/// owning thread. The thread that calls [`Dispatcher::new`] becomes the
/// owner.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher owned by the current thread.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                owner: std::thread::current().id(),
                state: Mutex::new(DispatchState {
                    queue: VecDeque::new(),
                    timers: SlotMap::with_key(),
                    timer_queue: BinaryHeap::new(),
                    stopped: false,
                }),
                wakeup: Condvar::new(),
            }),
        }
    }

    /// Returns `true` if the current thread is the owning thread.
    pub fn is_owning_thread(&self) -> bool {
        std::thread::current().id() == self.inner.owner
    }

    /// Mint a proof-of-thread token.
    ///
    /// # Panics
    ///
    /// Panics if called from any thread other than the owning thread.
    pub fn token(&self) -> DispatchToken {
        match self.try_token() {
            Ok(token) => token,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mint a proof-of-thread token, or report which contract was broken.
    pub fn try_token(&self) -> Result<DispatchToken, DispatchError> {
        if self.is_owning_thread() {
            Ok(DispatchToken {
                _not_send: PhantomData,
            })
        } else {
            Err(DispatchError::WrongThread)
        }
    }

    /// Queue a closure to run on the dispatch thread.
    ///
    /// Returns [`DispatchError::Stopped`] if the dispatcher has been
    /// stopped; the closure is dropped in that case.
    pub fn post<F>(&self, f: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&DispatchToken) + Send + 'static,
    {
        let mut state = self.inner.state.lock();
        if state.stopped {
            return Err(DispatchError::Stopped);
        }
        state.queue.push_back(Box::new(f));
        drop(state);
        self.inner.wakeup.notify_one();
        Ok(())
    }

    /// Queue a closure to run on the dispatch thread after `delay`.
    ///
    /// Returns a [`TimerId`] usable with [`cancel_timer`](Self::cancel_timer).
    pub fn post_delayed<F>(&self, delay: Duration, f: F) -> Result<TimerId, DispatchError>
    where
        F: FnOnce(&DispatchToken) + Send + 'static,
    {
        let fire_at = Instant::now() + delay;
        let mut state = self.inner.state.lock();
        if state.stopped {
            return Err(DispatchError::Stopped);
        }
        let id = state.timers.insert(TimerData {
            fire_at,
            callback: Some(Box::new(f)),
        });
        state.timer_queue.push(TimerQueueEntry {
            id,
            fire_time: fire_at,
        });
        drop(state);
        self.inner.wakeup.notify_one();
        Ok(id)
    }

    /// Cancel a pending one-shot timer.
    ///
    /// Canceling a timer that already fired (or never existed) returns
    /// [`TimerError::InvalidTimerId`]; callers that treat late cancelation
    /// as benign can ignore the result.
    pub fn cancel_timer(&self, id: TimerId) -> Result<(), TimerError> {
        let mut state = self.inner.state.lock();
        if state.timers.remove(id).is_some() {
            Ok(())
        } else {
            Err(TimerError::InvalidTimerId)
        }
    }

    /// Time until the earliest pending timer, if any.
    ///
    /// Returns `Duration::ZERO` for timers already due.
    pub fn time_until_next_timer(&self) -> Option<Duration> {
        let mut state = self.inner.state.lock();
        // Drop canceled entries from the front of the heap.
        while let Some(entry) = state.timer_queue.peek() {
            if state.timers.contains_key(entry.id) {
                break;
            }
            state.timer_queue.pop();
        }
        state
            .timer_queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(Instant::now()))
    }

    /// Drain all queued closures and due timers.
    ///
    /// Returns the number of invocations run. Closures posted while
    /// draining are run before this returns.
    pub fn run_pending(&self, token: &DispatchToken) -> usize {
        let mut ran = 0;
        loop {
            let Some(invocation) = self.next_due_invocation() else {
                break;
            };
            invocation(token);
            ran += 1;
        }
        ran
    }

    /// Run until [`stop`](Self::stop) is called, sleeping between work.
    pub fn run(&self, token: &DispatchToken) {
        loop {
            self.run_pending(token);

            let mut state = self.inner.state.lock();
            if state.stopped {
                return;
            }
            if !state.queue.is_empty() {
                continue;
            }
            let deadline = state.timer_queue.peek().map(|entry| entry.fire_time);
            match deadline {
                Some(deadline) => {
                    self.inner.wakeup.wait_until(&mut state, deadline);
                }
                None => {
                    self.inner.wakeup.wait(&mut state);
                }
            }
        }
    }

    /// Stop the dispatcher.
    ///
    /// Already-queued closures are discarded; subsequent `post` calls fail
    /// with [`DispatchError::Stopped`].
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        state.stopped = true;
        state.queue.clear();
        state.timers.clear();
        state.timer_queue.clear();
        drop(state);
        self.inner.wakeup.notify_all();
    }

    /// Pop the next runnable invocation: queued work first, then due timers.
    fn next_due_invocation(&self) -> Option<Invocation> {
        let now = Instant::now();
        let mut state = self.inner.state.lock();

        if let Some(invocation) = state.queue.pop_front() {
            return Some(invocation);
        }

        while let Some(entry) = state.timer_queue.peek() {
            if entry.fire_time > now {
                break;
            }
            let entry = *entry;
            state.timer_queue.pop();

            // A canceled timer leaves a stale heap entry behind.
            let Some(timer) = state.timers.get_mut(entry.id) else {
                continue;
            };
            let callback = timer.callback.take();
            state.timers.remove(entry.id);
            if let Some(callback) = callback {
                tracing::trace!(target: "horizon_trellis_core::dispatcher", id = ?entry.id, "timer fired");
                return Some(callback);
            }
        }

        None
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Dispatcher")
            .field("owner", &self.inner.owner)
            .field("queued", &state.queue.len())
            .field("timers", &state.timers.len())
            .field("stopped", &state.stopped)
            .finish()
    }
}
