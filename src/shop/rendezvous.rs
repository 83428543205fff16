use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{SimulationError, SimulationResult};

#[derive(Default)]
struct Counters {
    arrivals: usize,
    completions: usize,
    closed: bool,
}

/// Blocking handoff between the server and its clients.
///
/// Two counters with counting-semaphore semantics: a signal with nobody waiting is buffered and
/// satisfies the next wait, and each signal wakes at most one waiter. Signals carry no client
/// identity, so when several clients wait on a completion, *some* client is released per service
/// cycle, not a particular one.
///
/// [`Self::close`] is the shutdown path: it wakes every waiter and makes further waits fail with
/// [`SimulationError::ChannelClosed`].
pub struct RendezvousChannel {
    counters: Mutex<Counters>,
    arrival_cv: Condvar,
    completion_cv: Condvar,
}

impl RendezvousChannel {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            arrival_cv: Condvar::new(),
            completion_cv: Condvar::new(),
        }
    }

    /// Client side: announce one admitted customer.
    pub fn signal_arrival(&self) {
        let mut g = self.lock();
        g.arrivals += 1;
        self.arrival_cv.notify_one();
    }

    /// Server side: block until an arrival is outstanding, then consume it.
    ///
    /// Fails with [`SimulationError::ChannelClosed`] once the channel is closed, even if arrivals
    /// are still buffered.
    pub fn wait_arrival(&self) -> SimulationResult<()> {
        let mut g = self.lock();
        loop {
            if g.closed {
                return Err(SimulationError::ChannelClosed);
            }
            if g.arrivals > 0 {
                g.arrivals -= 1;
                return Ok(());
            }
            g = self
                .arrival_cv
                .wait(g)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Server side: announce one finished service.
    pub fn signal_completion(&self) {
        let mut g = self.lock();
        g.completions += 1;
        self.completion_cv.notify_one();
    }

    /// Client side: block until a completion is outstanding, then consume it.
    ///
    /// A completion buffered before [`Self::close`] is still delivered.
    pub fn wait_completion(&self) -> SimulationResult<()> {
        let mut g = self.lock();
        loop {
            if g.completions > 0 {
                g.completions -= 1;
                return Ok(());
            }
            if g.closed {
                return Err(SimulationError::ChannelClosed);
            }
            g = self
                .completion_cv
                .wait(g)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Close the channel and wake every waiter.
    pub fn close(&self) {
        let mut g = self.lock();
        g.closed = true;
        self.arrival_cv.notify_all();
        self.completion_cv.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn pending_arrivals(&self) -> usize {
        self.lock().arrivals
    }

    pub fn pending_completions(&self) -> usize {
        self.lock().completions
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RendezvousChannel {
    fn default() -> Self {
        Self::new()
    }
}
