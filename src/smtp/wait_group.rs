//! Tracking of in-flight connection threads

use parking_lot::{Condvar, Mutex};

/// Counter of running tasks with a blocking wait for all of them to finish
pub trait TaskCounter: Send + Sync {
    fn add(&self, count: usize);
    fn done(&self);
    fn wait(&self);
}

#[derive(Debug, Default)]
pub struct WaitGroup {
    running: Mutex<usize>,
    finished: Condvar,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running(&self) -> usize {
        *self.running.lock()
    }
}

impl TaskCounter for WaitGroup {
    fn add(&self, count: usize) {
        *self.running.lock() += count;
    }

    fn done(&self) {
        let mut running = self.running.lock();
        *running = running.saturating_sub(1);
        if *running == 0 {
            self.finished.notify_all();
        }
    }

    fn wait(&self) {
        let mut running = self.running.lock();
        while *running > 0 {
            self.finished.wait(&mut running);
        }
    }
}

/// Calls [`TaskCounter::done`] when dropped, so a task is released on every
/// exit path including panics
pub struct TaskGuard<'a>(&'a dyn TaskCounter);

impl<'a> TaskGuard<'a> {
    pub fn new(counter: &'a dyn TaskCounter) -> Self {
        Self(counter)
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.0.done();
    }
}
