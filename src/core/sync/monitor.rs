/*!
 * Monitor
 *
 * A mutex and its condition variable bundled into one value, so the
 * condition can only ever be waited on with the lock that guards its state.
 */

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Mutex-protected state plus the condition used to wait for changes to it
#[derive(Debug, Default)]
pub struct Monitor<T> {
    state: Mutex<T>,
    changed: Condvar,
}

impl<T> Monitor<T> {
    pub const fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            changed: Condvar::new(),
        }
    }

    /// Acquire the monitor lock
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock()
    }

    /// Block until `ready` yields a value, then return it
    ///
    /// The check runs under the lock before parking, so a notification sent
    /// before this call is never missed. The lock is released on return.
    pub fn wait_for<R, F>(&self, mut ready: F) -> R
    where
        F: FnMut(&T) -> Option<R>,
    {
        let mut guard = self.state.lock();
        loop {
            if let Some(value) = ready(&guard) {
                return value;
            }
            self.changed.wait(&mut guard);
        }
    }

    /// Wake every thread parked in `wait_for`
    #[inline]
    pub fn notify_all(&self) -> usize {
        self.changed.notify_all()
    }
}
