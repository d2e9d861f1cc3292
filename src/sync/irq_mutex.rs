// src/sync/irq_mutex.rs

//! Interrupt-safe spin mutex
//!
//! On a single core, a spin lock shared with an interrupt handler deadlocks
//! as soon as the handler fires while mainline code holds the lock. Every
//! acquisition here therefore happens inside
//! [`InterruptController::without_interrupts`]: mainline code can never be
//! preempted while it holds the lock, and a handler that takes the lock
//! always finds it free.

use core::fmt;
use core::marker::PhantomData;

use spin::Mutex;

use super::interrupt::InterruptController;

/// Spin mutex whose lock is only ever taken with interrupts disabled
pub struct IrqMutex<T, C> {
    inner: Mutex<T>,
    _controller: PhantomData<fn() -> C>,
}

impl<T, C> IrqMutex<T, C> {
    /// Wrap `value`; usable in `static` items.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            _controller: PhantomData,
        }
    }

    /// Consume the mutex and return the protected value
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    /// Whether the lock is currently held (diagnostics only)
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

impl<T, C: InterruptController> IrqMutex<T, C> {
    /// Run `f` with exclusive access, interrupts disabled for the duration
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        C::without_interrupts(|| {
            let mut guard = self.inner.lock();
            f(&mut guard)
        })
    }

    /// Like [`with`](Self::with), but gives up instead of spinning.
    ///
    /// Interrupt handlers should prefer this: if the lock is somehow held
    /// (e.g. by a handler on another vector) the event is dropped rather than
    /// spinning forever with interrupts off.
    pub fn try_with<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        C::without_interrupts(|| self.inner.try_lock().map(|mut guard| f(&mut guard)))
    }
}

impl<T, C> fmt::Debug for IrqMutex<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqMutex")
            .field("locked", &self.inner.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    static MASKED: AtomicUsize = AtomicUsize::new(0);

    struct CountingController;

    impl InterruptController for CountingController {
        fn without_interrupts<F, R>(f: F) -> R
        where
            F: FnOnce() -> R,
        {
            MASKED.fetch_add(1, Ordering::SeqCst);
            f()
        }
    }

    #[test]
    fn test_with_masks_interrupts() {
        let cell: IrqMutex<u32, CountingController> = IrqMutex::new(1);
        let before = MASKED.load(Ordering::SeqCst);

        let doubled = cell.with(|v| {
            *v *= 2;
            *v
        });

        assert_eq!(doubled, 2);
        assert!(MASKED.load(Ordering::SeqCst) > before);
        assert!(!cell.is_locked());
    }

    #[test]
    fn test_try_with_fails_while_held() {
        let cell: IrqMutex<u32, CountingController> = IrqMutex::new(7);
        let nested = cell.with(|_| cell.try_with(|v| *v));
        assert_eq!(nested, None);
        assert_eq!(cell.try_with(|v| *v), Some(7));
    }
}
