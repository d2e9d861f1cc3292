//! Interrupt controller abstraction.

/// A trait for controlling CPU interrupts.
///
/// This trait abstracts over the hardware-specific details of enabling and
/// disabling interrupts. Implementations must restore the previous interrupt
/// state when `f` returns, so calls nest correctly.
pub trait InterruptController {
    /// Runs `f` with interrupts disabled, restoring the prior state afterwards.
    fn without_interrupts<F, R>(f: F) -> R
    where
        F: FnOnce() -> R;
}

/// Controller for hosts and tests, where there is no interrupt to mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterruptController;

impl InterruptController for NoInterruptController {
    #[inline]
    fn without_interrupts<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }
}
