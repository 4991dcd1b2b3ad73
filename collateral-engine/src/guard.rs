//! Reentrancy guard
//!
//! Every public mutating operation holds a [`GuardToken`] for its whole
//! duration, including collaborator calls. A collaborator that calls back into
//! any mutating operation gets [`Error::ReentrancyBlocked`]. The token releases
//! the guard when dropped, on success, on error and on unwind alike.

use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Exclusive in-progress marker
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    /// Create released guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard or fail if an operation is already in progress
    pub fn enter(&self) -> Result<GuardToken<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| Error::ReentrancyBlocked)?;
        Ok(GuardToken { guard: self })
    }

    /// Whether an operation currently holds the guard
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Scoped ownership of the guard
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_entry_blocked() {
        let guard = ReentrancyGuard::new();
        let token = guard.enter().unwrap();
        assert!(guard.is_entered());
        assert!(matches!(guard.enter(), Err(Error::ReentrancyBlocked)));

        drop(token);
        assert!(!guard.is_entered());
        assert!(guard.enter().is_ok());
    }

    #[test]
    fn test_released_on_error_path() {
        let guard = ReentrancyGuard::new();
        let failing = || -> Result<()> {
            let _token = guard.enter()?;
            Err(Error::MintFailed)
        };

        assert!(failing().is_err());
        assert!(!guard.is_entered());
    }
}
