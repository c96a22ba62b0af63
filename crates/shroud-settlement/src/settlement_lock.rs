//! Non-reentrant settlement lock.
//!
//! Held for the whole of a balance-moving operation. A token ledger that
//! calls back into the engine mid-transfer finds the lock held and is
//! rejected with [`ShroudError::Reentrancy`].

use shroud_types::{Result, ShroudError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementLock {
    held: bool,
}

impl SettlementLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Acquire the lock.
    ///
    /// # Errors
    /// [`ShroudError::Reentrancy`] if already held.
    pub fn enter(&mut self) -> Result<()> {
        if self.held {
            tracing::warn!("reentrant settlement rejected");
            return Err(ShroudError::Reentrancy);
        }
        self.held = true;
        Ok(())
    }

    pub fn exit(&mut self) {
        self.held = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_released() {
        let lock = SettlementLock::new();
        assert!(!lock.is_held());
    }

    #[test]
    fn enter_exit_cycle() {
        let mut lock = SettlementLock::new();
        lock.enter().unwrap();
        assert!(lock.is_held());
        lock.exit();
        assert!(!lock.is_held());
        lock.enter().unwrap();
    }

    #[test]
    fn double_enter_rejected() {
        let mut lock = SettlementLock::new();
        lock.enter().unwrap();
        let err = lock.enter().unwrap_err();
        assert!(matches!(err, ShroudError::Reentrancy));
        assert!(lock.is_held());
    }
}
