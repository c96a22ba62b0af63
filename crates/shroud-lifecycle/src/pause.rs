//! Administrative circuit breaker.
//!
//! While paused, every mutating entry point of the controller fails with
//! [`ShroudError::Paused`]. Reads are unaffected and no state is lost.

use shroud_types::{Result, ShroudError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// # Errors
    /// [`ShroudError::AlreadyPaused`] if already paused.
    pub fn pause(&mut self) -> Result<()> {
        if self.paused {
            return Err(ShroudError::AlreadyPaused);
        }
        self.paused = true;
        Ok(())
    }

    /// # Errors
    /// [`ShroudError::NotPaused`] if not paused.
    pub fn unpause(&mut self) -> Result<()> {
        if !self.paused {
            return Err(ShroudError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }

    /// Gate for mutating operations.
    pub fn ensure_active(&self) -> Result<()> {
        if self.paused {
            Err(ShroudError::Paused)
        } else {
            Ok(())
        }
    }
}
