//! Audit provenance stamping.
//!
//! # Responsibility
//! - Define the current-actor and clock providers the interceptor reads.
//! - Stamp provenance on pending auditable changes before each commit.
//!
//! # Invariants
//! - Providers are injected; nothing here reads ambient global state except
//!   `SystemClock`.
//! - Provider failures surface as `ProviderError` and are never defaulted.

use crate::model::audit::{ActorId, EpochMillis};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

mod interceptor;

pub use interceptor::{AuditInterceptor, AuditSummary};

/// Failure of an injected provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub provider: &'static str,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: &'static str, message: impl Into<String>) -> Self {
        Self {
            provider,
            message: message.into(),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} provider failed: {}", self.provider, self.message)
    }
}

impl Error for ProviderError {}

/// Source of the principal on whose behalf a commit runs.
pub trait CurrentActor: Send + Sync {
    /// Returns `None` for anonymous or system contexts.
    fn actor_id(&self) -> Result<Option<ActorId>, ProviderError>;
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<EpochMillis, ProviderError>;
}

/// Wall clock in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<EpochMillis, ProviderError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| ProviderError::new("clock", err.to_string()))?;
        EpochMillis::try_from(elapsed.as_millis())
            .map_err(|err| ProviderError::new("clock", err.to_string()))
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: EpochMillis) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: EpochMillis) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: EpochMillis) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<EpochMillis, ProviderError> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

/// Actor provider for system contexts with no principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousActor;

impl CurrentActor for AnonymousActor {
    fn actor_id(&self) -> Result<Option<ActorId>, ProviderError> {
        Ok(None)
    }
}

/// Actor provider whose principal can be switched between commits.
#[derive(Debug, Default)]
pub struct ManualActor {
    actor: Mutex<Option<ActorId>>,
}

impl ManualActor {
    pub fn new(actor: Option<&str>) -> Self {
        Self {
            actor: Mutex::new(actor.map(str::to_string)),
        }
    }

    pub fn set(&self, actor: Option<&str>) {
        let mut current = self.actor.lock().unwrap_or_else(PoisonError::into_inner);
        *current = actor.map(str::to_string);
    }
}

impl CurrentActor for ManualActor {
    fn actor_id(&self) -> Result<Option<ActorId>, ProviderError> {
        let current = self
            .actor
            .lock()
            .map_err(|_| ProviderError::new("current_actor", "actor lock poisoned"))?;
        Ok(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, CurrentActor, ManualActor, ManualClock, SystemClock};

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now().unwrap(), 1_000);

        clock.advance(500);
        assert_eq!(clock.now().unwrap(), 1_500);

        clock.set(10);
        assert_eq!(clock.now().unwrap(), 10);
    }

    #[test]
    fn manual_actor_switches_principal() {
        let actor = ManualActor::new(Some("alice"));
        assert_eq!(actor.actor_id().unwrap().as_deref(), Some("alice"));

        actor.set(None);
        assert_eq!(actor.actor_id().unwrap(), None);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().unwrap() > 1_577_836_800_000);
    }
}
