//! One in-flight read per endpoint
//!
//! A second read on an endpoint that is already being read fails fast
//! instead of queueing behind the first one. Entries only live while a read
//! holds them, so arbitrary request-supplied addresses do not accumulate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Per-address exclusivity
#[derive(Debug, Default)]
pub struct EndpointLocks {
    locks: LockMap,
}

/// Held while an endpoint is being read; released on drop
#[derive(Debug)]
pub struct EndpointGuard {
    address: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl EndpointGuard {
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Drop for EndpointGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map still refers to the lock: nobody is reading or waiting
        if locks
            .get(&self.address)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.address);
        }
    }
}

impl EndpointLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `address`, or `None` if another read holds it
    pub fn try_acquire(&self, address: &str) -> Option<EndpointGuard> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(address.to_string()).or_default().clone()
        };
        let guard = lock.try_lock_owned().ok()?;
        Some(EndpointGuard {
            address: address.to_string(),
            guard: Some(guard),
            locks: self.locks.clone(),
        })
    }

    /// Whether a read on `address` is in flight
    pub fn is_busy(&self, address: &str) -> bool {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.get(address).is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of addresses currently tracked
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_fails_until_release() {
        let locks = EndpointLocks::new();

        let first = locks.try_acquire("COM3").unwrap();
        assert_eq!(first.address(), "COM3");
        assert!(locks.try_acquire("COM3").is_none());
        assert!(locks.is_busy("COM3"));

        drop(first);
        assert!(!locks.is_busy("COM3"));
        assert!(locks.try_acquire("COM3").is_some());
    }

    #[test]
    fn test_addresses_are_independent() {
        let locks = EndpointLocks::new();
        let _a = locks.try_acquire("/dev/ttyUSB0").unwrap();
        assert!(locks.try_acquire("/dev/ttyUSB1").is_some());
        assert!(!locks.is_busy("/dev/ttyACM0"));
    }

    #[test]
    fn test_released_addresses_are_forgotten() {
        let locks = EndpointLocks::new();
        for i in 0..100 {
            let guard = locks.try_acquire(&format!("/dev/ttyFAKE{}", i)).unwrap();
            assert_eq!(locks.tracked(), 1);
            drop(guard);
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn test_rejected_claim_keeps_holder_entry() {
        let locks = EndpointLocks::new();
        let held = locks.try_acquire("COM3").unwrap();

        assert!(locks.try_acquire("COM3").is_none());
        assert_eq!(locks.tracked(), 1);
        assert!(locks.is_busy("COM3"));

        drop(held);
        assert_eq!(locks.tracked(), 0);
    }
}
