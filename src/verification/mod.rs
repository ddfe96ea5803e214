//! Ephemeral verification store.
//!
//! Holds pending OTP state keyed by an identifier (the recipient email),
//! with a fixed 5-minute TTL. The store is process-memory only: entries do
//! not survive a restart, which is acceptable here — a user whose pending
//! OTP is lost simply re-requests one.
//!
//! Expiry is checked lazily at read time rather than by a background sweep,
//! so entries for keys that are never queried again live until process exit.
//! This is a documented bounded leak, sized by the number of distinct
//! checkout emails per process lifetime, not a defect.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

/// Fixed validity window for pending OTPs.
pub const OTP_TTL: Duration = Duration::from_secs(300);

/// Source of "now" for TTL arithmetic.
///
/// Injected so tests can drive expiry without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to. For tests.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.read().unwrap()
    }
}

/// A pending OTP awaiting verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp<T> {
    /// The 6-digit code the recipient must echo back.
    pub code: String,
    /// Absolute expiry timestamp.
    pub expires_at: SystemTime,
    /// Business payload committed once the code is verified.
    pub payload: T,
}

/// Why a lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpLookupError {
    /// No entry for the key (never requested, already consumed, or expired
    /// and swept by an earlier lookup).
    NotFound,
    /// An entry existed but its validity window had passed; it has been
    /// removed.
    Expired,
}

/// In-memory key → pending-OTP map.
///
/// At most one pending entry exists per key: a new `put` for the same key
/// overwrites the old entry, invalidating any previously issued code.
/// `consume` removes the entry on first call regardless of what the caller
/// then does with the code, so a failed guess burns the OTP.
pub struct OtpStore<T> {
    entries: RwLock<HashMap<String, PendingOtp<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> OtpStore<T> {
    /// Create a store with the standard 5-minute TTL.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: OTP_TTL,
            clock,
        }
    }

    /// Store a pending OTP, overwriting any existing entry for `key`.
    pub fn put(&self, key: &str, code: &str, payload: T) {
        let entry = PendingOtp {
            code: code.to_string(),
            expires_at: self.clock.now() + self.ttl,
            payload,
        };
        let mut entries = self.entries.write().unwrap();
        entries.insert(key.to_string(), entry);
    }

    /// Look up the pending OTP for `key` without consuming it.
    ///
    /// An expired entry is removed and reported as [`OtpLookupError::Expired`].
    pub fn get(&self, key: &str) -> Result<PendingOtp<T>, OtpLookupError> {
        let mut entries = self.entries.write().unwrap();
        match entries.get(key) {
            None => Err(OtpLookupError::NotFound),
            Some(entry) if entry.expires_at <= self.clock.now() => {
                entries.remove(key);
                Err(OtpLookupError::Expired)
            }
            Some(entry) => Ok(entry.clone()),
        }
    }

    /// Atomically read and delete the pending OTP for `key`.
    ///
    /// The removal and the expiry check happen under one write-lock
    /// acquisition, so two concurrent verification attempts for the same key
    /// cannot both receive the entry.
    pub fn consume(&self, key: &str) -> Result<PendingOtp<T>, OtpLookupError> {
        let mut entries = self.entries.write().unwrap();
        match entries.remove(key) {
            None => Err(OtpLookupError::NotFound),
            Some(entry) if entry.expires_at <= self.clock.now() => Err(OtpLookupError::Expired),
            Some(entry) => Ok(entry),
        }
    }

    /// Number of pending entries, including not-yet-observed expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}
