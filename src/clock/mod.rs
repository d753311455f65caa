// src/clock/mod.rs

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod mock;

/// Abstract source of "now", in unix seconds.
///
/// Every time-sensitive decision in the engine (windows, day boundaries,
/// expiry) reads the time through this trait so hosts and tests can drive it.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> i64;
}

/// Implementation that reads the system wall clock.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            // Clock set before 1970; treat as epoch.
            Err(_) => 0,
        }
    }
}
