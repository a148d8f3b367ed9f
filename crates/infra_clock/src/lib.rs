use anyhow::{bail, Result};
use chrono::{DateTime, TimeDelta, Utc};
use core_types::CycleWindow;
use parking_lot::RwLock;

/// Cycle index 0 starts at 2025-07-14T00:00:00Z.
pub const CYCLE_START_EPOCH_SECS: i64 = 1_752_451_200;
pub const CYCLE_DAYS: i64 = 15;

pub fn default_cycle_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(CYCLE_START_EPOCH_SECS)
}

pub trait Clock: Send + Sync {
    fn utc_now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn utc_now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Maps wall-clock instants onto fixed-length UTC accounting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleCalculator {
    epoch: DateTime<Utc>,
    cycle: TimeDelta,
}

impl Default for CycleCalculator {
    fn default() -> Self {
        Self {
            epoch: default_cycle_epoch(),
            cycle: TimeDelta::days(CYCLE_DAYS),
        }
    }
}

impl CycleCalculator {
    pub fn new(epoch: DateTime<Utc>, cycle: TimeDelta) -> Result<Self> {
        if cycle < TimeDelta::seconds(1) {
            bail!("cycle length must be at least one second, got {cycle}");
        }
        Ok(Self { epoch, cycle })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn cycle(&self) -> TimeDelta {
        self.cycle
    }

    pub fn compute_current_window(&self, now: DateTime<Utc>) -> CycleWindow {
        let cycle_ms = self.cycle.num_milliseconds();
        let index = floor_millis(now - self.epoch).div_euclid(cycle_ms);
        let start = self.epoch + TimeDelta::milliseconds(index * cycle_ms);
        self.window_from_start(start)
    }

    pub fn compute_previous_window(&self, now: DateTime<Utc>) -> CycleWindow {
        let current = self.compute_current_window(now);
        self.window_from_start(current.start - self.cycle)
    }

    fn window_from_start(&self, start: DateTime<Utc>) -> CycleWindow {
        let next_start = start + self.cycle;
        CycleWindow {
            start,
            next_start,
            end_inclusive: next_start - TimeDelta::seconds(1),
        }
    }
}

// `num_milliseconds` truncates toward zero; sub-millisecond remainders before
// the epoch must still land in the earlier cycle.
fn floor_millis(delta: TimeDelta) -> i64 {
    let ms = delta.num_milliseconds();
    if delta < TimeDelta::milliseconds(ms) {
        ms - 1
    } else {
        ms
    }
}
