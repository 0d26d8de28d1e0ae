use jiff::Timestamp;
use std::time::Duration;

/// Shortest pause between two clock samples while waiting.
const MIN_POLL_MICROS: i64 = 20;
/// Longest pause between two clock samples while waiting.
const MAX_POLL_MICROS: i64 = 1_000;

pub trait Clock: Send + Sync {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
    /// Block and wait until the clock reaches the target time.
    fn wait_until(&self, target: Timestamp);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn wait_until(&self, target: Timestamp) {
        // re-sample after every sleep, never sleeping past 1ms at a time
        loop {
            let now = Timestamp::now();
            if now >= target {
                return;
            }
            let remaining = (target.as_microsecond() - now.as_microsecond())
                .clamp(MIN_POLL_MICROS, MAX_POLL_MICROS);
            std::thread::sleep(Duration::from_micros(remaining as u64));
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_waits_past_target() {
        let clock = SystemClock;
        let target = Timestamp::from_millisecond(clock.now().as_millisecond() + 3).unwrap();
        clock.wait_until(target);
        assert!(clock.now() >= target);
    }

    #[test]
    fn system_clock_returns_immediately_for_past_target() {
        let clock = SystemClock;
        let before = clock.now();
        clock.wait_until(Timestamp::UNIX_EPOCH);
        assert!(clock.now() >= before);
    }
}
