use crate::{
    clock::{Clock, SystemClock},
    error::Error,
    SnowflakeId,
};
use jiff::Timestamp;
use std::sync::Mutex;
use tracing::{trace, warn};
use typed_builder::TypedBuilder;

/// Twitter's original Snowflake epoch, 2010-11-04T01:42:54.657Z.
pub const DEFAULT_EPOCH_MILLIS: i64 = 1_288_834_974_657;

fn default_epoch() -> Timestamp {
    Timestamp::from_millisecond(DEFAULT_EPOCH_MILLIS).expect("default epoch is a valid timestamp")
}

/// Configures a Snowflake generator instance.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct SnowflakeSettings {
    /// A unique instance index in the range `[0, 1023]`.
    ///
    /// Uniqueness across cooperating instances is the operator's job; the
    /// generator only checks the range.
    #[builder]
    pub instance_id: u16,
    /// Custom epoch used as the zero point for the 41-bit timestamp field.
    #[builder(default = default_epoch())]
    pub start_epoch: Timestamp,
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_millis: Option<i64>,
    sequence: u16,
}

/// Snowflake ID generator with wait-on-overflow semantics.
///
/// Ids from one instance are strictly increasing. When the per-millisecond
/// sequence is exhausted, or the clock steps backwards, `next_id` blocks
/// until the clock has moved past the last millisecond it used.
pub struct Snowflake<C: Clock> {
    epoch_millis: i64,
    instance_id: u16,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl Snowflake<SystemClock> {
    /// Creates a generator backed by the real system clock.
    pub fn new(settings: SnowflakeSettings) -> Result<Self, Error> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> Snowflake<C> {
    /// Creates a generator backed by a custom clock.
    pub fn with_clock(settings: SnowflakeSettings, clock: C) -> Result<Self, Error> {
        if settings.instance_id > SnowflakeId::MAX_INSTANCE_ID {
            return Err(Error::InvalidInstanceId {
                instance_id: settings.instance_id,
                max_instance_id: SnowflakeId::MAX_INSTANCE_ID,
            });
        }

        let now = clock.now();
        if settings.start_epoch > now {
            return Err(Error::EpochAhead {
                epoch: settings.start_epoch,
                now,
            });
        }

        Ok(Self {
            epoch_millis: settings.start_epoch.as_millisecond(),
            instance_id: settings.instance_id,
            clock,
            state: Mutex::new(GeneratorState::default()),
        })
    }

    pub fn instance_id(&self) -> u16 {
        self.instance_id
    }

    /// Generates the next unique SnowflakeId.
    ///
    /// - if the per-millisecond sequence is exhausted, wait for the next millisecond
    /// - if the clock moves backward, wait until it catches up
    pub fn next_id(&self) -> Result<SnowflakeId, Error> {
        let mut state = self.state.lock().map_err(|_| Error::StatePoisoned)?;

        let mut now = self.clock.now().as_millisecond();

        match state.last_millis {
            None => {
                if now < self.epoch_millis {
                    self.wait_until_millis(self.epoch_millis)?;
                    now = self.clock.now().as_millisecond();
                }
                state.sequence = 0;
            }
            Some(last) => {
                if now < last {
                    // Reusing an earlier millisecond could repeat a
                    // (timestamp, sequence) pair, so hold until we're back.
                    warn!(
                        last_millis = last,
                        now_millis = now,
                        "clock moved backwards, waiting for it to catch up"
                    );
                    self.wait_until_millis(last)?;
                    now = self.clock.now().as_millisecond().max(last);
                }

                if now == last {
                    if state.sequence < SnowflakeId::MAX_SEQUENCE {
                        state.sequence += 1;
                    } else {
                        trace!(last_millis = last, "sequence exhausted, waiting for next millisecond");
                        self.wait_until_millis(last + 1)?;
                        // the clock may step back again while we wait
                        now = self.clock.now().as_millisecond().max(last + 1);
                        state.sequence = 0;
                    }
                } else {
                    state.sequence = 0;
                }
            }
        }

        let elapsed = u64::try_from(now - self.epoch_millis).map_err(|_| Error::OverTimeLimit)?;
        if elapsed > SnowflakeId::MAX_TIMESTAMP {
            return Err(Error::OverTimeLimit);
        }

        let id = SnowflakeId::from_parts(elapsed, self.instance_id, state.sequence);

        state.last_millis = Some(now);

        Ok(id)
    }

    fn wait_until_millis(&self, millis: i64) -> Result<(), Error> {
        let target = Timestamp::from_millisecond(millis).map_err(|_| Error::OverTimeLimit)?;
        self.clock.wait_until(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_clock::TestClock;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn settings(instance_id: u16) -> SnowflakeSettings {
        SnowflakeSettings::builder()
            .instance_id(instance_id)
            .start_epoch(Timestamp::UNIX_EPOCH)
            .build()
    }

    fn make_generator(instance_id: u16, clock_millis: i64) -> (Snowflake<TestClock>, TestClock) {
        let clock = TestClock::from_millis(clock_millis);
        let gen = Snowflake::with_clock(settings(instance_id), clock.clone()).unwrap();
        (gen, clock)
    }

    #[test]
    fn first_id_has_sequence_zero() {
        let (gen, _) = make_generator(0, 100);
        let id = gen.next_id().unwrap();
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn same_millisecond_increments_sequence() {
        let (gen, _) = make_generator(0, 100);
        let id0 = gen.next_id().unwrap();
        let id1 = gen.next_id().unwrap();
        let id2 = gen.next_id().unwrap();
        assert_eq!(id0.sequence(), 0);
        assert_eq!(id1.sequence(), 1);
        assert_eq!(id2.sequence(), 2);
        assert!(id0 < id1 && id1 < id2);
    }

    #[test]
    fn new_millisecond_resets_sequence() {
        let (gen, clock) = make_generator(0, 100);
        gen.next_id().unwrap();
        gen.next_id().unwrap();
        clock.set_millis(101);
        let id = gen.next_id().unwrap();
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.timestamp(), 101);
    }

    #[test]
    fn sequence_overflow_advances_clock() {
        let (gen, clock) = make_generator(0, 100);
        // Exhaust all 4096 IDs allocated to millisecond 100.
        for _ in 0..=SnowflakeId::MAX_SEQUENCE {
            gen.next_id().unwrap();
        }
        assert_eq!(clock.waits(), 0);
        // The next call must wait for millisecond 101; sequence resets to 0.
        let id = gen.next_id().unwrap();
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.timestamp(), 101);
        assert_eq!(clock.waits(), 1);
    }

    #[test]
    fn clock_regression_never_yields_smaller_id() {
        let (gen, clock) = make_generator(0, 5_000);
        let before = gen.next_id().unwrap();
        clock.set_millis(4_000);
        let after = gen.next_id().unwrap();
        assert!(after > before);
        assert_eq!(after.timestamp(), 5_000);
        assert_eq!(after.sequence(), 1);
        assert_eq!(clock.waits(), 1);
    }

    /// Steps back by `rewind` millis right after every wait.
    struct RewindingClock {
        inner: TestClock,
        rewind: i64,
    }

    impl Clock for RewindingClock {
        fn now(&self) -> Timestamp {
            self.inner.now()
        }

        fn wait_until(&self, target: Timestamp) {
            self.inner.wait_until(target);
            self.inner
                .set_millis(target.as_millisecond() - self.rewind);
        }
    }

    fn rewinding_generator(clock_millis: i64, rewind: i64) -> (Snowflake<RewindingClock>, TestClock) {
        let clock = TestClock::from_millis(clock_millis);
        let rewinding = RewindingClock {
            inner: clock.clone(),
            rewind,
        };
        let gen = Snowflake::with_clock(settings(0), rewinding).unwrap();
        (gen, clock)
    }

    #[test]
    fn clock_stepping_back_during_overflow_wait_keeps_order() {
        let (gen, clock) = rewinding_generator(100, 5);
        let mut last = gen.next_id().unwrap();
        for _ in 0..SnowflakeId::MAX_SEQUENCE {
            last = gen.next_id().unwrap();
        }
        assert_eq!(last.sequence(), SnowflakeId::MAX_SEQUENCE);

        let id = gen.next_id().unwrap();
        assert!(id > last);
        assert_eq!(id.timestamp(), 101);
        assert_eq!(id.sequence(), 0);
        assert_eq!(clock.waits(), 1);
    }

    #[test]
    fn clock_stepping_back_during_regression_wait_keeps_order() {
        let (gen, clock) = rewinding_generator(5_000, 3);
        let before = gen.next_id().unwrap();
        clock.set_millis(4_000);

        let after = gen.next_id().unwrap();
        assert!(after > before);
        assert_eq!(after.timestamp(), 5_000);
        assert_eq!(after.sequence(), 1);
    }

    #[test]
    fn instance_id_is_embedded() {
        let (gen, _) = make_generator(SnowflakeId::MAX_INSTANCE_ID, 100);
        let id = gen.next_id().unwrap();
        assert_eq!(id.instance_id(), SnowflakeId::MAX_INSTANCE_ID);
    }

    #[test]
    fn timestamp_field_reflects_elapsed_millis() {
        let clock = TestClock::from_millis(1_500);
        let settings = SnowflakeSettings::builder()
            .instance_id(0)
            .start_epoch(Timestamp::from_millisecond(1_000).unwrap())
            .build();
        let gen = Snowflake::with_clock(settings, clock).unwrap();
        assert_eq!(gen.next_id().unwrap().timestamp(), 500);
    }

    #[test]
    fn instance_id_out_of_range_is_rejected() {
        let clock = TestClock::from_millis(100);
        let result = Snowflake::with_clock(settings(1024), clock);
        assert_eq!(
            result.err(),
            Some(Error::InvalidInstanceId {
                instance_id: 1024,
                max_instance_id: 1023,
            })
        );
    }

    #[test]
    fn epoch_ahead_is_rejected() {
        let clock = TestClock::from_millis(100);
        let settings = SnowflakeSettings::builder()
            .instance_id(0)
            .start_epoch(Timestamp::from_millisecond(200).unwrap())
            .build();
        assert!(matches!(
            Snowflake::with_clock(settings, clock),
            Err(Error::EpochAhead { .. })
        ));
    }

    #[test]
    fn overtime_limit_returns_error() {
        // Place the clock one millisecond past the 41-bit timestamp limit.
        let over_limit = SnowflakeId::MAX_TIMESTAMP as i64 + 1;
        let (gen, _) = make_generator(0, over_limit);
        assert_eq!(gen.next_id(), Err(Error::OverTimeLimit));
    }

    #[test]
    fn default_epoch_is_twitter_epoch() {
        let settings = SnowflakeSettings::builder().instance_id(1).build();
        assert_eq!(settings.start_epoch.as_millisecond(), DEFAULT_EPOCH_MILLIS);
    }

    #[test]
    fn concurrent_callers_get_distinct_ids() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 625;

        let gen = Arc::new(Snowflake::new(SnowflakeSettings::builder().instance_id(1).build()).unwrap());

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| gen.next_id().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let ids = handle.join().unwrap();
            // each thread observes its own calls in arrival order
            assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
            for id in ids {
                assert!(seen.insert(id), "duplicate id {id:?}");
            }
        }
        assert_eq!(seen.len(), THREADS * PER_THREAD);
    }

    #[test]
    fn serialized_calls_are_strictly_increasing() {
        let gen = Snowflake::new(SnowflakeSettings::builder().instance_id(7).build()).unwrap();
        let ids: Vec<_> = (0..10_000).map(|_| gen.next_id().unwrap()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
