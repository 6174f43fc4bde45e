//! The latest known value of every metric.

use crate::types::{Error, Metric, Millis, Value};

/// Latest validated reading per metric, plus the time of the most recent
/// successful update.
///
/// Fields can only change through [`Snapshot::apply`], which validates the
/// value first, so every field is either zero or a value that passed its
/// range check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    co2: Value,
    pm25: Value,
    o3: Value,
    temperature: Value,
    humidity: Value,
    tvoc: Value,
    last_update: Millis,
}

impl Snapshot {
    pub const fn new() -> Self {
        Self {
            co2: 0,
            pm25: 0,
            o3: 0,
            temperature: 0,
            humidity: 0,
            tvoc: 0,
            last_update: 0,
        }
    }

    pub const fn get(&self, metric: Metric) -> Value {
        match metric {
            Metric::Co2 => self.co2,
            Metric::Pm25 => self.pm25,
            Metric::O3 => self.o3,
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::Tvoc => self.tvoc,
        }
    }

    fn field_mut(&mut self, metric: Metric) -> &mut Value {
        match metric {
            Metric::Co2 => &mut self.co2,
            Metric::Pm25 => &mut self.pm25,
            Metric::O3 => &mut self.o3,
            Metric::Temperature => &mut self.temperature,
            Metric::Humidity => &mut self.humidity,
            Metric::Tvoc => &mut self.tvoc,
        }
    }

    /// Store `value` for `metric` and stamp the snapshot with `now`.
    /// # Errors
    /// Returns [`Error::OutOfRange`] and leaves the snapshot untouched if
    /// the value fails validation.
    pub fn apply(&mut self, metric: Metric, value: Value, now: Millis) -> Result<Value, Error> {
        let value = metric.validate(value)?;
        *self.field_mut(metric) = value;
        self.last_update = now;
        Ok(value)
    }

    /// Time of the most recent successful update, 0 if there never was one.
    pub const fn last_update(&self) -> Millis {
        self.last_update
    }

    /// Milliseconds since the last successful update.
    pub const fn age(&self, now: Millis) -> Millis {
        now.saturating_sub(self.last_update)
    }
}

#[cfg(feature = "std")]
pub use shared::SharedSnapshot;

#[cfg(feature = "std")]
mod shared {
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use super::Snapshot;

    /// A [`Snapshot`] shared between the serial pipeline and the HTTP
    /// handlers. Reads and writes both take the lock, so a reader never sees
    /// a half-applied update.
    #[derive(Debug, Clone, Default)]
    pub struct SharedSnapshot(Arc<Mutex<Snapshot>>);

    impl SharedSnapshot {
        pub fn new() -> Self {
            Self::default()
        }

        /// Copy out the current state.
        pub fn read(&self) -> Snapshot {
            *self.lock()
        }

        /// Run `f` with exclusive access to the snapshot.
        pub fn update<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
            f(&mut self.lock())
        }

        fn lock(&self) -> MutexGuard<'_, Snapshot> {
            // Plain integers, a poisoned lock still holds a consistent value.
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Snapshot::new();
        assert_eq!(s, Snapshot::default());
        for metric in Metric::ALL {
            assert_eq!(s.get(metric), 0);
        }
        assert_eq!(s.last_update(), 0);
    }

    #[test]
    fn test_apply() {
        let mut s = Snapshot::new();
        assert_eq!(s.apply(Metric::Temperature, -12, 1500), Ok(-12));
        assert_eq!(s.get(Metric::Temperature), -12);
        assert_eq!(s.last_update(), 1500);
        assert_eq!(s.age(4000), 2500);
        assert_eq!(s.age(1000), 0);
    }

    #[test]
    fn test_rejected_apply_is_noop() {
        let mut s = Snapshot::new();
        s.apply(Metric::Co2, 400, 10).unwrap();
        let before = s;
        assert!(s.apply(Metric::Co2, 0, 20).is_err());
        assert!(s.apply(Metric::Humidity, 150, 30).is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn test_fields_are_independent() {
        let mut s = Snapshot::new();
        for (n, metric) in Metric::ALL.into_iter().enumerate() {
            s.apply(metric, n as Value + 1, n as Millis).unwrap();
        }
        for (n, metric) in Metric::ALL.into_iter().enumerate() {
            assert_eq!(s.get(metric), n as Value + 1);
        }
        assert_eq!(s.last_update(), 5);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_shared() {
        let shared = SharedSnapshot::new();
        let writer = shared.clone();
        std::thread::spawn(move || {
            for v in 1..=100 {
                writer.update(|s| s.apply(Metric::Pm25, v, v as Millis)).unwrap();
            }
        })
        .join()
        .unwrap();
        let s = shared.read();
        assert_eq!(s.get(Metric::Pm25), 100);
        assert_eq!(s.last_update(), 100);
    }
}
