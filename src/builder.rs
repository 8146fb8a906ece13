// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::Error;
use crate::snowflake::{ClockBackwardPolicy, MAX_DATA_CENTER_ID, MAX_WORKER_ID, Snowflake};
use crate::time::{SystemClock, TimeSource, to_millis};
use chrono::prelude::*;
use std::{env, str::FromStr};

/// Environment variable holding the epoch in milliseconds since the Unix epoch.
pub const ENV_EPOCH_MS: &str = "IDKIT_EPOCH_MS";
/// Environment variable holding the data center id.
pub const ENV_DATA_CENTER_ID: &str = "IDKIT_DATA_CENTER_ID";
/// Environment variable holding the worker id.
pub const ENV_WORKER_ID: &str = "IDKIT_WORKER_ID";
/// Environment variable that, when set, selects [`ClockBackwardPolicy::Wait`]
/// with the given tolerance in milliseconds.
pub const ENV_MAX_CLOCK_DRIFT_MS: &str = "IDKIT_MAX_CLOCK_DRIFT_MS";

/// A builder for building the [`Snowflake`] generator.
///
/// Unset values default to the Unix epoch, data center 0, worker 0, the
/// system clock and [`ClockBackwardPolicy::Fail`].
#[derive(Debug, Clone)]
pub struct Builder<T = SystemClock> {
    epoch: i64,
    data_center_id: i64,
    worker_id: i64,
    clock_backward_policy: ClockBackwardPolicy,
    time: T,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    /// Construct a new builder for the build of [`Snowflake`].
    pub fn new() -> Self {
        Self {
            epoch: 0,
            data_center_id: 0,
            worker_id: 0,
            clock_backward_policy: ClockBackwardPolicy::Fail,
            time: SystemClock,
        }
    }

    /// Construct a builder from the `IDKIT_*` environment variables.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnvVar`] if a variable is set but can't be
    /// parsed as an integer, or if the clock drift tolerance is negative.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`from_env`], reading variables through `lookup`.
    ///
    /// [`from_env`]: Builder::from_env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new();
        if let Some(epoch) = parse_var(&lookup, ENV_EPOCH_MS)? {
            builder = builder.epoch_millis(epoch);
        }
        if let Some(data_center_id) = parse_var(&lookup, ENV_DATA_CENTER_ID)? {
            builder = builder.data_center_id(data_center_id);
        }
        if let Some(worker_id) = parse_var(&lookup, ENV_WORKER_ID)? {
            builder = builder.worker_id(worker_id);
        }
        if let Some(max_drift_ms) = parse_var::<_, i64>(&lookup, ENV_MAX_CLOCK_DRIFT_MS)? {
            if max_drift_ms < 0 {
                return Err(Error::InvalidEnvVar {
                    name: ENV_MAX_CLOCK_DRIFT_MS,
                    value: max_drift_ms.to_string(),
                });
            }
            builder = builder.clock_backward_policy(ClockBackwardPolicy::Wait { max_drift_ms });
        }
        Ok(builder)
    }
}

impl<T> Builder<T> {
    /// Set the epoch.
    /// If the time is later than the current time, `finalize` will fail.
    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.epoch = to_millis(start_time);
        self
    }

    /// Set the epoch in milliseconds since the Unix epoch.
    /// If it is negative or later than the current time, `finalize` will fail.
    pub fn epoch_millis(mut self, epoch_ms: i64) -> Self {
        self.epoch = epoch_ms;
        self
    }

    /// Set the data center ID.
    /// If it is outside `0..=31`, `finalize` will fail.
    pub fn data_center_id(mut self, data_center_id: i64) -> Self {
        self.data_center_id = data_center_id;
        self
    }

    /// Set the worker ID.
    /// If it is outside `0..=31`, `finalize` will fail.
    pub fn worker_id(mut self, worker_id: i64) -> Self {
        self.worker_id = worker_id;
        self
    }

    /// Set how the generator reacts to the clock moving backwards.
    /// A negative `max_drift_ms` never waits, so it behaves like
    /// [`ClockBackwardPolicy::Fail`].
    pub fn clock_backward_policy(mut self, policy: ClockBackwardPolicy) -> Self {
        self.clock_backward_policy = policy;
        self
    }

    /// Replace the clock the generator reads.
    pub fn time_source<U: TimeSource>(self, time: U) -> Builder<U> {
        Builder {
            epoch: self.epoch,
            data_center_id: self.data_center_id,
            worker_id: self.worker_id,
            clock_backward_policy: self.clock_backward_policy,
            time,
        }
    }
}

impl<T: TimeSource> Builder<T> {
    /// Finish building and create a Snowflake instance.
    /// This method will return an error if validation fails.
    pub fn finalize(self) -> Result<Snowflake<T>, Error> {
        if self.epoch < 0 {
            return Err(Error::EpochNegative(self.epoch));
        }

        let now = self.time.current_millis();
        if self.epoch > now {
            return Err(Error::EpochAheadOfCurrentTime {
                epoch_ms: self.epoch,
                now_ms: now,
            });
        }

        let data_center_id = match u8::try_from(self.data_center_id) {
            Ok(id) if i64::from(id) <= MAX_DATA_CENTER_ID => id,
            _ => return Err(Error::DataCenterIdOutOfRange(self.data_center_id)),
        };

        let worker_id = match u8::try_from(self.worker_id) {
            Ok(id) if i64::from(id) <= MAX_WORKER_ID => id,
            _ => return Err(Error::WorkerIdOutOfRange(self.worker_id)),
        };

        Ok(Snowflake::new_inner(
            self.epoch,
            data_center_id,
            worker_id,
            self.clock_backward_policy,
            self.time,
        ))
    }
}

fn parse_var<F, V>(lookup: &F, name: &'static str) -> Result<Option<V>, Error>
where
    F: Fn(&str) -> Option<String>,
    V: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidEnvVar { name, value }),
    }
}
