// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::Builder;
use crate::error::*;
use crate::time::{SystemClock, TimeSource};
use chrono::prelude::*;
use std::{
    fmt, hint,
    sync::{Arc, Mutex},
};

/// bit length of sequence number
pub(crate) const BIT_LEN_SEQUENCE: u64 = 12;
/// bit length of worker id
pub(crate) const BIT_LEN_WORKER_ID: u64 = 5;
/// bit length of the data center id
pub(crate) const BIT_LEN_DATA_CENTER_ID: u64 = 5;
/// bit length of time, everything below the sign bit
pub(crate) const BIT_LEN_TIME: u64 =
    63 - BIT_LEN_SEQUENCE - BIT_LEN_WORKER_ID - BIT_LEN_DATA_CENTER_ID;

const WORKER_ID_SHIFT: u64 = BIT_LEN_SEQUENCE;
const DATA_CENTER_ID_SHIFT: u64 = BIT_LEN_SEQUENCE + BIT_LEN_WORKER_ID;
const TIME_SHIFT: u64 = DATA_CENTER_ID_SHIFT + BIT_LEN_DATA_CENTER_ID;

/// Largest accepted data center id.
pub const MAX_DATA_CENTER_ID: i64 = (1 << BIT_LEN_DATA_CENTER_ID) - 1;
/// Largest accepted worker id.
pub const MAX_WORKER_ID: i64 = (1 << BIT_LEN_WORKER_ID) - 1;
/// mask for sequence number
pub const MAX_SEQUENCE: u16 = (1 << BIT_LEN_SEQUENCE) - 1;

/// `last_timestamp` before the first id is issued.
const NEVER_ISSUED: i64 = -1;

/// What [`Snowflake::next_id`] does when the clock reads earlier than the
/// last millisecond it issued an id for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockBackwardPolicy {
    /// Fail with [`Error::ClockMovedBackwards`].
    #[default]
    Fail,
    /// Spin until the clock catches up if it is at most `max_drift_ms` behind,
    /// fail with [`Error::ClockMovedBackwards`] otherwise.
    Wait { max_drift_ms: i64 },
}

/// Mutable state of a generator, guarded by its mutex.
#[derive(Debug)]
pub(crate) struct Internals {
    pub(crate) last_timestamp: i64,
    pub(crate) sequence: u16,
}

/// SharedSnowflake is shared between clones of one Snowflake.
pub(crate) struct SharedSnowflake<T> {
    pub(crate) epoch: i64,
    pub(crate) data_center_id: u8,
    pub(crate) worker_id: u8,
    pub(crate) clock_backward_policy: ClockBackwardPolicy,
    pub(crate) time: T,
    pub(crate) internals: Mutex<Internals>,
}

/// Snowflake is a distributed unique ID generator.
///
/// An id packs, most significant first, the milliseconds elapsed since the
/// epoch (41 bits), the data center id (5 bits), the worker id (5 bits) and a
/// per-millisecond sequence (12 bits). The sign bit is always zero.
///
/// It is thread-safe. Clones share the same state, so ids stay ordered across
/// every clone of one generator.
pub struct Snowflake<T = SystemClock>(pub(crate) Arc<SharedSnowflake<T>>);

impl Snowflake {
    /// Create a new Snowflake reading the system clock.
    ///
    /// `epoch_ms` is milliseconds since the Unix epoch and must not be in the
    /// future; both ids must be in `0..=31`.
    /// For further configuration see [`builder`].
    ///
    /// [`builder`]: Snowflake::builder
    pub fn new(epoch_ms: i64, data_center_id: i64, worker_id: i64) -> Result<Self, Error> {
        Builder::new()
            .epoch_millis(epoch_ms)
            .data_center_id(data_center_id)
            .worker_id(worker_id)
            .finalize()
    }

    /// Create a new [`Builder`] to construct a Snowflake.
    pub fn builder() -> Builder {
        Builder::new()
    }
}

/// The zero-valued generator: Unix epoch, data center 0, worker 0.
impl Default for Snowflake {
    fn default() -> Self {
        Self::new_inner(0, 0, 0, ClockBackwardPolicy::Fail, SystemClock)
    }
}

impl<T: TimeSource> Snowflake<T> {
    /// Ids and epoch must already be validated.
    pub(crate) fn new_inner(
        epoch: i64,
        data_center_id: u8,
        worker_id: u8,
        clock_backward_policy: ClockBackwardPolicy,
        time: T,
    ) -> Self {
        tracing::info!(
            epoch_ms = epoch,
            data_center_id,
            worker_id,
            ?clock_backward_policy,
            "created snowflake generator"
        );
        Self(Arc::new(SharedSnowflake {
            epoch,
            data_center_id,
            worker_id,
            clock_backward_policy,
            time,
            internals: Mutex::new(Internals {
                last_timestamp: NEVER_ISSUED,
                sequence: 0,
            }),
        }))
    }

    /// Generate the next unique id.
    ///
    /// Ids from one generator are strictly increasing. When the 4096 sequence
    /// values of a millisecond are used up, this spins until the clock ticks.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackwards`] if the clock regressed and the
    ///   [`ClockBackwardPolicy`] does not allow waiting it out.
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than the epoch.
    /// - [`Error::OverTimeLimit`] once the 41-bit time field is exhausted.
    pub fn next_id(&self) -> Result<u64, Error> {
        let mut internals = self.0.internals.lock().map_err(|_| Error::MutexPoisoned)?;

        let mut now = self.0.time.current_millis();
        if now < internals.last_timestamp {
            now = self.wait_for_clock(now, internals.last_timestamp)?;
        }
        if now < self.0.epoch {
            return Err(Error::ClockBeforeEpoch {
                epoch_ms: self.0.epoch,
                now_ms: now,
            });
        }

        let sequence = if now == internals.last_timestamp {
            let sequence = (internals.sequence + 1) & MAX_SEQUENCE;
            if sequence == 0 {
                tracing::debug!(
                    timestamp_ms = now,
                    "sequence exhausted, spinning until next millisecond"
                );
                now = self.til_next_millis(internals.last_timestamp);
            }
            sequence
        } else {
            0
        };

        let elapsed = now - self.0.epoch;
        if elapsed >= 1 << BIT_LEN_TIME {
            return Err(Error::OverTimeLimit);
        }

        internals.last_timestamp = now;
        internals.sequence = sequence;

        Ok(compose(
            elapsed as u64,
            self.0.data_center_id,
            self.0.worker_id,
            sequence,
        ))
    }

    /// Returns the epoch in milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.0.epoch
    }

    pub fn data_center_id(&self) -> u8 {
        self.0.data_center_id
    }

    pub fn worker_id(&self) -> u8 {
        self.0.worker_id
    }

    pub fn clock_backward_policy(&self) -> ClockBackwardPolicy {
        self.0.clock_backward_policy
    }

    /// Called with the lock held when `now < last`. Returns a reading that is
    /// at least `last`, or the regression error.
    #[cold]
    fn wait_for_clock(&self, now: i64, last: i64) -> Result<i64, Error> {
        let drift = last - now;
        match self.0.clock_backward_policy {
            ClockBackwardPolicy::Wait { max_drift_ms } if drift <= max_drift_ms => {
                tracing::warn!(
                    last_ms = last,
                    now_ms = now,
                    drift_ms = drift,
                    "clock moved backwards, waiting for it to catch up"
                );
                let mut now = now;
                while now < last {
                    hint::spin_loop();
                    now = self.0.time.current_millis();
                }
                Ok(now)
            }
            _ => {
                tracing::warn!(
                    last_ms = last,
                    now_ms = now,
                    drift_ms = drift,
                    "clock moved backwards"
                );
                Err(Error::ClockMovedBackwards {
                    last_ms: last,
                    now_ms: now,
                })
            }
        }
    }

    /// Busy-waits until the clock passes `last`. Bounded by one clock tick.
    fn til_next_millis(&self, last: i64) -> i64 {
        let mut now = self.0.time.current_millis();
        while now <= last {
            hint::spin_loop();
            now = self.0.time.current_millis();
        }
        now
    }
}

/// Returns a new `Snowflake` referencing the same state as `self`.
impl<T> Clone for Snowflake<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Snowflake<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snowflake")
            .field("epoch_ms", &self.0.epoch)
            .field("data_center_id", &self.0.data_center_id)
            .field("worker_id", &self.0.worker_id)
            .field("clock_backward_policy", &self.0.clock_backward_policy)
            .finish_non_exhaustive()
    }
}

#[inline]
pub(crate) fn compose(elapsed: u64, data_center_id: u8, worker_id: u8, sequence: u16) -> u64 {
    elapsed << TIME_SHIFT
        | (data_center_id as u64) << DATA_CENTER_ID_SHIFT
        | (worker_id as u64) << WORKER_ID_SHIFT
        | sequence as u64
}

/// DecomposedSnowflake is the parts of a Snowflake ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposedSnowflake {
    pub id: u64,
    pub msb: u64,
    /// Milliseconds since the generator's epoch.
    pub time: u64,
    pub data_center_id: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

impl DecomposedSnowflake {
    /// Returns the issuing time in milliseconds since the Unix epoch, given
    /// the epoch of the generator that issued the id.
    pub fn timestamp_millis(&self, epoch_ms: i64) -> i64 {
        epoch_ms + self.time as i64
    }

    /// Returns the issuing time, given the epoch of the issuing generator.
    pub fn datetime(&self, epoch_ms: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_millis(epoch_ms))
    }
}

/// The mask for sequence number.
const MASK_SEQUENCE: u64 = (1 << BIT_LEN_SEQUENCE) - 1;
/// The mask for worker ID.
const MASK_WORKER_ID: u64 = ((1 << BIT_LEN_WORKER_ID) - 1) << WORKER_ID_SHIFT;
/// The mask for data center ID.
const MASK_DATA_CENTER_ID: u64 = ((1 << BIT_LEN_DATA_CENTER_ID) - 1) << DATA_CENTER_ID_SHIFT;
/// The mask for time.
const MASK_TIME: u64 = ((1 << BIT_LEN_TIME) - 1) << TIME_SHIFT;

/// Break a Snowflake ID up into its parts.
pub fn decompose(id: u64) -> DecomposedSnowflake {
    DecomposedSnowflake {
        id,
        msb: id >> 63,
        time: (id & MASK_TIME) >> TIME_SHIFT,
        data_center_id: (id & MASK_DATA_CENTER_ID) >> DATA_CENTER_ID_SHIFT,
        worker_id: (id & MASK_WORKER_ID) >> WORKER_ID_SHIFT,
        sequence: id & MASK_SEQUENCE,
    }
}
