// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

/// The error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("epoch `{0}` ms must not be negative")]
    EpochNegative(i64),
    #[error("epoch `{epoch_ms}` ms is ahead of current time `{now_ms}` ms")]
    EpochAheadOfCurrentTime { epoch_ms: i64, now_ms: i64 },
    #[error("data_center_id `{0}` is out of range [0, 31]")]
    DataCenterIdOutOfRange(i64),
    #[error("worker_id `{0}` is out of range [0, 31]")]
    WorkerIdOutOfRange(i64),
    #[error("environment variable `{name}` has invalid value `{value}`")]
    InvalidEnvVar { name: &'static str, value: String },
    #[error(
        "clock moved backwards by {} ms (last issued at {last_ms}, now {now_ms}), refusing to generate id",
        .last_ms - .now_ms
    )]
    ClockMovedBackwards { last_ms: i64, now_ms: i64 },
    #[error("clock `{now_ms}` ms is before the epoch `{epoch_ms}` ms")]
    ClockBeforeEpoch { epoch_ms: i64, now_ms: i64 },
    #[error("over the time limit")]
    OverTimeLimit,
    #[error("mutex is poisoned (i.e. a panic happened while it was locked)")]
    MutexPoisoned,
    #[error("invalid object id `{0}`")]
    InvalidObjectId(String),
}

impl Error {
    /// Returns `true` if the error was caused by invalid generator configuration.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::EpochNegative(_)
                | Error::EpochAheadOfCurrentTime { .. }
                | Error::DataCenterIdOutOfRange(_)
                | Error::WorkerIdOutOfRange(_)
                | Error::InvalidEnvVar { .. }
        )
    }

    /// Returns `true` if the error was caused by the clock reading earlier than
    /// a time the generator has already observed.
    pub fn is_clock_regression(&self) -> bool {
        matches!(
            self,
            Error::ClockMovedBackwards { .. } | Error::ClockBeforeEpoch { .. }
        )
    }
}
