// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::Error;
use crate::object_id::ObjectId;
use crate::random::{RANDOM_ID_LEN, random_string};
use crate::snowflake::{SharedSnowflake, Snowflake};
use crate::time::SystemClock;
use arc_swap::ArcSwapOption;
use std::sync::{Arc, OnceLock};

/// The kind of identifier [`Registry::get_id`] hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// A Snowflake id from the registry's generator, in decimal.
    Snowflake,
    /// A random alphanumeric string of [`RANDOM_ID_LEN`] characters.
    Random,
    /// A MongoDB-style [`ObjectId`] in hex.
    ObjectId,
}

/// Holds the Snowflake generator shared by every caller of one registry.
///
/// The generator is created lazily with [`Snowflake::default`] on first use
/// unless one was installed with [`set_snowflake`] before. Once a generator is
/// present, reading it is a lock-free atomic load.
///
/// A process-wide registry is available through [`global`] and the free
/// functions of this crate; a `Registry` can also be owned and passed around
/// like any other value.
///
/// [`set_snowflake`]: Registry::set_snowflake
pub struct Registry {
    // Holds the generator's shared state itself, so a load is one refcount.
    current: ArcSwapOption<SharedSnowflake<SystemClock>>,
    default: OnceLock<Snowflake>,
}

impl Registry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            current: ArcSwapOption::const_empty(),
            default: OnceLock::new(),
        }
    }

    /// Install `snowflake` as the generator for all subsequent calls.
    ///
    /// Calls already running on the previous generator finish on it.
    pub fn set_snowflake(&self, snowflake: Snowflake) {
        tracing::info!(
            epoch_ms = snowflake.epoch_millis(),
            data_center_id = snowflake.data_center_id(),
            worker_id = snowflake.worker_id(),
            "installed snowflake generator"
        );
        self.current.store(Some(snowflake.0));
    }

    /// Returns the installed generator, if any, without creating one.
    pub fn current(&self) -> Option<Snowflake> {
        self.current.load_full().map(Snowflake)
    }

    /// Returns the installed generator, creating and installing the default
    /// one if the registry is empty.
    pub fn snowflake(&self) -> Snowflake {
        if let Some(shared) = self.current.load_full() {
            return Snowflake(shared);
        }

        let default = self.default.get_or_init(Snowflake::default);
        // Publish only into an empty slot so a concurrent `set_snowflake`
        // is never overwritten by the default.
        let previous = self.current.compare_and_swap(
            &None::<Arc<SharedSnowflake<SystemClock>>>,
            Some(Arc::clone(&default.0)),
        );
        match &*previous {
            Some(installed) => Snowflake(Arc::clone(installed)),
            None => default.clone(),
        }
    }

    /// Returns `true` once the lazily created default generator exists.
    pub fn is_default_initialized(&self) -> bool {
        self.default.get().is_some()
    }

    /// Generate the next id from the registry's generator.
    pub fn next_snowflake_id(&self) -> Result<u64, Error> {
        self.snowflake().next_id()
    }

    /// Returns a new identifier of the given kind as a string.
    ///
    /// # Errors
    ///
    /// Only [`IdKind::Snowflake`] can fail, with the errors of
    /// [`Snowflake::next_id`].
    pub fn get_id(&self, kind: IdKind) -> Result<String, Error> {
        match kind {
            IdKind::Snowflake => Ok(self.next_snowflake_id()?.to_string()),
            IdKind::Random => Ok(random_string(RANDOM_ID_LEN)),
            IdKind::ObjectId => Ok(ObjectId::new().to_hex()),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Registry = Registry::new();

/// Returns the process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Install `snowflake` in the process-wide registry.
pub fn set_snowflake(snowflake: Snowflake) {
    GLOBAL.set_snowflake(snowflake)
}

/// Returns a new identifier of the given kind from the process-wide registry.
pub fn get_id(kind: IdKind) -> Result<String, Error> {
    GLOBAL.get_id(kind)
}

/// Generate the next Snowflake id from the process-wide registry.
pub fn next_snowflake_id() -> Result<u64, Error> {
    GLOBAL.next_snowflake_id()
}
