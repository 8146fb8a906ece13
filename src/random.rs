// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use rand::{Rng, distr::Alphanumeric, rng};

/// Length of the strings handed out for [`IdKind::Random`].
///
/// [`IdKind::Random`]: crate::IdKind::Random
pub const RANDOM_ID_LEN: usize = 16;

/// Returns `len` characters drawn uniformly from `[A-Za-z0-9]`, using the
/// thread-local RNG.
pub fn random_string(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
