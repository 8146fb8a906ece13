//! A distributed unique ID generator inspired by [Twitter's Snowflake], plus a
//! process-wide registry that lazily shares one generator between callers.
//!
//! An id packs, most significant first, the milliseconds elapsed since an
//! epoch (41 bits), a data center id (5 bits), a worker id (5 bits) and a
//! per-millisecond sequence (12 bits). Ids from one generator are strictly
//! increasing as long as the clock does not move backwards.
//!
//! ## Quickstart
//!
//! Use the library like this:
//!
//! ```
//! use idkit::Snowflake;
//!
//! let sf = Snowflake::new(0, 1, 1).unwrap();
//! let next_id = sf.next_id().unwrap();
//! println!("{}", next_id);
//! ```
//!
//! Or go through the process-wide registry:
//!
//! ```
//! use idkit::{IdKind, get_id};
//!
//! let id = get_id(IdKind::Snowflake).unwrap();
//! assert!(id.parse::<u64>().is_ok());
//! ```
//!
//! ## Concurrent use
//!
//! Snowflake is thread-safe. `clone` it before moving to another thread,
//! clones share the same state:
//! ```
//! use idkit::Snowflake;
//! use std::thread;
//!
//! let sf = Snowflake::new(0, 0, 1).unwrap();
//!
//! let mut children = Vec::new();
//! for _ in 0..10 {
//!     let thread_sf = sf.clone();
//!     children.push(thread::spawn(move || {
//!         println!("{}", thread_sf.next_id().unwrap());
//!     }));
//! }
//!
//! for child in children {
//!     child.join().unwrap();
//! }
//! ```
//!
//! [Twitter's Snowflake]: https://blog.twitter.com/2010/announcing-snowflake

mod builder;
mod error;
mod object_id;
mod random;
mod registry;
mod snowflake;
mod time;

pub use crate::snowflake::*;
pub use builder::*;
pub use error::*;
pub use object_id::*;
pub use random::*;
pub use registry::*;
pub use time::{SystemClock, TimeSource};
