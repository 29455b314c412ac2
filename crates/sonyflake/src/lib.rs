//! Distributed, time-ordered 63-bit unique IDs in the Sonyflake layout.
//!
//! ```text
//!  Bit Index:  63           63 62           24 23            16 15              0
//!              +--------------+---------------+----------------+-----------------+
//!  Field:      | reserved (1) |   time (39)   |  sequence (8)  | machine ID (16) |
//!              +--------------+---------------+----------------+-----------------+
//! ```
//!
//! Time is counted in 10 ms ticks since a configurable epoch. Each
//! [`SonyFlake`] grants at most 256 IDs per tick and blocks the caller until
//! the next tick once that quota is spent. [`RoundRobin`] spreads calls over
//! several generators with distinct machine IDs to raise throughput.
//!
//! ```
//! use sonyflake::SonyFlake;
//!
//! let sf = SonyFlake::builder().machine_id(0x7F7F).build().unwrap();
//! let id = sf.next_id().unwrap();
//! let parts = sf.decompose(id);
//!
//! assert_eq!(parts.machine_id, 0x7F7F);
//! assert_eq!(parts.msb, 0);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod id;
mod machine_id;
mod mutex;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::machine_id::*;
pub use crate::time::*;
