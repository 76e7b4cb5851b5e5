//! Lock-free transactional SPSC ring buffer for timestamped records
//!
//! One producer thread appends variable-length timestamped records through
//! scoped write transactions; one consumer thread drains them through scoped
//! read transactions. Records become visible atomically on commit, so the
//! consumer never observes a partially written record and the producer never
//! overwrites unread bytes. No locks, no blocking, no allocation after setup.
//!
//! ```
//! use txring::{TransactionalRing, Ts};
//!
//! let mut ring = TransactionalRing::<Ts>::new();
//! ring.reserve(8192)?;
//! let (mut producer, mut consumer) = ring.split()?;
//!
//! // Producer side (one thread)
//! if let Some(mut tx) = producer.try_write(Ts::from_nanos(1)) {
//!     tx.push(42_u32);
//!     tx.commit();
//! }
//!
//! // Consumer side (one thread)
//! if let Some(mut tx) = consumer.try_read() {
//!     assert_eq!(tx.timestamp(), Ts::from_nanos(1));
//!     assert_eq!(tx.pop::<u32>(), Some(42));
//! }
//! # Ok::<(), txring::RingError>(())
//! ```

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![allow(unsafe_code)] // the arena is a raw byte region shared across two threads
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)] // capacities and cursors are u32 by contract

mod arena;
mod error;
mod read;
mod ring;
mod types;
mod write;

pub use bytemuck::Pod;
pub use error::RingError;
pub use read::{Consumer, ReadTransaction};
pub use ring::TransactionalRing;
pub use types::Ts;
pub use write::{Producer, WriteTransaction};
