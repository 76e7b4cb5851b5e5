//! Producer handle and the scoped write transaction

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytemuck::Pod;

use crate::ring::{header_size, Shared, SIZE_PREFIX};

/// Producer half of a split ring. Exactly one exists per ring; it is `Send`
/// but deliberately not clonable, so only one thread can ever append.
pub struct Producer<T: Pod> {
    shared: Arc<Shared<T>>,
    /// Offset of the next record to be written. Producer-private: the
    /// consumer never reads it.
    end: u32,
}

impl<T: Pod> Producer<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared, end: 0 }
    }

    /// Ring capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.shared.arena.capacity()
    }

    /// Occupied bytes right now. Debug aid; the value is stale the moment it
    /// is returned.
    #[must_use]
    pub fn occupied(&self) -> u32 {
        self.shared.occupied.load(Ordering::Acquire)
    }

    /// Bytes currently appendable from this role's perspective.
    #[must_use]
    pub fn free(&self) -> u32 {
        self.capacity() - self.occupied()
    }

    /// Open a write transaction stamped with `timestamp`.
    ///
    /// Returns `None` when the ring lacks room for even a record header. On
    /// success the timestamp is already serialized; the length prefix is
    /// deferred to commit, so nothing becomes visible to the consumer until
    /// the transaction drops (or [`WriteTransaction::commit`] runs).
    pub fn try_write(&mut self, timestamp: T) -> Option<WriteTransaction<'_, T>> {
        let header = header_size::<T>();
        let free = self.shared.arena.capacity() - self.shared.occupied.load(Ordering::Acquire);
        if free < header {
            return None;
        }
        let ts_slot = self.shared.arena.index_of(self.end + SIZE_PREFIX);
        // SAFETY: [end, end + free) is producer-owned and holds at least a header.
        unsafe { self.shared.arena.write_value(ts_slot, &timestamp) };
        let index = self.shared.arena.index_of(self.end + header);
        Some(WriteTransaction {
            producer: self,
            timestamp,
            record: header,
            index,
            available: free - header,
            invalidated: false,
        })
    }
}

/// Scoped write transaction: appends accumulate into one record that becomes
/// visible atomically when the transaction commits (on drop, or explicitly).
///
/// The transaction borrows its [`Producer`] mutably, so a second `try_write`
/// while one is live does not compile. A failed append leaves the transaction
/// usable; smaller appends may still succeed.
pub struct WriteTransaction<'a, T: Pod> {
    producer: &'a mut Producer<T>,
    timestamp: T,
    /// Total record length so far, header included.
    record: u32,
    /// Arena offset of the next append.
    index: u32,
    /// Bytes still appendable; cached, re-synced against the occupancy
    /// counter when an append would otherwise fail.
    available: u32,
    invalidated: bool,
}

impl<T: Pod> WriteTransaction<'_, T> {
    /// Payload bytes appended so far (header excluded).
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        self.record - header_size::<T>()
    }

    /// The timestamp this record was stamped with.
    #[must_use]
    pub fn timestamp(&self) -> T {
        self.timestamp
    }

    /// Bytes still appendable as of the last sync with the consumer.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.available
    }

    /// Serialized record header size for this ring's timestamp type.
    #[must_use]
    pub const fn header_size() -> u32 {
        header_size::<T>()
    }

    fn can_write(&mut self, len: u32) -> bool {
        if self.available < len {
            // The consumer may have drained since `available` was cached.
            let occupied = self.producer.shared.occupied.load(Ordering::Acquire);
            self.available = self.producer.shared.arena.capacity() - occupied - self.record;
            if self.available < len {
                return false;
            }
        }
        true
    }

    /// Append raw bytes. All-or-nothing: `false` means nothing was written.
    pub fn push_bytes(&mut self, data: &[u8]) -> bool {
        let Ok(len) = u32::try_from(data.len()) else {
            return false;
        };
        if !self.can_write(len) {
            return false;
        }
        // SAFETY: can_write guarantees `len` producer-owned bytes at `index`.
        unsafe { self.producer.shared.arena.write_bytes(self.index, data) };
        self.advance(len);
        true
    }

    /// Append one fixed-width value. All-or-nothing.
    pub fn push<V: Pod>(&mut self, value: V) -> bool {
        let len = std::mem::size_of::<V>() as u32;
        if !self.can_write(len) {
            return false;
        }
        // SAFETY: can_write guarantees `len` producer-owned bytes at `index`.
        unsafe { self.producer.shared.arena.write_value(self.index, &value) };
        self.advance(len);
        true
    }

    /// Append values in order, stopping at the first that does not fit.
    /// Returns the number appended; the transaction stays usable either way.
    pub fn push_slice<V: Pod>(&mut self, values: &[V]) -> usize {
        let mut appended = 0;
        for value in values {
            if !self.push(*value) {
                break;
            }
            appended += 1;
        }
        appended
    }

    fn advance(&mut self, len: u32) {
        self.index = self.producer.shared.arena.index_of(self.index + len);
        self.available -= len;
        self.record += len;
    }

    /// Commit now instead of at scope exit.
    pub fn commit(self) {
        drop(self);
    }

    /// Abandon the transaction: nothing is published, the occupancy counter
    /// is untouched, and the bytes already appended become garbage that the
    /// next write overwrites.
    pub fn invalidate(mut self) {
        self.invalidated = true;
    }
}

impl<T: Pod> Drop for WriteTransaction<'_, T> {
    fn drop(&mut self) {
        if self.invalidated {
            return;
        }
        let arena = &self.producer.shared.arena;
        // The length prefix is written last; the release increment below is
        // the sole publication point, so the consumer sees a complete record
        // or nothing.
        // SAFETY: the prefix slot at `end` was reserved when the transaction opened.
        unsafe { arena.write_value(self.producer.end, &self.record) };
        self.producer.end = arena.index_of(self.producer.end + self.record);
        self.producer
            .shared
            .occupied
            .fetch_add(self.record, Ordering::Release);
    }
}
