//! Consumer handle and the scoped read transaction

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytemuck::Pod;

use crate::ring::{header_size, Shared, SIZE_PREFIX};

/// Consumer half of a split ring. Exactly one exists per ring; it is `Send`
/// but deliberately not clonable, so only one thread can ever drain.
pub struct Consumer<T: Pod> {
    shared: Arc<Shared<T>>,
    /// Offset of the next record to be read. Consumer-private: the producer
    /// never reads it.
    start: u32,
}

impl<T: Pod> Consumer<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared, start: 0 }
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

    /// True when at least one committed record is waiting.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.shared.occupied.load(Ordering::Acquire) > 0
    }

    /// Open a read transaction over the oldest committed record.
    ///
    /// Returns `None` when the ring is empty. On success the record header
    /// has been copied out; the payload is popped incrementally. Records are
    /// committed whole, so a non-zero occupancy always means a complete
    /// record is waiting.
    pub fn try_read(&mut self) -> Option<ReadTransaction<'_, T>> {
        if self.shared.occupied.load(Ordering::Acquire) == 0 {
            return None;
        }
        let arena = &self.shared.arena;
        // SAFETY: the acquire load above makes the committed record's bytes
        // visible; [start, start + occupied) is consumer-owned.
        let record: u32 = unsafe { arena.read_value(self.start) };
        let timestamp: T = unsafe { arena.read_value(arena.index_of(self.start + SIZE_PREFIX)) };
        let header = header_size::<T>();
        let index = arena.index_of(self.start + header);
        Some(ReadTransaction {
            consumer: self,
            timestamp,
            record,
            index,
            available: record - header,
            invalidated: false,
        })
    }
}

/// Scoped read transaction over one record.
///
/// The transaction borrows its [`Consumer`] mutably, so a second `try_read`
/// while one is live does not compile. The record need not be fully drained:
/// commit always advances past the entire record, discarding unread payload.
/// [`invalidate`](Self::invalidate) leaves the record in the ring for the
/// next `try_read` to see again.
pub struct ReadTransaction<'a, T: Pod> {
    consumer: &'a mut Consumer<T>,
    timestamp: T,
    /// Total record length, header included.
    record: u32,
    /// Arena offset of the next pop.
    index: u32,
    /// Payload bytes not yet popped.
    available: u32,
    invalidated: bool,
}

impl<T: Pod> ReadTransaction<'_, T> {
    /// Total payload bytes this record was committed with (header excluded).
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        self.record - header_size::<T>()
    }

    /// The timestamp the producer stamped this record with.
    #[must_use]
    pub fn timestamp(&self) -> T {
        self.timestamp
    }

    /// Payload bytes not yet popped.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.available
    }

    /// Serialized record header size for this ring's timestamp type.
    #[must_use]
    pub const fn header_size() -> u32 {
        header_size::<T>()
    }

    const fn can_read(&self, len: u32) -> bool {
        self.available >= len
    }

    /// Pop one fixed-width value. `None` when fewer bytes remain than the
    /// value needs; nothing is consumed in that case.
    pub fn pop<V: Pod>(&mut self) -> Option<V> {
        let len = std::mem::size_of::<V>() as u32;
        if !self.can_read(len) {
            return None;
        }
        // SAFETY: `available` bounds the committed record's remaining payload.
        let value = unsafe { self.consumer.shared.arena.read_value(self.index) };
        self.advance(len);
        Some(value)
    }

    /// Pop one fixed-width value into a caller slot. `false` leaves both the
    /// slot and the transaction untouched.
    pub fn pop_into<V: Pod>(&mut self, dest: &mut V) -> bool {
        match self.pop::<V>() {
            Some(value) => {
                *dest = value;
                true
            }
            None => false,
        }
    }

    /// Pop `len` raw bytes, handing them to `sink` straight from the arena:
    /// one contiguous slice, or two when the record wraps. The slices are
    /// valid only for the duration of each call. All-or-nothing: `false`
    /// means `sink` was never invoked and nothing was consumed.
    pub fn pop_bytes(&mut self, len: u32, mut sink: impl FnMut(&[u8])) -> bool {
        if !self.can_read(len) {
            return false;
        }
        // SAFETY: the range [index, index + len) lies inside the committed
        // record, which stays consumer-owned until commit.
        unsafe {
            self.consumer
                .shared
                .arena
                .with_slices(self.index, len, &mut sink);
        }
        self.advance(len);
        true
    }

    fn advance(&mut self, len: u32) {
        self.index = self.consumer.shared.arena.index_of(self.index + len);
        self.available -= len;
    }

    /// Commit now instead of at scope exit, discarding any unread payload.
    pub fn commit(self) {
        drop(self);
    }

    /// Abandon the transaction: the cursor and occupancy counter stay put,
    /// and the same record is delivered again on the next `try_read`.
    pub fn invalidate(mut self) {
        self.invalidated = true;
    }
}

impl<T: Pod> Drop for ReadTransaction<'_, T> {
    fn drop(&mut self) {
        if self.invalidated {
            return;
        }
        // The whole declared record is reclaimed regardless of how much the
        // caller actually popped; the release decrement hands the bytes back
        // to the producer.
        let start = self.consumer.start;
        self.consumer.start = self.consumer.shared.arena.index_of(start + self.record);
        self.consumer
            .shared
            .occupied
            .fetch_sub(self.record, Ordering::Release);
    }
}
