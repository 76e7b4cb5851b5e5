//! Ring configuration and the shared producer/consumer state
//!
//! A [`TransactionalRing`] starts with no memory. The owning thread attaches
//! an arena with [`reserve`](TransactionalRing::reserve) (owned mode) or
//! [`borrow`](TransactionalRing::borrow) (caller-provided memory), then calls
//! [`split`](TransactionalRing::split) to obtain the two role handles. Since
//! `split` consumes the ring, reconfiguring while either role is live is
//! impossible by construction.

use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr::NonNull;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use bytemuck::Pod;
use crossbeam_utils::CachePadded;
use tracing::debug;

use crate::arena::Arena;
use crate::error::RingError;
use crate::read::Consumer;
use crate::write::Producer;

/// Width of the record length prefix.
pub(crate) const SIZE_PREFIX: u32 = size_of::<u32>() as u32;

/// Serialized record header size for timestamp type `T`: the 4-byte length
/// prefix plus the timestamp, with no padding.
pub(crate) const fn header_size<T>() -> u32 {
    (size_of::<u32>() + size_of::<T>()) as u32
}

/// State shared by the two role handles.
pub(crate) struct Shared<T> {
    pub(crate) arena: Arena,
    /// Occupied byte count; the only producer/consumer synchronisation point.
    /// Cache-padded so commit traffic from one role does not bounce the other
    /// role's private cursor line.
    pub(crate) occupied: CachePadded<AtomicU32>,
    _timestamp: PhantomData<T>,
}

// SAFETY: the arena is a raw byte region accessed under the occupancy
// protocol: the producer owns [end, end + free), the consumer owns
// [start, start + occupied), and `occupied` transfers byte ranges between
// the roles with Release/Acquire pairs. Neither role ever touches the
// other's range, so cross-thread access never races.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

/// A timestamped SPSC ring buffer awaiting configuration.
///
/// The timestamp type `T` may be any [`Pod`] value; it is copied into each
/// record header byte-for-byte, host-endian.
pub struct TransactionalRing<T: Pod> {
    arena: Option<Arena>,
    _timestamp: PhantomData<T>,
}

impl<T: Pod> TransactionalRing<T> {
    /// Create a ring with no backing memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arena: None,
            _timestamp: PhantomData,
        }
    }

    /// Smallest legal capacity: one serialized record header.
    #[must_use]
    pub const fn min_capacity() -> u32 {
        header_size::<T>()
    }

    /// Current capacity in bytes; zero before `reserve`/`borrow`.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.arena.as_ref().map_or(0, Arena::capacity)
    }

    /// Attach an owned arena of at least `wanted` bytes, rounded up to the
    /// next power of two and floored at [`min_capacity`](Self::min_capacity).
    ///
    /// Calling `reserve` again is allowed: a smaller or equal capacity reuses
    /// the existing allocation with a truncated logical capacity, a larger
    /// one reallocates.
    ///
    /// # Errors
    ///
    /// [`RingError::Borrowed`] if the ring is in borrowed mode.
    pub fn reserve(&mut self, wanted: u32) -> Result<(), RingError> {
        let capacity = wanted.max(Self::min_capacity()).next_power_of_two();
        match &mut self.arena {
            Some(arena) if !arena.is_owned() => Err(RingError::Borrowed),
            Some(arena) => {
                let reused = arena.retarget(capacity);
                debug!(capacity, reused, "ring arena retargeted");
                Ok(())
            }
            None => {
                self.arena = Some(Arena::owned(capacity));
                debug!(capacity, "ring arena reserved");
                Ok(())
            }
        }
    }

    /// Attach a caller-owned region. The ring enters borrowed mode
    /// irreversibly; a later `reserve` fails. A failed `borrow` leaves the
    /// ring untouched, so owned mode remains available.
    ///
    /// # Errors
    ///
    /// [`RingError::Owned`] if the ring already owns an arena,
    /// [`RingError::NullRegion`] on a null pointer,
    /// [`RingError::NotPowerOfTwo`] / [`RingError::BelowMinimum`] on an
    /// unusable capacity.
    ///
    /// # Safety
    ///
    /// `region` must point to at least `capacity` readable and writable bytes
    /// that outlive the ring and every handle split from it, and that are not
    /// accessed through any other path during that time.
    pub unsafe fn borrow(&mut self, region: *mut u8, capacity: u32) -> Result<(), RingError> {
        if self.arena.as_ref().is_some_and(Arena::is_owned) {
            return Err(RingError::Owned);
        }
        let Some(memory) = NonNull::new(region) else {
            return Err(RingError::NullRegion);
        };
        if !capacity.is_power_of_two() {
            return Err(RingError::NotPowerOfTwo(capacity));
        }
        if capacity < Self::min_capacity() {
            return Err(RingError::BelowMinimum {
                capacity,
                minimum: Self::min_capacity(),
            });
        }
        // SAFETY: the caller upholds the region contract; capacity checks done above.
        self.arena = Some(unsafe { Arena::borrowed(memory, capacity) });
        debug!(capacity, "ring arena borrowed");
        Ok(())
    }

    /// Split the configured ring into its two role handles. Each handle is
    /// `Send`; hand one to each thread. The arena is freed (if owned) when
    /// the last handle drops.
    ///
    /// # Errors
    ///
    /// [`RingError::Unconfigured`] when neither `reserve` nor `borrow` has
    /// succeeded.
    pub fn split(self) -> Result<(Producer<T>, Consumer<T>), RingError> {
        let arena = self.arena.ok_or(RingError::Unconfigured)?;
        debug!(capacity = arena.capacity(), "ring split into role handles");
        let shared = Arc::new(Shared {
            arena,
            occupied: CachePadded::new(AtomicU32::new(0)),
            _timestamp: PhantomData,
        });
        Ok((Producer::new(Arc::clone(&shared)), Consumer::new(shared)))
    }
}

impl<T: Pod> Default for TransactionalRing<T> {
    fn default() -> Self {
        Self::new()
    }
}
