//! Configuration error taxonomy

/// Errors surfaced while configuring a ring's backing memory
///
/// Every variant leaves the ring exactly as it was before the failing call.
/// Transaction-level conditions (no room, no data) are not errors; they are
/// `None`/`false` returns on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// `reserve` called on a ring whose memory is externally borrowed
    #[error("ring memory is borrowed; reserve is unavailable")]
    Borrowed,

    /// `borrow` called on a ring that already owns an allocated arena
    #[error("ring already owns its memory; borrow is unavailable")]
    Owned,

    /// Borrowed regions must have power-of-two capacity
    #[error("capacity {0} is not a power of two")]
    NotPowerOfTwo(u32),

    /// Borrowed regions must hold at least one record header
    #[error("capacity {capacity} is below the minimum {minimum}")]
    BelowMinimum {
        /// The rejected capacity
        capacity: u32,
        /// Smallest legal capacity for the ring's timestamp type
        minimum: u32,
    },

    /// Borrowed region pointer was null
    #[error("borrowed memory region is null")]
    NullRegion,

    /// The ring has no backing memory yet
    #[error("ring has no backing memory; call reserve or borrow first")]
    Unconfigured,
}
