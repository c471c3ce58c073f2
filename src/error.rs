use thiserror::Error;

/// Errors that can occur while operating on a value-slot region. Marked as
/// non-exhaustive to allow for future additions without breaking the API.
/// Most callers only need to handle `RegionFull` and `FlashError`; the
/// remaining variants indicate static misuse.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The region base address has to be aligned to the device's erase
    /// unit.
    #[error("region misaligned")]
    RegionMisaligned,

    /// The region, or a slot bound within it, does not fit the device.
    #[error("out of bounds")]
    OutOfBounds,

    /// The value (or the first word of a record) equals the erased
    /// pattern or the region's invalid marker. Both are reserved; storing
    /// them would make the value indistinguishable from a free or
    /// superseded slot.
    #[error("value collides with a reserved bit pattern")]
    ValueReserved,

    /// Records carry their tag in the first word, so they are at least 4
    /// bytes long.
    #[error("record shorter than one slot")]
    RecordTooShort,

    /// The record does not fit into a single region.
    #[error("record too long")]
    RecordTooLong,

    /// A bounded store ran out of slots. Bounded stores never erase on
    /// their own; reclaiming the region is the caller's decision.
    #[error("region full")]
    RegionFull,

    /// The flash driver reported a failure (bus error, completion-poll
    /// timeout). There is no alternate medium to fall back to: the error
    /// is surfaced as-is and the log refuses further writes.
    #[error("internal flash error")]
    FlashError,

    /// The JEDEC density code does not name a supported flash capacity.
    #[error("unsupported flash capacity")]
    UnsupportedCapacity,
}
