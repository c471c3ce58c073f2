#![doc = include_str ! ("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod error;
pub mod layout;
pub mod platform;

mod bounded;
mod record;
mod scan;
mod value;

use core::fmt;

use crate::error::Error;
use crate::platform::Platform;
use crate::scan::{ERASED_WORD, SLOT_SIZE, SlotState, classify, read_word, slot_count};

/// A contiguous flash address range used as the log for exactly one
/// logical value, paired with the bit pattern that marks a superseded
/// slot. The unbounded stores treat it as a whole erase unit; the bounded
/// stores accept any slot-aligned base.
///
/// The marker is reserved: it must never occur as legitimate data, because
/// reads return it to signal "no value present". The all-ones erased
/// pattern is rejected at construction time.
///
/// Tip: build regions in a const context so a bad marker fails the build:
///   `const CALIB: Region = Region::new(0x77000, 0xDEADBEEF);`
#[derive(Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    base: u32,
    invalid: u32,
}

impl Region {
    /// Creates a region descriptor for the erase unit starting at `base`.
    ///
    /// Panics if `invalid_marker` equals the erased pattern (`0xFFFF_FFFF`).
    /// Alignment of `base` is checked per operation instead, since the
    /// device's geometry is not known here.
    pub const fn new(base: u32, invalid_marker: u32) -> Self {
        assert!(
            invalid_marker != ERASED_WORD,
            "invalid marker must differ from the erased pattern"
        );
        Self {
            base,
            invalid: invalid_marker,
        }
    }

    pub const fn base(&self) -> u32 {
        self.base
    }

    pub const fn invalid_marker(&self) -> u32 {
        self.invalid
    }

    pub(crate) const fn slot_addr(&self, index: usize) -> u32 {
        self.base + (index * SLOT_SIZE) as u32
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Region {{ base: {:#07x}, marker: {:#010x} }}",
            self.base, self.invalid
        )
    }
}

/// Per-slot census of a region, at slot (not record) granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegionStatistics {
    pub erased: usize,
    pub invalidated: usize,
    pub occupied: usize,
}

/// The value-slot log over one flash device.
///
/// Operations are synchronous and assume a single logical owner per
/// region; see [`platform::Platform`] for what the flash driver must
/// guarantee while a primitive runs.
pub struct SlotLog<T: Platform> {
    pub(crate) hal: T,
    pub(crate) faulted: bool,
}

impl<T: Platform> SlotLog<T> {
    pub fn new(hal: T) -> Self {
        const {
            assert!(
                T::WRITE_SIZE > 0 && SLOT_SIZE % T::WRITE_SIZE == 0,
                "program granularity must divide the 4-byte slot"
            );
            assert!(
                T::READ_SIZE > 0 && SLOT_SIZE % T::READ_SIZE == 0,
                "read granularity must divide the 4-byte slot"
            );
            assert!(
                T::ERASE_SIZE % SLOT_SIZE == 0 && T::ERASE_SIZE / SLOT_SIZE >= 2,
                "erase unit must hold at least two slots"
            );
        }

        Self {
            hal,
            faulted: false,
        }
    }

    /// Replaces the region's current value.
    ///
    /// Claims the next free slot, invalidating the superseded one first;
    /// erases the region and restarts at slot 0 when no slot is left. Up
    /// to three flash operations per call. A power loss between the
    /// invalidation and the final program makes the next read report
    /// absence.
    pub fn write_value(&mut self, region: &Region, value: u32) -> Result<(), Error> {
        if self.faulted {
            return Err(Error::FlashError);
        }
        self.latch(|log| log.write_value_inner(region, value))
    }

    /// Returns the region's current value, or its invalid marker if none
    /// has been written since the last erase.
    ///
    /// As a maintenance side effect, a region found almost exhausted
    /// without a live value is erased before the marker is returned.
    pub fn read_value(&mut self, region: &Region) -> Result<u32, Error> {
        self.latch(|log| log.read_value_inner(region))
    }

    /// Replaces the region's current record with `bytes`.
    ///
    /// A record occupies `ceil(len / 4)` contiguous slots and is
    /// classified through its first word alone, so that word is subject
    /// to the same reservation rules as a plain value. Overflow policy
    /// matches [`Self::write_value`].
    pub fn write_record(&mut self, region: &Region, bytes: &[u8]) -> Result<(), Error> {
        if self.faulted {
            return Err(Error::FlashError);
        }
        self.latch(|log| log.write_record_inner(region, bytes))
    }

    /// Reads the region's current record into `buf` (whose length selects
    /// the record length) and returns its first word, or `None` if the
    /// region holds no record.
    pub fn read_record(&mut self, region: &Region, buf: &mut [u8]) -> Result<Option<u32>, Error> {
        self.latch(|log| log.read_record_inner(region, buf))
    }

    /// Like [`Self::write_value`], but confined to `num_slots` slots from
    /// the region base and never erasing: once those slots are used up
    /// the call fails with [`Error::RegionFull`] and leaves the flash
    /// untouched. Because no erase ever happens here, the base only needs
    /// slot alignment, so several bounded stores can share one erase unit
    /// safely; erasure policy stays with the caller.
    pub fn write_bounded(
        &mut self,
        region: &Region,
        value: u32,
        num_slots: usize,
    ) -> Result<(), Error> {
        if self.faulted {
            return Err(Error::FlashError);
        }
        self.latch(|log| log.write_bounded_inner(region, value, num_slots))
    }

    /// Like [`Self::read_value`], but confined to `num_slots` slots from
    /// the region base and without the maintenance erase.
    pub fn read_bounded(&mut self, region: &Region, num_slots: usize) -> Result<u32, Error> {
        self.latch(|log| log.read_bounded_inner(region, num_slots))
    }

    /// Counts the slots of a region per state.
    ///
    /// The census is slot-granular: the interior slots of a multi-slot
    /// record carry arbitrary payload bytes and are classified as whatever
    /// they happen to look like.
    pub fn statistics(&mut self, region: &Region) -> Result<RegionStatistics, Error> {
        self.latch(|log| log.statistics_inner(region))
    }

    /// Flash failures are not recoverable from inside the log, so the
    /// first one latches and every later write fails fast.
    fn latch<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        match op(self) {
            Err(Error::FlashError) => {
                self.faulted = true;
                Err(Error::FlashError)
            }
            other => other,
        }
    }

    fn statistics_inner(&mut self, region: &Region) -> Result<RegionStatistics, Error> {
        self.check_region(region)?;

        let mut stats = RegionStatistics {
            erased: 0,
            invalidated: 0,
            occupied: 0,
        };
        for index in 0..slot_count::<T>() {
            let word = read_word(&mut self.hal, region.slot_addr(index))?;
            match classify(word, region.invalid_marker()) {
                SlotState::Erased => stats.erased += 1,
                SlotState::Invalidated => stats.invalidated += 1,
                SlotState::Occupied => stats.occupied += 1,
            }
        }
        Ok(stats)
    }

    pub(crate) fn check_region(&mut self, region: &Region) -> Result<(), Error> {
        let base = region.base() as usize;
        if !base.is_multiple_of(T::ERASE_SIZE) {
            return Err(Error::RegionMisaligned);
        }
        match base.checked_add(T::ERASE_SIZE) {
            Some(end) if end <= self.hal.capacity() => Ok(()),
            _ => Err(Error::OutOfBounds),
        }
    }

    pub(crate) fn erase_region(&mut self, region: &Region) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("erase region @{:#08x}", region.base());

        let from = region.base();
        let to = from + T::ERASE_SIZE as u32;
        self.hal.erase(from, to).map_err(|_| Error::FlashError)
    }
}
