//! Bounded subregion store: same slot semantics as the fixed-width store,
//! but capped at a caller-chosen slot count and never erasing. Overflow is
//! the caller's problem, which is exactly the point when several logical
//! values share one erase unit.

use crate::error::Error;
use crate::platform::Platform;
use crate::scan::{
    ERASED_WORD, SLOT_SIZE, WritePlacement, locate_read_slot, locate_write_slot, program_word,
    slot_count,
};
use crate::{Region, SlotLog};

impl<T: Platform> SlotLog<T> {
    pub(crate) fn write_bounded_inner(
        &mut self,
        region: &Region,
        value: u32,
        num_slots: usize,
    ) -> Result<(), Error> {
        self.check_subregion(region, num_slots)?;
        if value == ERASED_WORD || value == region.invalid_marker() {
            return Err(Error::ValueReserved);
        }

        let index = match locate_write_slot(&mut self.hal, region, 1, num_slots)? {
            WritePlacement::Free(index) | WritePlacement::AfterInvalidate(index) => index,
            WritePlacement::Exhausted => return Err(Error::RegionFull),
        };
        program_word(&mut self.hal, region.slot_addr(index), value)
    }

    pub(crate) fn read_bounded_inner(
        &mut self,
        region: &Region,
        num_slots: usize,
    ) -> Result<u32, Error> {
        self.check_subregion(region, num_slots)?;

        // No reclaim on a miss here: erasing would take the other values
        // sharing the erase unit down with this one.
        let scan = locate_read_slot(&mut self.hal, region, 1, num_slots)?;
        Ok(match scan.hit {
            Some((_, word)) => word,
            None => region.invalid_marker(),
        })
    }

    /// Subregions never get erased through this store, so their base only
    /// has to be slot-aligned, and may sit anywhere inside a sector.
    fn check_subregion(&mut self, region: &Region, num_slots: usize) -> Result<(), Error> {
        if num_slots == 0 || num_slots > slot_count::<T>() {
            return Err(Error::OutOfBounds);
        }
        let base = region.base() as usize;
        if !base.is_multiple_of(SLOT_SIZE) {
            return Err(Error::RegionMisaligned);
        }
        match base.checked_add(num_slots * SLOT_SIZE) {
            Some(end) if end <= self.hal.capacity() => Ok(()),
            _ => Err(Error::OutOfBounds),
        }
    }
}
