//! Fixed-width store: one `u32` per slot, 1024 slots on a 4 KiB sector.

use crate::error::Error;
use crate::platform::Platform;
use crate::scan::{
    ERASED_WORD, WritePlacement, locate_read_slot, locate_write_slot, program_word,
    reclaim_threshold, slot_count,
};
use crate::{Region, SlotLog};

impl<T: Platform> SlotLog<T> {
    pub(crate) fn write_value_inner(&mut self, region: &Region, value: u32) -> Result<(), Error> {
        self.check_region(region)?;
        if value == ERASED_WORD || value == region.invalid_marker() {
            return Err(Error::ValueReserved);
        }

        let count = slot_count::<T>();
        let index = match locate_write_slot(&mut self.hal, region, 1, count)? {
            WritePlacement::Free(index) | WritePlacement::AfterInvalidate(index) => index,
            WritePlacement::Exhausted => {
                self.erase_region(region)?;
                0
            }
        };
        program_word(&mut self.hal, region.slot_addr(index), value)
    }

    pub(crate) fn read_value_inner(&mut self, region: &Region) -> Result<u32, Error> {
        self.check_region(region)?;

        let count = slot_count::<T>();
        let scan = locate_read_slot(&mut self.hal, region, 1, count)?;
        match scan.hit {
            Some((_, word)) => Ok(word),
            None => {
                // A miss that burrowed nearly to the end means the region
                // is all invalidated slots; erase it now rather than on
                // the next write.
                if scan.scanned > reclaim_threshold(count) {
                    self.erase_region(region)?;
                }
                Ok(region.invalid_marker())
            }
        }
    }
}
