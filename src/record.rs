//! Variable-length records: `ceil(len / 4)` contiguous slots per record,
//! classified through the first word alone.

use crate::error::Error;
use crate::platform::Platform;
use crate::scan::{
    ERASED_WORD, SLOT_SIZE, WritePlacement, locate_read_slot, locate_write_slot, program_bytes,
    read_bytes, reclaim_threshold, slot_count,
};
use crate::{Region, SlotLog};

fn record_stride(len: usize, count: usize) -> Result<usize, Error> {
    if len < SLOT_SIZE {
        return Err(Error::RecordTooShort);
    }
    let stride = len.div_ceil(SLOT_SIZE);
    if stride > count {
        return Err(Error::RecordTooLong);
    }
    Ok(stride)
}

impl<T: Platform> SlotLog<T> {
    pub(crate) fn write_record_inner(&mut self, region: &Region, bytes: &[u8]) -> Result<(), Error> {
        self.check_region(region)?;
        let count = slot_count::<T>();
        let stride = record_stride(bytes.len(), count)?;

        let tag = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if tag == ERASED_WORD || tag == region.invalid_marker() {
            return Err(Error::ValueReserved);
        }

        let index = match locate_write_slot(&mut self.hal, region, stride, count)? {
            WritePlacement::Free(index) | WritePlacement::AfterInvalidate(index) => index,
            WritePlacement::Exhausted => {
                self.erase_region(region)?;
                0
            }
        };
        program_bytes(&mut self.hal, region.slot_addr(index), bytes)
    }

    pub(crate) fn read_record_inner(
        &mut self,
        region: &Region,
        buf: &mut [u8],
    ) -> Result<Option<u32>, Error> {
        self.check_region(region)?;
        let count = slot_count::<T>();
        let stride = record_stride(buf.len(), count)?;

        let scan = locate_read_slot(&mut self.hal, region, stride, count)?;
        match scan.hit {
            Some((index, tag)) => {
                read_bytes(&mut self.hal, region.slot_addr(index), buf)?;
                Ok(Some(tag))
            }
            None => {
                if scan.scanned > reclaim_threshold(count) {
                    self.erase_region(region)?;
                }
                Ok(None)
            }
        }
    }
}
