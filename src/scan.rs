//! Shared slot scanner: locates where the next write lands and where the
//! current value lives, given a region and a slot stride.

use crate::Region;
use crate::error::Error;
use crate::platform::{Platform, align_floor};

/// Slots are one little-endian word wide; records span several of them.
pub(crate) const SLOT_SIZE: usize = 4;

/// What a slot reads back as after a sector erase; doubles as the "never
/// written" sentinel.
pub(crate) const ERASED_WORD: u32 = u32::MAX;

/// How close to the end of a region an empty-handed read scan may get
/// before the region is erased to reclaim it. On a 1024-slot sector this
/// leaves the last 24 slots as headroom; tiny regions fall back to the
/// three-quarter mark so the reclaim does not fire on every miss.
const RECLAIM_SLACK: usize = 24;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) enum SlotState {
    Erased,
    Invalidated,
    Occupied,
}

pub(crate) const fn classify(word: u32, marker: u32) -> SlotState {
    if word == ERASED_WORD {
        SlotState::Erased
    } else if word == marker {
        SlotState::Invalidated
    } else {
        SlotState::Occupied
    }
}

pub(crate) fn slot_count<T: Platform>() -> usize {
    T::ERASE_SIZE / SLOT_SIZE
}

pub(crate) fn reclaim_threshold(count: usize) -> usize {
    count.saturating_sub(RECLAIM_SLACK).max(count - count / 4)
}

/// Where the next write goes.
pub(crate) enum WritePlacement {
    /// Slot `index` is erased; program straight into it.
    Free(usize),
    /// The superseded slot has already been invalidated; program at
    /// `index`.
    AfterInvalidate(usize),
    /// No slot left, whether because the occupied run sits at the end of
    /// the range or because every slot is invalidated. The caller decides
    /// between erasing and failing.
    Exhausted,
}

/// Scans `0..count` in steps of `stride` for the slot the next write
/// should claim.
///
/// Finding a live value mid-region invalidates it on the spot, so that at
/// no point two occupied slots coexist; only then is the following slot
/// handed out. A live value too close to the end to advance past is left
/// untouched and reported as `Exhausted`.
pub(crate) fn locate_write_slot<T: Platform>(
    hal: &mut T,
    region: &Region,
    stride: usize,
    count: usize,
) -> Result<WritePlacement, Error> {
    let mut index = 0;
    while index + stride <= count {
        let addr = region.slot_addr(index);
        match classify(read_word(hal, addr)?, region.invalid_marker()) {
            SlotState::Erased => return Ok(WritePlacement::Free(index)),
            SlotState::Invalidated => index += stride,
            SlotState::Occupied => {
                let next = index + stride;
                if next + stride > count {
                    return Ok(WritePlacement::Exhausted);
                }

                #[cfg(feature = "defmt")]
                defmt::trace!("invalidate slot {} @{:#08x}", index, addr);

                program_word(hal, addr, region.invalid_marker())?;
                return Ok(WritePlacement::AfterInvalidate(next));
            }
        }
    }
    Ok(WritePlacement::Exhausted)
}

pub(crate) struct ReadScan {
    /// First occupied slot index and its word, if any.
    pub(crate) hit: Option<(usize, u32)>,
    /// Index at which the scan terminated; feeds the read-path reclaim.
    pub(crate) scanned: usize,
}

/// Scans for the slot holding the current value. An erased slot ends the
/// search immediately: values are never written after a gap.
pub(crate) fn locate_read_slot<T: Platform>(
    hal: &mut T,
    region: &Region,
    stride: usize,
    count: usize,
) -> Result<ReadScan, Error> {
    let mut index = 0;
    while index + stride <= count {
        let word = read_word(hal, region.slot_addr(index))?;
        match classify(word, region.invalid_marker()) {
            SlotState::Erased => {
                return Ok(ReadScan {
                    hit: None,
                    scanned: index,
                });
            }
            SlotState::Invalidated => index += stride,
            SlotState::Occupied => {
                return Ok(ReadScan {
                    hit: Some((index, word)),
                    scanned: index,
                });
            }
        }
    }
    Ok(ReadScan {
        hit: None,
        scanned: index,
    })
}

pub(crate) fn read_word<T: Platform>(hal: &mut T, addr: u32) -> Result<u32, Error> {
    let mut buf = [0u8; SLOT_SIZE];
    hal.read(addr, &mut buf).map_err(|_| Error::FlashError)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn program_word<T: Platform>(hal: &mut T, addr: u32, word: u32) -> Result<(), Error> {
    hal.write(addr, &word.to_le_bytes())
        .map_err(|_| Error::FlashError)
}

/// Reads `buf.len()` bytes, tolerating lengths that are not a multiple of
/// the device's read granularity by bouncing the tail through a slot-wide
/// scratch buffer.
pub(crate) fn read_bytes<T: Platform>(hal: &mut T, addr: u32, buf: &mut [u8]) -> Result<(), Error> {
    let pivot = align_floor(buf.len(), T::READ_SIZE);
    if pivot > 0 {
        hal.read(addr, &mut buf[..pivot])
            .map_err(|_| Error::FlashError)?;
    }

    let trailer = buf.len() - pivot;
    if trailer > 0 {
        let mut scratch = [0u8; SLOT_SIZE];
        hal.read(addr + pivot as u32, &mut scratch[..T::READ_SIZE])
            .map_err(|_| Error::FlashError)?;
        buf[pivot..].copy_from_slice(&scratch[..trailer]);
    }
    Ok(())
}

/// Programs `bytes`, padding a trailing partial word with `0xFF` so the
/// untouched rest of the slot stays in its erased state.
pub(crate) fn program_bytes<T: Platform>(hal: &mut T, addr: u32, bytes: &[u8]) -> Result<(), Error> {
    #[cfg(feature = "defmt")]
    defmt::trace!("program @{:#08x}: [{}]", addr, bytes.len());

    let pivot = align_floor(bytes.len(), T::WRITE_SIZE);
    if pivot > 0 {
        hal.write(addr, &bytes[..pivot])
            .map_err(|_| Error::FlashError)?;
    }

    let trailer = &bytes[pivot..];
    if trailer.iter().any(|&b| b != 0xFF) {
        let mut padded = [0xFFu8; SLOT_SIZE];
        padded[..trailer.len()].copy_from_slice(trailer);
        hal.write(addr + pivot as u32, &padded[..T::WRITE_SIZE])
            .map_err(|_| Error::FlashError)?;
    }
    Ok(())
}
