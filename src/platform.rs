use embedded_storage::nor_flash::NorFlash;

/// The raw flash collaborator.
///
/// Any `embedded-storage` NOR driver qualifies. The log relies on the
/// standard NOR contract: erase sets every byte of an erase unit to
/// `0xFF`, program only clears bits, and both block until the physical
/// operation has completed. Drivers must keep interrupt handlers and
/// concurrent bus users away from the device for the duration of a
/// primitive, and must bound any completion polling (see [`PollBudget`])
/// instead of spinning forever.
///
/// Program source buffers must live in RAM, not in the flash range being
/// programmed.
pub trait Platform: NorFlash {}

impl<T: NorFlash> Platform for T {}

/// Upper bounds on completion polling, for drivers that spin on the
/// device's busy bit after kicking off a program or erase.
///
/// A primitive that is still busy once its budget has elapsed must fail
/// rather than keep spinning; the log then latches the fault. The
/// defaults cover the worst-case figures common to the small SPI NOR
/// parts this log targets (sector erase 300 ms, page program 3 ms).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollBudget {
    pub erase_us: u32,
    pub program_us: u32,
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            erase_us: 300_000,
            program_us: 3_000,
        }
    }
}

#[inline(always)]
pub(crate) const fn align_floor(size: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    size & !(alignment - 1)
}
