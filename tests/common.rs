#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use slotlog::platform::PollBudget;

pub const WORD_SIZE: usize = 4;

/// In-memory NOR flash with faithful NOR semantics: a program can only
/// clear bits, an erase covers whole sectors and sets them back to all
/// ones. Every primitive is journaled, and faults can be injected either
/// after a fixed number of operations or by making the simulated erase
/// outlast its completion-poll budget.
pub struct Flash<const SECTOR_SIZE: usize = 4096> {
    pub buf: Vec<u8>,
    pub budget: PollBudget,
    /// Simulated worst-case erase duration. Raising it past
    /// `budget.erase_us` makes every erase fail with a timeout, the way a
    /// worn-out sector would.
    pub erase_takes_us: u32,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
    Erase { offset: u32, len: usize },
}

impl<const SECTOR_SIZE: usize> Flash<SECTOR_SIZE> {
    pub fn new(sectors: usize) -> Self {
        Self {
            buf: vec![0xffu8; SECTOR_SIZE * sectors],
            budget: PollBudget::default(),
            erase_takes_us: 60_000,
            fail_after_operation: usize::MAX,
            operations: Vec::new(),
        }
    }

    pub fn new_with_fault(sectors: usize, fail_after_operation: usize) -> Self {
        Self {
            fail_after_operation,
            ..Self::new(sectors)
        }
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    pub fn erases(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Erase { .. }))
            .count()
    }

    /// The word stored in a slot, for asserting on the raw layout.
    pub fn word(&self, slot: usize) -> u32 {
        let offset = slot * WORD_SIZE;
        u32::from_le_bytes(self.buf[offset..offset + WORD_SIZE].try_into().unwrap())
    }

    fn guard(&mut self, op: Operation) -> Result<(), FlashFault> {
        if self.operations.len() >= self.fail_after_operation {
            return Err(FlashFault::Bus);
        }
        self.operations.push(op);
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum FlashFault {
    Bus,
    Timeout,
}

impl NorFlashError for FlashFault {
    fn kind(&self) -> NorFlashErrorKind {
        NorFlashErrorKind::Other
    }
}

impl<const SECTOR_SIZE: usize> ErrorType for Flash<SECTOR_SIZE> {
    type Error = FlashFault;
}

impl<const SECTOR_SIZE: usize> ReadNorFlash for Flash<SECTOR_SIZE> {
    const READ_SIZE: usize = WORD_SIZE;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        assert!(offset.is_multiple_of(Self::READ_SIZE as u32));
        assert!(bytes.len().is_multiple_of(Self::READ_SIZE));

        self.guard(Operation::Read {
            offset,
            len: bytes.len(),
        })?;

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl<const SECTOR_SIZE: usize> NorFlash for Flash<SECTOR_SIZE> {
    const WRITE_SIZE: usize = WORD_SIZE;

    const ERASE_SIZE: usize = SECTOR_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        assert!(from.is_multiple_of(Self::ERASE_SIZE as u32));
        assert!(to.is_multiple_of(Self::ERASE_SIZE as u32));

        if self.erase_takes_us > self.budget.erase_us {
            return Err(FlashFault::Timeout);
        }

        self.guard(Operation::Erase {
            offset: from,
            len: (to - from) as usize,
        })?;

        for addr in from..to {
            self.buf[addr as usize] = 0xff;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        assert!(offset.is_multiple_of(Self::WRITE_SIZE as u32));
        assert!(bytes.len().is_multiple_of(Self::WRITE_SIZE));
        assert!(!bytes.is_empty());

        self.guard(Operation::Write {
            offset,
            len: bytes.len(),
        })?;

        let offset = offset as usize;
        for (i, &val) in bytes.iter().enumerate() {
            // programs can only flip bits from 1 to 0
            self.buf[offset + i] &= val;
        }
        Ok(())
    }
}
