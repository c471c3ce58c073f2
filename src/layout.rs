//! Capacity-dependent flash layout.
//!
//! The MAC and calibration sectors sit just below the end of the device,
//! so their addresses depend on the part that was actually soldered.
//! Boot code reads the JEDEC ID once, builds a [`Layout`] from the
//! density byte and passes it along to whoever picks region bases; there
//! is no process-wide mutable state involved.

use crate::error::Error;

/// Supported device densities, keyed by the JEDEC density byte (the third
/// byte of the manufacturer ID).
#[derive(strum::FromRepr, strum::Display, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Capacity {
    K512 = 0x13,
    M1 = 0x14,
}

impl Capacity {
    pub const fn bytes(self) -> u32 {
        match self {
            Capacity::K512 => 512 * 1024,
            Capacity::M1 => 1024 * 1024,
        }
    }
}

/// Where the fixed-purpose sectors live on a given part.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    capacity: Capacity,
    mac_sector: u32,
    calibration_sector: u32,
}

impl Layout {
    /// Builds the layout for the part identified by a JEDEC density byte.
    pub fn from_density_code(code: u8) -> Result<Self, Error> {
        let capacity = Capacity::from_repr(code).ok_or(Error::UnsupportedCapacity)?;
        Ok(Self::from_capacity(capacity))
    }

    pub const fn from_capacity(capacity: Capacity) -> Self {
        match capacity {
            Capacity::K512 => Self {
                capacity,
                mac_sector: 0x76000,
                calibration_sector: 0x77000,
            },
            Capacity::M1 => Self {
                capacity,
                mac_sector: 0xFF000,
                calibration_sector: 0xFE000,
            },
        }
    }

    pub const fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Sector holding the device MAC address.
    pub const fn mac_sector(&self) -> u32 {
        self.mac_sector
    }

    /// Sector holding factory calibration values.
    pub const fn calibration_sector(&self) -> u32 {
        self.calibration_sector
    }
}
