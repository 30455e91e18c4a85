// Licensed under the Apache-2.0 license

//! Boundary to the RP1 bootstrap port: a byte transport addressed by
//! 32-bit bus addresses, plus the driver sequences the boot ROM expects.
//! The only in-tree implementation is an in-memory model; real bus
//! electronics stay outside this crate.

mod bootstrap;
mod model_emulated;

use anyhow::Result;

pub use bootstrap::{
    Bootstrap, BOOTROM_BASE, BOOTROM_SIZE, BOOT_ENTRY_REG, BOOT_MAGIC, BOOT_MAGIC_REG,
    BOOT_VECTOR_REG, CHUNK_SIZE, POWER_GATE_BOOT, POWER_GATE_REG, RESETS_CLR, ROM_BOOT_VECTOR,
    SRAM_BASE, SRAM_ENTRY, SRAM_SIZE, SYSINFO_BASE, SYSINFO_RESET_MASK, WATCHDOG_CTRL,
    WATCHDOG_TRIGGER,
};
pub use model_emulated::{InitParams, ModelEmulated};

pub type DefaultModel = ModelEmulated;

/// Raw byte access to the chip over its bootstrap port.
pub trait Transport {
    /// Write `data` starting at bus address `addr`.
    fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Read `len` bytes starting at bus address `addr`.
    fn read_bytes(&mut self, addr: u32, len: usize) -> Result<Vec<u8>>;

    /// Pulse the chip's RUN line, putting it back into bootstrap mode.
    fn reset(&mut self) -> Result<()>;

    /// Read one peripheral register. Register values travel least
    /// significant byte first, independent of the transport's own framing.
    fn read_reg(&mut self, addr: u32) -> Result<u32> {
        let bytes = self.read_bytes(addr, 4)?;
        let word: [u8; 4] = bytes.as_slice().try_into()?;
        Ok(u32::from_le_bytes(word))
    }

    /// Write one peripheral register, least significant byte first.
    fn write_reg(&mut self, addr: u32, value: u32) -> Result<()> {
        self.write_bytes(addr, &value.to_le_bytes())
    }
}
