// Licensed under the Apache-2.0 license

use std::io::Write;

use anyhow::{bail, Result};
use log::{debug, info};

use crate::Transport;

/// SRAM base; uploaded firmware lands here.
pub const SRAM_BASE: u32 = 0x2000_0000;
pub const SRAM_SIZE: usize = 0x2_0000;
/// Upload chunk size. Longer bus writes arrive corrupted.
pub const CHUNK_SIZE: usize = 64;

/// sysinfo block; the chip id is its first word, readable only once the
/// block is released from reset.
pub const SYSINFO_BASE: u32 = 0x4000_0000;
/// Clear alias of the three-word resets block: writing a 1 bit releases
/// that line from reset.
pub const RESETS_CLR: u32 = 0x4001_7000;
/// sysinfo bit inside the second resets word.
pub const SYSINFO_RESET_MASK: u32 = 0x0080_0000;

/// Power gate register poked during the boot handoff.
pub const POWER_GATE_REG: u32 = 0x4001_0008;
pub const POWER_GATE_BOOT: u32 = 0x100;

/// Watchdog control word; bit 31 forces the reboot the ROM intercepts.
pub const WATCHDOG_CTRL: u32 = 0x4015_4000;
pub const WATCHDOG_TRIGGER: u32 = 0x8000_0000;
/// Watchdog scratch registers the boot ROM inspects after a forced
/// reboot: magic, magic-xor-entry, and a ROM vector routine.
pub const BOOT_MAGIC_REG: u32 = 0x4015_400c;
pub const BOOT_ENTRY_REG: u32 = 0x4015_4010;
pub const BOOT_VECTOR_REG: u32 = 0x4015_4018;
pub const BOOT_MAGIC: u32 = 0xb007_c0de;
/// Thumb-mode entry at the bottom of SRAM.
pub const SRAM_ENTRY: u32 = SRAM_BASE | 1;
pub const ROM_BOOT_VECTOR: u32 = 0x1000_30d0;

/// Readable boot ROM window. The hardware window is 64 KiB with the ROM
/// mirrored after 32 KiB; the upper half avoids the zeroed words at the
/// very start.
pub const BOOTROM_BASE: u32 = 0x8000;
pub const BOOTROM_SIZE: usize = 32 * 1024;

/// Driver for the sequences the boot ROM accepts over a [`Transport`].
pub struct Bootstrap<T: Transport> {
    transport: T,
}

impl<T: Transport> Bootstrap<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Reset the chip, release the sysinfo block, and read the chip id.
    pub fn chip_id(&mut self) -> Result<u32> {
        self.transport.reset()?;
        self.transport.write_reg(RESETS_CLR + 4, SYSINFO_RESET_MASK)?;
        self.transport.read_reg(SYSINFO_BASE)
    }

    /// Upload `firmware` to SRAM and hand control to it.
    ///
    /// Expects the chip freshly reset into bootstrap mode; call
    /// [`Transport::reset`] first if its state is unknown. The handoff
    /// plants the watchdog scratch vector and forces a watchdog reboot,
    /// which the ROM resolves to the SRAM entry point.
    pub fn load_firmware(&mut self, firmware: &[u8]) -> Result<()> {
        if firmware.len() > SRAM_SIZE {
            bail!(
                "firmware is {} bytes, larger than the {} byte sram",
                firmware.len(),
                SRAM_SIZE
            );
        }
        for (i, chunk) in firmware.chunks(CHUNK_SIZE).enumerate() {
            self.transport
                .write_bytes(SRAM_BASE + (i * CHUNK_SIZE) as u32, chunk)?;
        }
        debug!("uploaded {} bytes to sram", firmware.len());

        self.transport.write_reg(BOOT_MAGIC_REG, BOOT_MAGIC)?;
        self.transport
            .write_reg(BOOT_ENTRY_REG, BOOT_MAGIC ^ SRAM_ENTRY)?;
        self.transport.write_reg(BOOT_VECTOR_REG, ROM_BOOT_VECTOR)?;
        self.transport.write_reg(POWER_GATE_REG, POWER_GATE_BOOT)?;
        self.transport.write_reg(WATCHDOG_CTRL, WATCHDOG_TRIGGER)?;
        info!(
            "handed off to {} byte firmware at {:#010x}",
            firmware.len(),
            SRAM_BASE
        );
        Ok(())
    }

    /// Release every peripheral block from reset.
    pub fn release_all_resets(&mut self) -> Result<()> {
        for word in 0..3u32 {
            self.transport
                .write_reg(RESETS_CLR + word * 4, 0xffff_ffff)?;
        }
        Ok(())
    }

    /// Reset the chip and copy the boot ROM out through `sink`.
    ///
    /// Reads one word at a time: wider reads come back with flipped bits.
    pub fn dump_bootrom(&mut self, mut sink: impl Write) -> Result<()> {
        self.transport.reset()?;
        self.release_all_resets()?;
        for offset in (0..BOOTROM_SIZE as u32).step_by(4) {
            let word = self.transport.read_bytes(BOOTROM_BASE + offset, 4)?;
            sink.write_all(&word)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InitParams, ModelEmulated};

    #[test]
    fn test_load_firmware_uploads_chunks_and_hands_off() {
        let model = ModelEmulated::new(InitParams::default());
        let mut boot = Bootstrap::new(model);
        let firmware: Vec<u8> = (0..200u32).map(|i| i as u8).collect();

        boot.load_firmware(&firmware).unwrap();

        let model = boot.into_inner();
        assert_eq!(&model.sram()[..200], &firmware[..]);
        assert!(model.sram()[200..].iter().all(|&b| b == 0));
        assert_eq!(model.reg(BOOT_MAGIC_REG), Some(BOOT_MAGIC));
        assert_eq!(model.reg(BOOT_ENTRY_REG), Some(BOOT_MAGIC ^ SRAM_ENTRY));
        assert_eq!(model.reg(BOOT_VECTOR_REG), Some(ROM_BOOT_VECTOR));
        assert_eq!(model.reg(POWER_GATE_REG), Some(POWER_GATE_BOOT));
        assert_eq!(model.reg(WATCHDOG_CTRL), Some(WATCHDOG_TRIGGER));
    }

    #[test]
    fn test_load_firmware_rejects_oversized_image() {
        let mut boot = Bootstrap::new(ModelEmulated::new(InitParams::default()));
        assert!(boot.load_firmware(&vec![0; SRAM_SIZE + 1]).is_err());
    }

    #[test]
    fn test_chip_id_needs_the_sysinfo_release() {
        let mut model = ModelEmulated::new(InitParams {
            chip_id: 0x4a00_1927,
            ..InitParams::default()
        });
        // Still held in reset: the id register reads as zero.
        assert_eq!(model.read_reg(SYSINFO_BASE).unwrap(), 0);

        let mut boot = Bootstrap::new(model);
        assert_eq!(boot.chip_id().unwrap(), 0x4a00_1927);
        let model = boot.into_inner();
        assert_eq!(model.reset_count(), 1);
    }

    #[test]
    fn test_dump_bootrom_reads_the_whole_rom() {
        let rom: Vec<u8> = (0..BOOTROM_SIZE as u32).map(|i| (i % 251) as u8).collect();
        let model = ModelEmulated::new(InitParams {
            bootrom: rom.clone(),
            ..InitParams::default()
        });
        let mut boot = Bootstrap::new(model);

        let mut dump = Vec::new();
        boot.dump_bootrom(&mut dump).unwrap();

        assert_eq!(dump, rom);
        let model = boot.into_inner();
        assert_eq!(model.released_resets(), [0xffff_ffff; 3]);
        assert_eq!(model.reset_count(), 1);
    }
}
