// Licensed under the Apache-2.0 license

use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::bootstrap::{
    BOOTROM_BASE, BOOTROM_SIZE, RESETS_CLR, SRAM_BASE, SRAM_SIZE, SYSINFO_BASE,
    SYSINFO_RESET_MASK,
};
use crate::Transport;

#[derive(Clone)]
pub struct InitParams {
    /// Chip id readable at the sysinfo base once the block is released.
    pub chip_id: u32,
    /// Boot ROM contents behind the ROM window; padded or truncated to
    /// the window size.
    pub bootrom: Vec<u8>,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            chip_id: 0,
            bootrom: vec![0; BOOTROM_SIZE],
        }
    }
}

/// In-memory stand-in for a chip on the bootstrap port.
///
/// Models what the driver sequences rely on: SRAM, the ROM window, the
/// resets clear alias, the gated chip id, and a sparse word-register
/// file for everything else.
pub struct ModelEmulated {
    sram: Vec<u8>,
    bootrom: Vec<u8>,
    chip_id: u32,
    regs: HashMap<u32, u32>,
    released: [u32; 3],
    reset_count: u32,
}

impl ModelEmulated {
    pub fn new(params: InitParams) -> Self {
        let mut bootrom = params.bootrom;
        bootrom.resize(BOOTROM_SIZE, 0);
        Self {
            sram: vec![0; SRAM_SIZE],
            bootrom,
            chip_id: params.chip_id,
            regs: HashMap::new(),
            released: [0; 3],
            reset_count: 0,
        }
    }

    pub fn sram(&self) -> &[u8] {
        &self.sram
    }

    /// Last value written to a plain word register, if any.
    pub fn reg(&self, addr: u32) -> Option<u32> {
        self.regs.get(&addr).copied()
    }

    /// Reset lines released so far, one bitmask per resets word.
    pub fn released_resets(&self) -> [u32; 3] {
        self.released
    }

    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }

    fn sysinfo_released(&self) -> bool {
        self.released[1] & SYSINFO_RESET_MASK != 0
    }
}

impl Default for ModelEmulated {
    fn default() -> Self {
        Self::new(InitParams::default())
    }
}

fn in_sram(addr: u32) -> bool {
    (SRAM_BASE..SRAM_BASE + SRAM_SIZE as u32).contains(&addr)
}

fn in_rom(addr: u32) -> bool {
    (BOOTROM_BASE..BOOTROM_BASE + BOOTROM_SIZE as u32).contains(&addr)
}

fn region_range(addr: u32, base: u32, size: usize, len: usize) -> Result<std::ops::Range<usize>> {
    let start = (addr - base) as usize;
    let end = start.checked_add(len).unwrap_or(usize::MAX);
    if end > size {
        bail!(
            "access of {} bytes at {:#010x} crosses the region boundary",
            len,
            addr
        );
    }
    Ok(start..end)
}

fn word_value(addr: u32, data: &[u8]) -> Result<u32> {
    if data.len() != 4 || addr % 4 != 0 {
        bail!(
            "register access at {:#010x} must be one aligned word, got {} bytes",
            addr,
            data.len()
        );
    }
    let word: [u8; 4] = data.try_into()?;
    Ok(u32::from_le_bytes(word))
}

impl Transport for ModelEmulated {
    fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        if in_sram(addr) {
            let range = region_range(addr, SRAM_BASE, SRAM_SIZE, data.len())?;
            self.sram[range].copy_from_slice(data);
            return Ok(());
        }
        if (RESETS_CLR..RESETS_CLR + 12).contains(&addr) {
            let value = word_value(addr, data)?;
            let word = ((addr - RESETS_CLR) / 4) as usize;
            self.released[word] |= value;
            return Ok(());
        }
        let value = word_value(addr, data)?;
        self.regs.insert(addr, value);
        Ok(())
    }

    fn read_bytes(&mut self, addr: u32, len: usize) -> Result<Vec<u8>> {
        if in_sram(addr) {
            let range = region_range(addr, SRAM_BASE, SRAM_SIZE, len)?;
            return Ok(self.sram[range].to_vec());
        }
        if in_rom(addr) {
            let range = region_range(addr, BOOTROM_BASE, BOOTROM_SIZE, len)?;
            return Ok(self.bootrom[range].to_vec());
        }
        if addr == SYSINFO_BASE && len == 4 {
            let id = if self.sysinfo_released() {
                self.chip_id
            } else {
                0
            };
            return Ok(id.to_le_bytes().to_vec());
        }
        if let Some(value) = self.regs.get(&addr) {
            if len == 4 {
                return Ok(value.to_le_bytes().to_vec());
            }
        }
        bail!("unmapped read of {} bytes at {:#010x}", len, addr);
    }

    fn reset(&mut self) -> Result<()> {
        // SRAM contents survive a RUN pulse; peripheral state does not.
        self.regs.clear();
        self.released = [0; 3];
        self.reset_count += 1;
        Ok(())
    }
}
