// Licensed under the Apache-2.0 license

//! Whole-file compress/decompress subcommands.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use anyhow::{anyhow, Result};

pub fn compress(input: &Path, output: Option<&Path>) -> Result<()> {
    let data =
        fs::read(input).map_err(|e| anyhow!("Cannot read file '{}': {}", input.display(), e))?;
    emit(&eeprom_compress::compress(&data), output)
}

pub fn decompress(input: &Path, output: Option<&Path>) -> Result<()> {
    let data =
        fs::read(input).map_err(|e| anyhow!("Cannot read file '{}': {}", input.display(), e))?;
    let plain = eeprom_compress::decompress(&data)
        .map_err(|e| anyhow!("'{}': {}", input.display(), e))?;
    emit(&plain, output)
}

fn emit(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, bytes)
            .map_err(|e| anyhow!("Unable to write '{}': {}", path.display(), e))?,
        None => std::io::stdout().lock().write_all(bytes)?,
    }
    Ok(())
}
