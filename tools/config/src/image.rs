// Licensed under the Apache-2.0 license

//! Subcommands operating on a bootloader EEPROM image file.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use eeprom_image::{EepromImage, MAX_FILE_SIZE};
use log::debug;

use crate::pem;

/// Print one line per section: offset, magic, stored length, name.
pub fn list(path: &Path) -> Result<()> {
    let image = load(path)?;
    for section in image.directory().sections() {
        println!(
            "{:#010x} {:#010x} {:8} {}",
            section.offset,
            section.magic,
            section.length,
            section.name()
        );
    }
    Ok(())
}

/// Write every section's payload into `dir`, one file per section name.
pub fn extract_all(path: &Path, dir: &Path) -> Result<()> {
    let image = load(path)?;
    fs::create_dir_all(dir)
        .map_err(|e| anyhow!("Unable to create directory '{}': {}", dir.display(), e))?;
    image
        .extract_all(dir)
        .map_err(|e| anyhow!("Unable to extract to '{}': {}", dir.display(), e))?;
    println!(
        "Extracted {} sections to {}",
        image.directory().sections().len(),
        dir.display()
    );
    Ok(())
}

/// Replace `target`'s payload with the contents of `src`.
pub fn update_file(path: &Path, target: &str, src: &Path, output: Option<&Path>) -> Result<()> {
    let payload =
        fs::read(src).map_err(|e| anyhow!("Cannot read file '{}': {}", src.display(), e))?;
    if payload.len() > MAX_FILE_SIZE {
        bail!(
            "'{}' is {} bytes; a section payload holds at most {} bytes",
            src.display(),
            payload.len(),
            MAX_FILE_SIZE
        );
    }
    update(path, target, &payload, output)
}

/// Replace `target`'s payload with the raw public key from a PEM file.
pub fn update_key(path: &Path, target: &str, pem_file: &Path, output: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(pem_file)
        .map_err(|e| anyhow!("Cannot read file '{}': {}", pem_file.display(), e))?;
    let raw = pem::public_key_bytes(&text)
        .map_err(|e| anyhow!("'{}': {}", pem_file.display(), e))?;
    debug!("raw public key bytes: {}", hex::encode(raw));
    update(path, target, &raw, output)
}

fn update(path: &Path, target: &str, payload: &[u8], output: Option<&Path>) -> Result<()> {
    let mut image = load(path)?;
    image.update(target, payload)?;
    let dest = output.unwrap_or(path);
    image
        .write_file(dest)
        .map_err(|e| anyhow!("Unable to write '{}': {}", dest.display(), e))?;
    println!("Updated {} ({} bytes) in {}", target, payload.len(), dest.display());
    Ok(())
}

/// Print the payload of the boot configuration file.
pub fn read_bootconf(path: &Path) -> Result<()> {
    let image = load(path)?;
    std::io::stdout().write_all(image.bootconf()?)?;
    Ok(())
}

/// Copy an image to a file, or to stdout when `output` is `-`.
pub fn write(path: &Path, output: &str) -> Result<()> {
    let image = load(path)?;
    if output == "-" {
        image.write_to(std::io::stdout().lock())?;
    } else {
        image
            .write_file(output)
            .map_err(|e| anyhow!("Unable to write '{}': {}", output, e))?;
    }
    Ok(())
}

fn load(path: &Path) -> Result<EepromImage> {
    EepromImage::from_file(path)
        .map_err(|e| anyhow!("Cannot load image '{}': {}", path.display(), e))
}
