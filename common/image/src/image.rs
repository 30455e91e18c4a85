// Licensed under the Apache-2.0 license

use std::fs;
use std::io::Write;
use std::path::Path;

use zerocopy::IntoBytes;

use crate::directory::{SectionDirectory, Slot};
use crate::error::ImageError;
use crate::section::{
    align8, SectionHeader, BOOTCONF_TXT, FILENAME_LEN, FILE_HDR_LEN, PAD_MAGIC, VALID_IMAGE_SIZES,
};

/// A bootloader EEPROM image: the byte arena plus its parsed directory.
///
/// The directory always reflects the bytes. Mutating operations validate
/// against the current directory, edit the arena, and re-derive the
/// directory before returning, so callers never hold stale geometry.
#[derive(Debug, Clone)]
pub struct EepromImage {
    data: Vec<u8>,
    directory: SectionDirectory,
}

impl EepromImage {
    /// Take ownership of raw image bytes and parse the section table.
    pub fn new(data: Vec<u8>) -> Result<Self, ImageError> {
        if !VALID_IMAGE_SIZES.contains(&data.len()) {
            return Err(ImageError::BadImageSize(data.len()));
        }
        let directory = SectionDirectory::parse(&data)?;
        Ok(Self { data, directory })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        Self::new(fs::read(path)?)
    }

    pub fn directory(&self) -> &SectionDirectory {
        &self.directory
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Replace the payload of the section answering to `name`.
    ///
    /// The rewritten footprint (header, filename, reserved word, payload,
    /// alignment fill) must stop before the next live section and before
    /// the scratch sector; otherwise the arena is left byte-for-byte
    /// unchanged and an error is returned. The gap up to the next live
    /// section is re-padded: framed as a pad section when it is large
    /// enough and something follows, plain erase fill otherwise.
    pub fn update(&mut self, name: &str, payload: &[u8]) -> Result<(), ImageError> {
        let Slot {
            header_offset,
            is_last,
            next_offset,
            ..
        } = self.directory.locate(name)?;
        let update_len = payload.len() + FILE_HDR_LEN;
        let payload_offset = header_offset + 4 + FILE_HDR_LEN;
        let footprint_end = align8(payload_offset + payload.len());
        if footprint_end > self.directory.scratch_boundary() {
            return Err(ImageError::OutOfImage {
                offset: header_offset,
                attempted: update_len,
            });
        }
        if footprint_end > next_offset {
            return Err(ImageError::SectionOverflow {
                attempted: update_len,
                available: next_offset - header_offset,
            });
        }

        let stored_len = (payload.len() + FILENAME_LEN + 4) as u32;
        self.write_at(header_offset + 4, &stored_len.to_be_bytes())?;
        self.write_at(payload_offset, payload)?;

        // 0xFF is the erase value; everything from the payload end to the
        // next live section must read as erased flash.
        let payload_end = payload_offset + payload.len();
        self.fill(payload_end, footprint_end - payload_end, 0xff)?;
        let gap = next_offset - footprint_end;
        if gap > 8 && !is_last {
            let pad = SectionHeader::new(PAD_MAGIC, (gap - 8) as u32);
            self.write_at(footprint_end, pad.as_bytes())?;
            self.fill(footprint_end + 8, gap - 8, 0xff)?;
        } else {
            self.fill(footprint_end, gap, 0xff)?;
        }

        self.directory = SectionDirectory::parse(&self.data)?;
        Ok(())
    }

    /// Payload bytes of the section answering to `name`.
    ///
    /// The stored length covers the filename and the reserved word; a
    /// length shorter than those yields an empty payload.
    pub fn payload(&self, name: &str) -> Result<&[u8], ImageError> {
        let slot = self.directory.locate(name)?;
        let start = slot.header_offset + 4 + FILE_HDR_LEN;
        let len = (slot.length as usize).saturating_sub(FILENAME_LEN + 4);
        self.slice(start, len)
    }

    /// Contents of the boot configuration file.
    pub fn bootconf(&self) -> Result<&[u8], ImageError> {
        self.payload(BOOTCONF_TXT)
    }

    /// Write every section's payload into `dir`, one file per section name.
    pub fn extract_all(&self, dir: impl AsRef<Path>) -> Result<(), ImageError> {
        let dir = dir.as_ref();
        for section in self.directory.sections() {
            let name = section.name();
            let payload = self.payload(&name)?;
            fs::write(dir.join(name.as_ref()), payload)?;
        }
        Ok(())
    }

    /// Serialize the image to `sink`.
    pub fn write_to(&self, mut sink: impl Write) -> Result<(), ImageError> {
        sink.write_all(&self.data)?;
        Ok(())
    }

    /// Serialize the image to a file at `path`.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        fs::write(path, &self.data)?;
        Ok(())
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&[u8], ImageError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(ImageError::OutOfRange { offset, len })
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), ImageError> {
        let len = bytes.len();
        offset
            .checked_add(len)
            .and_then(|end| self.data.get_mut(offset..end))
            .ok_or(ImageError::OutOfRange { offset, len })?
            .copy_from_slice(bytes);
        Ok(())
    }

    fn fill(&mut self, offset: usize, len: usize, value: u8) -> Result<(), ImageError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get_mut(offset..end))
            .ok_or(ImageError::OutOfRange { offset, len })?
            .fill(value);
        Ok(())
    }
}
