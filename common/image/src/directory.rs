// Licensed under the Apache-2.0 license

use std::mem::size_of;

use log::debug;
use zerocopy::FromBytes;

use crate::error::ImageError;
use crate::section::{
    FileHeader, Section, SectionHeader, SectionKind, ERASE_ALIGN_SIZE, FILE_MAGIC, MAGIC_BASE,
    MAGIC_MASK, PAD_MAGIC,
};

/// End-of-table sentinels: a never-written word and erased flash.
const SENTINEL_MAGICS: [u32; 2] = [0x0000_0000, 0xffff_ffff];

/// Ordered table of the sections found in an image, ascending by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDirectory {
    sections: Vec<Section>,
    image_size: usize,
}

/// Where a named section sits and how much room it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Offset of the section header (its magic word).
    pub header_offset: usize,
    /// Stored length field of the section.
    pub length: u32,
    /// Whether the section is the final directory entry.
    pub is_last: bool,
    /// Offset of the first following non-pad section, or the scratch
    /// boundary when nothing live follows.
    pub next_offset: usize,
}

impl SectionDirectory {
    /// Walk the section table at the front of `data`.
    ///
    /// Stops at the first sentinel magic or at the end of the buffer;
    /// any other magic failing the mask check aborts the whole parse.
    pub fn parse(data: &[u8]) -> Result<Self, ImageError> {
        let mut sections = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let header = read_section_header(data, offset)?;
            let magic = header.magic.get();
            if SENTINEL_MAGICS.contains(&magic) {
                break;
            }
            if magic & MAGIC_MASK != MAGIC_BASE {
                return Err(ImageError::Corrupt { offset, magic });
            }
            let length = header.length.get();
            let kind = if magic == FILE_MAGIC {
                SectionKind::File(read_filename(data, offset)?)
            } else if magic == PAD_MAGIC {
                SectionKind::Pad
            } else {
                SectionKind::Other(format!("{offset}.bin"))
            };
            let section = Section {
                magic,
                offset,
                length,
                kind,
            };
            debug!(
                "section {} magic {:#010x} offset {:#x} length {}",
                section.name(),
                magic,
                offset,
                length
            );
            offset = section.end();
            sections.push(section);
        }
        Ok(Self {
            sections,
            image_size: data.len(),
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }

    /// Find the first section answering to `name`.
    ///
    /// The match is deliberately broad: pad and unrecognized sections are
    /// candidates too, through their synthetic `"<offset>.bin"` names.
    /// Existing tooling addresses raw sections that way, so the match must
    /// not be narrowed to file sections.
    pub fn locate(&self, name: &str) -> Result<Slot, ImageError> {
        let index = self
            .sections
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| ImageError::NotFound {
                name: name.to_string(),
            })?;
        let next_offset = self.sections[index + 1..]
            .iter()
            .find(|s| !s.is_pad())
            .map_or_else(|| self.scratch_boundary(), |s| s.offset);
        let found = &self.sections[index];
        Ok(Slot {
            header_offset: found.offset,
            length: found.length,
            is_last: index == self.sections.len() - 1,
            next_offset,
        })
    }

    /// First byte of the reserved trailing erase sector. Updates may not
    /// reach past this even when nothing follows the target section.
    pub fn scratch_boundary(&self) -> usize {
        self.image_size.saturating_sub(ERASE_ALIGN_SIZE)
    }
}

fn read_section_header(data: &[u8], offset: usize) -> Result<SectionHeader, ImageError> {
    let len = size_of::<SectionHeader>();
    let bytes = data
        .get(offset..offset + len)
        .ok_or(ImageError::OutOfRange { offset, len })?;
    SectionHeader::read_from_bytes(bytes).map_err(|_| ImageError::OutOfRange { offset, len })
}

fn read_filename(data: &[u8], offset: usize) -> Result<String, ImageError> {
    let len = size_of::<FileHeader>();
    let bytes = data
        .get(offset..offset + len)
        .ok_or(ImageError::OutOfRange { offset, len })?;
    let header =
        FileHeader::read_from_bytes(bytes).map_err(|_| ImageError::OutOfRange { offset, len })?;
    // Trailing NULs are padding; interior bytes are kept as-is.
    let end = header
        .filename
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |i| i + 1);
    Ok(String::from_utf8_lossy(&header.filename[..end]).into_owned())
}
