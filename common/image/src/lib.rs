// Licensed under the Apache-2.0 license

//! Reader/mutator for the Raspberry Pi bootloader EEPROM image format.
//!
//! An image is a fixed-size blob (512 KiB or 2 MiB) holding a sequence of
//! 8-byte-aligned, magic-tagged sections, terminated by an erased or zero
//! sentinel word. File sections carry an embedded 12-byte name and a
//! replaceable payload; the trailing erase sector of the image is reserved
//! and never written by updates.

mod directory;
mod error;
mod image;
mod section;

pub use directory::{SectionDirectory, Slot};
pub use error::ImageError;
pub use image::EepromImage;
pub use section::{
    FileHeader, Section, SectionHeader, SectionKind, BOOTCONF_TXT, ERASE_ALIGN_SIZE, FILENAME_LEN,
    FILE_HDR_LEN, FILE_MAGIC, MAGIC_BASE, MAGIC_MASK, MAX_FILE_SIZE, PAD_MAGIC, VALID_IMAGE_SIZES,
};
