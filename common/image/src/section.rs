// Licensed under the Apache-2.0 license

use std::borrow::Cow;

use zerocopy::{byteorder::U32, FromBytes, Immutable, IntoBytes, KnownLayout};

/// Base pattern every valid section magic matches under [`MAGIC_MASK`].
pub const MAGIC_BASE: u32 = 0x55aa_f00f;
pub const MAGIC_MASK: u32 = 0xffff_f00f;
/// Section holding a named, replaceable file.
pub const FILE_MAGIC: u32 = 0x55aa_f11f;
/// Alignment filler section.
pub const PAD_MAGIC: u32 = 0x55aa_feef;

/// Bytes between the end of the magic and the start of a file payload:
/// the length word, the embedded filename, and one reserved word.
pub const FILE_HDR_LEN: usize = 20;
pub const FILENAME_LEN: usize = 12;

/// Flash erase-sector granularity. The trailing sector of the image is
/// reserved as scratch and a file payload may not exceed one sector.
pub const ERASE_ALIGN_SIZE: usize = 4096;
pub const MAX_FILE_SIZE: usize = ERASE_ALIGN_SIZE - FILE_HDR_LEN;

/// Total image sizes the tool accepts, in bytes.
pub const VALID_IMAGE_SIZES: [usize; 2] = [512 * 1024, 2 * 1024 * 1024];

/// Name of the boot configuration file carried by stock images.
pub const BOOTCONF_TXT: &str = "bootconf.txt";

/// On-flash section header: big-endian magic, then the stored length.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SectionHeader {
    pub magic: U32<zerocopy::byteorder::BigEndian>,
    pub length: U32<zerocopy::byteorder::BigEndian>,
}

impl SectionHeader {
    pub fn new(magic: u32, length: u32) -> Self {
        Self {
            magic: magic.into(),
            length: length.into(),
        }
    }
}

/// Front matter of a file section, including the embedded name.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct FileHeader {
    pub magic: U32<zerocopy::byteorder::BigEndian>,
    pub length: U32<zerocopy::byteorder::BigEndian>,
    pub filename: [u8; FILENAME_LEN],
}

/// Logical kind of a section, decided by its magic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    /// Replaceable named file; the name is embedded in the header.
    File(String),
    /// Filler with no payload semantics.
    Pad,
    /// Valid but unrecognized record, addressed by a synthetic name.
    Other(String),
}

/// One entry of the section directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub magic: u32,
    pub offset: usize,
    pub length: u32,
    pub kind: SectionKind,
}

impl Section {
    /// Name this section answers to: the embedded filename for file
    /// sections, `"<offset>.bin"` for everything else.
    pub fn name(&self) -> Cow<'_, str> {
        match &self.kind {
            SectionKind::File(name) => Cow::Borrowed(name.as_str()),
            SectionKind::Other(name) => Cow::Borrowed(name.as_str()),
            SectionKind::Pad => Cow::Owned(format!("{}.bin", self.offset)),
        }
    }

    pub fn is_pad(&self) -> bool {
        self.magic == PAD_MAGIC
    }

    /// Offset where the section after this one starts.
    pub fn end(&self) -> usize {
        align8(self.offset + 8 + self.length as usize)
    }
}

/// Round up to the next 8-byte boundary.
pub(crate) fn align8(n: usize) -> usize {
    (n + 7) & !7
}
