// Licensed under the Apache-2.0 license

use thiserror::Error;

/// Failures raised while loading, parsing, or editing an image.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("invalid image size {0} bytes; expected 512 KiB or 2 MiB")]
    BadImageSize(usize),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt image: bad magic {magic:#010x} at offset {offset:#x}")]
    Corrupt { offset: usize, magic: u32 },

    #[error("no section named {name:?} in image")]
    NotFound { name: String },

    #[error("update of {attempted} bytes at offset {offset:#x} would run into the reserved scratch sector")]
    OutOfImage { offset: usize, attempted: usize },

    #[error("update needs {attempted} bytes but the slot only has {available}")]
    SectionOverflow { attempted: usize, available: usize },

    #[error("access of {len} bytes at offset {offset:#x} is outside the image")]
    OutOfRange { offset: usize, len: usize },
}
