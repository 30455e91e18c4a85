// Licensed under the Apache-2.0 license

//! Command implementations for the EEPROM configuration tool.

pub mod codec;
pub mod image;
pub mod pem;
