use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Bytes reserved at the top of the ROM for the reset vector.
pub const VECTOR_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomSize {
    Auto,
    Fixed(usize),
}

impl RomSize {
    /// Total image size for `code` bytes of program.
    pub fn total(self, code: usize) -> Result<usize, Error> {
        let need = code + VECTOR_LEN;
        match self {
            RomSize::Auto => Ok(need.next_power_of_two()),
            RomSize::Fixed(total) if need <= total => Ok(total),
            RomSize::Fixed(total) => Err(Error::RomOverflow(code, total)),
        }
    }
}

impl FromStr for RomSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(RomSize::Auto);
        }
        let parsed = if let Some(hex) = s.strip_prefix('$').or_else(|| s.strip_prefix("0x")) {
            usize::from_str_radix(hex, 16)
        } else {
            s.parse()
        };
        parsed
            .map(RomSize::Fixed)
            .map_err(|_| Error::InvalidSize(s.to_string()))
    }
}

impl fmt::Display for RomSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomSize::Auto => write!(f, "auto"),
            RomSize::Fixed(n) => write!(f, "{}", n),
        }
    }
}

impl<'de> Deserialize<'de> for RomSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(usize),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(RomSize::Fixed(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Lay out the ROM image: code, zero fill, then the little-endian reset vector.
/// Without a size the code is returned as is.
pub fn build(code: &[u8], size: Option<RomSize>, reset: u16) -> Result<Vec<u8>, Error> {
    let Some(size) = size else {
        return Ok(code.to_vec());
    };
    let total = size.total(code.len())?;
    let mut image = Vec::with_capacity(total);
    image.extend_from_slice(code);
    image.resize(total - VECTOR_LEN, 0);
    image.extend(reset.to_le_bytes());
    Ok(image)
}
