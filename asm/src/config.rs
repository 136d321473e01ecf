use serde::{Deserialize, Deserializer};

use crate::error::Error;
use crate::rom::RomSize;
use crate::Options;

pub const DEFAULT_OFFSET: u16 = 0xE000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Raw binary image
    #[default]
    Bin,
    /// VHDL ROM entity
    Vhdl,
}

impl Format {
    pub fn default_output(self) -> &'static str {
        match self {
            Format::Bin => "a.out",
            Format::Vhdl => "a.vhd",
        }
    }
}

/// Build settings, from a YAML file and the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(deserialize_with = "de_offset")]
    pub offset: Option<u16>,
    pub size: Option<RomSize>,
    pub entry: Option<String>,
    pub output: Option<String>,
    pub format: Option<Format>,
    pub template: Option<String>,
    pub symbols: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let text =
            std::fs::read_to_string(path).map_err(|e| Error::FileOpen(path.to_string(), e))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &str, text: &str) -> Result<Self, Error> {
        serde_yaml::from_str(text).map_err(|e| Error::Config(path.to_string(), e))
    }

    /// Values set in `over` win.
    pub fn merge(self, over: Config) -> Config {
        Config {
            offset: over.offset.or(self.offset),
            size: over.size.or(self.size),
            entry: over.entry.or(self.entry),
            output: over.output.or(self.output),
            format: over.format.or(self.format),
            template: over.template.or(self.template),
            symbols: over.symbols.or(self.symbols),
        }
    }

    pub fn format(&self) -> Format {
        self.format.unwrap_or_default()
    }

    pub fn output(&self) -> String {
        self.output
            .clone()
            .unwrap_or_else(|| self.format().default_output().to_string())
    }

    pub fn options(&self) -> Options {
        let size = match (self.size, self.format()) {
            (Some(size), _) => Some(size),
            (None, Format::Vhdl) => Some(RomSize::Auto),
            (None, Format::Bin) => None,
        };
        Options {
            offset: self.offset.unwrap_or(DEFAULT_OFFSET),
            size,
            entry: self.entry.clone(),
        }
    }
}

/// Load offset, hexadecimal with an optional `$` or `0x` prefix.
pub fn parse_offset(s: &str) -> Result<u16, Error> {
    let s = s.trim();
    let digits = s
        .strip_prefix('$')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|_| Error::InvalidOffset(s.to_string()))
}

pub fn parse_size(s: &str) -> Result<RomSize, Error> {
    s.parse()
}

fn de_offset<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    // `offset: 8000` reads as a YAML integer, but its digits are still hex.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }
    let text = match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Text(s) => s,
    };
    parse_offset(&text)
        .map(Some)
        .map_err(serde::de::Error::custom)
}
