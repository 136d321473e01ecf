use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, Display, EnumIter,
)]
pub enum AddrMode {
    #[default]
    Implied,
    Immediate,
    Absolute,
    ZeroPage,
    AbsoluteX,
    Indirect,
    JumpAbsolute,
    IndexedIndirectX,
    IndirectIndexedX,
}

impl AddrMode {
    /// Operand width in bytes. Depends on the mode only, never on the value.
    pub fn width(self) -> u16 {
        match self {
            AddrMode::Implied | AddrMode::Immediate | AddrMode::ZeroPage => 1,
            _ => 2,
        }
    }

    /// Lower three bits of the opcode byte. Implied shares the immediate code.
    pub fn bits(self) -> u8 {
        match self {
            AddrMode::Implied | AddrMode::Immediate => 0,
            AddrMode::Absolute => 1,
            AddrMode::ZeroPage => 2,
            AddrMode::AbsoluteX => 3,
            AddrMode::Indirect => 4,
            AddrMode::JumpAbsolute => 5,
            AddrMode::IndexedIndirectX => 6,
            AddrMode::IndirectIndexedX => 7,
        }
    }

    /// Zero-page variant, if the mode has one.
    pub fn zero_page(self) -> Self {
        match self {
            AddrMode::Absolute => AddrMode::ZeroPage,
            mode => mode,
        }
    }

    /// Inverse of `zero_page`.
    pub fn widened(self) -> Self {
        match self {
            AddrMode::ZeroPage => AddrMode::Absolute,
            mode => mode,
        }
    }
}
