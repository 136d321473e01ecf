use num_enum::IntoPrimitive;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Instruction mnemonics.
///
/// The declaration order is the opcode table: the index of a mnemonic is the
/// upper five bits of its opcode byte.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Mnemonic {
    NOP,
    LDA,
    TAX,
    TXA,
    TAY,
    TYA,
    ADC,
    SBC,
    AND,
    ORA,
    EOR,
    ASL,
    LSR,
    INX,
    DEX,
    JMP,
    STA,
    PHA,
    PLA,
    JSR,
    RTS,
    CMP,
    BCS,
    BEQ,
    BMI,
    BNE,
    BPL,
    BIT,
    LDX,
    LDY,
    STX,
    STY,
}

impl Mnemonic {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<Self>().ok()
    }

    pub fn index(self) -> u8 {
        self.into()
    }

    /// Jumps, calls and branches. These only take an absolute or indirect target.
    pub fn is_jump(self) -> bool {
        use Mnemonic::*;
        matches!(self, JMP | JSR | BCS | BEQ | BMI | BNE | BPL)
    }
}
