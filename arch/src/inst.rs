use crate::{mode::AddrMode, op::Mnemonic};

/// Addressing bits actually placed in the opcode.
///
/// Jump-family mnemonics reuse the codes: a plain absolute target encodes as
/// `JumpAbsolute`, and an indirect target encodes as `Absolute`. Any other
/// mode is not encodable for them and yields `None`.
pub fn mode_bits(op: Mnemonic, mode: AddrMode) -> Option<u8> {
    if op.is_jump() {
        match mode {
            AddrMode::Absolute => Some(AddrMode::JumpAbsolute.bits()),
            AddrMode::Indirect => Some(AddrMode::Absolute.bits()),
            _ => None,
        }
    } else {
        Some(mode.bits())
    }
}

/// `(table index << 3) | addressing bits`
pub fn opcode(op: Mnemonic, mode: AddrMode) -> Option<u8> {
    mode_bits(op, mode).map(|bits| (op.index() << 3) | bits)
}
