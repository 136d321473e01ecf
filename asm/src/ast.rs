use arch::{mode::AddrMode, op::Mnemonic};
use std::fmt;

use crate::source::Pos;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub pos: Pos,
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Label(String),    // ident ":"
    Instr(Instr),     // mnemonic [ operand ]
    Literal(Literal), // ".data" item
}

impl Node {
    /// Bytes this node occupies in the image. Never depends on label values.
    pub fn len(&self) -> usize {
        match self {
            Node::Label(_) => 0,
            Node::Instr(instr) => instr.len(),
            Node::Literal(lit) => lit.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instr {
    pub op: Mnemonic,
    pub operand: Operand,
}

impl Instr {
    pub fn new(op: Mnemonic, mut operand: Operand) -> Self {
        // The target of a jump is rarely known while parsing, keep it wide.
        if op.is_jump() {
            operand.mode = operand.mode.widened();
        }
        Instr { op, operand }
    }

    pub fn len(&self) -> usize {
        1 + usize::from(self.operand.mode.width())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub mode: AddrMode,
    pub value: Value,
}

impl Operand {
    pub fn new(mode: AddrMode, value: Value) -> Self {
        Operand { mode, value }
    }

    pub fn implied() -> Self {
        Operand::new(AddrMode::Implied, Value::Int(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(u16),    // num
    Sym(SymRef), // ident [ ("+" | "-") num ]
}

/// Reference to a label, resolved while encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymRef {
    pub ident: String,
    pub offset: i32,
    pub transform: Transform,
}

impl SymRef {
    pub fn new(ident: &str) -> Self {
        SymRef {
            ident: ident.to_string(),
            offset: 0,
            transform: Transform::Identity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    #[default]
    Identity,
    Low,  // ">"
    High, // "<"
}

impl Transform {
    pub fn apply(self, value: u16) -> u16 {
        match self {
            Transform::Identity => value,
            Transform::Low => value & 0xFF,
            Transform::High => value >> 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Byte(Value),   // num | ("<" | ">") value
    Text(Vec<u8>), // "'" chars "'", emitted with a NUL terminator
    Word(SymRef),  // ident, emitted little-endian
}

impl Literal {
    pub fn len(&self) -> usize {
        match self {
            Literal::Byte(_) => 1,
            Literal::Text(text) => text.len() + 1,
            Literal::Word(_) => 2,
        }
    }
}

impl fmt::Display for SymRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.transform {
            Transform::Identity => {}
            Transform::Low => write!(f, ">")?,
            Transform::High => write!(f, "<")?,
        }
        write!(f, "{}", self.ident)?;
        match self.offset {
            0 => Ok(()),
            n if n > 0 => write!(f, "+{}", n),
            n => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "${:X}", v),
            Value::Sym(sym) => write!(f, "{}", sym),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.value;
        match self.mode {
            AddrMode::Implied => Ok(()),
            AddrMode::Immediate => write!(f, "#{}", v),
            AddrMode::Absolute | AddrMode::ZeroPage | AddrMode::JumpAbsolute => write!(f, "{}", v),
            AddrMode::AbsoluteX => write!(f, "{}, X", v),
            AddrMode::Indirect => write!(f, "({})", v),
            AddrMode::IndexedIndirectX => write!(f, "({}, X)", v),
            AddrMode::IndirectIndexedX => write!(f, "({}), X", v),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Byte(v) => write!(f, ".data {}", v),
            Literal::Text(text) => write!(f, ".data '{}'", String::from_utf8_lossy(text)),
            Literal::Word(sym) => write!(f, ".data {}", sym),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Label(ident) => write!(f, "{}:", ident),
            Node::Instr(instr) => write!(f, "{}", instr),
            Node::Literal(lit) => write!(f, "{}", lit),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand.mode {
            AddrMode::Implied => write!(f, "{}", self.op),
            _ => write!(f, "{} {}", self.op, self.operand),
        }
    }
}
