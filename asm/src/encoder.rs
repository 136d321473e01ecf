use arch::inst::opcode;
use std::ops::Range;

use crate::ast::{Instr, Literal, Node, Stmt, SymRef, Value};
use crate::error::{Diag, Error};
use crate::symbols::SymbolTable;

const ADDRESS_SPACE: usize = 0x10000;

/// Bytes emitted by one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub stmt: usize,
    pub addr: u16,
    pub range: Range<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Code {
    pub bytes: Vec<u8>,
    pub spans: Vec<Span>,
}

impl Code {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn span_bytes(&self, span: &Span) -> &[u8] {
        &self.bytes[span.range.clone()]
    }
}

/// Second pass: emit every instruction and literal in order.
pub fn encode(stmts: &[Stmt], symbols: &SymbolTable, offset: u16) -> Result<Code, Diag> {
    let mut code = Code::default();
    for (idx, stmt) in stmts.iter().enumerate() {
        if let Node::Label(_) = stmt.node {
            continue;
        }
        let bytes = encode_node(&stmt.node, symbols).map_err(|e| e.at(&stmt.pos))?;
        let start = code.bytes.len();
        if usize::from(offset) + start + bytes.len() > ADDRESS_SPACE {
            return Err(Error::CodeOverflow.at(&stmt.pos));
        }
        code.bytes.extend(bytes);
        code.spans.push(Span {
            stmt: idx,
            addr: offset.wrapping_add(start as u16),
            range: start..code.bytes.len(),
        });
    }
    Ok(code)
}

pub fn encode_node(node: &Node, symbols: &SymbolTable) -> Result<Vec<u8>, Error> {
    match node {
        Node::Label(_) => Ok(vec![]),
        Node::Instr(instr) => encode_instr(instr, symbols),
        Node::Literal(lit) => encode_literal(lit, symbols),
    }
}

fn encode_instr(instr: &Instr, symbols: &SymbolTable) -> Result<Vec<u8>, Error> {
    let mode = instr.operand.mode;
    let op = opcode(instr.op, mode).ok_or(Error::JumpAddressing(instr.op))?;
    let value = resolve(&instr.operand.value, symbols, mode.width())?;
    let mut bytes = vec![op];
    match mode.width() {
        1 => bytes.push(value as u8),
        _ => bytes.extend(value.to_le_bytes()),
    }
    Ok(bytes)
}

fn encode_literal(lit: &Literal, symbols: &SymbolTable) -> Result<Vec<u8>, Error> {
    match lit {
        Literal::Byte(value) => Ok(vec![resolve(value, symbols, 1)? as u8]),
        Literal::Text(text) => Ok(text.iter().copied().chain([0]).collect()),
        Literal::Word(sym) => Ok(resolve_sym(sym, symbols, 2)?.to_le_bytes().to_vec()),
    }
}

/// Final operand value, checked against the operand width.
pub fn resolve(value: &Value, symbols: &SymbolTable, width: u16) -> Result<u16, Error> {
    match value {
        Value::Int(v) => fit(i64::from(*v), width),
        Value::Sym(sym) => resolve_sym(sym, symbols, width),
    }
}

fn resolve_sym(sym: &SymRef, symbols: &SymbolTable, width: u16) -> Result<u16, Error> {
    let addr = symbols
        .get(&sym.ident)
        .ok_or_else(|| Error::UndefinedLabel(sym.ident.clone()))?;
    // The byte selection happens before the offset is added.
    let value = i64::from(sym.transform.apply(addr)) + i64::from(sym.offset);
    fit(value, width)
}

fn fit(value: i64, width: u16) -> Result<u16, Error> {
    match width {
        1 => u8::try_from(value).map(u16::from).map_err(|_| Error::ByteRange),
        _ => u16::try_from(value).map_err(|_| Error::WordRange),
    }
}

/// Reset vector target: the load offset, or the address of `entry`.
pub fn entry_point(symbols: &SymbolTable, offset: u16, entry: Option<&str>) -> Result<u16, Error> {
    match entry {
        None => Ok(offset),
        Some(label) => symbols
            .get(label)
            .ok_or_else(|| Error::UndefinedEntry(label.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_line, parse_source};
    use crate::source::Source;

    fn assemble(code: &str, offset: u16) -> Result<(Code, SymbolTable), Diag> {
        let mut src = Source::new();
        src.push("test.s", code);
        let stmts = parse_source(&src)?;
        let symbols = SymbolTable::build(&stmts, offset)?;
        Ok((encode(&stmts, &symbols, offset)?, symbols))
    }

    fn bytes(line: &str) -> Vec<u8> {
        let nodes = parse_line(line).unwrap();
        encode_node(&nodes[0], &SymbolTable::default()).unwrap()
    }

    macro_rules! case {
        ($($name:ident: $code:expr => $expect:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(bytes($code), $expect.to_vec(), "{}", $code);
                }
            )*
        }
    }

    case! {
        nop: "NOP" => [0x00, 0x00],
        rts: "RTS" => [0xA0, 0x00],
        adc_imm: "ADC #16" => [0x30, 0x10],
        adc_zp: "ADC $FF" => [0x32, 0xFF],
        adc_abs: "ADC $100" => [0x31, 0x00, 0x01],
        adc_abs_x: "ADC 16, X" => [0x33, 0x10, 0x00],
        adc_indir: "ADC ($100)" => [0x34, 0x00, 0x01],
        adc_indexed_indir: "ADC (120, X)" => [0x36, 0x78, 0x00],
        adc_indir_indexed: "ADC (120), X" => [0x37, 0x78, 0x00],
        lda_abs: "LDA $1234" => [0x09, 0x34, 0x12],
        jmp_abs: "JMP $10" => [0x7D, 0x10, 0x00],
        jmp_indir: "JMP ($FFFC)" => [0x79, 0xFC, 0xFF],
        data_text: ".data 'HI'" => [0x48, 0x49, 0x00],
        data_byte: ".data $7F" => [0x7F],
    }

    #[test]
    fn jump_rejects_other_modes() {
        for code in ["JMP #1", "JSR", "BNE (1, X)", "BEQ (1), X", "BPL 1, X"] {
            let node = &parse_line(code).unwrap()[0];
            let err = encode_node(node, &SymbolTable::default()).unwrap_err();
            assert!(matches!(err, Error::JumpAddressing(_)), "{code}");
        }
    }

    #[test]
    fn jump_to_label() {
        let (code, symbols) = assemble("FOO: NOP\nJMP FOO", 0x8000).unwrap();
        assert_eq!(symbols.get("foo"), Some(0x8000));
        assert_eq!(code.bytes, vec![0x00, 0x00, 0x7D, 0x00, 0x80]);
        assert_eq!(code.size(), 5);
    }

    #[test]
    fn label_transforms_and_offsets() {
        let src = "LDA #<table\nLDA #>table\nLDA table+1\nLDA #>table-1\ntable: .data table";
        let (code, _) = assemble(src, 0xE000).unwrap();
        // table is at 0xE000 + 2 + 2 + 3 + 2
        assert_eq!(
            code.bytes,
            vec![
                0x08, 0xE0, // LDA #<table
                0x08, 0x09, // LDA #>table
                0x09, 0x0A, 0xE0, // LDA table+1
                0x08, 0x08, // LDA #>table-1
                0x09, 0xE0, // .data table
            ]
        );
    }

    #[test]
    fn spans_track_addresses() {
        let (code, _) = assemble("start: NOP\nLDA $1234\n.data 'A', 1", 0x100).unwrap();
        let spans: Vec<_> = code.spans.iter().map(|s| (s.stmt, s.addr)).collect();
        assert_eq!(spans, vec![(1, 0x100), (2, 0x102), (3, 0x105), (4, 0x107)]);
        assert_eq!(code.span_bytes(&code.spans[1]), &[0x09, 0x34, 0x12]);
    }

    #[test]
    fn code_fills_address_space() {
        let text = format!(".data '{}'", "A".repeat(0xFFFF));
        let (code, _) = assemble(&text, 0).unwrap();
        assert_eq!(code.size(), 0x10000);
        let diag = assemble(&text, 1).unwrap_err();
        assert!(matches!(diag.error, Error::CodeOverflow));
        let diag = assemble(&format!("NOP\n{}", text), 0).unwrap_err();
        assert_eq!(diag.pos.map(|p| p.idx), Some(1));
    }

    #[test]
    fn undefined_label() {
        let diag = assemble("NOP\nJMP nowhere", 0).unwrap_err();
        assert_eq!(diag.to_string(), "test.s:2: Label not defined: nowhere");
    }

    #[test]
    fn immediate_label_must_fit_a_byte() {
        let diag = assemble("LDA #far\nfar: NOP", 0x1000).unwrap_err();
        assert!(matches!(diag.error, Error::ByteRange));
    }

    #[test]
    fn negative_address() {
        let diag = assemble("here: LDA here-1", 0).unwrap_err();
        assert!(matches!(diag.error, Error::WordRange));
    }

    #[test]
    fn entry() {
        let (_, symbols) = assemble("NOP\nMain: NOP", 0xE000).unwrap();
        assert_eq!(entry_point(&symbols, 0xE000, None).unwrap(), 0xE000);
        assert_eq!(entry_point(&symbols, 0xE000, Some("MAIN")).unwrap(), 0xE002);
        assert!(matches!(
            entry_point(&symbols, 0xE000, Some("reset")),
            Err(Error::UndefinedEntry(_))
        ));
    }
}
