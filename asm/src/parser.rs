use arch::{mode::AddrMode, op::Mnemonic};
use std::iter::Peekable;
use std::str::CharIndices;

use crate::ast::{Instr, Literal, Node, Operand, Stmt, SymRef, Transform, Value};
use crate::error::{Diag, Error};
use crate::source::Source;

const DATA_DIRECTIVE: &str = "data";

/// Parse every line of every file, in order.
pub fn parse_source(source: &Source) -> Result<Vec<Stmt>, Diag> {
    let mut stmts = vec![];
    for (pos, line) in source.lines() {
        let nodes = parse_line(line).map_err(|e| e.at(&pos))?;
        stmts.extend(nodes.into_iter().map(|node| Stmt {
            pos: pos.clone(),
            node,
        }));
    }
    Ok(stmts)
}

/// Parse a single line into zero or more nodes.
pub fn parse_line(line: &str) -> Result<Vec<Node>, Error> {
    LineParser::new(line.trim()).parse()
}

struct LineParser<'a> {
    line: &'a str,
    iter: Peekable<CharIndices<'a>>,
}

fn is_ident_head(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_tail(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

impl<'a> LineParser<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            iter: line.char_indices().peekable(),
        }
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.iter.clone().nth(n).map(|(_, c)| c)
    }

    fn peek(&self) -> Option<char> {
        self.peek_nth(0)
    }

    fn consume(&mut self) -> Option<char> {
        self.iter.next().map(|(_, c)| c)
    }

    fn eat(&mut self, ch: char) -> bool {
        self.iter.next_if(|&(_, c)| c == ch).is_some()
    }

    fn skip_ws(&mut self) {
        while self.iter.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn cursor(&mut self) -> usize {
        self.iter.peek().map_or(self.line.len(), |&(idx, _)| idx)
    }

    fn rest(&mut self) -> &'a str {
        let idx = self.cursor();
        &self.line[idx..]
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, cond: F) -> &'a str {
        let start = self.cursor();
        while self.iter.next_if(|&(_, c)| cond(c)).is_some() {}
        let end = self.cursor();
        &self.line[start..end]
    }

    fn ident(&mut self) -> Option<&'a str> {
        if !self.peek().is_some_and(is_ident_head) {
            return None;
        }
        Some(self.take_while(is_ident_tail))
    }

    /// Nothing but a comment may follow a complete statement.
    fn trailing(&mut self) -> Result<(), Error> {
        self.skip_ws();
        match self.peek() {
            None | Some(';') => Ok(()),
            Some(_) => Err(Error::TrailingChars(self.rest().trim_end().to_string())),
        }
    }
}

// ----------------------------------------------------------------------------
// Statements
// ----------------------------------------------------------------------------

impl<'a> LineParser<'a> {
    fn parse(mut self) -> Result<Vec<Node>, Error> {
        let mut nodes = vec![];
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some(';') => return Ok(nodes),
                Some('.') => {
                    self.consume();
                    nodes.extend(self.directive()?);
                    break;
                }
                Some(c) if is_ident_head(c) => {
                    let word = self.ident().unwrap_or_default();
                    if let Some(op) = Mnemonic::parse(word) {
                        nodes.push(Node::Instr(self.instr(op)?));
                        break;
                    }
                    self.skip_ws();
                    if !self.eat(':') {
                        return Err(Error::UnknownInstruction(word.to_string()));
                    }
                    nodes.push(Node::Label(word.to_string()));
                }
                Some(_) => break,
            }
        }
        self.trailing()?;
        Ok(nodes)
    }

    fn instr(&mut self, op: Mnemonic) -> Result<Instr, Error> {
        let mut operand = self.operand()?;
        if let (AddrMode::Absolute, Value::Int(v)) = (operand.mode, &operand.value) {
            if *v <= 0xFF && !op.is_jump() {
                operand.mode = operand.mode.zero_page();
            }
        }
        Ok(Instr::new(op, operand))
    }

    fn directive(&mut self) -> Result<Vec<Node>, Error> {
        let name = self.ident().unwrap_or_default();
        if !name.eq_ignore_ascii_case(DATA_DIRECTIVE) {
            return Err(Error::UnknownDirective(name.to_string()));
        }
        let mut nodes = vec![];
        loop {
            self.skip_ws();
            nodes.push(Node::Literal(self.literal()?));
            self.skip_ws();
            if !self.eat(',') {
                break;
            }
        }
        Ok(nodes)
    }
}

// ----------------------------------------------------------------------------
// Operands
// ----------------------------------------------------------------------------

impl<'a> LineParser<'a> {
    /// immediate | absolute | indirect | implied, tried in this order.
    fn operand(&mut self) -> Result<Operand, Error> {
        self.skip_ws();
        if let Some(operand) = self.immediate()? {
            return Ok(operand);
        }
        if let Some(operand) = self.absolute()? {
            return Ok(operand);
        }
        if let Some(operand) = self.indirect()? {
            return Ok(operand);
        }
        Ok(Operand::implied())
    }

    // "#" [ "<" | ">" ] value | ( "<" | ">" ) value
    fn immediate(&mut self) -> Result<Option<Operand>, Error> {
        let transform = match self.peek() {
            Some('#') => {
                self.consume();
                self.skip_ws();
                self.transform()
            }
            Some('<' | '>') => self.transform(),
            _ => return Ok(None),
        };
        let value = match self.value()?.ok_or(Error::ExpectedImmediate)? {
            Value::Int(v) => match transform.apply(v) {
                v @ 0..=0xFF => Value::Int(v),
                _ => return Err(Error::ByteRange),
            },
            Value::Sym(mut sym) => {
                sym.transform = transform;
                Value::Sym(sym)
            }
        };
        Ok(Some(Operand::new(AddrMode::Immediate, value)))
    }

    // value [ "," "X" ]
    fn absolute(&mut self) -> Result<Option<Operand>, Error> {
        let Some(value) = self.value()? else {
            return Ok(None);
        };
        let mode = if self.index() {
            AddrMode::AbsoluteX
        } else {
            AddrMode::Absolute
        };
        Ok(Some(Operand::new(mode, value)))
    }

    // "(" value [ "," "X" ] ")" [ "," "X" ]
    fn indirect(&mut self) -> Result<Option<Operand>, Error> {
        if !self.eat('(') {
            return Ok(None);
        }
        let value = self.value()?.ok_or(Error::ExpectedIndirect)?;
        let inner = self.index();
        self.skip_ws();
        if !self.eat(')') {
            return Err(Error::MissingParen);
        }
        let outer = self.index();
        let mode = match (inner, outer) {
            (true, true) => return Err(Error::DoubleIndex),
            (true, false) => AddrMode::IndexedIndirectX,
            (false, true) => AddrMode::IndirectIndexedX,
            (false, false) => AddrMode::Indirect,
        };
        Ok(Some(Operand::new(mode, value)))
    }

    fn index(&mut self) -> bool {
        let save = self.iter.clone();
        self.skip_ws();
        if self.eat(',') {
            self.skip_ws();
            let is_x = self.peek().is_some_and(|c| c.eq_ignore_ascii_case(&'x'));
            if is_x && !self.peek_nth(1).is_some_and(is_ident_tail) {
                self.consume();
                return true;
            }
        }
        self.iter = save;
        false
    }

    fn transform(&mut self) -> Transform {
        let transform = match self.peek() {
            Some('<') => Transform::High,
            Some('>') => Transform::Low,
            _ => return Transform::Identity,
        };
        self.consume();
        self.skip_ws();
        transform
    }
}

// ----------------------------------------------------------------------------
// Values
// ----------------------------------------------------------------------------

impl<'a> LineParser<'a> {
    // ident [ ( "+" | "-" ) num ] | num
    fn value(&mut self) -> Result<Option<Value>, Error> {
        self.skip_ws();
        if let Some(word) = self.ident() {
            if Mnemonic::parse(word).is_some() {
                return Err(Error::InvalidLabel(word.to_string()));
            }
            let mut sym = SymRef::new(word);
            sym.offset = self.sym_offset()?;
            return Ok(Some(Value::Sym(sym)));
        }
        Ok(self.number()?.map(Value::Int))
    }

    // digits | "$" hex-digits
    fn number(&mut self) -> Result<Option<u16>, Error> {
        let radix = match self.peek() {
            Some('$') => {
                self.consume();
                16
            }
            Some(c) if c.is_ascii_digit() => 10,
            _ => return Ok(None),
        };
        let digits = self.take_while(|c| c.is_digit(radix));
        if digits.is_empty() {
            let rest = self.take_while(|c| !c.is_whitespace() && c != ',' && c != ')');
            return Err(Error::InvalidNumber(format!("${}", rest)));
        }
        let value = digits.chars().try_fold(0u32, |acc, c| {
            acc.checked_mul(radix)?.checked_add(c.to_digit(radix)?)
        });
        match value {
            Some(v) if v <= 0xFFFF => Ok(Some(v as u16)),
            _ => Err(Error::WordRange),
        }
    }

    fn sym_offset(&mut self) -> Result<i32, Error> {
        let save = self.iter.clone();
        self.skip_ws();
        let sign = match self.peek() {
            Some('+') => 1,
            Some('-') => -1,
            _ => {
                self.iter = save;
                return Ok(0);
            }
        };
        self.consume();
        self.skip_ws();
        match self.number()? {
            Some(n) => Ok(sign * i32::from(n)),
            None => Err(Error::InvalidNumber(self.rest().trim_end().to_string())),
        }
    }
}

// ----------------------------------------------------------------------------
// Literals
// ----------------------------------------------------------------------------

impl<'a> LineParser<'a> {
    // "'" chars "'" | ( "<" | ">" ) value | num | ident [ offset ]
    fn literal(&mut self) -> Result<Literal, Error> {
        match self.peek() {
            Some('\'') => {
                self.consume();
                return self.text();
            }
            Some('<' | '>') => {
                let transform = self.transform();
                return match self.value()? {
                    Some(Value::Int(v)) => Ok(Literal::Byte(Value::Int(transform.apply(v)))),
                    Some(Value::Sym(mut sym)) => {
                        sym.transform = transform;
                        Ok(Literal::Byte(Value::Sym(sym)))
                    }
                    None => Err(self.invalid_literal()),
                };
            }
            _ => {}
        }
        match self.value()? {
            Some(Value::Int(v)) if v <= 0xFF => Ok(Literal::Byte(Value::Int(v))),
            Some(Value::Int(_)) => Err(Error::ByteRange),
            Some(Value::Sym(sym)) => Ok(Literal::Word(sym)),
            None => Err(self.invalid_literal()),
        }
    }

    fn text(&mut self) -> Result<Literal, Error> {
        let mut bytes = vec![];
        loop {
            match self.consume() {
                Some('\'') => return Ok(Literal::Text(bytes)),
                Some(c) if c.is_ascii() => bytes.push(c as u8),
                Some(c) => return Err(Error::InvalidLiteral(c.to_string())),
                None => return Err(Error::UnterminatedString),
            }
        }
    }

    fn invalid_literal(&mut self) -> Error {
        Error::InvalidLiteral(self.rest().trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(op: Mnemonic, mode: AddrMode, value: Value) -> Node {
        Node::Instr(Instr::new(op, Operand::new(mode, value)))
    }

    fn implied(op: Mnemonic) -> Node {
        Node::Instr(Instr::new(op, Operand::implied()))
    }

    fn sym(ident: &str, offset: i32, transform: Transform) -> Value {
        Value::Sym(SymRef {
            ident: ident.to_string(),
            offset,
            transform,
        })
    }

    macro_rules! case {
        ($name:ident, $code:expr, [$($node:expr),* $(,)?]) => {
            #[test]
            fn $name() {
                let expect: Vec<Node> = vec![$($node),*];
                assert_eq!(parse_line($code).unwrap(), expect, "{}", $code);
            }
        };
    }

    macro_rules! fail {
        ($name:ident, $code:expr, $err:pat) => {
            #[test]
            fn $name() {
                let err = parse_line($code).unwrap_err();
                assert!(matches!(err, $err), "{}: {:?}", $code, err);
            }
        };
    }

    use AddrMode::*;
    use Mnemonic::*;
    use Transform::*;

    // Blank and comments
    case!(empty, "", []);
    case!(blank, "   \t ", []);
    case!(comment, "  ; LDA #1", []);

    // Implied
    case!(nop, "NOP", [implied(NOP)]);
    case!(nop_lower, "nop", [implied(NOP)]);
    case!(nop_comment, "RTS ; return", [implied(RTS)]);

    // Immediate
    case!(imm_dec, "ADC #16", [instr(ADC, Immediate, Value::Int(16))]);
    case!(imm_hex, "LDA #$ff", [instr(LDA, Immediate, Value::Int(0xFF))]);
    case!(imm_label, "LDA #foo", [instr(LDA, Immediate, sym("foo", 0, Identity))]);
    case!(imm_high, "LDA #<foo", [instr(LDA, Immediate, sym("foo", 0, High))]);
    case!(imm_low_bare, "LDA >foo+1", [instr(LDA, Immediate, sym("foo", 1, Low))]);
    case!(imm_high_num, "LDA <$1234", [instr(LDA, Immediate, Value::Int(0x12))]);
    case!(imm_low_num, "LDA >$1234", [instr(LDA, Immediate, Value::Int(0x34))]);

    // Absolute and zero page
    case!(zp_hex, "ADC $FF", [instr(ADC, ZeroPage, Value::Int(0xFF))]);
    case!(zp_255, "STA 255", [instr(STA, ZeroPage, Value::Int(255))]);
    case!(abs_256, "STA 256", [instr(STA, Absolute, Value::Int(256))]);
    case!(abs_label, "LDA table", [instr(LDA, Absolute, sym("table", 0, Identity))]);
    case!(abs_offset, "LDA table + 2", [instr(LDA, Absolute, sym("table", 2, Identity))]);
    case!(abs_neg_offset, "LDA table-$10", [instr(LDA, Absolute, sym("table", -16, Identity))]);
    case!(abs_x, "ADC 16, X", [instr(ADC, AbsoluteX, Value::Int(16))]);
    case!(abs_x_tight, "adc 16,x", [instr(ADC, AbsoluteX, Value::Int(16))]);
    case!(abs_x_label, "LDA buf_1 ,X", [instr(LDA, AbsoluteX, sym("buf_1", 0, Identity))]);

    // Indirect
    case!(indir, "ADC ($100)", [instr(ADC, Indirect, Value::Int(0x100))]);
    case!(indir_small, "ADC (120)", [instr(ADC, Indirect, Value::Int(120))]);
    case!(indexed_indir, "ADC (120, X)", [instr(ADC, IndexedIndirectX, Value::Int(120))]);
    case!(indir_indexed, "ADC (120), X", [instr(ADC, IndirectIndexedX, Value::Int(120))]);
    case!(indir_label, "LDA (ptr),x", [instr(LDA, IndirectIndexedX, sym("ptr", 0, Identity))]);

    // Jumps never narrow
    case!(jmp_small, "JMP $10", [instr(JMP, Absolute, Value::Int(0x10))]);
    case!(jsr_label, "jsr print", [instr(JSR, Absolute, sym("print", 0, Identity))]);
    case!(jmp_indir, "JMP ($FFFC)", [instr(JMP, Indirect, Value::Int(0xFFFC))]);

    // Labels
    case!(label_only, "loop:", [Node::Label("loop".to_string())]);
    case!(label_instr, "FOO: NOP", [Node::Label("FOO".to_string()), implied(NOP)]);
    case!(label_space, "_start :INX", [Node::Label("_start".to_string()), implied(INX)]);
    case!(
        label_twice,
        "a: b: DEX",
        [Node::Label("a".to_string()), Node::Label("b".to_string()), implied(DEX)]
    );

    // Data
    case!(data_text, ".data 'HI'", [Node::Literal(Literal::Text(b"HI".to_vec()))]);
    case!(data_text_semicolon, ".data 'a;b' ; c", [Node::Literal(Literal::Text(b"a;b".to_vec()))]);
    case!(data_byte, ".DATA $41", [Node::Literal(Literal::Byte(Value::Int(0x41)))]);
    case!(data_word, ".data main", [Node::Literal(Literal::Word(SymRef::new("main")))]);
    case!(
        data_list,
        "msg: .data 'A', 0, <main",
        [
            Node::Label("msg".to_string()),
            Node::Literal(Literal::Text(b"A".to_vec())),
            Node::Literal(Literal::Byte(Value::Int(0))),
            Node::Literal(Literal::Byte(sym("main", 0, High))),
        ]
    );

    // Errors
    fail!(unknown_instr, "FOO", Error::UnknownInstruction(_));
    fail!(unknown_instr_operand, "MOV #1", Error::UnknownInstruction(_));
    fail!(unknown_directive, ".word 1", Error::UnknownDirective(_));
    fail!(imm_range, "LDA #256", Error::ByteRange);
    fail!(abs_range, "LDA 65536", Error::WordRange);
    fail!(abs_range_hex, "LDA $10000", Error::WordRange);
    fail!(imm_missing, "LDA #", Error::ExpectedImmediate);
    fail!(bad_hex, "LDA $G", Error::InvalidNumber(_));
    fail!(bad_offset, "LDA foo+", Error::InvalidNumber(_));
    fail!(double_index, "ADC (120, X), X", Error::DoubleIndex);
    fail!(missing_paren, "ADC (120", Error::MissingParen);
    fail!(indir_missing, "ADC ()", Error::ExpectedIndirect);
    fail!(mnemonic_as_label, "JMP NOP", Error::InvalidLabel(_));
    fail!(trailing, "LDA #5 junk", Error::TrailingChars(_));
    fail!(trailing_index_y, "LDA $1234, Y", Error::TrailingChars(_));
    fail!(trailing_number, "1234", Error::TrailingChars(_));
    fail!(unterminated, ".data 'abc", Error::UnterminatedString);
    fail!(data_range, ".data 300", Error::ByteRange);
    fail!(data_empty, ".data", Error::InvalidLiteral(_));
    fail!(data_immediate, ".data #1", Error::InvalidLiteral(_));

    #[test]
    fn trailing_text_is_reported() {
        match parse_line("LDA #5 extra ; c") {
            Err(Error::TrailingChars(rest)) => assert_eq!(rest, "extra ; c"),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn positions_follow_files() {
        let mut src = Source::new();
        src.push("a.s", "; header\nstart: NOP");
        src.push("b.s", "\nJMP start");
        let stmts = parse_source(&src).unwrap();
        let pos: Vec<_> = stmts.iter().map(|s| s.pos.to_string()).collect();
        assert_eq!(pos, vec!["a.s:2", "a.s:2", "b.s:2"]);
    }

    #[test]
    fn error_carries_position() {
        let mut src = Source::new();
        src.push("main.s", "NOP\nLDA #300");
        let diag = parse_source(&src).unwrap_err();
        assert_eq!(diag.to_string(), "main.s:2: Operand must be in range 0-255");
    }
}
