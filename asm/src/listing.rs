use color_print::cformat;
use indexmap::IndexMap;

use crate::ast::{Node, Stmt};
use crate::encoder::Code;
use crate::source::{Pos, Source};

const SHOWN_BYTES: usize = 4;

/// Address and bytes emitted by one source line.
struct Row {
    addr: u16,
    bytes: Vec<u8>,
}

fn rows<'a>(stmts: &'a [Stmt], code: &Code) -> IndexMap<&'a Pos, Row> {
    let mut rows: IndexMap<&Pos, Row> = IndexMap::new();
    for span in &code.spans {
        let row = rows.entry(&stmts[span.stmt].pos).or_insert(Row {
            addr: span.addr,
            bytes: vec![],
        });
        row.bytes.extend_from_slice(code.span_bytes(span));
    }
    rows
}

/// Side-by-side listing of every source line with its address and encoding.
pub fn dump(source: &Source, stmts: &[Stmt], code: &Code) -> String {
    let rows = rows(stmts, code);
    let labeled: Vec<&Pos> = stmts
        .iter()
        .filter(|s| matches!(s.node, Node::Label(_)))
        .map(|s| &s.pos)
        .collect();

    let mut out = String::new();
    for (path, lines) in source.files() {
        out += &format!(
            "{}+------[{}]{}\n",
            "-".repeat(19),
            path,
            "-".repeat(45usize.saturating_sub(path.len()))
        );
        for (idx, line) in lines.iter().enumerate() {
            let pos = Pos::new(path, idx);
            let body = match rows.get(&pos) {
                Some(row) => {
                    let bytes = row
                        .bytes
                        .iter()
                        .take(SHOWN_BYTES)
                        .map(|b| format!("{:02X}", b))
                        .collect::<Vec<_>>()
                        .join(" ");
                    format!("[{:04X}] {:<11} | {:>4}: {}", row.addr, bytes, idx + 1, line)
                }
                None if labeled.contains(&&pos) => {
                    format!("{:19}| {:>4}: {}", "", idx + 1, cformat!("<g>{}</>", line))
                }
                None => format!("{:19}| {:>4}: {}", "", idx + 1, line),
            };
            out += &body;
            out += "\n";
        }
    }
    out += "-------------------+-----------------------------------------------------\n";
    out
}
