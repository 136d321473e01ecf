pub mod ast;
pub mod config;
pub mod encoder;
pub mod error;
pub mod listing;
pub mod parser;
pub mod rom;
pub mod source;
pub mod symbols;
pub mod template;

use crate::ast::Stmt;
use crate::config::DEFAULT_OFFSET;
use crate::encoder::Code;
use crate::error::Diag;
use crate::rom::RomSize;
use crate::source::Source;
use crate::symbols::SymbolTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Address of the first emitted byte
    pub offset: u16,
    /// ROM size. `None` emits the code without padding or reset vector.
    pub size: Option<RomSize>,
    /// Label the reset vector points to
    pub entry: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            offset: DEFAULT_OFFSET,
            size: None,
            entry: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub stmts: Vec<Stmt>,
    pub symbols: SymbolTable,
    pub code: Code,
    pub entry: u16,
    pub image: Vec<u8>,
}

/// Parse, collect labels, encode, and lay out the ROM image.
pub fn assemble(source: &Source, options: &Options) -> Result<Assembly, Diag> {
    let stmts = parser::parse_source(source)?;
    let symbols = SymbolTable::build(&stmts, options.offset)?;
    let code = encoder::encode(&stmts, &symbols, options.offset)?;
    let entry = encoder::entry_point(&symbols, options.offset, options.entry.as_deref())?;
    let image = rom::build(&code.bytes, options.size, entry)?;
    Ok(Assembly {
        stmts,
        symbols,
        code,
        entry,
        image,
    })
}
