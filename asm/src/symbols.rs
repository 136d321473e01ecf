use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{Node, Stmt};
use crate::error::{Diag, Error};

/// Label addresses, keyed by the lower-cased label name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymbolTable(IndexMap<String, u16>);

impl SymbolTable {
    /// First pass: walk the statements once and give every label the address
    /// of the node following it.
    pub fn build(stmts: &[Stmt], offset: u16) -> Result<Self, Diag> {
        let mut table = IndexMap::new();
        let mut pc = usize::from(offset);
        for stmt in stmts {
            match &stmt.node {
                Node::Label(ident) => {
                    let addr = u16::try_from(pc)
                        .map_err(|_| Error::AddressOverflow(ident.clone()).at(&stmt.pos))?;
                    if table.insert(ident.to_lowercase(), addr).is_some() {
                        return Err(Error::MultipleDeclarations(ident.clone()).at(&stmt.pos));
                    }
                }
                Node::Instr(_) | Node::Literal(_) => pc += stmt.node.len(),
            }
        }
        Ok(SymbolTable(table))
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.0.get(&name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.0.iter().map(|(name, addr)| (name.as_str(), *addr))
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self).map_err(Error::Symbols)
    }
}
