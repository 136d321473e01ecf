pub mod inst;
pub mod mode;
pub mod op;
