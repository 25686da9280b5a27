pub mod statement;

pub use statement::{ImportError, StatementReader};
