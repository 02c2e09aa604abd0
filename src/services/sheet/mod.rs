pub mod assembler;
pub mod columns;
pub mod header;
pub mod price;
pub mod reader;
pub mod tags;
pub mod utils;
pub mod variants;

pub use assembler::assemble_record;
pub use columns::resolve_columns;
pub use header::SheetTable;
pub use reader::read_table;
