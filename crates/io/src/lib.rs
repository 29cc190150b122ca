// File I/O: delimited input tables in, break table and JSON reports out.

pub mod csv;
pub mod json;

pub use crate::csv::{parse_table, read_table, sniff_delimiter, write_breaks, BREAK_TABLE_HEADERS};
