// Table IO: delimited text, Excel workbooks, JSON export, output naming

pub mod csv;
pub mod json;
pub mod output;
pub mod source;
pub mod xlsx;

pub use output::generate_unique_path;
pub use source::{
    check_writable, load_input, load_reference, read_table, select_reference_partition, sheet_names,
    write_table, TableFormat,
};
