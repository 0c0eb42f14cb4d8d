mod table;

pub use table::write_json;
pub use table::write_table;
