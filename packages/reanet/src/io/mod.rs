pub mod fs;
pub mod mutations_csv;
pub mod network_json;
pub mod network_writer;
