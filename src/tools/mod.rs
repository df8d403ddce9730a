pub mod file;
pub mod search;

pub use file::{find_protocol, read_file};
pub use search::{SearchClient, SearchHit};
