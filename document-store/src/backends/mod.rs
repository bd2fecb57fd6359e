pub mod filesystem;
pub mod json_bin;
pub mod memory;

pub use filesystem::FileSystemStore;
pub use json_bin::JsonBinStore;
pub use memory::InMemoryStore;
