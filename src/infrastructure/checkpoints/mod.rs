pub mod file_store;
pub mod memory;

pub use file_store::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;
