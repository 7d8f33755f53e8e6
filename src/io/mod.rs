pub mod codec;
pub mod storage;

pub use codec::{decode, encode};
pub use storage::{DirStorage, MemoryStorage, Storage, StorageError};
