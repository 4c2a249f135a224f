pub mod dir;
pub mod memory;
pub mod traits;

pub use dir::DirStore;
pub use memory::MemoryStore;
pub use traits::KvStore;
