pub mod client;
pub mod memory;

pub use client::SupabaseStore;
pub use memory::MemoryStore;
