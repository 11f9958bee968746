// Adapters layer: concrete store implementations behind the domain ports.

pub mod memory;

pub use memory::InMemoryStore;
