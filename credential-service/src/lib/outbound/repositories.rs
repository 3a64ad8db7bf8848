pub mod memory;

pub use memory::InMemoryCredentialRepository;
