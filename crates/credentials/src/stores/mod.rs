//! Built-in credential stores

mod env;
mod file;
mod memory;

pub use env::EnvCredentialStore;
pub use file::FileCredentialStore;
pub use memory::StaticCredentialStore;
