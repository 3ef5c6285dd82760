pub mod backend;
pub mod cli_backend;
pub mod jobs;
pub mod memory;

pub use backend::CmsBackend;
