// In-process work queue for document processing

pub mod jobs;
pub mod workers;

pub use jobs::*;
pub use workers::*;
