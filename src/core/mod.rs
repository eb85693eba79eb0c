pub mod changes;
pub mod error;

pub use changes::ChangeSet;
pub use error::{Error, Result};
