pub mod calls;
pub mod cli;
pub mod error;
pub mod queries;

pub use calls::*;
pub use cli::*;
pub use error::*;
pub use queries::*;
