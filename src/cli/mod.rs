pub mod commands;
pub mod error;
pub mod output;
pub mod session;

pub use commands::*;
pub use output::*;
pub use error::*;
pub use session::*;
