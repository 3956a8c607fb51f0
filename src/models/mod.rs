// Core data models for Day Ledger
// These structs represent the domain entities

pub mod task;
pub mod tag;
pub mod timer;
pub mod user;

pub use task::*;
pub use tag::*;
pub use timer::*;
pub use user::*;
