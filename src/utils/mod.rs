pub mod clock;
pub mod date;
pub mod duration;

pub use clock::*;
pub use date::*;
pub use duration::*;
