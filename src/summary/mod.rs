// Day summary: live elapsed time and per-tag distribution

pub mod aggregator;
pub mod running;
pub mod tag_index;

pub use aggregator::*;
pub use running::*;
pub use tag_index::*;
