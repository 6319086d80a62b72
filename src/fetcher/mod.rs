pub mod collector;
pub mod page_source;

pub use collector::*;
pub use page_source::*;
