pub mod column_resolver;
pub mod field_extractor;
pub mod listing_flattener;
pub mod rule_normalizer;
pub mod value_parser;

pub use column_resolver::*;
pub use field_extractor::*;
pub use listing_flattener::*;
pub use rule_normalizer::*;
pub use value_parser::*;
