pub mod feature_encoder;
pub mod form;
pub mod price_model;

pub use feature_encoder::*;
pub use form::*;
pub use price_model::*;
