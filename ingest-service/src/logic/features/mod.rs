//! Features Module - Model input construction
//!
//! - `layout`: authoritative feature order + version hash
//! - `vector`: versioned `FeatureVector`
//! - `builder`: `Reading` -> `FeatureVector`

pub mod layout;
pub mod vector;
pub mod builder;


// Re-export common types
pub use builder::build;
pub use layout::{LayoutMismatchError, FEATURE_COUNT};
pub use vector::FeatureVector;
