//! VJ generation for TCR alpha chain and IG light chain

pub mod model;

// Re-exporting for public API
pub use self::model::Generator;
