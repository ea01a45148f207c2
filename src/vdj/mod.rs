//! VDJ generation for TCR beta chain and IG heavy chain

pub mod model;

// Re-exporting for public API
pub use self::model::Generator;
