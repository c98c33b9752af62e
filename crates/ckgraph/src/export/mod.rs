//! Graph serialization.

pub mod json;

pub use json::{from_json, load_snapshot, save_snapshot, to_json, GraphDocument};
