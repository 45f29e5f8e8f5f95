//! XML serialization.
//!
//! This module writes a `Document` tree (or a single subtree) back out as
//! XML text, with optional indentation.

pub mod xml;

pub use xml::{serialize, serialize_node, serialize_with_options, SerializeOptions};
