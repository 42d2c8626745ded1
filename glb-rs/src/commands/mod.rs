//! Command implementations

pub mod animate;
pub mod info;
pub mod tree;
