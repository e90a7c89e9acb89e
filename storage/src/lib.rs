pub mod common;
pub mod file;

pub use common::*;
pub use file::*;
