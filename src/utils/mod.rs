//! Small helpers shared by the compiler and the bundle writer.

pub mod doctype;
pub mod escape;
pub mod hash;
pub mod minify;
