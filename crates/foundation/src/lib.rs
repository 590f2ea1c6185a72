pub mod bounds;
pub mod math;

// Geometry primitives shared by every other crate.
pub use bounds::*;
