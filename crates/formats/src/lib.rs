pub mod boundary;
pub mod regions;

pub use boundary::*;
pub use regions::*;
