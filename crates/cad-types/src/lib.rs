pub mod geometry;
pub mod plane;
pub mod sketch;

pub use geometry::*;
pub use plane::*;
pub use sketch::*;
