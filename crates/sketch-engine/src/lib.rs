//! 2D sketch geometry: the editing session, snapping, trimming, offsetting,
//! closed-profile detection and display-only constraint hints.

pub mod config;
pub mod hints;
pub mod intersect;
pub mod offset;
pub mod profiles;
pub mod session;
pub mod snap;
pub mod trim;
pub mod types;

pub use config::*;
pub use hints::infer_constraints;
pub use profiles::{detect_profiles, ClosedLoopFinder, Edge, GreedyCycleFinder};
pub use session::SketchSession;
pub use snap::find_snap_point;
pub use types::*;
