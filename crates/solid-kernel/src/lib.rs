//! Solid-kernel boundary: the `SolidKernel` trait consumed by the feature
//! evaluator, a deterministic `MockKernel`, and a truck-backed `TruckKernel`.

pub mod mesh_metrics;
pub mod mock_kernel;
pub mod primitives;
pub mod tessellation;
pub mod traits;
pub mod truck_kernel;
pub mod types;

pub use mock_kernel::MockKernel;
pub use traits::*;
pub use truck_kernel::TruckKernel;
pub use types::*;
