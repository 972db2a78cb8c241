use serde::{Deserialize, Serialize};

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only for the kernel instance that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolidHandle(pub(crate) u64);

impl SolidHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("kernel used before initialize()")]
    Uninitialized,

    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("solid handle not found: {handle}")]
    HandleNotFound { handle: u64 },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// Tessellated triangle mesh for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals [nx0, ny0, nz0, nx1, ny1, nz1, ...].
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
}

impl RenderMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
