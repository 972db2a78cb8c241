use crate::types::*;

/// Core solid-modeling kernel trait.
///
/// Implemented by `TruckKernel` (wraps truck) and `MockKernel` (deterministic
/// test double). Every constructive operation returns a new handle and leaves
/// its inputs alive; the caller's bookkeeping decides what to keep.
pub trait SolidKernel {
    /// One-time setup. Must succeed before any other operation.
    fn initialize(&mut self) -> Result<(), KernelError>;

    fn is_initialized(&self) -> bool;

    /// Axis-aligned box from the origin to `(width, height, depth)`.
    fn create_box(
        &mut self,
        width: f64,
        height: f64,
        depth: f64,
    ) -> Result<SolidHandle, KernelError>;

    /// Cylinder with its base centered on the origin, extending along +Z.
    fn create_cylinder(&mut self, radius: f64, height: f64) -> Result<SolidHandle, KernelError>;

    /// Sphere centered on the origin.
    fn create_sphere(&mut self, radius: f64) -> Result<SolidHandle, KernelError>;

    fn union(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError>;

    /// Boolean subtraction: `a` minus `b`.
    fn difference(&mut self, a: &SolidHandle, b: &SolidHandle)
        -> Result<SolidHandle, KernelError>;

    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError>;

    fn translate(&mut self, solid: &SolidHandle, offset: [f64; 3])
        -> Result<SolidHandle, KernelError>;

    /// Rotate about the world origin by Euler angles in degrees, applied X, then Y, then Z.
    fn rotate(&mut self, solid: &SolidHandle, degrees: [f64; 3])
        -> Result<SolidHandle, KernelError>;

    fn scale(&mut self, solid: &SolidHandle, factors: [f64; 3])
        -> Result<SolidHandle, KernelError>;

    /// Extrude a closed polygon in the XY plane along Z by `height`.
    /// A negative height extrudes toward -Z.
    fn extrude(&mut self, polygon: &[(f64, f64)], height: f64)
        -> Result<SolidHandle, KernelError>;

    fn tessellate(&mut self, solid: &SolidHandle) -> Result<RenderMesh, KernelError>;

    fn num_triangles(&mut self, solid: &SolidHandle) -> Result<usize, KernelError>;

    fn volume(&mut self, solid: &SolidHandle) -> Result<f64, KernelError>;

    fn surface_area(&mut self, solid: &SolidHandle) -> Result<f64, KernelError>;
}

/// Reject non-finite or non-positive dimensions before they reach a kernel.
pub(crate) fn check_positive(name: &str, value: f64) -> Result<(), KernelError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KernelError::InvalidInput {
            reason: format!("{} must be positive, got {}", name, value),
        })
    }
}

/// Validate an extrusion polygon and height; returns the polygon's signed area.
pub(crate) fn check_extrusion(polygon: &[(f64, f64)], height: f64) -> Result<f64, KernelError> {
    if polygon.len() < 3 {
        return Err(KernelError::InvalidInput {
            reason: format!("extrusion polygon needs 3+ points, got {}", polygon.len()),
        });
    }
    if !height.is_finite() || height == 0.0 {
        return Err(KernelError::InvalidInput {
            reason: format!("extrusion height must be non-zero, got {}", height),
        });
    }
    let area = polygon_signed_area(polygon);
    if area.abs() < 1e-12 {
        return Err(KernelError::InvalidInput {
            reason: "extrusion polygon has zero area".to_string(),
        });
    }
    Ok(area)
}

/// Shoelace signed area of a 2D polygon.
pub(crate) fn polygon_signed_area(pts: &[(f64, f64)]) -> f64 {
    let n = pts.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += pts[i].0 * pts[j].1;
        area -= pts[j].0 * pts[i].1;
    }
    area / 2.0
}
