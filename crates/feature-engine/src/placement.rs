use cad_types::SketchPlane;
use solid_kernel::{KernelError, SolidHandle, SolidKernel};

use crate::types::ExtrudeDirection;

/// Signed extrusion height along local +Z.
pub fn extrude_height(distance: f64, direction: ExtrudeDirection) -> f64 {
    match direction {
        ExtrudeDirection::Reverse => -distance,
        ExtrudeDirection::Normal | ExtrudeDirection::Symmetric => distance,
    }
}

/// Local Z shift applied after extrusion, before plane placement.
pub fn symmetric_offset(height: f64, direction: ExtrudeDirection) -> Option<f64> {
    (direction == ExtrudeDirection::Symmetric).then_some(-height / 2.0)
}

/// Carry a solid built in the local XY frame onto its sketch plane:
/// rotate into orientation, then translate by the plane origin.
pub fn place_on_plane(
    kernel: &mut dyn SolidKernel,
    solid: SolidHandle,
    plane: &SketchPlane,
) -> Result<SolidHandle, KernelError> {
    let mut placed = solid;
    if let Some(degrees) = plane.rotation_degrees() {
        placed = kernel.rotate(&placed, degrees)?;
    }
    if let Some(offset) = plane.translation() {
        placed = kernel.translate(&placed, offset)?;
    }
    Ok(placed)
}
