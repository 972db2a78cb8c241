//! Tessellation wrapper around truck-meshalgo.

use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::{MeshableShape, MeshedShape};
use truck_modeling::{InnerSpace, Vector3};

use crate::types::*;

type TruckSolid = truck_modeling::Solid;

/// Chordal tolerance used for every tessellation.
pub const TESSELLATION_TOLERANCE: f64 = 0.05;

/// Tessellate a truck Solid into a flat `RenderMesh`.
///
/// Triangles are emitted with their own vertices so per-corner normals can be
/// carried through unchanged; faces without normals get the triangle normal.
pub fn tessellate_solid(solid: &TruckSolid, tolerance: f64) -> Result<RenderMesh, KernelError> {
    let meshed = solid.triangulation(tolerance);
    let mesh = meshed.to_polygon();

    let positions = mesh.positions();
    let normals = mesh.normals();

    let mut out = RenderMesh::default();
    for tri in mesh.tri_faces() {
        let corners = [positions[tri[0].pos], positions[tri[1].pos], positions[tri[2].pos]];
        let u = corners[1] - corners[0];
        let v = corners[2] - corners[0];
        let face_normal = u.cross(v);
        let len = face_normal.magnitude();
        let fallback = if len > 1e-12 {
            face_normal / len
        } else {
            Vector3::unit_z()
        };

        for (corner, vertex) in corners.iter().zip(tri.iter()) {
            let n = vertex
                .nor
                .and_then(|i| normals.get(i))
                .unwrap_or(fallback);
            out.indices.push((out.vertices.len() / 3) as u32);
            out.vertices
                .extend_from_slice(&[corner[0] as f32, corner[1] as f32, corner[2] as f32]);
            out.normals
                .extend_from_slice(&[n[0] as f32, n[1] as f32, n[2] as f32]);
        }
    }

    if out.indices.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "triangulation produced no triangles".to_string(),
        });
    }
    Ok(out)
}
