//! Scalar measurements of a tessellated solid.

use crate::types::RenderMesh;

fn triangle_vertices(mesh: &RenderMesh) -> impl Iterator<Item = [[f64; 3]; 3]> + '_ {
    let verts = &mesh.vertices;
    mesh.indices.chunks(3).filter_map(move |tri| {
        if tri.len() < 3 {
            return None;
        }
        let mut out = [[0.0; 3]; 3];
        for (slot, &idx) in out.iter_mut().zip(tri) {
            let i = idx as usize * 3;
            if i + 2 >= verts.len() {
                return None;
            }
            *slot = [verts[i] as f64, verts[i + 1] as f64, verts[i + 2] as f64];
        }
        Some(out)
    })
}

/// Enclosed volume of a closed triangle mesh (divergence theorem).
///
/// For open meshes the result is meaningless.
pub fn mesh_volume(mesh: &RenderMesh) -> f64 {
    let volume: f64 = triangle_vertices(mesh)
        .map(|[a, b, c]| {
            a[0] * (b[1] * c[2] - c[1] * b[2]) + b[0] * (c[1] * a[2] - a[1] * c[2])
                + c[0] * (a[1] * b[2] - b[1] * a[2])
        })
        .sum();
    (volume / 6.0).abs()
}

/// Total surface area of a triangle mesh.
pub fn mesh_surface_area(mesh: &RenderMesh) -> f64 {
    triangle_vertices(mesh)
        .map(|[a, b, c]| {
            let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let cx = u[1] * v[2] - u[2] * v[1];
            let cy = u[2] * v[0] - u[0] * v[2];
            let cz = u[0] * v[1] - u[1] * v[0];
            (cx * cx + cy * cy + cz * cz).sqrt() / 2.0
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit tetrahedron with outward winding.
    fn tetrahedron() -> RenderMesh {
        RenderMesh {
            vertices: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0,
            ],
            normals: vec![0.0; 12],
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        }
    }

    #[test]
    fn tetrahedron_volume() {
        assert_relative_eq!(mesh_volume(&tetrahedron()), 1.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn tetrahedron_area() {
        let expected = 1.5 + 3.0_f64.sqrt() / 2.0;
        assert_relative_eq!(mesh_surface_area(&tetrahedron()), expected, epsilon = 1e-6);
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let mut mesh = tetrahedron();
        mesh.indices.extend_from_slice(&[0, 1, 99]);
        assert_relative_eq!(mesh_volume(&mesh), 1.0 / 6.0, epsilon = 1e-9);
    }
}
