//! Higher-level primitive builders on top of truck's sweep API.
//!
//! truck has no built-in box/cylinder/sphere; everything is successive sweeps.

use std::f64::consts::PI;
use truck_modeling::builder;
use truck_modeling::topology::{Edge, Solid, Wire};
use truck_modeling::{EuclideanSpace, Point3, Rad, Vector3};

use crate::types::KernelError;

/// Create a box solid via successive translational sweeps.
/// Origin at (0,0,0), extends to (w,h,d).
pub fn make_box(w: f64, h: f64, d: f64) -> Solid {
    let v = builder::vertex(Point3::new(0.0, 0.0, 0.0));
    let edge = builder::tsweep(&v, Vector3::new(w, 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, h, 0.0));
    builder::tsweep(&face, Vector3::new(0.0, 0.0, d))
}

/// Create a cylinder solid: circle wire → face → translational sweep.
/// Base centered at origin in XY plane, extending along +Z.
pub fn make_cylinder(radius: f64, height: f64) -> Result<Solid, KernelError> {
    let v = builder::vertex(Point3::new(radius, 0.0, 0.0));
    let wire = builder::rsweep(&v, Point3::origin(), Vector3::unit_z(), Rad(2.0 * PI));
    let face = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::Other {
        message: format!("failed to create circular face: {}", e),
    })?;
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, height)))
}

/// Create a sphere solid: half-disc face → rotational sweep 2π.
/// Centered at origin.
pub fn make_sphere(radius: f64) -> Result<Solid, KernelError> {
    // Semicircle in XZ from (r,0,0) over the top to (-r,0,0)
    let v_right = builder::vertex(Point3::new(radius, 0.0, 0.0));
    let arc_wire = builder::rsweep(&v_right, Point3::origin(), Vector3::unit_y(), Rad(PI));

    let v_left = builder::vertex(Point3::new(-radius, 0.0, 0.0));
    let line_edge: Edge = builder::tsweep(&v_left, Vector3::new(2.0 * radius, 0.0, 0.0));

    let mut edges: Vec<Edge> = arc_wire.edge_iter().cloned().collect();
    edges.push(line_edge);
    let closed_wire = Wire::from_iter(edges);

    let face = builder::try_attach_plane(&[closed_wire]).map_err(|e| KernelError::Other {
        message: format!("failed to create semicircle face: {}", e),
    })?;

    Ok(builder::rsweep(
        &face,
        Point3::origin(),
        Vector3::unit_z(),
        Rad(2.0 * PI),
    ))
}

/// Create a prism by sweeping a closed XY polygon along +Z by `height`.
///
/// The polygon must be counter-clockwise so the attached plane faces +Z.
pub fn make_prism(polygon: &[(f64, f64)], height: f64) -> Result<Solid, KernelError> {
    let vertices: Vec<_> = polygon
        .iter()
        .map(|&(x, y)| builder::vertex(Point3::new(x, y, 0.0)))
        .collect();
    let n = vertices.len();
    let edges: Vec<Edge> = (0..n)
        .map(|i| builder::line(&vertices[i], &vertices[(i + 1) % n]))
        .collect();
    let wire = Wire::from_iter(edges);

    let face = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::Other {
        message: format!("failed to create planar face: {}", e),
    })?;
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, height)))
}
