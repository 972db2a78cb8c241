//! MockKernel: a deterministic test double implementing `SolidKernel`.
//!
//! Solids are modelled as an axis-aligned bounding box plus scalar volume,
//! surface area and triangle count. Boolean volumes are exact for
//! axis-aligned boxes and approximate otherwise. Every kernel operation is
//! counted so callers can assert that cached work never reaches the kernel.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::traits::{check_extrusion, check_positive, SolidKernel};
use crate::types::*;

/// Segment count used for the faceted cylinder/sphere triangle estimates.
const CURVED_SEGMENTS: usize = 32;

/// A synthetic solid with deterministic properties.
#[derive(Debug, Clone, PartialEq)]
struct MockSolid {
    min: [f64; 3],
    max: [f64; 3],
    volume: f64,
    surface_area: f64,
    triangles: usize,
}

impl MockSolid {
    fn from_bounds(min: [f64; 3], max: [f64; 3]) -> Self {
        let d = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
        Self {
            min,
            max,
            volume: d[0] * d[1] * d[2],
            surface_area: 2.0 * (d[0] * d[1] + d[0] * d[2] + d[1] * d[2]),
            triangles: 12,
        }
    }

    /// Volume of the overlap between two bounding boxes (0 if disjoint).
    fn overlap_volume(&self, other: &MockSolid) -> f64 {
        (0..3)
            .map(|i| (self.max[i].min(other.max[i]) - self.min[i].max(other.min[i])).max(0.0))
            .product()
    }
}

/// Deterministic test double for the solid kernel.
pub struct MockKernel {
    initialized: bool,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    calls: usize,
    fail_booleans: bool,
}

impl MockKernel {
    /// A kernel that still needs `initialize()`.
    pub fn new() -> Self {
        Self {
            initialized: false,
            next_handle: 1,
            solids: HashMap::new(),
            calls: 0,
            fail_booleans: false,
        }
    }

    /// A kernel that is already initialized.
    pub fn initialized() -> Self {
        let mut kernel = Self::new();
        kernel.initialized = true;
        kernel
    }

    /// Number of kernel operations performed (initialize excluded).
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn reset_calls(&mut self) {
        self.calls = 0;
    }

    /// Make every subsequent boolean operation fail.
    pub fn set_fail_booleans(&mut self, fail: bool) {
        self.fail_booleans = fail;
    }

    /// Number of live solids held by the kernel.
    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    /// Axis-aligned bounds of a solid as `(min, max)`.
    pub fn bounding_box(&self, handle: &SolidHandle) -> Option<([f64; 3], [f64; 3])> {
        self.solids.get(&handle.0).map(|s| (s.min, s.max))
    }

    fn begin(&mut self) -> Result<(), KernelError> {
        if !self.initialized {
            return Err(KernelError::Uninitialized);
        }
        self.calls += 1;
        Ok(())
    }

    fn store(&mut self, solid: MockSolid) -> SolidHandle {
        let handle = SolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(handle.0, solid);
        handle
    }

    fn get(&self, handle: &SolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.0)
            .ok_or(KernelError::HandleNotFound { handle: handle.0 })
    }

    fn check_boolean(&self) -> Result<(), KernelError> {
        if self.fail_booleans {
            Err(KernelError::BooleanFailed {
                reason: "mock boolean failure injected".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Generate a box mesh: 4 vertices and 2 triangles per face.
    fn tessellate_bounds(solid: &MockSolid) -> RenderMesh {
        let (lo, hi) = (solid.min, solid.max);
        // (normal, four corners counter-clockwise seen from outside)
        let faces: [([f64; 3], [[f64; 3]; 4]); 6] = [
            (
                [0.0, 0.0, -1.0],
                [
                    [lo[0], lo[1], lo[2]],
                    [lo[0], hi[1], lo[2]],
                    [hi[0], hi[1], lo[2]],
                    [hi[0], lo[1], lo[2]],
                ],
            ),
            (
                [0.0, 0.0, 1.0],
                [
                    [lo[0], lo[1], hi[2]],
                    [hi[0], lo[1], hi[2]],
                    [hi[0], hi[1], hi[2]],
                    [lo[0], hi[1], hi[2]],
                ],
            ),
            (
                [0.0, -1.0, 0.0],
                [
                    [lo[0], lo[1], lo[2]],
                    [hi[0], lo[1], lo[2]],
                    [hi[0], lo[1], hi[2]],
                    [lo[0], lo[1], hi[2]],
                ],
            ),
            (
                [0.0, 1.0, 0.0],
                [
                    [lo[0], hi[1], lo[2]],
                    [lo[0], hi[1], hi[2]],
                    [hi[0], hi[1], hi[2]],
                    [hi[0], hi[1], lo[2]],
                ],
            ),
            (
                [-1.0, 0.0, 0.0],
                [
                    [lo[0], lo[1], lo[2]],
                    [lo[0], lo[1], hi[2]],
                    [lo[0], hi[1], hi[2]],
                    [lo[0], hi[1], lo[2]],
                ],
            ),
            (
                [1.0, 0.0, 0.0],
                [
                    [hi[0], lo[1], lo[2]],
                    [hi[0], hi[1], lo[2]],
                    [hi[0], hi[1], hi[2]],
                    [hi[0], lo[1], hi[2]],
                ],
            ),
        ];

        let mut mesh = RenderMesh::default();
        for (normal, corners) in &faces {
            let base = (mesh.vertices.len() / 3) as u32;
            for c in corners {
                mesh.vertices
                    .extend_from_slice(&[c[0] as f32, c[1] as f32, c[2] as f32]);
                mesh.normals
                    .extend_from_slice(&[normal[0] as f32, normal[1] as f32, normal[2] as f32]);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotate a point about the origin by Euler angles (degrees), X then Y then Z.
fn rotate_point(p: [f64; 3], degrees: [f64; 3]) -> [f64; 3] {
    let [ax, ay, az] = degrees.map(f64::to_radians);
    let (sx, cx) = ax.sin_cos();
    let (sy, cy) = ay.sin_cos();
    let (sz, cz) = az.sin_cos();

    let p = [p[0], p[1] * cx - p[2] * sx, p[1] * sx + p[2] * cx];
    let p = [p[0] * cy + p[2] * sy, p[1], -p[0] * sy + p[2] * cy];
    [p[0] * cz - p[1] * sz, p[0] * sz + p[1] * cz, p[2]]
}

/// Snap values within float noise of an integer so rotated bounds stay exact.
fn clean(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < 1e-9 {
        r
    } else {
        v
    }
}

impl SolidKernel for MockKernel {
    fn initialize(&mut self) -> Result<(), KernelError> {
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn create_box(
        &mut self,
        width: f64,
        height: f64,
        depth: f64,
    ) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        check_positive("width", width)?;
        check_positive("height", height)?;
        check_positive("depth", depth)?;
        Ok(self.store(MockSolid::from_bounds([0.0; 3], [width, height, depth])))
    }

    fn create_cylinder(&mut self, radius: f64, height: f64) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        check_positive("radius", radius)?;
        check_positive("height", height)?;
        Ok(self.store(MockSolid {
            min: [-radius, -radius, 0.0],
            max: [radius, radius, height],
            volume: PI * radius * radius * height,
            surface_area: 2.0 * PI * radius * (radius + height),
            triangles: 4 * CURVED_SEGMENTS,
        }))
    }

    fn create_sphere(&mut self, radius: f64) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        check_positive("radius", radius)?;
        Ok(self.store(MockSolid {
            min: [-radius; 3],
            max: [radius; 3],
            volume: 4.0 / 3.0 * PI * radius.powi(3),
            surface_area: 4.0 * PI * radius * radius,
            triangles: CURVED_SEGMENTS * CURVED_SEGMENTS,
        }))
    }

    fn union(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        self.check_boolean()?;
        let (sa, sb) = (self.get(a)?.clone(), self.get(b)?.clone());
        let overlap = sa.overlap_volume(&sb).min(sa.volume).min(sb.volume);
        let mut min = sa.min;
        let mut max = sa.max;
        for i in 0..3 {
            min[i] = min[i].min(sb.min[i]);
            max[i] = max[i].max(sb.max[i]);
        }
        Ok(self.store(MockSolid {
            min,
            max,
            volume: sa.volume + sb.volume - overlap,
            surface_area: sa.surface_area + sb.surface_area,
            triangles: sa.triangles + sb.triangles,
        }))
    }

    fn difference(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        self.check_boolean()?;
        let (sa, sb) = (self.get(a)?.clone(), self.get(b)?.clone());
        let overlap = sa.overlap_volume(&sb).min(sa.volume).min(sb.volume);
        Ok(self.store(MockSolid {
            volume: (sa.volume - overlap).max(0.0),
            triangles: sa.triangles + sb.triangles,
            ..sa
        }))
    }

    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        self.check_boolean()?;
        let (sa, sb) = (self.get(a)?.clone(), self.get(b)?.clone());
        let overlap = sa.overlap_volume(&sb).min(sa.volume).min(sb.volume);
        if overlap <= 0.0 {
            return Ok(self.store(MockSolid {
                min: sa.min,
                max: sa.min,
                volume: 0.0,
                surface_area: 0.0,
                triangles: 0,
            }));
        }
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for i in 0..3 {
            min[i] = sa.min[i].max(sb.min[i]);
            max[i] = sa.max[i].min(sb.max[i]);
        }
        let mut solid = MockSolid::from_bounds(min, max);
        solid.volume = overlap;
        Ok(self.store(solid))
    }

    fn translate(
        &mut self,
        solid: &SolidHandle,
        offset: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        let s = self.get(solid)?.clone();
        let shift = |p: [f64; 3]| [p[0] + offset[0], p[1] + offset[1], p[2] + offset[2]];
        Ok(self.store(MockSolid {
            min: shift(s.min),
            max: shift(s.max),
            ..s
        }))
    }

    fn rotate(
        &mut self,
        solid: &SolidHandle,
        degrees: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        let s = self.get(solid)?.clone();
        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for corner in 0..8 {
            let p = [
                if corner & 1 == 0 { s.min[0] } else { s.max[0] },
                if corner & 2 == 0 { s.min[1] } else { s.max[1] },
                if corner & 4 == 0 { s.min[2] } else { s.max[2] },
            ];
            let r = rotate_point(p, degrees);
            for i in 0..3 {
                min[i] = min[i].min(clean(r[i]));
                max[i] = max[i].max(clean(r[i]));
            }
        }
        Ok(self.store(MockSolid { min, max, ..s }))
    }

    fn scale(
        &mut self,
        solid: &SolidHandle,
        factors: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        if factors.iter().any(|f| !f.is_finite() || *f == 0.0) {
            return Err(KernelError::InvalidInput {
                reason: format!("scale factors must be non-zero, got {:?}", factors),
            });
        }
        let s = self.get(solid)?.clone();
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for i in 0..3 {
            let (a, b) = (s.min[i] * factors[i], s.max[i] * factors[i]);
            min[i] = a.min(b);
            max[i] = a.max(b);
        }
        let det = (factors[0] * factors[1] * factors[2]).abs();
        Ok(self.store(MockSolid {
            min,
            max,
            volume: s.volume * det,
            surface_area: s.surface_area * det.powf(2.0 / 3.0),
            triangles: s.triangles,
        }))
    }

    fn extrude(
        &mut self,
        polygon: &[(f64, f64)],
        height: f64,
    ) -> Result<SolidHandle, KernelError> {
        self.begin()?;
        let area = check_extrusion(polygon, height)?.abs();

        let n = polygon.len();
        let mut perimeter = 0.0;
        let mut min = [f64::MAX, f64::MAX, height.min(0.0)];
        let mut max = [f64::MIN, f64::MIN, height.max(0.0)];
        for i in 0..n {
            let (x, y) = polygon[i];
            let (nx, ny) = polygon[(i + 1) % n];
            perimeter += (nx - x).hypot(ny - y);
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
            max[0] = max[0].max(x);
            max[1] = max[1].max(y);
        }

        Ok(self.store(MockSolid {
            min,
            max,
            volume: area * height.abs(),
            surface_area: 2.0 * area + perimeter * height.abs(),
            triangles: 2 * (n - 2) + 2 * n,
        }))
    }

    fn tessellate(&mut self, solid: &SolidHandle) -> Result<RenderMesh, KernelError> {
        self.begin()?;
        Ok(Self::tessellate_bounds(self.get(solid)?))
    }

    fn num_triangles(&mut self, solid: &SolidHandle) -> Result<usize, KernelError> {
        self.begin()?;
        Ok(self.get(solid)?.triangles)
    }

    fn volume(&mut self, solid: &SolidHandle) -> Result<f64, KernelError> {
        self.begin()?;
        Ok(self.get(solid)?.volume)
    }

    fn surface_area(&mut self, solid: &SolidHandle) -> Result<f64, KernelError> {
        self.begin()?;
        Ok(self.get(solid)?.surface_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_operations_require_initialize() {
        let mut kernel = MockKernel::new();
        assert!(matches!(
            kernel.create_box(1.0, 1.0, 1.0),
            Err(KernelError::Uninitialized)
        ));
        kernel.initialize().unwrap();
        assert!(kernel.create_box(1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_box_volume_and_area() {
        let mut kernel = MockKernel::initialized();
        let h = kernel.create_box(2.0, 3.0, 4.0).unwrap();
        assert_relative_eq!(kernel.volume(&h).unwrap(), 24.0);
        assert_relative_eq!(kernel.surface_area(&h).unwrap(), 52.0);
        assert_eq!(kernel.num_triangles(&h).unwrap(), 12);
    }

    #[test]
    fn test_union_of_overlapping_boxes() {
        let mut kernel = MockKernel::initialized();
        let a = kernel.create_box(2.0, 2.0, 2.0).unwrap();
        let b = kernel.create_box(2.0, 2.0, 2.0).unwrap();
        let b = kernel.translate(&b, [1.0, 0.0, 0.0]).unwrap();
        let u = kernel.union(&a, &b).unwrap();
        assert_relative_eq!(kernel.volume(&u).unwrap(), 12.0);
        assert_eq!(kernel.bounding_box(&u).unwrap(), ([0.0; 3], [3.0, 2.0, 2.0]));
    }

    #[test]
    fn test_difference_and_intersect() {
        let mut kernel = MockKernel::initialized();
        let a = kernel.create_box(4.0, 4.0, 4.0).unwrap();
        let b = kernel.create_box(2.0, 2.0, 2.0).unwrap();
        let d = kernel.difference(&a, &b).unwrap();
        let i = kernel.intersect(&a, &b).unwrap();
        assert_relative_eq!(kernel.volume(&d).unwrap(), 56.0);
        assert_relative_eq!(kernel.volume(&i).unwrap(), 8.0);
    }

    #[test]
    fn test_rotate_maps_z_extent_onto_negative_y() {
        let mut kernel = MockKernel::initialized();
        let h = kernel.create_box(1.0, 2.0, 3.0).unwrap();
        let r = kernel.rotate(&h, [90.0, 0.0, 0.0]).unwrap();
        assert_eq!(
            kernel.bounding_box(&r).unwrap(),
            ([0.0, -3.0, 0.0], [1.0, 0.0, 2.0])
        );
    }

    #[test]
    fn test_extrude_square_and_negative_height() {
        let mut kernel = MockKernel::initialized();
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let up = kernel.extrude(&square, 5.0).unwrap();
        let down = kernel.extrude(&square, -5.0).unwrap();
        assert_relative_eq!(kernel.volume(&up).unwrap(), 500.0);
        assert_eq!(kernel.bounding_box(&down).unwrap().0[2], -5.0);
        assert!(kernel.extrude(&square[..2], 1.0).is_err());
        assert!(kernel.extrude(&square, 0.0).is_err());
    }

    #[test]
    fn test_call_counter_and_failure_injection() {
        let mut kernel = MockKernel::initialized();
        let a = kernel.create_box(1.0, 1.0, 1.0).unwrap();
        let b = kernel.create_sphere(1.0).unwrap();
        assert_eq!(kernel.calls(), 2);
        kernel.set_fail_booleans(true);
        assert!(matches!(
            kernel.union(&a, &b),
            Err(KernelError::BooleanFailed { .. })
        ));
        kernel.reset_calls();
        assert_eq!(kernel.calls(), 0);
    }

    #[test]
    fn test_tessellate_box_mesh() {
        let mut kernel = MockKernel::initialized();
        let h = kernel.create_box(1.0, 1.0, 1.0).unwrap();
        let mesh = kernel.tessellate(&h).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
        assert_relative_eq!(crate::mesh_metrics::mesh_volume(&mesh), 1.0, epsilon = 1e-6);
    }
}
