//! TruckKernel: real geometry kernel wrapping truck's API.

use std::collections::HashMap;

use truck_modeling::builder;
use truck_modeling::topology::Solid;
use truck_modeling::{EuclideanSpace, Point3, Rad, Vector3};
use tracing::debug;

use crate::mesh_metrics;
use crate::primitives;
use crate::tessellation::{self, TESSELLATION_TOLERANCE};
use crate::traits::{check_extrusion, check_positive, SolidKernel};
use crate::types::*;

/// Tolerance handed to truck's boolean operations.
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// Real geometry kernel backed by the truck BREP library.
pub struct TruckKernel {
    initialized: bool,
    next_handle: u64,
    solids: HashMap<u64, Solid>,
    /// Tessellations are cached per handle; solids never change once stored.
    meshes: HashMap<u64, RenderMesh>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            initialized: false,
            next_handle: 1,
            solids: HashMap::new(),
            meshes: HashMap::new(),
        }
    }

    fn ensure_ready(&self) -> Result<(), KernelError> {
        if self.initialized {
            Ok(())
        } else {
            Err(KernelError::Uninitialized)
        }
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> SolidHandle {
        let handle = SolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(handle.0, solid);
        handle
    }

    pub(crate) fn get_solid(&self, handle: &SolidHandle) -> Result<&Solid, KernelError> {
        self.solids
            .get(&handle.0)
            .ok_or(KernelError::HandleNotFound { handle: handle.0 })
    }

    fn mesh(&mut self, handle: &SolidHandle) -> Result<&RenderMesh, KernelError> {
        self.ensure_ready()?;
        if !self.meshes.contains_key(&handle.0) {
            let mesh = tessellation::tessellate_solid(self.get_solid(handle)?, TESSELLATION_TOLERANCE)?;
            self.meshes.insert(handle.0, mesh);
        }
        self.meshes
            .get(&handle.0)
            .ok_or(KernelError::HandleNotFound { handle: handle.0 })
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidKernel for TruckKernel {
    fn initialize(&mut self) -> Result<(), KernelError> {
        if !self.initialized {
            debug!("truck kernel initialized");
            self.initialized = true;
        }
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
        self.ensure_ready()?;
        check_positive("width", width)?;
        check_positive("height", height)?;
        check_positive("depth", depth)?;
        Ok(self.store_solid(primitives::make_box(width, height, depth)))
    }

    fn create_cylinder(&mut self, radius: f64, height: f64) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        check_positive("radius", radius)?;
        check_positive("height", height)?;
        let solid = primitives::make_cylinder(radius, height)?;
        Ok(self.store_solid(solid))
    }

    fn create_sphere(&mut self, radius: f64) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        check_positive("radius", radius)?;
        let solid = primitives::make_sphere(radius)?;
        Ok(self.store_solid(solid))
    }

    fn union(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        let result = truck_shapeops::or(self.get_solid(a)?, self.get_solid(b)?, BOOLEAN_TOLERANCE)
            .ok_or_else(|| KernelError::BooleanFailed {
                reason: "truck or() returned None".to_string(),
            })?;
        Ok(self.store_solid(result))
    }

    fn difference(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        // Subtraction = A ∩ ¬B. not() mutates in place.
        let mut tool = self.get_solid(b)?.clone();
        tool.not();
        let result = truck_shapeops::and(self.get_solid(a)?, &tool, BOOLEAN_TOLERANCE)
            .ok_or_else(|| KernelError::BooleanFailed {
                reason: "truck and() returned None for subtraction".to_string(),
            })?;
        Ok(self.store_solid(result))
    }

    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        let result = truck_shapeops::and(self.get_solid(a)?, self.get_solid(b)?, BOOLEAN_TOLERANCE)
            .ok_or_else(|| KernelError::BooleanFailed {
                reason: "truck and() returned None".to_string(),
            })?;
        Ok(self.store_solid(result))
    }

    fn translate(
        &mut self,
        solid: &SolidHandle,
        offset: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        let moved = builder::translated(
            self.get_solid(solid)?,
            Vector3::new(offset[0], offset[1], offset[2]),
        );
        Ok(self.store_solid(moved))
    }

    fn rotate(
        &mut self,
        solid: &SolidHandle,
        degrees: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        let axes = [Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z()];
        let mut current = self.get_solid(solid)?.clone();
        for (axis, angle) in axes.into_iter().zip(degrees) {
            if angle != 0.0 {
                current = builder::rotated(&current, Point3::origin(), axis, Rad(angle.to_radians()));
            }
        }
        Ok(self.store_solid(current))
    }

    fn scale(
        &mut self,
        solid: &SolidHandle,
        factors: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        if factors.iter().any(|f| !f.is_finite() || *f == 0.0) {
            return Err(KernelError::InvalidInput {
                reason: format!("scale factors must be non-zero, got {:?}", factors),
            });
        }
        let scaled = builder::scaled(
            self.get_solid(solid)?,
            Point3::origin(),
            Vector3::new(factors[0], factors[1], factors[2]),
        );
        Ok(self.store_solid(scaled))
    }

    fn extrude(
        &mut self,
        polygon: &[(f64, f64)],
        height: f64,
    ) -> Result<SolidHandle, KernelError> {
        self.ensure_ready()?;
        let area = check_extrusion(polygon, height)?;

        // try_attach_plane orients the face by the wire, so feed it CCW.
        let mut ccw = polygon.to_vec();
        if area < 0.0 {
            ccw.reverse();
        }
        let prism = primitives::make_prism(&ccw, height.abs())?;
        let solid = if height < 0.0 {
            builder::translated(&prism, Vector3::new(0.0, 0.0, height))
        } else {
            prism
        };
        Ok(self.store_solid(solid))
    }

    fn tessellate(&mut self, solid: &SolidHandle) -> Result<RenderMesh, KernelError> {
        self.mesh(solid).cloned()
    }

    fn num_triangles(&mut self, solid: &SolidHandle) -> Result<usize, KernelError> {
        Ok(self.mesh(solid)?.triangle_count())
    }

    fn volume(&mut self, solid: &SolidHandle) -> Result<f64, KernelError> {
        Ok(mesh_metrics::mesh_volume(self.mesh(solid)?))
    }

    fn surface_area(&mut self, solid: &SolidHandle) -> Result<f64, KernelError> {
        Ok(mesh_metrics::mesh_surface_area(self.mesh(solid)?))
    }
}
