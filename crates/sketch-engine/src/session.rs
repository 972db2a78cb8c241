//! The sketch editing session: a working copy of one sketch plus the
//! Idle/Active lifecycle around it.
//!
//! Every mutation re-derives profiles and constraint hints, so
//! [`SketchSession::snapshot`] is always current.

use cad_types::{Point2D, Profile, SketchConstraint, SketchData, SketchEntity};
use tracing::{debug, instrument, warn};

use crate::config::SketchConfig;
use crate::hints::infer_constraints;
use crate::offset;
use crate::profiles::detect_profiles;
use crate::snap::{self, SnapSettings};
use crate::trim;
use crate::types::*;

const COLLINEAR_EPSILON: f64 = 1e-9;

/// An editing session over one sketch.
pub struct SketchSession {
    config: SketchConfig,
    state: SessionState,
    /// Data the session was entered with, restored on cancel.
    seed: SketchData,
    working: SketchData,
    /// `None` once the id space is used up.
    next_id: Option<u32>,
}

impl SketchSession {
    pub fn new(config: SketchConfig) -> Self {
        let empty = SketchData::new(config.grid_size, config.snap_enabled);
        Self {
            config,
            state: SessionState::Idle,
            seed: empty.clone(),
            working: empty,
            next_id: Some(1),
        }
    }

    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Current sketch data: the working copy while active, the committed or
    /// restored data once idle.
    pub fn snapshot(&self) -> &SketchData {
        &self.working
    }

    pub fn entities(&self) -> &[SketchEntity] {
        &self.working.entities
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.working.profiles
    }

    pub fn constraints(&self) -> &[SketchConstraint] {
        &self.working.constraints
    }

    fn require(&self, expected: SessionState) -> Result<(), SketchError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SketchError::SessionState {
                expected,
                found: self.state,
            })
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Start editing. A seed is deep-copied; without one the sketch starts
    /// empty with the configured grid settings.
    #[instrument(skip(self, seed))]
    pub fn enter(&mut self, seed: Option<&SketchData>) -> Result<(), SketchError> {
        self.require(SessionState::Idle)?;
        self.seed = seed
            .cloned()
            .unwrap_or_else(|| SketchData::new(self.config.grid_size, self.config.snap_enabled));
        self.working = self.seed.clone();
        self.next_id = self.working.max_entity_id().checked_add(1);
        self.state = SessionState::Active;
        self.refresh();
        debug!(entities = self.working.entities.len(), "entered sketch");
        Ok(())
    }

    /// Commit the working copy and return it.
    pub fn finish(&mut self) -> Result<SketchData, SketchError> {
        self.require(SessionState::Active)?;
        self.refresh();
        self.state = SessionState::Idle;
        debug!(
            entities = self.working.entities.len(),
            profiles = self.working.profiles.len(),
            "committed sketch"
        );
        Ok(self.working.clone())
    }

    /// Discard every edit made since [`enter`](Self::enter).
    pub fn cancel(&mut self) -> Result<(), SketchError> {
        self.require(SessionState::Active)?;
        self.working = self.seed.clone();
        self.state = SessionState::Idle;
        debug!("discarded sketch edits");
        Ok(())
    }

    fn refresh(&mut self) {
        self.working.profiles = detect_profiles(&self.working.entities, &self.config.detector);
        self.working.constraints = infer_constraints(&self.working.entities, &self.config.hints);
    }

    fn allocate_id(&mut self) -> Result<u32, SketchError> {
        let id = self.next_id.ok_or(SketchError::IdsExhausted)?;
        self.next_id = id.checked_add(1);
        Ok(id)
    }

    fn push(&mut self, entity: SketchEntity) -> SketchEntity {
        self.working.entities.push(entity.clone());
        self.refresh();
        entity
    }

    fn entity(&self, id: u32) -> Result<&SketchEntity, SketchError> {
        self.working
            .find_entity(id)
            .ok_or(SketchError::EntityNotFound { id })
    }

    // ── Entity creation ─────────────────────────────────────────

    pub fn add_point(&mut self, position: Point2D) -> Result<SketchEntity, SketchError> {
        self.require(SessionState::Active)?;
        let id = self.allocate_id()?;
        Ok(self.push(SketchEntity::Point {
            id,
            position,
            construction: false,
        }))
    }

    pub fn add_line(&mut self, start: Point2D, end: Point2D) -> Result<SketchEntity, SketchError> {
        self.require(SessionState::Active)?;
        if start.distance_to(&end) <= f64::EPSILON {
            return Err(degenerate("line has zero length"));
        }
        let id = self.allocate_id()?;
        Ok(self.push(SketchEntity::Line {
            id,
            start,
            end,
            construction: false,
        }))
    }

    pub fn add_rectangle(
        &mut self,
        corner_a: Point2D,
        corner_b: Point2D,
    ) -> Result<SketchEntity, SketchError> {
        self.require(SessionState::Active)?;
        if (corner_a.x - corner_b.x).abs() <= f64::EPSILON
            || (corner_a.y - corner_b.y).abs() <= f64::EPSILON
        {
            return Err(degenerate("rectangle has zero width or height"));
        }
        let id = self.allocate_id()?;
        Ok(self.push(SketchEntity::Rectangle {
            id,
            corner_a,
            corner_b,
            construction: false,
        }))
    }

    pub fn add_circle(&mut self, center: Point2D, radius: f64) -> Result<SketchEntity, SketchError> {
        self.require(SessionState::Active)?;
        check_radius(radius)?;
        let id = self.allocate_id()?;
        Ok(self.push(SketchEntity::Circle {
            id,
            center,
            radius,
            construction: false,
        }))
    }

    /// Counter-clockwise arc from `start_angle` to `end_angle` (radians).
    pub fn add_arc(
        &mut self,
        center: Point2D,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<SketchEntity, SketchError> {
        self.require(SessionState::Active)?;
        check_radius(radius)?;
        let id = self.allocate_id()?;
        Ok(self.push(SketchEntity::Arc {
            id,
            center,
            radius,
            start_angle,
            end_angle,
            construction: false,
        }))
    }

    /// Arc from `start` through `mid` to `end`. `Ok(None)` when the three
    /// points are collinear.
    pub fn add_arc_through_points(
        &mut self,
        start: Point2D,
        mid: Point2D,
        end: Point2D,
    ) -> Result<Option<SketchEntity>, SketchError> {
        self.require(SessionState::Active)?;
        let Some(center) = circumcenter(start, mid, end) else {
            debug!("arc through collinear points rejected");
            return Ok(None);
        };
        let radius = center.distance_to(&start);
        let angle = |p: Point2D| (p.y - center.y).atan2(p.x - center.x);
        let (a0, a_mid, a1) = (angle(start), angle(mid), angle(end));
        // Stored arcs run counter-clockwise; flip when mid is on the other side.
        let (start_angle, end_angle) = if cad_types::arc_contains_angle(a0, a1, a_mid) {
            (a0, a1)
        } else {
            (a1, a0)
        };
        self.add_arc(center, radius, start_angle, end_angle).map(Some)
    }

    // ── Editing ─────────────────────────────────────────────────

    pub fn remove_entity(&mut self, id: u32) -> Result<SketchEntity, SketchError> {
        self.require(SessionState::Active)?;
        let index = self
            .working
            .entities
            .iter()
            .position(|e| e.id() == id)
            .ok_or(SketchError::EntityNotFound { id })?;
        let removed = self.working.entities.remove(index);
        self.refresh();
        Ok(removed)
    }

    pub fn set_construction(&mut self, id: u32, construction: bool) -> Result<(), SketchError> {
        self.require(SessionState::Active)?;
        let entity = self
            .working
            .entities
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or(SketchError::EntityNotFound { id })?;
        entity.set_construction(construction);
        self.refresh();
        Ok(())
    }

    pub fn set_grid_size(&mut self, grid_size: f64) -> Result<(), SketchError> {
        self.require(SessionState::Active)?;
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return Err(degenerate(format!("grid size must be positive, got {grid_size}")));
        }
        self.working.grid_size = grid_size;
        Ok(())
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) -> Result<(), SketchError> {
        self.require(SessionState::Active)?;
        self.working.snap_enabled = enabled;
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn find_snap_point(&self, position: Point2D, exclude_id: Option<u32>) -> Option<SnapResult> {
        let settings = SnapSettings {
            radius: self.config.snap_radius,
            grid_size: self.working.grid_size,
            grid_enabled: self.working.snap_enabled,
        };
        snap::find_snap_point(&self.working.entities, position, exclude_id, &settings)
    }

    pub fn find_nearest_line_entity(&self, point: Point2D, max_distance: f64) -> Option<u32> {
        trim::find_nearest_line_entity(&self.working.entities, point, max_distance)
    }

    pub fn find_nearest_offsetable_entity(&self, point: Point2D, max_distance: f64) -> Option<u32> {
        offset::find_nearest_offsetable_entity(&self.working.entities, point, max_distance)
    }

    // ── Trim / offset ───────────────────────────────────────────

    /// Remove the piece of line `id` around `click`, bounded by the nearest
    /// intersections on either side. Surviving pieces get fresh ids.
    /// `Ok(None)` for a zero-length line.
    #[instrument(skip(self))]
    pub fn trim_line_at(
        &mut self,
        id: u32,
        click: Point2D,
    ) -> Result<Option<TrimOutcome>, SketchError> {
        self.require(SessionState::Active)?;
        let (start, end, construction) = match self.entity(id)? {
            SketchEntity::Line {
                start,
                end,
                construction,
                ..
            } => (*start, *end, *construction),
            other => return Err(wrong_kind(id, "line", other)),
        };
        let Some(spans) = trim::trim_spans(
            &self.working.entities,
            id,
            start,
            end,
            click,
            self.config.trim_epsilon,
        ) else {
            warn!(id, "cannot trim a zero-length line");
            return Ok(None);
        };

        let index = self
            .working
            .entities
            .iter()
            .position(|e| e.id() == id)
            .ok_or(SketchError::EntityNotFound { id })?;
        let piece_ids = spans
            .iter()
            .map(|_| self.allocate_id())
            .collect::<Result<Vec<_>, _>>()?;
        let removed = self.working.entities.remove(index);

        let mut added = Vec::with_capacity(spans.len());
        for ((t0, t1), piece_id) in spans.into_iter().zip(piece_ids) {
            let piece = SketchEntity::Line {
                id: piece_id,
                start: start.lerp(&end, t0),
                end: start.lerp(&end, t1),
                construction,
            };
            self.working.entities.push(piece.clone());
            added.push(piece);
        }
        self.refresh();
        debug!(pieces = added.len(), "trimmed line");
        Ok(Some(TrimOutcome { removed, added }))
    }

    /// Add a copy of line `id` shifted `distance` toward `reference`.
    pub fn offset_line(
        &mut self,
        id: u32,
        distance: f64,
        reference: Point2D,
    ) -> Result<Option<SketchEntity>, SketchError> {
        self.require(SessionState::Active)?;
        let (start, end) = match self.entity(id)? {
            SketchEntity::Line { start, end, .. } => (*start, *end),
            other => return Err(wrong_kind(id, "line", other)),
        };
        let Some((start, end)) = offset::offset_line(start, end, distance, reference) else {
            warn!(id, distance, "line offset is degenerate");
            return Ok(None);
        };
        let id = self.allocate_id()?;
        Ok(Some(self.push(SketchEntity::Line {
            id,
            start,
            end,
            construction: false,
        })))
    }

    /// Add a concentric copy of circle `id`, larger when `reference` lies
    /// outside it and smaller when inside.
    pub fn offset_circle(
        &mut self,
        id: u32,
        distance: f64,
        reference: Point2D,
    ) -> Result<Option<SketchEntity>, SketchError> {
        self.require(SessionState::Active)?;
        let (center, radius) = match self.entity(id)? {
            SketchEntity::Circle { center, radius, .. } => (*center, *radius),
            other => return Err(wrong_kind(id, "circle", other)),
        };
        let Some(radius) =
            offset::offset_circle(center, radius, distance, reference, self.config.min_offset_size)
        else {
            warn!(id, distance, "circle offset is degenerate");
            return Ok(None);
        };
        let id = self.allocate_id()?;
        Ok(Some(self.push(SketchEntity::Circle {
            id,
            center,
            radius,
            construction: false,
        })))
    }

    /// Add a grown or shrunk copy of rectangle `id`.
    pub fn offset_rectangle(
        &mut self,
        id: u32,
        distance: f64,
        reference: Point2D,
    ) -> Result<Option<SketchEntity>, SketchError> {
        self.require(SessionState::Active)?;
        let (corner_a, corner_b) = match self.entity(id)? {
            SketchEntity::Rectangle {
                corner_a, corner_b, ..
            } => (*corner_a, *corner_b),
            other => return Err(wrong_kind(id, "rectangle", other)),
        };
        let Some((corner_a, corner_b)) = offset::offset_rectangle(
            corner_a,
            corner_b,
            distance,
            reference,
            self.config.min_offset_size,
        ) else {
            warn!(id, distance, "rectangle offset is degenerate");
            return Ok(None);
        };
        let id = self.allocate_id()?;
        Ok(Some(self.push(SketchEntity::Rectangle {
            id,
            corner_a,
            corner_b,
            construction: false,
        })))
    }
}

impl Default for SketchSession {
    fn default() -> Self {
        Self::new(SketchConfig::default())
    }
}

fn degenerate(reason: impl Into<String>) -> SketchError {
    SketchError::Degenerate {
        reason: reason.into(),
    }
}

fn wrong_kind(id: u32, expected: &'static str, found: &SketchEntity) -> SketchError {
    SketchError::WrongEntityKind {
        id,
        expected,
        found: found.kind_name(),
    }
}

fn check_radius(radius: f64) -> Result<(), SketchError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(degenerate(format!("radius must be positive, got {radius}")))
    }
}

/// Center of the circle through three points, `None` if they are collinear.
fn circumcenter(a: Point2D, b: Point2D, c: Point2D) -> Option<Point2D> {
    let d = 2.0 * (b - a).cross(&(c - a));
    if d.abs() < COLLINEAR_EPSILON {
        return None;
    }
    let (ab, ac) = (b - a, c - a);
    let (ab2, ac2) = (ab.dot(&ab), ac.dot(&ac));
    let ux = (ac.y * ab2 - ab.y * ac2) / d;
    let uy = (ab.x * ac2 - ac.x * ab2) / d;
    Some(Point2D::new(a.x + ux, a.y + uy))
}
