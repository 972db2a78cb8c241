use std::collections::{HashMap, HashSet};
use std::f64::consts::{PI, TAU};

use cad_types::{rectangle_bounds, rectangle_corners, signed_area, BoundingBox, Point2D, Profile, SketchEntity};
use tracing::debug;

use crate::config::DetectorConfig;

/// Loops with less area than this are dropped from the output.
const MIN_PROFILE_AREA: f64 = 1e-9;

/// A straight graph edge contributed by a line or an arc chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub entity_id: u32,
    pub start: Point2D,
    pub end: Point2D,
}

/// Strategy for turning a set of edges into closed profiles.
pub trait ClosedLoopFinder {
    fn find_profiles(&self, edges: &[Edge], config: &DetectorConfig) -> Vec<Profile>;
}

/// Depth-first cycle enumeration followed by a greedy edge-disjoint pick.
///
/// Shortest cycles win; a cycle sharing any edge with an already accepted one
/// is discarded. Holes and nesting are not recognized.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyCycleFinder;

/// Detect closed profiles in a sketch with the default finder.
///
/// Every non-construction circle and rectangle is a profile on its own,
/// reported first and in entity order. Lines and arc chords then go through
/// the cycle finder.
pub fn detect_profiles(entities: &[SketchEntity], config: &DetectorConfig) -> Vec<Profile> {
    detect_profiles_with(entities, config, &GreedyCycleFinder)
}

/// Like [`detect_profiles`], with a caller-supplied loop finder.
pub fn detect_profiles_with(
    entities: &[SketchEntity],
    config: &DetectorConfig,
    finder: &dyn ClosedLoopFinder,
) -> Vec<Profile> {
    let mut profiles = Vec::new();

    for entity in entities.iter().filter(|e| !e.is_construction()) {
        match entity {
            SketchEntity::Circle { center, radius, .. } if *radius > 0.0 => {
                profiles.push(circle_profile(*center, *radius, config.circle_segments));
            }
            SketchEntity::Rectangle {
                corner_a, corner_b, ..
            } => {
                let bounds = rectangle_bounds(*corner_a, *corner_b);
                let area = bounds.width() * bounds.height();
                if area > MIN_PROFILE_AREA {
                    profiles.push(Profile {
                        outer_loop: rectangle_corners(*corner_a, *corner_b).to_vec(),
                        inner_loops: Vec::new(),
                        area,
                        bounding_box: bounds,
                    });
                }
            }
            _ => {}
        }
    }

    let edges = entity_edges(entities);
    let standalone = profiles.len();
    profiles.extend(finder.find_profiles(&edges, config));
    debug!(
        standalone,
        from_edges = profiles.len() - standalone,
        edges = edges.len(),
        "detected sketch profiles"
    );
    profiles
}

/// Graph edges for every non-construction line and arc. Arcs contribute
/// their chord, so curvature is lost.
pub fn entity_edges(entities: &[SketchEntity]) -> Vec<Edge> {
    entities
        .iter()
        .filter(|e| !e.is_construction())
        .filter_map(|entity| match entity {
            SketchEntity::Line { id, start, end, .. } => Some(Edge {
                entity_id: *id,
                start: *start,
                end: *end,
            }),
            SketchEntity::Arc {
                id,
                center,
                radius,
                start_angle,
                end_angle,
                ..
            } => Some(Edge {
                entity_id: *id,
                start: Point2D::from_polar(*center, *radius, *start_angle),
                end: Point2D::from_polar(*center, *radius, *end_angle),
            }),
            _ => None,
        })
        .collect()
}

/// Polygonal circle profile. Area and bounds are the exact circle's.
fn circle_profile(center: Point2D, radius: f64, segments: usize) -> Profile {
    let segments = segments.max(3);
    let outer_loop = (0..segments)
        .map(|i| Point2D::from_polar(center, radius, TAU * i as f64 / segments as f64))
        .collect();
    Profile {
        outer_loop,
        inner_loops: Vec::new(),
        area: PI * radius * radius,
        bounding_box: BoundingBox {
            min: Point2D::new(center.x - radius, center.y - radius),
            max: Point2D::new(center.x + radius, center.y + radius),
        },
    }
}

/// Endpoint graph with vertices merged on a rounding grid.
struct EdgeGraph {
    positions: Vec<Point2D>,
    /// `(vertex_a, vertex_b)` per kept edge.
    edges: Vec<(usize, usize)>,
    /// `(edge_index, neighbor)` per vertex, in edge order.
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl EdgeGraph {
    fn build(edges: &[Edge], tolerance: f64) -> Self {
        let mut lookup: HashMap<(i64, i64), usize> = HashMap::new();
        let mut positions = Vec::new();
        let mut vertex_of = |p: Point2D| -> usize {
            let key = if tolerance > 0.0 {
                ((p.x / tolerance).round() as i64, (p.y / tolerance).round() as i64)
            } else {
                (p.x.to_bits() as i64, p.y.to_bits() as i64)
            };
            *lookup.entry(key).or_insert_with(|| {
                positions.push(p);
                positions.len() - 1
            })
        };

        let mut graph_edges = Vec::new();
        for edge in edges {
            let a = vertex_of(edge.start);
            let b = vertex_of(edge.end);
            // Both ends merged into one vertex: nothing to traverse.
            if a != b {
                graph_edges.push((a, b));
            }
        }

        let mut adjacency = vec![Vec::new(); positions.len()];
        for (index, &(a, b)) in graph_edges.iter().enumerate() {
            adjacency[a].push((index, b));
            adjacency[b].push((index, a));
        }

        Self {
            positions,
            edges: graph_edges,
            adjacency,
        }
    }

    /// Every simple cycle of two or more edges, deduplicated by edge set, in
    /// discovery order.
    fn cycles(&self, max_depth: usize) -> Vec<Vec<usize>> {
        let mut search = CycleSearch {
            graph: self,
            max_depth,
            visited: vec![false; self.positions.len()],
            path: Vec::new(),
            seen: HashSet::new(),
            found: Vec::new(),
        };
        for start in 0..self.positions.len() {
            if self.adjacency[start].len() < 2 {
                continue;
            }
            search.visited[start] = true;
            search.walk(start, start, None);
            search.visited[start] = false;
        }
        search.found
    }

    /// Order a cycle's edges into a vertex loop by following shared endpoints.
    fn walk_loop(&self, cycle: &[usize]) -> Vec<Point2D> {
        let Some(&first) = cycle.first() else {
            return Vec::new();
        };
        let (start, mut current) = self.edges[first];
        let mut remaining: Vec<usize> = cycle[1..].to_vec();
        let mut points = vec![self.positions[start]];

        while current != start {
            points.push(self.positions[current]);
            let Some(pos) = remaining.iter().position(|&e| {
                let (a, b) = self.edges[e];
                a == current || b == current
            }) else {
                break;
            };
            let (a, b) = self.edges[remaining.swap_remove(pos)];
            current = if a == current { b } else { a };
        }
        points
    }
}

struct CycleSearch<'g> {
    graph: &'g EdgeGraph,
    max_depth: usize,
    visited: Vec<bool>,
    path: Vec<usize>,
    seen: HashSet<Vec<usize>>,
    found: Vec<Vec<usize>>,
}

impl CycleSearch<'_> {
    fn walk(&mut self, start: usize, current: usize, arrived_by: Option<usize>) {
        let graph = self.graph;
        for &(edge, next) in &graph.adjacency[current] {
            if Some(edge) == arrived_by {
                continue;
            }
            if next == start {
                if !self.path.is_empty() {
                    self.record(edge);
                }
                continue;
            }
            if self.visited[next] || self.path.len() >= self.max_depth {
                continue;
            }
            self.visited[next] = true;
            self.path.push(edge);
            self.walk(start, next, Some(edge));
            self.path.pop();
            self.visited[next] = false;
        }
    }

    fn record(&mut self, closing_edge: usize) {
        let mut cycle = self.path.clone();
        cycle.push(closing_edge);
        let mut key = cycle.clone();
        key.sort_unstable();
        if self.seen.insert(key) {
            self.found.push(cycle);
        }
    }
}

impl ClosedLoopFinder for GreedyCycleFinder {
    fn find_profiles(&self, edges: &[Edge], config: &DetectorConfig) -> Vec<Profile> {
        let graph = EdgeGraph::build(edges, config.merge_tolerance);
        let mut cycles = graph.cycles(config.max_depth);
        cycles.sort_by_key(Vec::len);

        let mut claimed = vec![false; graph.edges.len()];
        let mut profiles = Vec::new();
        for cycle in cycles {
            if cycle.iter().any(|&e| claimed[e]) {
                continue;
            }
            for &e in &cycle {
                claimed[e] = true;
            }
            if let Some(profile) = loop_profile(graph.walk_loop(&cycle)) {
                profiles.push(profile);
            }
        }
        profiles
    }
}

/// Normalize a point loop to counter-clockwise and measure it.
fn loop_profile(mut points: Vec<Point2D>) -> Option<Profile> {
    if points.len() < 3 {
        return None;
    }
    let mut area = signed_area(&points);
    if area < 0.0 {
        points.reverse();
        area = -area;
    }
    if area < MIN_PROFILE_AREA {
        return None;
    }
    let bounding_box = BoundingBox::from_points(&points)?;
    Some(Profile {
        outer_loop: points,
        inner_loops: Vec::new(),
        area,
        bounding_box,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(id: u32, a: (f64, f64), b: (f64, f64)) -> SketchEntity {
        SketchEntity::Line {
            id,
            start: a.into(),
            end: b.into(),
            construction: false,
        }
    }

    #[test]
    fn merge_tolerance_closes_near_miss() {
        let entities = vec![
            line(1, (0.0, 0.0), (10.0, 0.0)),
            line(2, (10.3, 0.2), (10.0, 10.0)),
            line(3, (10.0, 10.0), (0.0, 0.0)),
        ];
        let profiles = detect_profiles(&entities, &DetectorConfig::default());
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].outer_loop.len(), 3);
    }

    #[test]
    fn clockwise_input_is_reversed() {
        let entities = vec![
            line(1, (0.0, 0.0), (0.0, 10.0)),
            line(2, (0.0, 10.0), (10.0, 10.0)),
            line(3, (10.0, 10.0), (10.0, 0.0)),
            line(4, (10.0, 0.0), (0.0, 0.0)),
        ];
        let profiles = detect_profiles(&entities, &DetectorConfig::default());
        assert_eq!(profiles.len(), 1);
        assert!(signed_area(&profiles[0].outer_loop) > 0.0);
        assert_relative_eq!(profiles[0].area, 100.0);
    }

    #[test]
    fn shortest_cycle_claims_shared_edge() {
        // Square split by a diagonal: both triangles share the diagonal, so
        // only the first accepted triangle survives.
        let entities = vec![
            line(1, (0.0, 0.0), (10.0, 0.0)),
            line(2, (10.0, 0.0), (10.0, 10.0)),
            line(3, (10.0, 10.0), (0.0, 10.0)),
            line(4, (0.0, 10.0), (0.0, 0.0)),
            line(5, (0.0, 0.0), (10.0, 10.0)),
        ];
        let profiles = detect_profiles(&entities, &DetectorConfig::default());
        assert_eq!(profiles.len(), 1);
        assert_relative_eq!(profiles[0].area, 50.0);
    }

    #[test]
    fn depth_cap_limits_cycle_length() {
        let entities = vec![
            line(1, (0.0, 0.0), (10.0, 0.0)),
            line(2, (10.0, 0.0), (10.0, 10.0)),
            line(3, (10.0, 10.0), (0.0, 10.0)),
            line(4, (0.0, 10.0), (0.0, 0.0)),
        ];
        let config = DetectorConfig {
            max_depth: 2,
            ..DetectorConfig::default()
        };
        assert!(detect_profiles(&entities, &config).is_empty());
    }

    #[test]
    fn arc_contributes_its_chord() {
        let entities = vec![
            line(1, (-5.0, 0.0), (0.0, -5.0)),
            line(2, (0.0, -5.0), (5.0, 0.0)),
            SketchEntity::Arc {
                id: 3,
                center: Point2D::ORIGIN,
                radius: 5.0,
                start_angle: 0.0,
                end_angle: PI,
                construction: false,
            },
        ];
        let profiles = detect_profiles(&entities, &DetectorConfig::default());
        assert_eq!(profiles.len(), 1);
        assert_relative_eq!(profiles[0].area, 25.0, epsilon = 1e-9);
    }
}
