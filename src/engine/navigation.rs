// Walkable-area queries and pathfinding
//
// The character layer treats pathfinding as a black box behind `Pathfinder`.
// `WalkableArea` is the simple implementation used by the demo and tests: a
// single convex walkable polygon, straight-line routes, and rectangular
// obstacles keyed by character id that block a route while enabled.

use std::collections::HashMap;

use glam::Vec2;
use parry2d::math::{Isometry, Point, Vector};
use parry2d::query::{PointQuery, Ray, RayCast};
use parry2d::shape::{ConvexPolygon, Cuboid};

/// Points this close to the area count as reachable (clamped targets land on the edge)
const EDGE_TOLERANCE: f32 = 1e-3;

/// Identifier used to key obstacles (the owning character's id)
pub type ObstacleId = u32;

/// Navigation queries consumed by characters
pub trait Pathfinder {
    /// Whether a walkable area has been set up at all
    fn is_valid(&self) -> bool;
    /// Ordered waypoints from `from` to `to` (inclusive), or `None` if unreachable
    fn find_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>>;
    fn is_point_in_area(&self, point: Vec2) -> bool;
    fn closest_point_to_area(&self, point: Vec2) -> Vec2;
    /// Add an obstacle, or move it if the id is already registered
    fn add_obstacle(&mut self, id: ObstacleId, center: Vec2, size: Vec2);
    fn remove_obstacle(&mut self, id: ObstacleId);
    fn enable_obstacle(&mut self, id: ObstacleId);
    fn disable_obstacle(&mut self, id: ObstacleId);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Obstacle {
    center: Vec2,
    half_extents: Vec2,
    enabled: bool,
}

/// Convex walkable polygon with rectangular obstacles
#[derive(Debug, Default)]
pub struct WalkableArea {
    polygon: Option<ConvexPolygon>,
    obstacles: HashMap<ObstacleId, Obstacle>,
}

fn to_point(v: Vec2) -> Point<f32> {
    Point::new(v.x, v.y)
}

impl WalkableArea {
    /// Area with no walkable polygon; `is_valid` reports false
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the corners of a convex polygon (hull is computed, order doesn't matter)
    pub fn from_points(points: &[Vec2]) -> Self {
        let points: Vec<Point<f32>> = points.iter().copied().map(to_point).collect();
        let polygon = ConvexPolygon::from_convex_hull(&points);
        if polygon.is_none() {
            log::warn!("Walkable area is degenerate ({} points)", points.len());
        }
        Self {
            polygon,
            obstacles: HashMap::new(),
        }
    }

    /// Axis-aligned rectangular area
    pub fn rectangle(min: Vec2, max: Vec2) -> Self {
        Self::from_points(&[
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    /// Whether an obstacle is registered and enabled
    pub fn is_obstacle_enabled(&self, id: ObstacleId) -> bool {
        self.obstacles.get(&id).is_some_and(|o| o.enabled)
    }

    pub fn has_obstacle(&self, id: ObstacleId) -> bool {
        self.obstacles.contains_key(&id)
    }

    /// Inside the area or on its edge
    fn reaches(&self, point: Vec2) -> bool {
        match &self.polygon {
            Some(polygon) => {
                polygon.distance_to_point(&Isometry::identity(), &to_point(point), true) <= EDGE_TOLERANCE
            }
            None => false,
        }
    }

    fn segment_blocked(&self, from: Vec2, to: Vec2) -> bool {
        let delta = to - from;
        let length = delta.length();
        if length <= f32::EPSILON {
            return false;
        }
        let dir = delta / length;
        let ray = Ray::new(to_point(from), Vector::new(dir.x, dir.y));

        self.obstacles.values().filter(|o| o.enabled).any(|o| {
            let cuboid = Cuboid::new(Vector::new(o.half_extents.x, o.half_extents.y));
            let pose = Isometry::translation(o.center.x, o.center.y);
            cuboid.intersects_ray(&pose, &ray, length)
        })
    }
}

impl Pathfinder for WalkableArea {
    fn is_valid(&self) -> bool {
        self.polygon.is_some()
    }

    fn find_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        if !self.reaches(to) || self.segment_blocked(from, to) {
            return None;
        }
        Some(vec![from, to])
    }

    fn is_point_in_area(&self, point: Vec2) -> bool {
        match &self.polygon {
            Some(polygon) => polygon.contains_point(&Isometry::identity(), &to_point(point)),
            None => false,
        }
    }

    fn closest_point_to_area(&self, point: Vec2) -> Vec2 {
        match &self.polygon {
            Some(polygon) => {
                let projection = polygon.project_point(&Isometry::identity(), &to_point(point), true);
                Vec2::new(projection.point.x, projection.point.y)
            }
            None => point,
        }
    }

    fn add_obstacle(&mut self, id: ObstacleId, center: Vec2, size: Vec2) {
        let enabled = self.obstacles.get(&id).map_or(true, |o| o.enabled);
        self.obstacles.insert(
            id,
            Obstacle {
                center,
                half_extents: size * 0.5,
                enabled,
            },
        );
    }

    fn remove_obstacle(&mut self, id: ObstacleId) {
        self.obstacles.remove(&id);
    }

    fn enable_obstacle(&mut self, id: ObstacleId) {
        if let Some(obstacle) = self.obstacles.get_mut(&id) {
            obstacle.enabled = true;
        }
    }

    fn disable_obstacle(&mut self, id: ObstacleId) {
        if let Some(obstacle) = self.obstacles.get_mut(&id) {
            obstacle.enabled = false;
        }
    }
}
