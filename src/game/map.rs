//! World Geometry
//!
//! The rectangular play field and its four boundary edges.

use crate::core::rng::GameRng;
use crate::core::vec2::Vec2;

/// One side of the world rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// x = 0
    Left,
    /// x = width
    Right,
    /// y = 0
    Top,
    /// y = height
    Bottom,
}

impl Edge {
    /// All edges, in the order a spawn roll indexes them.
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];
}

/// World dimensions. The origin is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    /// Extent along x
    pub width: f64,
    /// Extent along y
    pub height: f64,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl WorldBounds {
    /// Create bounds.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Centre of the world, where new sessions start.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Point on `edge` at fraction `t` in [0, 1) along it.
    pub fn edge_point(&self, edge: Edge, t: f64) -> Vec2 {
        match edge {
            Edge::Left => Vec2::new(0.0, t * self.height),
            Edge::Right => Vec2::new(self.width, t * self.height),
            Edge::Top => Vec2::new(t * self.width, 0.0),
            Edge::Bottom => Vec2::new(t * self.width, self.height),
        }
    }

    /// Uniform edge, then a uniform point along it.
    pub fn random_edge_point(&self, rng: &mut GameRng) -> (Edge, Vec2) {
        let edge = Edge::ALL[rng.next_int(Edge::ALL.len() as u32) as usize];
        let t = rng.next_f64();
        (edge, self.edge_point(edge, t))
    }

    /// Whether `point` lies inside or on the rectangle.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    /// Whether `point` lies exactly on one of the four edges.
    pub fn on_boundary(&self, point: Vec2) -> bool {
        self.contains(point)
            && (point.x == 0.0
                || point.x == self.width
                || point.y == 0.0
                || point.y == self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_points() {
        let bounds = WorldBounds::default();
        assert_eq!(bounds.edge_point(Edge::Left, 0.5), Vec2::new(0.0, 300.0));
        assert_eq!(bounds.edge_point(Edge::Right, 0.5), Vec2::new(800.0, 300.0));
        assert_eq!(bounds.edge_point(Edge::Top, 0.25), Vec2::new(200.0, 0.0));
        assert_eq!(bounds.edge_point(Edge::Bottom, 0.25), Vec2::new(200.0, 600.0));
    }

    #[test]
    fn test_random_edge_point_on_boundary() {
        let bounds = WorldBounds::new(320.0, 240.0);
        let mut rng = GameRng::new(7777);
        let mut seen = [false; 4];

        for _ in 0..400 {
            let (edge, point) = bounds.random_edge_point(&mut rng);
            assert!(bounds.on_boundary(point), "{point} not on boundary");
            let idx = Edge::ALL.iter().position(|e| *e == edge).unwrap();
            seen[idx] = true;
        }

        // Every edge gets picked eventually
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_on_boundary() {
        let bounds = WorldBounds::default();
        assert!(bounds.on_boundary(Vec2::new(0.0, 10.0)));
        assert!(bounds.on_boundary(Vec2::new(800.0, 600.0)));
        assert!(!bounds.on_boundary(Vec2::new(400.0, 300.0)));
        assert!(!bounds.on_boundary(Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn test_center() {
        assert_eq!(WorldBounds::default().center(), Vec2::new(400.0, 300.0));
    }
}
