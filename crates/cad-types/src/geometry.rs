use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point (or free vector) in sketch-local 2D coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point on a circle of `radius` around `center` at `angle` radians.
    pub fn from_polar(center: Point2D, radius: f64, angle: f64) -> Self {
        Self {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (*other - *self).length()
    }

    pub fn midpoint(&self, other: &Point2D) -> Point2D {
        self.lerp(other, 0.5)
    }

    /// Linear interpolation: `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(&self, other: &Point2D, t: f64) -> Point2D {
        Point2D {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(&self, other: &Point2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(&self) -> Option<Point2D> {
        let len = self.length();
        if len < 1e-12 {
            None
        } else {
            Some(Point2D::new(self.x / len, self.y / len))
        }
    }

    /// Counter-clockwise perpendicular `(-y, x)`.
    pub fn perp(&self) -> Point2D {
        Point2D::new(-self.y, self.x)
    }
}

impl Add for Point2D {
    type Output = Point2D;
    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;
    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;
    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2D {
    type Output = Point2D;
    fn neg(self) -> Point2D {
        Point2D::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Point2D::new(x, y)
    }
}

/// Axis-aligned 2D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2D,
    pub max: Point2D,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` if the iterator is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = BoundingBox {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2D {
        self.min.midpoint(&self.max)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Signed polygon area via the shoelace formula. Positive = CCW.
pub fn signed_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    area / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn signed_area_ccw_square_is_positive() {
        let square = [
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(0.0, 2.0),
        ];
        assert_relative_eq!(signed_area(&square), 4.0);

        let mut reversed = square;
        reversed.reverse();
        assert_relative_eq!(signed_area(&reversed), -4.0);
    }

    #[test]
    fn bounding_box_from_points() {
        let pts = [
            Point2D::new(3.0, -1.0),
            Point2D::new(-2.0, 4.0),
            Point2D::new(0.5, 0.5),
        ];
        let bbox = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(bbox.min, Point2D::new(-2.0, -1.0));
        assert_eq!(bbox.max, Point2D::new(3.0, 4.0));
        assert!(bbox.contains(&Point2D::new(0.0, 0.0)));
        let empty: [Point2D; 0] = [];
        assert!(BoundingBox::from_points(&empty).is_none());
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert!(Point2D::ORIGIN.normalized().is_none());
        let n = Point2D::new(3.0, 4.0).normalized().unwrap();
        assert_relative_eq!(n.length(), 1.0);
    }
}
