//! Planar vector utilities for the epicycle chain.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Point (or vector) in the plane of the 2D decomposition view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector of length `radius` at angle `theta`.
    #[inline]
    pub fn from_polar(radius: f64, theta: f64) -> Self {
        Self {
            x: radius * theta.cos(),
            y: radius * theta.sin(),
        }
    }

    #[inline]
    pub fn mag(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance(&self, other: Point2) -> f64 {
        (*self - other).mag()
    }
}

impl Add for Point2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polar_round_trip() {
        let p = Point2::from_polar(5.0, 0.9);
        assert!((p.mag() - 5.0).abs() < 1e-12);
        let q = p + Point2::new(1.0, -2.0);
        assert!(((q - p).mag() - 5f64.sqrt()).abs() < 1e-12);
        assert!((q.distance(p) - 5f64.sqrt()).abs() < 1e-12);
    }
}
