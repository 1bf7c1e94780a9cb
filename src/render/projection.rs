//! Spherical Mercator fitted to a screen rectangle.

use geo::{Centroid, LineString, MultiPolygon, Polygon};
use std::f64::consts::FRAC_PI_4;

/// Latitude limit of Web Mercator; beyond it the projection diverges.
const MAX_LATITUDE: f64 = 85.051_128_78;

fn raw(lon: f64, lat: f64) -> [f64; 2] {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon.to_radians();
    let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    // Screen y grows downwards.
    [x, -y]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    scale: f64,
    origin: [f64; 2],
    offset: [f64; 2],
}

impl Mercator {
    /// Scales and centres `positions` (`[lon, lat]`) inside
    /// `[[x0, y0], [x1, y1]]`, preserving aspect ratio. `None` for no input.
    pub fn fit_extent(
        extent: [[f64; 2]; 2],
        positions: impl IntoIterator<Item = [f64; 2]>,
    ) -> Option<Self> {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for [lon, lat] in positions {
            let p = raw(lon, lat);
            for axis in 0..2 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        if !min[0].is_finite() || !max[0].is_finite() {
            return None;
        }

        let [[x0, y0], [x1, y1]] = extent;
        let (w, h) = (x1 - x0, y1 - y0);
        let (dx, dy) = (max[0] - min[0], max[1] - min[1]);
        let scale = match (dx > 0.0, dy > 0.0) {
            (true, true) => (w / dx).min(h / dy),
            (true, false) => w / dx,
            (false, true) => h / dy,
            (false, false) => 1.0,
        };

        Some(Self {
            scale,
            origin: min,
            offset: [x0 + (w - scale * dx) / 2.0, y0 + (h - scale * dy) / 2.0],
        })
    }

    pub fn project(&self, [lon, lat]: [f64; 2]) -> [f64; 2] {
        let p = raw(lon, lat);
        [
            self.offset[0] + self.scale * (p[0] - self.origin[0]),
            self.offset[1] + self.scale * (p[1] - self.origin[1]),
        ]
    }
}

/// Area-weighted centroid of the exterior rings of projected polygons.
/// Zero-area shapes fall back to the centroid of their outlines.
pub fn centroid(rings: &[Vec<[f64; 2]>]) -> Option<[f64; 2]> {
    let shape: MultiPolygon<f64> = rings
        .iter()
        .map(|ring| Polygon::new(LineString::from(ring.clone()), Vec::new()))
        .collect();
    shape.centroid().map(|p| [p.x(), p.y()])
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENT: [[f64; 2]; 2] = [[70.0, 10.0], [520.0, 758.0]];

    fn calgary() -> Vec<[f64; 2]> {
        vec![[-114.3, 50.85], [-113.86, 50.85], [-113.86, 51.21], [-114.3, 51.21]]
    }

    #[test]
    fn test_fit_extent_stays_inside() {
        let m = Mercator::fit_extent(EXTENT, calgary()).unwrap();
        for p in calgary() {
            let [x, y] = m.project(p);
            assert!((EXTENT[0][0] - 1e-6..=EXTENT[1][0] + 1e-6).contains(&x), "x {x}");
            assert!((EXTENT[0][1] - 1e-6..=EXTENT[1][1] + 1e-6).contains(&y), "y {y}");
        }
    }

    #[test]
    fn test_north_is_up() {
        let m = Mercator::fit_extent(EXTENT, calgary()).unwrap();
        let south = m.project([-114.0, 50.9]);
        let north = m.project([-114.0, 51.1]);
        assert!(north[1] < south[1]);
    }

    #[test]
    fn test_fit_extent_empty() {
        assert!(Mercator::fit_extent(EXTENT, Vec::new()).is_none());
    }

    #[test]
    fn test_centroid_of_square() {
        let square = vec![vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]];
        let c = centroid(&square).unwrap();
        assert!((c[0] - 1.0).abs() < 1e-9 && (c[1] - 1.0).abs() < 1e-9);

        // Orientation does not matter.
        let reversed: Vec<Vec<[f64; 2]>> =
            square.iter().map(|r| r.iter().rev().copied().collect()).collect();
        let c = centroid(&reversed).unwrap();
        assert!((c[0] - 1.0).abs() < 1e-9 && (c[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_weights_by_area() {
        let big = vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]];
        let small = vec![[10.0, 0.0], [11.0, 0.0], [11.0, 1.0], [10.0, 1.0], [10.0, 0.0]];
        let c = centroid(&[big, small]).unwrap();
        // (4 * 1 + 1 * 10.5) / 5
        assert!((c[0] - 2.9).abs() < 1e-9, "x {}", c[0]);
        assert!((c[1] - 0.9).abs() < 1e-9, "y {}", c[1]);
    }

    #[test]
    fn test_centroid_degenerate_uses_outline() {
        let line = vec![vec![[0.0, 0.0], [4.0, 0.0], [0.0, 0.0]]];
        let c = centroid(&line).unwrap();
        assert!((c[0] - 2.0).abs() < 1e-9 && c[1].abs() < 1e-9);
        assert!(centroid(&[]).is_none());
    }
}
