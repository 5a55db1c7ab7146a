use crate::types::{GazeVector, HeadBox, Point};

/// Ray length in pixels. Long enough to leave any realistic frame.
pub const DEFAULT_GAZE_LENGTH: f64 = 10_000.0;

// =========================================================================
// Gaze Ray
// Head center plus the projected gaze direction, as a finite segment.
// =========================================================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeRay {
    pub origin: Point,
    pub end: Point,
}

impl GazeRay {
    /// The gaze producer's y axis points up and its x axis points away from
    /// the image x axis, so the direction is subtracted from the head center.
    pub fn from_head(head: &HeadBox, gaze: &GazeVector, length: f64) -> Self {
        let origin = head.center();
        let end = Point {
            x: (origin.x as f64 - length * gaze.x) as i64,
            y: (origin.y as f64 - length * gaze.y) as i64,
        };
        Self { origin, end }
    }

    pub fn hits(&self, target: &HeadBox) -> bool {
        intersects(self.origin, self.end, target)
    }
}

// =========================================================================
// Segment / Rectangle Clipping (Liang-Barsky)
// =========================================================================

/// Clip the segment `a -> b` to the closed rectangle of `bbox`.
///
/// Returns the clipped endpoints, or `None` when the segment misses the
/// rectangle entirely. Touching the border counts as a hit.
pub fn clip_segment(a: Point, b: Point, bbox: &HeadBox) -> Option<((f64, f64), (f64, f64))> {
    let (x0, y0) = (a.x as f64, a.y as f64);
    let dx = b.x as f64 - x0;
    let dy = b.y as f64 - y0;

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let edges = [
        (-dx, x0 - bbox.xmin),
        (dx, bbox.xmax - x0),
        (-dy, y0 - bbox.ymin),
        (dy, bbox.ymax - y0),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            // parallel to this edge
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }

    Some(((x0 + t0 * dx, y0 + t0 * dy), (x0 + t1 * dx, y0 + t1 * dy)))
}

/// Whether the segment `a -> b` touches the head box.
pub fn intersects(a: Point, b: Point, bbox: &HeadBox) -> bool {
    clip_segment(a, b, bbox).is_some()
}
