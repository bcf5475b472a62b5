//! Cubic-bezier easing for crossfade timing.
//!
//! A curve is defined by two control points (x1, y1) and (x2, y2) with the
//! endpoints pinned at (0,0) and (1,1). Evaluation inverts the x polynomial
//! by bisection, then evaluates y at the found parameter.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendCurve {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

impl BlendCurve {
    pub fn linear() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        }
    }

    /// Slow start, slow end. The default asset curve.
    pub fn ease_in_out() -> Self {
        Self {
            x1: 0.42,
            y1: 0.0,
            x2: 0.58,
            y2: 1.0,
        }
    }

    /// Evaluate the curve at normalized time t (clamped to [0,1]).
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        // Fast path: Bezier(0,0,1,1) is exactly linear.
        if self.x1 == 0.0 && self.y1 == 0.0 && self.x2 == 1.0 && self.y2 == 1.0 {
            return t;
        }
        // Monotonic x in [0,1] assumed for x1/x2 in [0,1].
        let mut lo = 0.0f32;
        let mut hi = 1.0f32;
        let mut mid = t;
        for _ in 0..24 {
            let x = cubic_bezier(0.0, self.x1, self.x2, 1.0, mid);
            if (x - t).abs() < 1e-6 {
                break;
            }
            if x < t {
                lo = mid;
            } else {
                hi = mid;
            }
            mid = 0.5 * (lo + hi);
        }
        cubic_bezier(0.0, self.y1, self.y2, 1.0, mid)
    }
}

impl Default for BlendCurve {
    fn default() -> Self {
        Self::ease_in_out()
    }
}
