//! Joint angle at a vertex landmark.
//!
//! The angle is measured in the image plane only. It ignores depth and so
//! depends on the camera viewpoint.

use crate::error::FrameSkip;
use crate::landmark::Point2;

/// Rays shorter than this are treated as collapsed.
const MIN_RAY_LENGTH: f64 = 1e-12;

/// Undirected angle in degrees at vertex `b` between rays `b->a` and `b->c`.
///
/// Always in `[0, 180]`. Returns `NaN` when either ray has zero length.
pub fn joint_angle(a: Point2, b: Point2, c: Point2) -> f64 {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);
    if bax.hypot(bay) < MIN_RAY_LENGTH || bcx.hypot(bcy) < MIN_RAY_LENGTH {
        return f64::NAN;
    }

    let radians = bcy.atan2(bcx) - bay.atan2(bax);
    let degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        360.0 - degrees
    } else {
        degrees
    }
}

/// Like [`joint_angle`], but maps an undefined result to
/// [`FrameSkip::DegenerateGeometry`].
pub fn try_joint_angle(a: Point2, b: Point2, c: Point2) -> Result<f64, FrameSkip> {
    let angle = joint_angle(a, b, c);
    if angle.is_finite() {
        Ok(angle)
    } else {
        Err(FrameSkip::DegenerateGeometry)
    }
}
