//! Keyframe search and interpolation helpers

/// The keyframe pair surrounding a sample time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    /// Last keyframe at or before the sample time
    pub lower: usize,
    /// Keyframe after `lower`, or `lower` itself when clamped
    pub upper: usize,
    /// Normalized position between `lower` and `upper`, in `[0, 1)`
    pub alpha: f32,
}

/// Locate the interpolation interval for `time`
///
/// Clamps to the first and last keyframes. Runs of equal timestamps resolve
/// to the last of the run, so zero-length intervals are never interpolated.
pub fn find_bracket(times: &[f32], time: f32) -> Option<Bracket> {
    let first = *times.first()?;
    let last_index = times.len() - 1;

    if time.is_nan() || time <= first {
        let lower = if time == first {
            times.partition_point(|&t| t <= first) - 1
        } else {
            0
        };
        return Some(Bracket {
            lower,
            upper: lower,
            alpha: 0.0,
        });
    }
    if time >= times[last_index] {
        return Some(Bracket {
            lower: last_index,
            upper: last_index,
            alpha: 0.0,
        });
    }

    // times[upper] > time >= times[lower], so the interval is never empty
    let upper = times.partition_point(|&t| t <= time);
    let lower = upper - 1;
    let span = times[upper] - times[lower];
    let alpha = ((time - times[lower]) / span).clamp(0.0, 1.0);

    Some(Bracket {
        lower,
        upper,
        alpha,
    })
}

/// Cubic Hermite spline with tangents already scaled by the interval length
pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * t3 - 3.0 * t2 + 1.0) * p0
        + (t3 - 2.0 * t2 + t) * m0
        + (-2.0 * t3 + 3.0 * t2) * p1
        + (t3 - t2) * m1
}
