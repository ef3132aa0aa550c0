// Copyright @yucwang 2026

use super::constants::{Float, Vector3f};

const MIN_SMOOTH_TIME: Float = 1e-4;

/// Critically damped spring toward `target`.
///
/// `velocity` carries the spring state between calls. The step uses the usual
/// polynomial approximation of `exp(-omega * dt)`, and never overshoots the target:
/// when an update would cross it, the output lands exactly on the target.
pub fn smooth_damp(current: Vector3f,
                   target: Vector3f,
                   velocity: &mut Vector3f,
                   smooth_time: Float,
                   dt: Float) -> Vector3f {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current).dot(&(output - target)) > 0.0 {
        output = target;
        *velocity = Vector3f::zeros();
    }

    output
}
