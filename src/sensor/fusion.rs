//! Heading fusion from raw device orientation.
//!
//! Native compass headings win. A device lying flat reads its heading
//! straight off alpha. A tilted device goes through the rotation-matrix yaw,
//! which is singular as `Vy` approaches zero; that edge is kept as-is.

use crate::model::Orientation;

use super::platform::OrientationSample;

/// Beta and gamma below this magnitude count as lying flat.
pub const FLAT_THRESHOLD_DEG: f64 = 10.0;

/// Compass heading in degrees for one sample.
#[must_use]
pub fn fuse_heading(sample: &OrientationSample) -> f64 {
    if let Some(heading) = sample.heading {
        return heading;
    }
    if sample.beta.abs() < FLAT_THRESHOLD_DEG && sample.gamma.abs() < FLAT_THRESHOLD_DEG {
        return (360.0 - sample.alpha).rem_euclid(360.0);
    }
    tilted_heading(sample.alpha, sample.beta, sample.gamma)
}

/// Yaw of the device's rotation matrix, in degrees.
#[must_use]
pub fn tilted_heading(alpha: f64, beta: f64, gamma: f64) -> f64 {
    let z = alpha.to_radians();
    let x = beta.to_radians();
    let y = gamma.to_radians();

    let vx = -z.cos() * y.sin() - z.sin() * x.sin() * y.cos();
    let vy = -z.sin() * y.sin() + z.cos() * x.sin() * y.cos();

    let mut heading = (vx / vy).atan();
    if vy < 0.0 {
        heading += std::f64::consts::PI;
    } else if vx < 0.0 {
        heading += 2.0 * std::f64::consts::PI;
    }
    heading.to_degrees()
}

/// Full orientation state for one sample.
#[must_use]
pub fn fuse(sample: &OrientationSample) -> Orientation {
    Orientation {
        alpha: sample.alpha,
        beta: sample.beta,
        gamma: sample.gamma,
        heading: fuse_heading(sample),
        absolute: sample.absolute,
    }
}

#[cfg(test)]
#[path = "fusion_test.rs"]
mod tests;
