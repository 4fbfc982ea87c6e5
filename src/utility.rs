pub const EPSILON: f32 = 5e-04;
pub const INFINITY: f32 = f32::INFINITY;

/// Largest `f32` strictly below one, upper bound for rescaled sample values
pub const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON / 2.0;

/// `acos` with the argument clamped to its domain, dot products of unit vectors drift slightly past `[-1, 1]`
pub fn safe_acos(x: f32) -> f32 { x.clamp(-1.0, 1.0).acos() }

/// Angle between two unit vectors
pub fn angle_between(a: glam::Vec3A, b: glam::Vec3A) -> f32 { safe_acos(glam::Vec3A::dot(a, b)) }

/// Clamps a rescaled sample back into `[0, 1)`
pub fn clamp_sample(u: f32) -> f32 { u.clamp(0.0, ONE_MINUS_EPSILON) }

#[cfg(test)]
mod tests
{
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn acos_is_clamped()
    {
        assert_eq!(safe_acos(1.000_001), 0.0);
        assert_relative_eq!(safe_acos(-1.000_001), std::f32::consts::PI);
        assert!(!safe_acos(2.0).is_nan());
    }

    #[test]
    fn sample_stays_below_one()
    {
        assert!(clamp_sample(1.0) < 1.0);
        assert_eq!(clamp_sample(-0.0), 0.0);
        assert_eq!(clamp_sample(0.25), 0.25);
    }
}
