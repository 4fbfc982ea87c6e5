use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::utility::angle_between;

/// Directional bound over a set of emitters.
///
/// * `axis` - unit vector at the center of the cone
/// * `theta_o` - half-angle bounding every member normal, in `[0, π]`
/// * `theta_e` - half-angle bounding emission around each normal, in `[0, π/2]`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrientationCone
{
    pub axis: glam::Vec3A,
    pub theta_o: f32,
    pub theta_e: f32,
}

impl OrientationCone
{
    pub fn new(axis: glam::Vec3A, theta_o: f32, theta_e: f32) -> Self
    {
        Self {
            axis: axis.normalize_or_zero(),
            theta_o: theta_o.clamp(0.0, PI),
            theta_e: theta_e.clamp(0.0, FRAC_PI_2),
        }
    }

    /// A cone of normals around one direction, emitting over the full hemisphere
    pub fn from_direction(axis: glam::Vec3A) -> Self { Self::new(axis, 0.0, FRAC_PI_2) }

    /// Cone around every direction, used by emitters without a preferred orientation
    pub fn full_sphere() -> Self { Self::new(glam::Vec3A::Z, PI, FRAC_PI_2) }

    /// Smallest cone found by the standard bounding-cone construction that contains both `self` and `other`
    pub fn union(self, other: OrientationCone) -> Self
    {
        let (a, b): (OrientationCone, OrientationCone) = if other.theta_o > self.theta_o { (other, self) } else { (self, other) };

        let theta_d: f32 = angle_between(a.axis, b.axis);
        let theta_e: f32 = a.theta_e.max(b.theta_e);

        if (theta_d + b.theta_o).min(PI) <= a.theta_o
        {
            return Self { theta_e, ..a };
        }

        let theta_o: f32 = 0.5 * (a.theta_o + theta_d + b.theta_o);
        if theta_o >= PI
        {
            return Self {
                axis: a.axis,
                theta_o: PI,
                theta_e,
            };
        }

        // Rotate a's axis towards b's, about the axis orthogonal to both
        let theta_r: f32 = theta_o - a.theta_o;
        let mut rotation_axis: glam::Vec3A = glam::Vec3A::cross(a.axis, b.axis);
        if rotation_axis.length_squared() < 1e-12
        {
            // Opposing axes, any orthogonal axis works
            rotation_axis = a.axis.any_orthonormal_pair().0;
        }

        let rotation: glam::Mat3A = glam::Mat3A::from_axis_angle(glam::Vec3::from(rotation_axis.normalize()), theta_r);
        let axis: glam::Vec3A = (rotation * a.axis).normalize();

        Self { axis, theta_o, theta_e }
    }

    /// Orientation part of the SAOH measure, the solid angle the cone can emit into
    pub fn m_omega(&self) -> f32
    {
        let theta_w2: f32 = 2.0 * (self.theta_o + self.theta_e).min(PI);
        let (sin_theta_o, cos_theta_o): (f32, f32) = self.theta_o.sin_cos();

        TAU * (1.0 - cos_theta_o)
            + FRAC_PI_2 * (theta_w2 * sin_theta_o - (self.theta_o - theta_w2).cos() - 2.0 * self.theta_o * sin_theta_o + cos_theta_o)
    }

    /// Whether `other`'s normals all lie inside this cone
    pub fn contains(&self, other: &OrientationCone, tolerance: f32) -> bool
    {
        self.theta_o >= PI - tolerance || angle_between(self.axis, other.axis) + other.theta_o <= self.theta_o + tolerance
    }
}

#[cfg(test)]
mod tests
{
    use approx::assert_relative_eq;
    use nanorand::{Rng, WyRand};

    use super::*;

    fn random_direction(rng: &mut WyRand) -> glam::Vec3A
    {
        let z: f32 = 1.0 - 2.0 * rng.generate::<f32>();
        let r: f32 = (1.0 - z * z).max(0.0).sqrt();
        let phi: f32 = TAU * rng.generate::<f32>();

        glam::Vec3A::new(r * phi.cos(), r * phi.sin(), z)
    }

    #[test]
    fn union_of_nested_cones_keeps_the_wider_one()
    {
        let wide: OrientationCone = OrientationCone::new(glam::Vec3A::Z, 1.0, 0.2);
        let narrow: OrientationCone = OrientationCone::new(glam::Vec3A::new(0.1, 0.0, 1.0), 0.1, 0.7);

        let u: OrientationCone = narrow.union(wide);

        assert_eq!(u.axis, wide.axis);
        assert_eq!(u.theta_o, wide.theta_o);
        assert_eq!(u.theta_e, 0.7);
    }

    #[test]
    fn union_of_two_directions_is_the_bisector()
    {
        let u: OrientationCone = OrientationCone::from_direction(glam::Vec3A::X).union(OrientationCone::from_direction(glam::Vec3A::Y));

        assert_relative_eq!(u.theta_o, std::f32::consts::FRAC_PI_4, epsilon = 1e-5);
        assert_relative_eq!(u.axis.x, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-5);
        assert_relative_eq!(u.axis.y, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-5);
        assert_relative_eq!(u.axis.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn opposing_directions_give_a_hemisphere()
    {
        let u: OrientationCone = OrientationCone::from_direction(glam::Vec3A::Z).union(OrientationCone::from_direction(-glam::Vec3A::Z));

        assert_relative_eq!(u.theta_o, FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(u.axis.z, 0.0, epsilon = 1e-5);
        assert!(u.axis.is_normalized());
    }

    #[test]
    fn union_saturates_at_full_sphere()
    {
        let a: OrientationCone = OrientationCone::new(glam::Vec3A::Z, 2.5, 0.0);
        let b: OrientationCone = OrientationCone::new(-glam::Vec3A::Z, 2.0, 0.0);
        let u: OrientationCone = a.union(b);

        assert_eq!(u.theta_o, PI);
        assert_eq!(u.axis, glam::Vec3A::Z);
    }

    #[test]
    fn union_contains_both_inputs()
    {
        let mut rng: WyRand = WyRand::new_seed(7);

        for _ in 0..1000
        {
            let a: OrientationCone = OrientationCone::new(random_direction(&mut rng), PI * rng.generate::<f32>(), FRAC_PI_2 * rng.generate::<f32>());
            let b: OrientationCone = OrientationCone::new(random_direction(&mut rng), 0.5 * rng.generate::<f32>(), FRAC_PI_2 * rng.generate::<f32>());
            let u: OrientationCone = a.union(b);

            assert!(u.contains(&a, 1e-3), "{:?} does not contain {:?}", u, a);
            assert!(u.contains(&b, 1e-3), "{:?} does not contain {:?}", u, b);
            assert!(u.theta_e >= a.theta_e && u.theta_e >= b.theta_e);
        }
    }

    #[test]
    fn orientation_measure()
    {
        // A single direction emitting over its hemisphere
        assert_relative_eq!(OrientationCone::from_direction(glam::Vec3A::Z).m_omega(), PI, epsilon = 1e-5);
        // Everything
        assert_relative_eq!(OrientationCone::full_sphere().m_omega(), 4.0 * PI, epsilon = 1e-4);

        let narrow: f32 = OrientationCone::new(glam::Vec3A::Z, 0.2, 0.3).m_omega();
        let wide: f32 = OrientationCone::new(glam::Vec3A::Z, 1.2, 0.3).m_omega();
        assert!(narrow > 0.0 && narrow < wide);
    }
}
