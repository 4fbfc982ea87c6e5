use crate::boundingbox::AABB;
use crate::cone::OrientationCone;
use crate::light::{Emitter, Light};
use crate::utility::safe_acos;

/// Point light restricted to a cone, with a smooth falloff between `cos_falloff_start` and `cos_total_width`
#[derive(Copy, Clone, Debug)]
pub struct SpotLight
{
    position: glam::Vec3A,
    direction: glam::Vec3A,
    intensity: f32,
    cos_falloff_start: f32,
    cos_total_width: f32,
}

impl SpotLight
{
    /// Angles are in degrees
    pub fn new(position: glam::Vec3A, direction: glam::Vec3A, intensity: f32, total_width: f32, falloff_start: f32) -> Light
    {
        let cos_total_width: f32 = total_width.to_radians().cos();
        let cos_falloff_start: f32 = falloff_start.min(total_width).to_radians().cos();

        Self {
            position,
            direction: direction.normalize(),
            intensity,
            cos_falloff_start,
            cos_total_width,
        }
        .into()
    }
}

impl Emitter for SpotLight
{
    fn bounds(&self) -> AABB { AABB::from_point(self.position) }

    fn cone(&self) -> OrientationCone { OrientationCone::new(self.direction, 0.0, safe_acos(self.cos_total_width)) }

    fn power(&self) -> f32 { self.intensity * std::f32::consts::TAU * (1.0 - 0.5 * (self.cos_falloff_start + self.cos_total_width)) }
}

#[cfg(test)]
mod tests
{
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cone_follows_direction()
    {
        let spot: Light = SpotLight::new(glam::Vec3A::ONE, glam::Vec3A::new(0.0, -2.0, 0.0), 1.0, 30.0, 20.0);
        let cone: OrientationCone = spot.cone();

        assert_eq!(cone.axis, glam::Vec3A::NEG_Y);
        assert_eq!(cone.theta_o, 0.0);
        assert_relative_eq!(cone.theta_e, 30.0f32.to_radians(), epsilon = 1e-5);
        assert_eq!(spot.centroid(), glam::Vec3A::ONE);
    }

    #[test]
    fn hemisphere_spot_has_half_a_point_lights_power()
    {
        let spot: Light = SpotLight::new(glam::Vec3A::ZERO, glam::Vec3A::Z, 1.0, 90.0, 90.0);

        assert_relative_eq!(spot.power(), std::f32::consts::TAU, epsilon = 1e-4);
        assert_relative_eq!(spot.cone().theta_e, std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
    }
}
