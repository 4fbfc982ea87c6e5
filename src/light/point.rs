use crate::boundingbox::AABB;
use crate::cone::OrientationCone;
use crate::light::{Emitter, Light};

/// Isotropic point light
#[derive(Copy, Clone, Debug)]
pub struct PointLight
{
    position: glam::Vec3A,
    intensity: f32,
}

impl PointLight
{
    pub fn new(position: glam::Vec3A, intensity: f32) -> Light { Self { position, intensity }.into() }

    /// Point light emitting `power` in total
    pub fn from_power(position: glam::Vec3A, power: f32) -> Light { Self::new(position, power / (4.0 * std::f32::consts::PI)) }

    pub fn position(&self) -> glam::Vec3A { self.position }
}

impl Emitter for PointLight
{
    fn bounds(&self) -> AABB { AABB::from_point(self.position) }

    fn cone(&self) -> OrientationCone { OrientationCone::full_sphere() }

    fn power(&self) -> f32 { 4.0 * std::f32::consts::PI * self.intensity }
}
