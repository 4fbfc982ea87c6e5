use crate::boundingbox::AABB;
use crate::cone::OrientationCone;
use crate::light::{Emitter, Light};

/// Environment light surrounding the scene. It has no finite bounds and never enters the light tree.
#[derive(Copy, Clone, Debug)]
pub struct InfiniteLight
{
    power: f32,
}

impl InfiniteLight
{
    pub fn new(power: f32) -> Light { Self { power }.into() }
}

impl Emitter for InfiniteLight
{
    fn bounds(&self) -> AABB { AABB::identity() }

    fn cone(&self) -> OrientationCone { OrientationCone::full_sphere() }

    fn power(&self) -> f32 { self.power }

    fn is_infinite(&self) -> bool { true }
}
