use id_arena::{Arena, Id};

use crate::light::Light;

pub mod light_sampler;

/// Owns every light of the scene. Light samplers only keep `Id<Light>` handles into it.
#[derive(Default)]
pub struct Scene
{
    lights: Arena<Light>,
}

impl Scene
{
    pub fn new(lights: Vec<Light>) -> Self
    {
        let mut scene: Scene = Self::default();
        for light in lights
        {
            scene.add_light(light);
        }
        scene
    }

    pub fn add_light<L>(&mut self, light: L) -> Id<Light>
    where
        L: Into<Light>,
    {
        self.lights.alloc(light.into())
    }

    pub fn light(&self, id: Id<Light>) -> &Light { &self.lights[id] }

    pub fn lights(&self) -> impl Iterator<Item = (Id<Light>, &Light)> { self.lights.iter() }

    pub fn light_count(&self) -> usize { self.lights.len() }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::light::{Emitter, InfiniteLight, PointLight};

    #[test]
    fn hands_out_arena_ids()
    {
        let mut scene: Scene = Scene::new(vec![PointLight::from_power(glam::Vec3A::ZERO, 1.0)]);
        let env: Id<Light> = scene.add_light(InfiniteLight::new(2.0));

        assert_eq!(scene.light_count(), 2);
        assert!(scene.light(env).is_infinite());
        assert_eq!(scene.lights().map(|(id, _)| id).last(), Some(env));
    }
}
