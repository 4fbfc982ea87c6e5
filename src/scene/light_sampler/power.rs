use std::collections::HashMap;

use crate::light::{Emitter, Light};
use crate::sampling::Distribution1D;
use crate::scene::light_sampler::{
    validate_lights, LightHandle, LightSampleContext, LightSampler, SampledLight, DEFAULT_INFINITE_POWER_SCALE,
};
use crate::scene::Scene;

/// Picks lights proportionally to their power, ignoring the shading point.
/// Mesh lights are split into their triangles, the infinite light enters with its damped power.
#[derive(Debug)]
pub struct PowerLightSampler
{
    infinite_power_scale: f32,
    lights: Vec<LightHandle>,
    indices: HashMap<LightHandle, usize>,
    distribution: Option<Distribution1D>,
}

impl Default for PowerLightSampler
{
    fn default() -> Self { Self::new(DEFAULT_INFINITE_POWER_SCALE) }
}

impl PowerLightSampler
{
    pub fn new(infinite_power_scale: f32) -> Self
    {
        Self {
            infinite_power_scale,
            lights: Vec::new(),
            indices: HashMap::new(),
            distribution: None,
        }
    }

    fn gather_lights(&self, scene: &Scene) -> Vec<(LightHandle, f32)>
    {
        let mut lights_data: Vec<(LightHandle, f32)> = Vec::with_capacity(scene.light_count());

        for (id, light) in scene.lights()
        {
            match light
            {
                Light::Mesh(mesh) => lights_data.extend(mesh.decompose().map(|t| (LightHandle::triangle(id, t.index()), t.power()))),
                Light::Infinite(_) => lights_data.push((LightHandle::Light(id), self.infinite_power_scale * light.power())),
                _ => lights_data.push((LightHandle::Light(id), light.power())),
            }
        }

        lights_data
    }
}

impl LightSampler for PowerLightSampler
{
    fn commit(&mut self, scene: &Scene) -> anyhow::Result<()>
    {
        validate_lights(scene)?;

        let lights_data: Vec<(LightHandle, f32)> = self.gather_lights(scene);
        let weights: Vec<f32> = lights_data.iter().map(|&(_, weight)| weight).collect();

        self.lights = lights_data.iter().map(|&(handle, _)| handle).collect();
        self.indices = self.lights.iter().enumerate().map(|(i, &handle)| (handle, i)).collect();
        self.distribution = (!weights.is_empty()).then(|| Distribution1D::new(&weights));

        log::info!("Power light sampler: {} entries", self.lights.len());

        Ok(())
    }

    fn sample(&self, _: &LightSampleContext, u: f32) -> Option<SampledLight>
    {
        self.distribution.as_ref().map(|distribution| {
            let (index, pdf): (usize, f32) = distribution.sample(u);
            SampledLight::new(self.lights[index], pdf)
        })
    }

    fn pdf(&self, _: &LightSampleContext, light: LightHandle) -> f32
    {
        let index: usize = *self
            .indices
            .get(&light)
            .unwrap_or_else(|| panic!("{:?} is not part of the committed light set", light));

        self.distribution.as_ref().map_or(0.0, |distribution| distribution.pmf(index))
    }
}

#[cfg(test)]
mod tests
{
    use approx::assert_relative_eq;
    use id_arena::Id;

    use super::*;
    use crate::light::{InfiniteLight, MeshLight, PointLight};

    #[test]
    fn picks_proportionally_to_power()
    {
        let mut scene: Scene = Scene::default();
        let dim: Id<Light> = scene.add_light(PointLight::from_power(glam::Vec3A::ZERO, 1.0));
        let bright: Id<Light> = scene.add_light(PointLight::from_power(glam::Vec3A::X, 3.0));

        let mut sampler: PowerLightSampler = PowerLightSampler::default();
        sampler.commit(&scene).unwrap();

        let ctx: LightSampleContext = LightSampleContext::new(glam::Vec3A::Y, glam::Vec3A::Y);
        assert_relative_eq!(sampler.pdf(&ctx, dim.into()), 0.25, epsilon = 1e-5);
        assert_relative_eq!(sampler.pdf(&ctx, bright.into()), 0.75, epsilon = 1e-5);

        let sampled: SampledLight = sampler.sample(&ctx, 0.9).unwrap();
        assert_eq!(sampled.light, LightHandle::Light(bright));
        assert_eq!(sampled.pdf, sampler.pdf(&ctx, sampled.light));
    }

    #[test]
    fn splits_meshes_and_damps_the_environment()
    {
        let mut scene: Scene = Scene::default();
        let mesh: Id<Light> = scene.add_light(MeshLight::new(
            vec![
                [glam::Vec3A::ZERO, glam::Vec3A::X, glam::Vec3A::Y],
                [glam::Vec3A::X, glam::Vec3A::new(1.0, 1.0, 0.0), glam::Vec3A::Y],
            ],
            2.0,
            false,
        ));
        let env: Id<Light> = scene.add_light(InfiniteLight::new(10.0));

        let mut sampler: PowerLightSampler = PowerLightSampler::new(0.1);
        sampler.commit(&scene).unwrap();

        // Two triangles of power 1 and the environment weighted as 1
        let ctx: LightSampleContext = LightSampleContext::new(glam::Vec3A::Z, glam::Vec3A::NEG_Z);
        for handle in [LightHandle::triangle(mesh, 0), LightHandle::triangle(mesh, 1), LightHandle::Light(env)]
        {
            assert_relative_eq!(sampler.pdf(&ctx, handle), 1.0 / 3.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn empty_scene_samples_nothing()
    {
        let mut sampler: PowerLightSampler = PowerLightSampler::default();
        sampler.commit(&Scene::default()).unwrap();

        assert!(sampler.sample(&LightSampleContext::new(glam::Vec3A::ZERO, glam::Vec3A::Z), 0.5).is_none());
    }

    #[test]
    #[should_panic(expected = "not part of the committed light set")]
    fn unknown_light_is_a_contract_violation()
    {
        let mut scene: Scene = Scene::default();
        let mesh: Id<Light> = scene.add_light(MeshLight::new(vec![[glam::Vec3A::ZERO, glam::Vec3A::X, glam::Vec3A::Y]], 1.0, false));

        let mut sampler: PowerLightSampler = PowerLightSampler::default();
        sampler.commit(&scene).unwrap();

        // Meshes are only known through their triangles
        sampler.pdf(&LightSampleContext::new(glam::Vec3A::Z, glam::Vec3A::Z), LightHandle::Light(mesh));
    }
}
