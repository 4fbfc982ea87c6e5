use ambassador::{delegatable_trait, Delegate};
use anyhow::{bail, ensure};
use id_arena::Id;

pub use light_tree::{LightTreeConfig, LightTreeSampler};
pub use power::PowerLightSampler;

use crate::light::{Emitter, Light};
use crate::scene::Scene;

pub mod light_tree;
mod power;

/// Fraction of the infinite light's power used when weighing it against finite lights.
/// Its real contribution at a shading point can't be bounded spatially.
pub const DEFAULT_INFINITE_POWER_SCALE: f32 = 0.1;

/// Everything a light sampler knows about the point being shaded
#[derive(Copy, Clone, Debug)]
pub struct LightSampleContext
{
    pub point: glam::Vec3A,
    /// Zero for points inside participating media, disables the cosine term
    pub normal: glam::Vec3A,
}

impl LightSampleContext
{
    pub fn new(point: glam::Vec3A, normal: glam::Vec3A) -> Self
    {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }
}

/// Triangle `triangle` of the mesh light `mesh`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TriangleKey
{
    pub mesh: Id<Light>,
    pub triangle: u32,
}

/// Identity of something a light sampler can return: a scene light, or one triangle of a mesh light
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LightHandle
{
    Light(Id<Light>),
    Triangle(TriangleKey),
}

impl LightHandle
{
    pub fn triangle(mesh: Id<Light>, triangle: u32) -> Self { LightHandle::Triangle(TriangleKey { mesh, triangle }) }

    /// The scene light this handle belongs to
    pub fn light_id(&self) -> Id<Light>
    {
        match self
        {
            LightHandle::Light(id) => *id,
            LightHandle::Triangle(key) => key.mesh,
        }
    }
}

impl From<Id<Light>> for LightHandle
{
    fn from(id: Id<Light>) -> Self { LightHandle::Light(id) }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SampledLight
{
    pub light: LightHandle,
    /// Discrete probability of having picked `light`
    pub pdf: f32,
}

impl SampledLight
{
    pub fn new(light: LightHandle, pdf: f32) -> Self { Self { light, pdf } }
}

/// Picks which light to ask for next-event estimation, and recovers the probability of a pick for MIS.
///
/// `commit` must run before any query. Queries never mutate the sampler and may run from any number of threads.
#[delegatable_trait]
pub trait LightSampler: Sync + Send
{
    /// Rebuilds the sampler from every light in `scene`
    fn commit(&mut self, scene: &Scene) -> anyhow::Result<()>;

    /// Picks a light with `u` in `[0, 1)`. `None` only for a scene without lights.
    fn sample(&self, ctx: &LightSampleContext, u: f32) -> Option<SampledLight>;

    /// Probability that `sample` returns `light` for this context
    fn pdf(&self, ctx: &LightSampleContext, light: LightHandle) -> f32;
}

#[derive(Delegate)]
#[delegate(LightSampler)]
pub enum LightSamplerType
{
    Power(PowerLightSampler),
    Tree(LightTreeSampler),
}

impl From<PowerLightSampler> for LightSamplerType
{
    fn from(sampler: PowerLightSampler) -> Self { LightSamplerType::Power(sampler) }
}

impl From<LightTreeSampler> for LightSamplerType
{
    fn from(sampler: LightTreeSampler) -> Self { LightSamplerType::Tree(sampler) }
}

/// Rejects light sets no sampler can build a distribution for.
/// Returns the infinite light, if any.
pub(crate) fn validate_lights(scene: &Scene) -> anyhow::Result<Option<Id<Light>>>
{
    let mut infinite: Option<Id<Light>> = None;

    for (id, light) in scene.lights()
    {
        let power: f32 = light.power();
        ensure!(power.is_finite(), "{} light {} has non-finite power {}", light.kind(), id.index(), power);
        ensure!(power >= 0.0, "{} light {} has negative power {}", light.kind(), id.index(), power);

        if light.is_infinite()
        {
            if let Some(first) = infinite
            {
                bail!("scene has more than one infinite light ({} and {})", first.index(), id.index());
            }
            infinite = Some(id);
        }
        else
        {
            ensure!(light.bounds().is_finite(), "{} light {} has non-finite bounds", light.kind(), id.index());
            ensure!(light.direction().is_finite(), "{} light {} has a non-finite direction", light.kind(), id.index());
        }
    }

    Ok(infinite)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::light::{InfiniteLight, PointLight};

    #[test]
    fn rejects_bad_lights()
    {
        let negative: Scene = Scene::new(vec![PointLight::from_power(glam::Vec3A::ZERO, -1.0)]);
        assert!(validate_lights(&negative).is_err());

        let nan: Scene = Scene::new(vec![PointLight::from_power(glam::Vec3A::splat(f32::NAN), 1.0)]);
        assert!(validate_lights(&nan).is_err());

        let two_envs: Scene = Scene::new(vec![InfiniteLight::new(1.0), InfiniteLight::new(1.0)]);
        let message: String = validate_lights(&two_envs).unwrap_err().to_string();
        assert!(message.contains("more than one infinite light"), "{}", message);
    }

    #[test]
    fn returns_the_infinite_light()
    {
        let mut scene: Scene = Scene::new(vec![PointLight::from_power(glam::Vec3A::ZERO, 1.0)]);
        assert_eq!(validate_lights(&scene).unwrap(), None);

        let env: Id<Light> = scene.add_light(InfiniteLight::new(3.0));
        assert_eq!(validate_lights(&scene).unwrap(), Some(env));
    }

    #[test]
    fn handles_compare_by_identity()
    {
        let mut scene: Scene = Scene::default();
        let a: Id<Light> = scene.add_light(PointLight::from_power(glam::Vec3A::ZERO, 1.0));
        let b: Id<Light> = scene.add_light(PointLight::from_power(glam::Vec3A::ZERO, 1.0));

        assert_ne!(LightHandle::from(a), LightHandle::from(b));
        assert_ne!(LightHandle::from(a), LightHandle::triangle(a, 0));
        assert_eq!(LightHandle::triangle(b, 3).light_id(), b);
    }
}
