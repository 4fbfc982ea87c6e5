#![allow(clippy::upper_case_acronyms)]

use std::f32::consts::PI;

use anyhow::{anyhow, Context};
use nanorand::tls::TlsWyRand;
use nanorand::Rng;
use rayon::prelude::*;

use light_tree::sampling::SobolSampler;
use light_tree::{
    Emitter, InfiniteLight, Light, LightHandle, LightSampleContext, LightSampler, LightSamplerType, LightTreeConfig, LightTreeSampler,
    MeshLight, PointLight, PowerLightSampler, SampledLight, Scene, SpotLight, TriangleLight,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const GRID_SIZE: usize = 24;
const GRID_SPACING: f32 = 4.0;

const NUM_EVENTS: usize = 4096;
const SAMPLES_PER_EVENT: u32 = 64;
const NUM_POINTS: usize = SAMPLES_PER_EVENT as usize;

/// A grid of small point lights with a few bright spots, an area light overhead and a dim sky
fn build_scene(rng: &mut TlsWyRand) -> Scene
{
    let mut scene: Scene = Scene::default();

    for i in 0..(GRID_SIZE * GRID_SIZE)
    {
        let x: f32 = (i % GRID_SIZE) as f32 * GRID_SPACING;
        let z: f32 = (i / GRID_SIZE) as f32 * GRID_SPACING;
        let power: f32 = 1.0 + 9.0 * rng.generate::<f32>();

        scene.add_light(PointLight::from_power(glam::Vec3A::new(x, 2.0, z), power));
    }

    let extent: f32 = GRID_SIZE as f32 * GRID_SPACING;
    for corner in [glam::Vec3A::ZERO, glam::Vec3A::new(extent, 0.0, extent)]
    {
        let position: glam::Vec3A = corner + glam::Vec3A::new(0.0, 10.0, 0.0);
        let direction: glam::Vec3A = glam::Vec3A::new(0.5 * extent, 0.0, 0.5 * extent) - position;
        scene.add_light(SpotLight::new(position, direction, 500.0, 30.0, 20.0));
    }

    let h: f32 = 20.0;
    let c: f32 = 0.5 * extent;
    scene.add_light(MeshLight::from_indexed(
        &[
            glam::Vec3A::new(c - 5.0, h, c - 5.0),
            glam::Vec3A::new(c + 5.0, h, c - 5.0),
            glam::Vec3A::new(c + 5.0, h, c + 5.0),
            glam::Vec3A::new(c - 5.0, h, c + 5.0),
        ],
        &[[0, 1, 2], [0, 2, 3]],
        5.0,
        false,
    ));

    scene.add_light(InfiniteLight::new(200.0));

    scene
}

/// Position and power of whatever a handle refers to
fn resolve(scene: &Scene, handle: LightHandle) -> anyhow::Result<(glam::Vec3A, f32, bool)>
{
    let light: &Light = scene.light(handle.light_id());

    match handle
    {
        LightHandle::Light(_) => Ok((light.centroid(), light.power(), light.is_infinite())),
        LightHandle::Triangle(key) =>
        {
            let mesh: &MeshLight = light.as_mesh().ok_or_else(|| anyhow!("triangle handle into a {} light", light.kind()))?;
            let triangle: TriangleLight = mesh.triangle_as_light(key.triangle as usize);
            Ok((triangle.centroid(), triangle.power(), false))
        }
    }
}

/// Unshadowed, unoccluded irradiance proxy of one light at a shading point
fn contribution(scene: &Scene, ctx: &LightSampleContext, handle: LightHandle) -> anyhow::Result<f32>
{
    let (position, power, infinite): (glam::Vec3A, f32, bool) = resolve(scene, handle)?;

    if infinite
    {
        return Ok(power / (4.0 * PI));
    }

    let to_light: glam::Vec3A = position - ctx.point;
    let d2: f32 = to_light.length_squared().max(1e-4);
    let cosine: f32 = glam::Vec3A::dot(ctx.normal, to_light.normalize_or_zero()).max(0.0);

    Ok(power * cosine / (4.0 * PI * d2))
}

/// Relative RMS error of the one-sample light estimator, and how often `pdf` disagreed with `sample`
fn evaluate(name: &str, sampler: &LightSamplerType, scene: &Scene, sobol: &SobolSampler) -> anyhow::Result<()>
{
    let handles: Vec<LightHandle> = scene
        .lights()
        .flat_map(|(id, light)| match light.as_mesh()
        {
            Some(mesh) => (0..mesh.triangle_count() as u32).map(|i| LightHandle::triangle(id, i)).collect::<Vec<LightHandle>>(),
            None => vec![LightHandle::Light(id)],
        })
        .collect();

    let begin: std::time::Instant = std::time::Instant::now();

    let results: Vec<(f32, u32)> = (0..NUM_EVENTS)
        .into_par_iter()
        .map(|_| -> anyhow::Result<(f32, u32)> {
            let mut rng: TlsWyRand = nanorand::tls_rng();

            let extent: f32 = GRID_SIZE as f32 * GRID_SPACING;
            let point: glam::Vec3A = glam::Vec3A::new(rng.generate::<f32>() * extent, 0.0, rng.generate::<f32>() * extent);
            let ctx: LightSampleContext = LightSampleContext::new(point, glam::Vec3A::Y);

            let exact: f32 = handles.iter().map(|&h| contribution(scene, &ctx, h)).sum::<anyhow::Result<f32>>()?;

            let seed: u32 = rng.generate();
            let mut squared_error: f32 = 0.0;
            let mut mismatches: u32 = 0;

            for index in 0..SAMPLES_PER_EVENT
            {
                let sampled: SampledLight = sampler
                    .sample(&ctx, sobol.get_1d(index, seed))
                    .context("scene has lights but nothing was sampled")?;

                if (sampler.pdf(&ctx, sampled.light) - sampled.pdf).abs() > 1e-5 * sampled.pdf
                {
                    mismatches += 1;
                }

                let estimate: f32 = contribution(scene, &ctx, sampled.light)? / sampled.pdf;
                squared_error += (estimate - exact) * (estimate - exact) / (exact * exact);
            }

            Ok((squared_error / SAMPLES_PER_EVENT as f32, mismatches))
        })
        .collect::<anyhow::Result<Vec<(f32, u32)>>>()?;

    let rms: f32 = (results.iter().map(|&(e, _)| e).sum::<f32>() / NUM_EVENTS as f32).sqrt();
    let mismatches: u32 = results.iter().map(|&(_, m)| m).sum();

    log::info!(
        "{}: relative RMS error {:.4}, {} pdf mismatches, took {:.2?}",
        name,
        rms,
        mismatches,
        begin.elapsed()
    );

    Ok(())
}

fn main() -> anyhow::Result<()>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Running on {} threads", num_cpus::get());

    let mut rng: TlsWyRand = nanorand::tls_rng();
    let scene: Scene = build_scene(&mut rng);

    let mut power: LightSamplerType = PowerLightSampler::default().into();
    let mut tree: LightSamplerType = LightTreeSampler::new(LightTreeConfig::default()).into();

    power.commit(&scene)?;
    tree.commit(&scene)?;

    let sobol: SobolSampler = SobolSampler::new(NUM_POINTS);

    evaluate("Power sampler", &power, &scene, &sobol)?;
    evaluate("Light tree", &tree, &scene, &sobol)?;

    Ok(())
}
