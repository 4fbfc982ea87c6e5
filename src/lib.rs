#![allow(clippy::upper_case_acronyms, clippy::new_ret_no_self)]

#[macro_use]
pub mod boundingbox;
pub mod cone;
pub mod light;
pub mod sampling;
pub mod scene;
pub mod utility;

pub use light::{Emitter, InfiniteLight, Light, MeshLight, PointLight, SpotLight, TriangleLight};
pub use scene::light_sampler::{
    LightHandle, LightSampleContext, LightSampler, LightSamplerType, LightTreeConfig, LightTreeSampler, PowerLightSampler, SampledLight,
    TriangleKey,
};
pub use scene::Scene;
