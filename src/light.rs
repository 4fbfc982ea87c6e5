use ambassador::{delegatable_trait, Delegate};

pub use infinite::InfiniteLight;
pub use mesh::{MeshLight, TriangleLight};
pub use point::PointLight;
pub use spot::SpotLight;

use crate::boundingbox::AABB;
use crate::cone::OrientationCone;

mod infinite;
mod mesh;
mod point;
mod spot;

/// What the light sampler needs to know about an emitter, nothing about how to sample it
#[delegatable_trait]
pub trait Emitter: Sync + Send
{
    fn bounds(&self) -> AABB;
    fn cone(&self) -> OrientationCone;

    /// Irradiance times area, or the equivalent for delta lights
    fn power(&self) -> f32;

    fn direction(&self) -> glam::Vec3A { self.cone().axis }
    fn centroid(&self) -> glam::Vec3A { self.bounds().center() }
    fn is_infinite(&self) -> bool { false }
}

#[derive(Delegate)]
#[delegate(Emitter)]
pub enum Light
{
    Point(PointLight),
    Spot(SpotLight),
    Mesh(MeshLight),
    Infinite(InfiniteLight),
}

impl Light
{
    pub fn as_mesh(&self) -> Option<&MeshLight>
    {
        match self
        {
            Light::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Name of the variant, for log output and error messages
    pub fn kind(&self) -> &'static str
    {
        match self
        {
            Light::Point(_) => "point",
            Light::Spot(_) => "spot",
            Light::Mesh(_) => "mesh",
            Light::Infinite(_) => "infinite",
        }
    }
}

impl From<PointLight> for Light
{
    fn from(light: PointLight) -> Self { Light::Point(light) }
}

impl From<SpotLight> for Light
{
    fn from(light: SpotLight) -> Self { Light::Spot(light) }
}

impl From<MeshLight> for Light
{
    fn from(light: MeshLight) -> Self { Light::Mesh(light) }
}

impl From<InfiniteLight> for Light
{
    fn from(light: InfiniteLight) -> Self { Light::Infinite(light) }
}
