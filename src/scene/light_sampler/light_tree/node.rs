use ambassador::Delegate;
use id_arena::Id;

use crate::boundingbox::{HasBox, AABB};
use crate::cone::OrientationCone;
use crate::light::Emitter;
use crate::scene::light_sampler::LightHandle;

/// One entry of the tree's flattened light array, everything the build and the queries need from a light
#[derive(Delegate, Copy, Clone, Debug)]
#[delegate(HasBox, target = "bounding_box")]
pub struct TreeLight
{
    pub handle: LightHandle,
    pub bounding_box: AABB,
    pub cone: OrientationCone,
    pub power: f32,
}

impl TreeLight
{
    pub fn new<E>(handle: LightHandle, emitter: &E) -> Self
    where
        E: Emitter,
    {
        Self {
            handle,
            bounding_box: emitter.bounds(),
            cone: emitter.cone(),
            power: emitter.power(),
        }
    }

    pub fn centroid(&self) -> glam::Vec3A { self.bounding_box.center() }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LightNodeType
{
    Leaf,
    Branch
    {
        left: Id<LightNode>, right: Id<LightNode>
    },
}

/// Node of the light tree.
///
/// The light range `[first_light_index, first_light_index + num_lights)` indexes the flattened light array.
/// Only leaves use it, for branches it is what the partitioning left behind.
#[derive(Delegate, Copy, Clone, Debug)]
#[delegate(HasBox, target = "bounding_box")]
pub struct LightNode
{
    pub bounding_box: AABB,
    pub cone: OrientationCone,
    pub power: f32,
    /// Sample variance of the member lights' power
    pub power_variance: f32,
    pub parent: Option<Id<LightNode>>,
    pub first_light_index: u32,
    pub num_lights: u32,
    pub node_type: LightNodeType,
}

impl LightNode
{
    pub fn is_leaf(&self) -> bool { self.node_type == LightNodeType::Leaf }

    pub fn children(&self) -> Option<(Id<LightNode>, Id<LightNode>)>
    {
        match self.node_type
        {
            LightNodeType::Branch { left, right } => Some((left, right)),
            LightNodeType::Leaf => None,
        }
    }

    pub fn light_range(&self) -> std::ops::Range<usize>
    {
        let first: usize = self.first_light_index as usize;
        first..(first + self.num_lights as usize)
    }
}
