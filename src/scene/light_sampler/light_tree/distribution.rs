use std::collections::HashMap;

use id_arena::Id;
use nohash_hasher::IntMap;

use crate::light::Light;
use crate::sampling::Distribution1D;
use crate::scene::light_sampler::light_tree::node::LightNode;
use crate::scene::light_sampler::{LightHandle, TriangleKey};

/// Power distributions of every leaf, keyed by the leaf's first light index
#[derive(Default, Debug)]
pub struct LeafDistributions
{
    distributions: IntMap<u32, Distribution1D>,
}

impl LeafDistributions
{
    pub fn insert(&mut self, first_light_index: u32, powers: &[f32])
    {
        let previous: Option<Distribution1D> = self.distributions.insert(first_light_index, Distribution1D::new(powers));
        debug_assert!(previous.is_none(), "Two leaves start at light {}", first_light_index);
    }

    pub fn get(&self, first_light_index: u32) -> &Distribution1D
    {
        self.distributions
            .get(&first_light_index)
            .unwrap_or_else(|| panic!("No leaf starts at light {}", first_light_index))
    }

    pub fn len(&self) -> usize { self.distributions.len() }

    pub fn is_empty(&self) -> bool { self.distributions.is_empty() }
}

/// Where a light ended up: its leaf, and its index inside that leaf's distribution
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LeafSlot
{
    pub node: Id<LightNode>,
    pub index: u32,
}

/// Light identity to leaf slot, the inverse of sampling.
/// Keys keep the full arena id, so a handle into another scene never aliases a light of this one.
#[derive(Default, Debug)]
pub struct ReverseMap
{
    lights: HashMap<Id<Light>, LeafSlot>,
    triangles: HashMap<TriangleKey, LeafSlot>,
}

impl ReverseMap
{
    pub fn insert(&mut self, light: LightHandle, slot: LeafSlot)
    {
        let previous: Option<LeafSlot> = match light
        {
            LightHandle::Light(id) => self.lights.insert(id, slot),
            LightHandle::Triangle(key) => self.triangles.insert(key, slot),
        };
        debug_assert!(previous.is_none(), "{:?} is in the tree twice", light);
    }

    pub fn lookup(&self, light: LightHandle) -> Option<LeafSlot>
    {
        match light
        {
            LightHandle::Light(id) => self.lights.get(&id).copied(),
            LightHandle::Triangle(key) => self.triangles.get(&key).copied(),
        }
    }

    pub fn len(&self) -> usize { self.lights.len() + self.triangles.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
