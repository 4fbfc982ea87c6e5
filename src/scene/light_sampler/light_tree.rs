use std::time::Instant;

use anyhow::ensure;
use id_arena::{Arena, Id};

pub use node::{LightNode, LightNodeType, TreeLight};

use crate::light::{Emitter, Light};
use crate::scene::light_sampler::light_tree::builder::{BuiltTree, TreeBuilder};
use crate::scene::light_sampler::light_tree::distribution::{LeafDistributions, LeafSlot, ReverseMap};
use crate::scene::light_sampler::{validate_lights, LightHandle, LightSampleContext, LightSampler, SampledLight, DEFAULT_INFINITE_POWER_SCALE};
use crate::scene::Scene;
use crate::utility::{angle_between, clamp_sample, EPSILON};

mod builder;
mod distribution;
pub mod node;

/// Keeps the distance to a cluster away from zero
const MIN_DISTANCE: f32 = 1e-6;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightTreeConfig
{
    /// Fraction of the infinite light's power it is weighed with against the tree
    pub infinite_power_scale: f32,
    /// Without adaptive splitting, the distance to a cluster is clamped below by a quarter of its diagonal
    pub adaptive_split: bool,
    pub split_threshold: f32,
}

impl Default for LightTreeConfig
{
    fn default() -> Self
    {
        Self {
            infinite_power_scale: DEFAULT_INFINITE_POWER_SCALE,
            adaptive_split: false,
            split_threshold: 0.5,
        }
    }
}

/// Frozen state of one commit
#[derive(Debug)]
struct CommittedTree
{
    nodes: Arena<LightNode>,
    root: Option<Id<LightNode>>,
    lights: Vec<TreeLight>,
    distributions: LeafDistributions,
    reverse_map: ReverseMap,
    tree_power: f32,
    depth: usize,
    infinite: Option<Id<Light>>,
    p_tree: f32,
}

/// Probability of descending into the tree rather than picking the infinite light
fn tree_probability(root: Option<Id<LightNode>>, tree_power: f32, infinite_power: Option<f32>) -> f32
{
    match (root, infinite_power)
    {
        (None, _) => 0.0,
        (Some(_), None) => 1.0,
        (Some(_), Some(infinite_power)) if tree_power + infinite_power > 0.0 => tree_power / (tree_power + infinite_power),
        (Some(_), Some(_)) => 0.5,
    }
}

/// Hierarchical light sampler.
///
/// Finite lights are clustered into a binary tree of bounds and orientation cones. Sampling walks down from the root,
/// choosing each child with probability proportional to its importance for the shading point, then picks a light
/// of the reached leaf proportionally to power. The infinite light competes with the whole tree through its damped power.
#[derive(Debug, Default)]
pub struct LightTreeSampler
{
    config: LightTreeConfig,
    tree: Option<CommittedTree>,
}

impl LightTreeSampler
{
    pub fn new(config: LightTreeConfig) -> Self { Self { config, tree: None } }

    pub fn config(&self) -> &LightTreeConfig { &self.config }

    pub fn is_committed(&self) -> bool { self.tree.is_some() }

    fn committed(&self) -> &CommittedTree { self.tree.as_ref().expect("Light tree queried before commit") }

    /// Flattens the finite lights, meshes enter triangle by triangle
    fn gather_lights(scene: &Scene) -> Vec<TreeLight>
    {
        let mut lights: Vec<TreeLight> = Vec::with_capacity(scene.light_count());

        for (id, light) in scene.lights()
        {
            match light
            {
                Light::Mesh(mesh) => lights.extend(mesh.decompose().map(|t| TreeLight::new(LightHandle::triangle(id, t.index()), &t))),
                Light::Infinite(_) => (),
                _ => lights.push(TreeLight::new(LightHandle::Light(id), light)),
            }
        }

        lights
    }

    /// Estimated contribution of a cluster to the shading point
    pub fn importance(&self, ctx: &LightSampleContext, node: &LightNode) -> f32
    {
        let diagonal: f32 = node.bounding_box.diagonal();
        let delta: glam::Vec3A = node.bounding_box.center() - ctx.point;

        let mut d: f32 = delta.length();
        if !self.config.adaptive_split
        {
            d = d.max(0.25 * diagonal);
        }
        d = d.max(MIN_DISTANCE);

        let to_cluster: glam::Vec3A = delta.normalize_or_zero();

        // The cone axis is compared with the direction from the cluster to the point, not with to_cluster
        let theta: f32 = angle_between(node.cone.axis, -to_cluster);
        let theta_u: f32 = (0.5 * diagonal / d).atan();
        let theta_p: f32 = (theta - node.cone.theta_o - theta_u).max(0.0);

        if theta_p >= node.cone.theta_e
        {
            return 0.0;
        }

        let cos_i: f32 = if ctx.normal == glam::Vec3A::ZERO
        {
            1.0
        }
        else
        {
            let theta_i: f32 = angle_between(ctx.normal, to_cluster);
            (theta_i - theta_u).max(0.0).cos().max(0.0)
        };

        cos_i * node.power / (d * d) * theta_p.cos()
    }

    /// Whether a cluster is too heterogeneous, as seen from the shading point, to stand in for its lights.
    /// Traversal never consults it.
    pub fn split(&self, ctx: &LightSampleContext, node: &LightNode) -> bool
    {
        let radius: f32 = 0.5 * node.bounding_box.diagonal();
        let d: f32 = (node.bounding_box.center() - ctx.point).length();

        if d <= radius
        {
            return true;
        }
        if node.is_leaf()
        {
            return false;
        }

        let near: f32 = (d - radius).max(EPSILON);
        let far: f32 = d + radius;

        // Moments of the inverse squared distance over the bounding sphere
        let e_g: f32 = 1.0 / (near * far);
        let e_g2: f32 = (near * near + near * far + far * far) / (3.0 * near.powi(3) * far.powi(3));
        let v_g: f32 = (e_g2 - e_g * e_g).max(0.0);

        let n: f32 = node.num_lights as f32;
        let e_e: f32 = node.power / n;
        let v_e: f32 = node.power_variance;

        let variance: f32 = (v_e * v_g + v_e * e_g * e_g + e_e * e_e * v_g) * n * n;
        let normalized: f32 = (1.0 / (1.0 + variance.sqrt())).powf(0.25);

        normalized < self.config.split_threshold
    }

    /// Probability of choosing the left child
    fn branch_probability(&self, ctx: &LightSampleContext, left: &LightNode, right: &LightNode) -> f32
    {
        let importance_left: f32 = self.importance(ctx, left);
        let importance_right: f32 = self.importance(ctx, right);
        let total: f32 = importance_left + importance_right;

        if total > 0.0
        {
            importance_left / total
        }
        else
        {
            0.5
        }
    }

    fn pick_light(&self, ctx: &LightSampleContext, mut u: f32, root: Id<LightNode>, p_tree: f32) -> SampledLight
    {
        let tree: &CommittedTree = self.committed();

        let mut pdf: f32 = p_tree;
        let mut node_id: Id<LightNode> = root;

        loop
        {
            let node: &LightNode = &tree.nodes[node_id];

            match node.node_type
            {
                LightNodeType::Leaf =>
                {
                    let (index, p): (usize, f32) = tree.distributions.get(node.first_light_index).sample(u);
                    let light: &TreeLight = &tree.lights[node.first_light_index as usize + index];

                    return SampledLight::new(light.handle, pdf * p);
                }
                LightNodeType::Branch { left, right } =>
                {
                    let p_left: f32 = self.branch_probability(ctx, &tree.nodes[left], &tree.nodes[right]);

                    if u < p_left
                    {
                        u = clamp_sample(u / p_left);
                        pdf *= p_left;
                        node_id = left;
                    }
                    else
                    {
                        let p_right: f32 = 1.0 - p_left;
                        u = clamp_sample((u - p_left) / p_right);
                        pdf *= p_right;
                        node_id = right;
                    }
                }
            }
        }
    }

    /// Probability of reaching `node_id` from the root, the tree's own share included.
    /// Multiplies top-down, in the same order as `pick_light`.
    fn path_probability(&self, ctx: &LightSampleContext, node_id: Id<LightNode>) -> f32
    {
        let tree: &CommittedTree = self.committed();

        match tree.nodes[node_id].parent
        {
            None => tree.p_tree,
            Some(parent) => match tree.nodes[parent].node_type
            {
                LightNodeType::Branch { left, right } =>
                {
                    let p_left: f32 = self.branch_probability(ctx, &tree.nodes[left], &tree.nodes[right]);
                    let p_child: f32 = if left == node_id { p_left } else { 1.0 - p_left };

                    self.path_probability(ctx, parent) * p_child
                }
                LightNodeType::Leaf => unreachable!("A leaf has no children"),
            },
        }
    }

    pub fn root(&self) -> Option<Id<LightNode>> { self.committed().root }

    pub fn node(&self, id: Id<LightNode>) -> &LightNode { &self.committed().nodes[id] }

    pub fn node_count(&self) -> usize { self.committed().nodes.len() }

    pub fn leaf_count(&self) -> usize { self.committed().distributions.len() }

    pub fn depth(&self) -> usize { self.committed().depth }

    pub fn tree_power(&self) -> f32 { self.committed().tree_power }

    /// Entries of the flattened light array, triangles counted individually
    pub fn light_count(&self) -> usize { self.committed().lights.len() }

    /// The flattened light array in tree order
    pub fn lights(&self) -> impl Iterator<Item = &TreeLight> { self.committed().lights.iter() }

    /// Probability of sampling the tree instead of the infinite light
    pub fn p_tree(&self) -> f32 { self.committed().p_tree }
}

impl LightSampler for LightTreeSampler
{
    fn commit(&mut self, scene: &Scene) -> anyhow::Result<()>
    {
        ensure!(
            self.config.infinite_power_scale.is_finite() && self.config.infinite_power_scale >= 0.0,
            "infinite power scale must be finite and non-negative, got {}",
            self.config.infinite_power_scale
        );
        ensure!(self.config.split_threshold.is_finite(), "split threshold must be finite, got {}", self.config.split_threshold);

        let infinite: Option<Id<Light>> = validate_lights(scene)?;

        let start: Instant = Instant::now();

        if scene.light_count() == 0
        {
            log::warn!("Committing a scene without lights, sampling will return nothing");
        }

        let lights: Vec<TreeLight> = Self::gather_lights(scene);
        let zero_power: usize = lights.iter().filter(|l| l.power == 0.0).count();
        if zero_power > 0
        {
            log::warn!("{} lights without power, they will never be sampled", zero_power);
        }

        let BuiltTree {
            nodes,
            root,
            lights,
            distributions,
            reverse_map,
            tree_power,
            depth,
        } = TreeBuilder::new(lights).build();

        let infinite_power: Option<f32> = infinite.map(|id| self.config.infinite_power_scale * scene.light(id).power());
        let p_tree: f32 = tree_probability(root, tree_power, infinite_power);

        log::info!(
            "Light tree: {} lights ({} entries), {} nodes, {} leaves, depth {}, power {}, built in {:.2?}",
            scene.light_count(),
            lights.len(),
            nodes.len(),
            distributions.len(),
            depth,
            tree_power,
            start.elapsed()
        );

        self.tree = Some(CommittedTree {
            nodes,
            root,
            lights,
            distributions,
            reverse_map,
            tree_power,
            depth,
            infinite,
            p_tree,
        });

        Ok(())
    }

    fn sample(&self, ctx: &LightSampleContext, u: f32) -> Option<SampledLight>
    {
        let tree: &CommittedTree = self.committed();
        let u: f32 = clamp_sample(u);

        match tree.root
        {
            Some(root) if u < tree.p_tree => Some(self.pick_light(ctx, clamp_sample(u / tree.p_tree), root, tree.p_tree)),
            _ => tree.infinite.map(|id| SampledLight::new(LightHandle::Light(id), 1.0 - tree.p_tree)),
        }
    }

    fn pdf(&self, ctx: &LightSampleContext, light: LightHandle) -> f32
    {
        let tree: &CommittedTree = self.committed();

        if tree.infinite.map(LightHandle::Light) == Some(light)
        {
            return 1.0 - tree.p_tree;
        }

        let slot: LeafSlot = tree
            .reverse_map
            .lookup(light)
            .unwrap_or_else(|| panic!("{:?} is not part of the light tree", light));
        let leaf: &LightNode = &tree.nodes[slot.node];

        self.path_probability(ctx, slot.node) * tree.distributions.get(leaf.first_light_index).pmf(slot.index as usize)
    }
}
