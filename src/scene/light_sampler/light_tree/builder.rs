use ambassador::Delegate;
use id_arena::{Arena, Id};

use crate::boundingbox::{surrounding_box, union_of, HasBox, AABB};
use crate::cone::OrientationCone;
use crate::scene::light_sampler::light_tree::distribution::{LeafDistributions, LeafSlot, ReverseMap};
use crate::scene::light_sampler::light_tree::node::{LightNode, LightNodeType, TreeLight};

const NUM_BUCKETS: usize = 12;
const NUM_AXES: usize = 3;

/// Aggregate over the lights whose centroid falls into one bucket along one axis.
/// The cone stays `None` until the first light arrives.
#[derive(Delegate, Copy, Clone, Debug)]
#[delegate(HasBox, target = "bounding_box")]
struct Bucket
{
    count: u32,
    power: f32,
    bounding_box: AABB,
    cone: Option<OrientationCone>,
}

impl Bucket
{
    fn empty() -> Self
    {
        Self {
            count: 0,
            power: 0.0,
            bounding_box: AABB::identity(),
            cone: None,
        }
    }

    fn add(&mut self, light: &TreeLight)
    {
        self.count += 1;
        self.power += light.power;
        self.bounding_box = surrounding_box(&self.bounding_box, light.get_box());
        self.cone = Some(self.cone.map_or(light.cone, |c| c.union(light.cone)));
    }

    fn merge(&self, other: &Bucket) -> Bucket
    {
        let cone: Option<OrientationCone> = match (self.cone, other.cone)
        {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };

        Bucket {
            count: self.count + other.count,
            power: self.power + other.power,
            bounding_box: surrounding_box(&self.bounding_box, other.get_box()),
            cone,
        }
    }

    /// Power weighted surface area orientation measure
    fn measure(&self) -> f32 { self.cone.map_or(0.0, |c| self.power * self.bounding_box.surface_area() * c.m_omega()) }
}

#[derive(Copy, Clone, Debug)]
struct SplitCandidate
{
    axis: usize,
    /// Last bucket on the left side
    bucket: usize,
    cost: f32,
    left_count: u32,
}

fn bucket_index(bounding_box: &AABB, centroid: glam::Vec3A, axis: usize) -> usize
{
    ((NUM_BUCKETS as f32 * bounding_box.offset(centroid, axis)) as usize).min(NUM_BUCKETS - 1)
}

fn power_variance(lights: &[TreeLight]) -> f32
{
    if lights.len() < 2
    {
        return 0.0;
    }

    let n: f32 = lights.len() as f32;
    let mean: f32 = lights.iter().map(|l| l.power).sum::<f32>() / n;

    lights.iter().map(|l| (l.power - mean) * (l.power - mean)).sum::<f32>() / (n - 1.0)
}

/// Finds the cheapest split over all axes and bucket boundaries by the surface area orientation heuristic.
/// Splits leaving one side empty are never considered.
fn find_split(lights: &[TreeLight], bounding_box: &AABB, cone: &OrientationCone) -> Option<SplitCandidate>
{
    let node_measure: f32 = bounding_box.surface_area() * cone.m_omega();
    let length: glam::Vec3A = bounding_box.length();
    let longest: f32 = bounding_box.longest_extent();

    let mut best: Option<SplitCandidate> = None;

    for axis in 0..NUM_AXES
    {
        // Every centroid lands in the same bucket
        if length[axis] <= 0.0
        {
            continue;
        }

        let mut buckets: [Bucket; NUM_BUCKETS] = [Bucket::empty(); NUM_BUCKETS];
        for light in lights
        {
            buckets[bucket_index(bounding_box, light.centroid(), axis)].add(light);
        }

        // below[b] covers buckets 0..=b, above[b] covers buckets b..
        let mut below: [Bucket; NUM_BUCKETS] = buckets;
        let mut above: [Bucket; NUM_BUCKETS] = buckets;
        for b in 1..NUM_BUCKETS
        {
            below[b] = below[b - 1].merge(&buckets[b]);
            above[NUM_BUCKETS - 1 - b] = above[NUM_BUCKETS - b].merge(&buckets[NUM_BUCKETS - 1 - b]);
        }

        // Discourages splitting thin axes
        let kr: f32 = longest / length[axis];

        for b in 0..(NUM_BUCKETS - 1)
        {
            let (left, right): (&Bucket, &Bucket) = (&below[b], &above[b + 1]);
            if left.count == 0 || right.count == 0
            {
                continue;
            }

            let children_measure: f32 = left.measure() + right.measure();
            let cost: f32 = if node_measure > 0.0 { kr * children_measure / node_measure } else { kr * children_measure };

            if !cost.is_nan() && best.map_or(true, |s| cost < s.cost)
            {
                best = Some(SplitCandidate {
                    axis,
                    bucket: b,
                    cost,
                    left_count: left.count,
                });
            }
        }
    }

    best
}

/// Everything a commit produces
pub(super) struct BuiltTree
{
    pub nodes: Arena<LightNode>,
    pub root: Option<Id<LightNode>>,
    pub lights: Vec<TreeLight>,
    pub distributions: LeafDistributions,
    pub reverse_map: ReverseMap,
    pub tree_power: f32,
    pub depth: usize,
}

/// Recursive top-down build over a light array it reorders in place
pub(super) struct TreeBuilder
{
    lights: Vec<TreeLight>,
    nodes: Arena<LightNode>,
    distributions: LeafDistributions,
    reverse_map: ReverseMap,
    tree_power: f32,
    depth: usize,
}

impl TreeBuilder
{
    pub fn new(lights: Vec<TreeLight>) -> Self
    {
        Self {
            lights,
            nodes: Arena::new(),
            distributions: LeafDistributions::default(),
            reverse_map: ReverseMap::default(),
            tree_power: 0.0,
            depth: 0,
        }
    }

    pub fn build(mut self) -> BuiltTree
    {
        let num_lights: usize = self.lights.len();
        let root: Option<Id<LightNode>> = (num_lights > 0).then(|| self.build_node(0, num_lights, None, 1));

        BuiltTree {
            nodes: self.nodes,
            root,
            lights: self.lights,
            distributions: self.distributions,
            reverse_map: self.reverse_map,
            tree_power: self.tree_power,
            depth: self.depth,
        }
    }

    fn build_node(&mut self, first: usize, count: usize, parent: Option<Id<LightNode>>, depth: usize) -> Id<LightNode>
    {
        debug_assert!(count > 0);
        self.depth = self.depth.max(depth);

        let lights: &[TreeLight] = &self.lights[first..(first + count)];

        let bounding_box: AABB = union_of(lights);
        let cone: OrientationCone = lights[1..].iter().fold(lights[0].cone, |c: OrientationCone, l: &TreeLight| c.union(l.cone));
        let power: f32 = lights.iter().map(|l| l.power).sum();
        let split: Option<SplitCandidate> = if count > 1 { find_split(lights, &bounding_box, &cone) } else { None };

        let id: Id<LightNode> = self.nodes.alloc(LightNode {
            bounding_box,
            cone,
            power,
            power_variance: power_variance(lights),
            parent,
            first_light_index: first as u32,
            num_lights: count as u32,
            node_type: LightNodeType::Leaf,
        });

        match split
        {
            Some(split) if split.cost < power =>
            {
                let lights: &mut [TreeLight] = &mut self.lights[first..(first + count)];
                glidesort::sort_by_key(lights, |l: &TreeLight| bucket_index(&bounding_box, l.centroid(), split.axis) > split.bucket);

                let num_left: usize = split.left_count as usize;
                debug_assert!(num_left > 0 && num_left < count);

                log::debug!(
                    "Splitting {} lights at bucket {} of axis {}, cost {} against power {}",
                    count,
                    split.bucket,
                    split.axis,
                    split.cost,
                    power
                );

                let left: Id<LightNode> = self.build_node(first, num_left, Some(id), depth + 1);
                let right: Id<LightNode> = self.build_node(first + num_left, count - num_left, Some(id), depth + 1);

                self.nodes[id].node_type = LightNodeType::Branch { left, right };
            }
            _ => self.make_leaf(id, first, count),
        }

        id
    }

    fn make_leaf(&mut self, id: Id<LightNode>, first: usize, count: usize)
    {
        let lights: &[TreeLight] = &self.lights[first..(first + count)];
        let powers: Vec<f32> = lights.iter().map(|l| l.power).collect();

        self.distributions.insert(first as u32, &powers);
        for (index, light) in lights.iter().enumerate()
        {
            self.reverse_map.insert(light.handle, LeafSlot { node: id, index: index as u32 });
        }

        self.tree_power += self.nodes[id].power;

        log::debug!("Leaf over lights {}..{}, power {}", first, first + count, self.nodes[id].power);
    }
}
