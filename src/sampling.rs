use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::prelude::IntoParallelRefMutIterator;

const DIRECTIONS: [u32; 32] = [
    0x80000000, 0xc0000000, 0xa0000000, 0xf0000000, 0x88000000, 0xcc000000, 0xaa000000, 0xff000000, 0x80800000, 0xc0c00000, 0xa0a00000, 0xf0f00000,
    0x88880000, 0xcccc0000, 0xaaaa0000, 0xffff0000, 0x80008000, 0xc000c000, 0xa000a000, 0xf000f000, 0x88008800, 0xcc00cc00, 0xaa00aa00, 0xff00ff00,
    0x80808080, 0xc0c0c0c0, 0xa0a0a0a0, 0xf0f0f0f0, 0x88888888, 0xcccccccc, 0xaaaaaaaa, 0xffffffff,
];

/// Maps the top 24 bits of `x` into `[0, 1)`
fn to_unit_float(x: u32) -> f32 { (x >> 8) as f32 * (1.0 / (1u32 << 24) as f32) }

/// A wrapper struct around a vector of 2D Sobol points,
/// with helper functions to return shuffled and scrambled `f32` points.
/// The first dimension is the van der Corput sequence, which is what the light samplers consume.
pub struct SobolSampler
{
    sobol: Vec<glam::UVec2>,
}

impl SobolSampler
{
    /// Computes a single Sobol point
    fn sobol(index: u32) -> u32
    {
        DIRECTIONS.iter().enumerate().fold(0u32, |x, (bit, &direction)| {
            let mask: u32 = (index >> bit) & 1u32;
            x ^ (mask * direction)
        })
    }

    /// Generates the first `num_points` points. Shuffled indices wrap around, so a power of two keeps
    /// the sequence stratified.
    pub fn new(num_points: usize) -> Self
    {
        assert!(num_points > 0 && u32::try_from(num_points).is_ok(), "Invalid number of points");
        let mut sobol: Vec<glam::UVec2> = vec![glam::UVec2::ZERO; num_points];

        sobol.par_iter_mut().enumerate().for_each(|(i, point)| {
            let index: u32 = i as u32;
            *point = glam::UVec2::new(index.reverse_bits(), Self::sobol(index));
        });

        Self { sobol }
    }

    pub fn len(&self) -> usize { self.sobol.len() }

    pub fn is_empty(&self) -> bool { self.sobol.is_empty() }

    /// An improved Laine-Karras hash.
    ///
    /// Credit to: https://psychopath.io/post/2021_01_30_building_a_better_lk_hash
    fn lk_hash(mut x: u32, seed: u32) -> u32
    {
        x ^= x.wrapping_mul(0x3d20adea);
        x = x.wrapping_add(seed);
        x = x.wrapping_mul(seed.wrapping_shr(16) | 1);
        x ^= x.wrapping_mul(0x05526c56);
        x ^= x.wrapping_mul(0x53a22864);

        x
    }

    /// Scrambles a `u32` in base-2 using an LK hash
    fn scramble_base2(x: u32, seed: u32) -> u32 { Self::lk_hash(x.reverse_bits(), seed).reverse_bits() }

    /// A fast 32 bit 2-round hash, used to generate multiple seeds from sequential seeds
    ///
    /// Credit to: https://github.com/skeeto/hash-prospector
    fn low_bias_hash(mut x: u32) -> u32
    {
        x ^= x.wrapping_shr(16);
        x = x.wrapping_mul(0x21f0aaad);
        x ^= x.wrapping_shr(15);
        x = x.wrapping_mul(0xd35a2d97);
        x ^= x.wrapping_shr(15);

        x
    }

    fn shuffled_point(&self, index: u32, seed: u32) -> glam::UVec2
    {
        let shuffle_seed: u32 = Self::low_bias_hash(seed.wrapping_add(2));
        let shuffled_index: u32 = Self::scramble_base2(index, shuffle_seed);

        self.sobol[shuffled_index as usize % self.sobol.len()]
    }

    /// Returns a shuffled-scrambled Sobol point inside the unit square.
    ///
    /// Based almost entirely on an implementation by **Andrew Helmer**:
    /// https://www.reddit.com/r/GraphicsProgramming/comments/l1go2r/owenscrambled_sobol_02_sequences_shadertoy/
    pub fn get_ss_sobol(&self, index: u32, seed: u32) -> glam::Vec2
    {
        let x_seed: u32 = Self::low_bias_hash(seed);
        let y_seed: u32 = Self::low_bias_hash(seed.wrapping_add(1));

        let sobol_pt: glam::UVec2 = self.shuffled_point(index, seed);

        let x: u32 = Self::scramble_base2(sobol_pt.x, x_seed);
        let y: u32 = Self::scramble_base2(sobol_pt.y, y_seed);

        glam::Vec2::new(to_unit_float(x), to_unit_float(y))
    }

    /// First dimension only, in `[0, 1)`
    pub fn get_1d(&self, index: u32, seed: u32) -> f32
    {
        let x_seed: u32 = Self::low_bias_hash(seed);
        to_unit_float(Self::scramble_base2(self.shuffled_point(index, seed).x, x_seed))
    }
}

/// Discrete distribution over a fixed set of non-negative weights.
/// A set without any weight falls back to a uniform distribution.
#[derive(Clone, Debug)]
pub struct Distribution1D
{
    pmf: Vec<f32>,
    cdf: Vec<f32>,
    total: f32,
}

impl Distribution1D
{
    pub fn new(weights: &[f32]) -> Self
    {
        assert!(!weights.is_empty(), "Empty distribution");

        let total: f32 = weights.iter().sum();

        let pmf: Vec<f32> = if total > 0.0
        {
            weights.iter().map(|w| w / total).collect()
        }
        else
        {
            vec![1.0 / weights.len() as f32; weights.len()]
        };

        let mut cdf: Vec<f32> = pmf
            .iter()
            .scan(0.0, |state: &mut f32, &p: &f32| {
                *state += p;
                Some(*state)
            })
            .collect();

        // Pin the end of the cdf to one, starting at the last entry that can be picked,
        // so every u in [0, 1) lands on an entry with non-zero probability
        let last: usize = pmf.iter().rposition(|&p| p > 0.0).unwrap_or(pmf.len() - 1);
        cdf[last..].iter_mut().for_each(|c| *c = 1.0);

        Self { pmf, cdf, total }
    }

    pub fn len(&self) -> usize { self.pmf.len() }

    pub fn is_empty(&self) -> bool { self.pmf.is_empty() }

    /// Sum of the weights the distribution was built from
    pub fn total(&self) -> f32 { self.total }

    /// Picks an index with `u` in `[0, 1)`, returns it with its probability
    pub fn sample(&self, u: f32) -> (usize, f32)
    {
        let index: usize = self.cdf.partition_point(|&c| c <= u).min(self.cdf.len() - 1);
        (index, self.pmf[index])
    }

    pub fn pmf(&self, index: usize) -> f32 { self.pmf[index] }
}

#[cfg(test)]
mod tests
{
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn distribution_follows_weights()
    {
        let d: Distribution1D = Distribution1D::new(&[1.0, 3.0]);

        assert_eq!(d.sample(0.0), (0, 0.25));
        assert_eq!(d.sample(0.2499), (0, 0.25));
        assert_eq!(d.sample(0.25), (1, 0.75));
        assert_eq!(d.sample(0.999_999), (1, 0.75));
        assert_eq!(d.total(), 4.0);
    }

    #[test]
    fn zero_weights_are_never_picked()
    {
        let d: Distribution1D = Distribution1D::new(&[0.0, 2.0, 0.0, 2.0, 0.0]);

        for i in 0..1000
        {
            let (index, pmf): (usize, f32) = d.sample(i as f32 / 1000.0);
            assert!(index == 1 || index == 3);
            assert_eq!(pmf, 0.5);
        }
        assert_eq!(d.pmf(4), 0.0);
    }

    #[test]
    fn weightless_distribution_is_uniform()
    {
        let d: Distribution1D = Distribution1D::new(&[0.0, 0.0, 0.0, 0.0]);

        assert_eq!(d.sample(0.6), (2, 0.25));
        assert_eq!(d.pmf(0), 0.25);
    }

    #[test]
    fn van_der_corput_is_stratified()
    {
        let sobol: SobolSampler = SobolSampler::new(1024);
        let mut strata: [u32; 16] = [0; 16];

        for i in 0..1024
        {
            let u: f32 = sobol.get_1d(i, 17);
            assert!((0.0..1.0).contains(&u));
            strata[(u * 16.0) as usize] += 1;
        }

        assert!(strata.iter().all(|&count| count == 64), "{:?}", strata);
    }

    #[test]
    fn points_stay_in_the_unit_square()
    {
        let sobol: SobolSampler = SobolSampler::new(256);

        for i in 0..256
        {
            let p: glam::Vec2 = sobol.get_ss_sobol(i, 3);
            assert!((0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y));
        }
        assert_relative_eq!(to_unit_float(u32::MAX), 1.0 - 1.0 / (1u32 << 24) as f32);
    }
}
