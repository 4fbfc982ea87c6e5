use ambassador::delegatable_trait;
use glam::swizzles::Vec3Swizzles;

use crate::utility::INFINITY;

#[delegatable_trait]
pub trait HasBox
{
    fn get_box(&self) -> &AABB;
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AABB
{
    minimum: glam::Vec3A,
    maximum: glam::Vec3A,
}

impl Default for AABB
{
    fn default() -> Self
    {
        Self {
            minimum: glam::Vec3A::ZERO,
            maximum: glam::Vec3A::ZERO,
        }
    }
}

impl AABB
{
    pub fn new(minimum: glam::Vec3A, maximum: glam::Vec3A) -> Self
    {
        debug_assert!(minimum.cmple(maximum).all());

        Self { minimum, maximum }
    }

    /// A degenerate box around a single point
    pub fn from_point(p: glam::Vec3A) -> Self { Self { minimum: p, maximum: p } }

    /// The empty box, neutral element of [`surrounding_box`]
    pub fn identity() -> Self
    {
        Self {
            minimum: glam::Vec3A::splat(INFINITY),
            maximum: glam::Vec3A::splat(-INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool { self.minimum.cmpgt(self.maximum).any() }

    pub fn is_finite(&self) -> bool { self.minimum.is_finite() && self.maximum.is_finite() }

    pub fn length(&self) -> glam::Vec3A { self.maximum - self.minimum }

    pub fn center(&self) -> glam::Vec3A { 0.5 * (self.minimum + self.maximum) }

    /// Length of the main diagonal
    pub fn diagonal(&self) -> f32 { self.length().length() }

    pub fn longest_extent(&self) -> f32 { self.length().max_element() }

    pub fn surface_area(&self) -> f32
    {
        let v: glam::Vec3A = self.maximum - self.minimum;

        2.0 * glam::Vec3A::dot(v, v.zxy())
    }

    /// Position of `p` relative to the box along `axis`, `0` at the minimum corner and `1` at the maximum.
    /// Zero-extent axes map everything to `0`.
    pub fn offset(&self, p: glam::Vec3A, axis: usize) -> f32
    {
        let extent: f32 = self.maximum[axis] - self.minimum[axis];

        if extent > 0.0
        {
            (p[axis] - self.minimum[axis]) / extent
        }
        else
        {
            0.0
        }
    }

    pub fn contains(&self, other: &AABB) -> bool { self.minimum.cmple(other.minimum).all() && self.maximum.cmpge(other.maximum).all() }
}

impl HasBox for AABB
{
    fn get_box(&self) -> &AABB { self }
}

/// Union of the boxes of every item
pub fn union_of<'a, N>(items: impl IntoIterator<Item = &'a N>) -> AABB
where
    N: HasBox + 'a,
{
    items.into_iter().fold(AABB::identity(), |a: AABB, b: &N| surrounding_box(&a, b.get_box()))
}

pub fn surrounding_box(a: &AABB, b: &AABB) -> AABB
{
    let minimum: glam::Vec3A = glam::Vec3A::min(a.minimum, b.minimum);
    let maximum: glam::Vec3A = glam::Vec3A::max(a.maximum, b.maximum);

    // Not AABB::new, either side may still be the identity
    AABB { minimum, maximum }
}

#[cfg(test)]
mod tests
{
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn identity_is_neutral()
    {
        let b: AABB = AABB::new(glam::Vec3A::new(-1.0, 0.0, 2.0), glam::Vec3A::new(1.0, 3.0, 4.0));

        assert!(AABB::identity().is_empty());
        assert_eq!(surrounding_box(&AABB::identity(), &b), b);
        assert_eq!(surrounding_box(&b, &AABB::identity()), b);
    }

    #[test]
    fn measures()
    {
        let b: AABB = AABB::new(glam::Vec3A::ZERO, glam::Vec3A::new(1.0, 2.0, 3.0));

        assert_relative_eq!(b.surface_area(), 22.0);
        assert_relative_eq!(b.diagonal(), 14.0f32.sqrt());
        assert_relative_eq!(b.longest_extent(), 3.0);
        assert_eq!(b.center(), glam::Vec3A::new(0.5, 1.0, 1.5));
        assert_relative_eq!(b.offset(glam::Vec3A::new(0.0, 1.0, 0.75), 1), 0.5);
        assert_relative_eq!(b.offset(glam::Vec3A::new(0.0, 1.0, 0.75), 2), 0.25);
    }

    #[test]
    fn degenerate_point_box()
    {
        let p: glam::Vec3A = glam::Vec3A::new(4.0, 5.0, 6.0);
        let b: AABB = AABB::from_point(p);

        assert!(!b.is_empty());
        assert_eq!(b.surface_area(), 0.0);
        assert_eq!(b.diagonal(), 0.0);
        assert_eq!(b.offset(p, 0), 0.0);
        assert_eq!(b.center(), p);
    }

    #[test]
    fn union_of_many()
    {
        let boxes: [AABB; 3] = [
            AABB::from_point(glam::Vec3A::new(1.0, -1.0, 0.0)),
            AABB::from_point(glam::Vec3A::new(-1.0, 2.0, 0.5)),
            AABB::new(glam::Vec3A::ZERO, glam::Vec3A::ONE),
        ];

        assert_eq!(union_of(&boxes), AABB::new(glam::Vec3A::new(-1.0, -1.0, 0.0), glam::Vec3A::new(1.0, 2.0, 1.0)));
        assert!(union_of::<AABB>(&[]).is_empty());
    }

    #[test]
    fn union_contains_both()
    {
        let a: AABB = AABB::new(glam::Vec3A::ZERO, glam::Vec3A::ONE);
        let b: AABB = AABB::from_point(glam::Vec3A::new(-2.0, 0.5, 3.0));
        let u: AABB = surrounding_box(&a, &b);

        assert!(u.contains(&a));
        assert!(u.contains(&b));
    }
}
