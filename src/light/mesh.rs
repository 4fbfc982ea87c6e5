use std::f32::consts::PI;

use crate::boundingbox::{surrounding_box, AABB};
use crate::cone::OrientationCone;
use crate::light::{Emitter, Light};
use crate::utility::angle_between;

/// Diffuse area light over a triangle mesh, with the same irradiance over every triangle
pub struct MeshLight
{
    triangles: Vec<[glam::Vec3A; 3]>,
    irradiance: f32,
    two_sided: bool,
    bounding_box: AABB,
    cone: OrientationCone,
    area: f32,
}

impl MeshLight
{
    pub fn new(triangles: Vec<[glam::Vec3A; 3]>, irradiance: f32, two_sided: bool) -> Light
    {
        let bounding_box: AABB = triangles
            .iter()
            .fold(AABB::identity(), |b: AABB, t: &[glam::Vec3A; 3]| surrounding_box(&b, &triangle_bounds(t)));

        let area: f32 = triangles.iter().map(|t| 0.5 * face_normal(t).length()).sum();

        // Area weighted normal, unnormalised cross products are already weighted by twice the area
        let mean_normal: glam::Vec3A = triangles.iter().map(face_normal).fold(glam::Vec3A::ZERO, |a, n| a + n);

        let cone: OrientationCone = if two_sided || mean_normal.length_squared() == 0.0
        {
            OrientationCone::full_sphere()
        }
        else
        {
            let axis: glam::Vec3A = mean_normal.normalize();
            let theta_o: f32 = triangles
                .iter()
                .map(face_normal)
                .filter(|n| n.length_squared() > 0.0)
                .map(|n| angle_between(axis, n.normalize()))
                .fold(0.0, f32::max);

            OrientationCone::new(axis, theta_o, std::f32::consts::FRAC_PI_2)
        };

        Self {
            triangles,
            irradiance,
            two_sided,
            bounding_box,
            cone,
            area,
        }
        .into()
    }

    /// Builds the triangle list from an indexed mesh
    pub fn from_indexed(positions: &[glam::Vec3A], indices: &[[u32; 3]], irradiance: f32, two_sided: bool) -> Light
    {
        let triangles: Vec<[glam::Vec3A; 3]> = indices
            .iter()
            .map(|&[a, b, c]| [positions[a as usize], positions[b as usize], positions[c as usize]])
            .collect();

        Self::new(triangles, irradiance, two_sided)
    }

    pub fn triangle_count(&self) -> usize { self.triangles.len() }

    pub fn area(&self) -> f32 { self.area }

    pub fn triangle_as_light(&self, index: usize) -> TriangleLight
    {
        let vertices: [glam::Vec3A; 3] = self.triangles[index];
        let normal: glam::Vec3A = face_normal(&vertices);

        TriangleLight {
            vertices,
            normal: normal.normalize_or_zero(),
            area: 0.5 * normal.length(),
            irradiance: self.irradiance,
            two_sided: self.two_sided,
            index: index as u32,
        }
    }

    /// One light per triangle, in triangle order
    pub fn decompose(&self) -> impl Iterator<Item = TriangleLight> + '_ { (0..self.triangle_count()).map(|i| self.triangle_as_light(i)) }
}

impl Emitter for MeshLight
{
    fn bounds(&self) -> AABB { self.bounding_box }

    fn cone(&self) -> OrientationCone { self.cone }

    fn power(&self) -> f32 { self.irradiance * self.area }
}

/// View over one triangle of a [`MeshLight`], owned by the light sampler that split the mesh
#[derive(Copy, Clone, Debug)]
pub struct TriangleLight
{
    vertices: [glam::Vec3A; 3],
    normal: glam::Vec3A,
    area: f32,
    irradiance: f32,
    two_sided: bool,
    index: u32,
}

impl TriangleLight
{
    /// Index of the triangle inside its mesh
    pub fn index(&self) -> u32 { self.index }
}

impl Emitter for TriangleLight
{
    fn bounds(&self) -> AABB { triangle_bounds(&self.vertices) }

    fn cone(&self) -> OrientationCone
    {
        if self.normal == glam::Vec3A::ZERO
        {
            OrientationCone::full_sphere()
        }
        else
        {
            OrientationCone::new(self.normal, if self.two_sided { PI } else { 0.0 }, std::f32::consts::FRAC_PI_2)
        }
    }

    fn power(&self) -> f32 { self.irradiance * self.area }
}

fn face_normal(t: &[glam::Vec3A; 3]) -> glam::Vec3A { glam::Vec3A::cross(t[1] - t[0], t[2] - t[0]) }

fn triangle_bounds(t: &[glam::Vec3A; 3]) -> AABB
{
    t.iter().fold(AABB::identity(), |b: AABB, &p: &glam::Vec3A| surrounding_box(&b, &AABB::from_point(p)))
}
