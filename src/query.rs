//! Cast entry points on [`Tree`] and helpers that drain a cast into a collection.
//!
//! Sphere and box parameters are checked before any traversal starts; a negative radius or inverted box is reported as
//! a [`TreeError`] instead of silently returning nothing.

use crate::cursor::{
    AabbCast, Cursor, Exclusion, Inclusion, InverseAabbCast, InverseShapeCast, InverseSphereCast, ShapeCast,
    SphereCast, Walk,
};
use crate::error::check_finite;
use crate::shape::{Aabb, Shape, Sphere};
use crate::{Tree, TreeError};

use glam::Vec3;

impl Sphere {
    /// A sphere with a finite center and a finite, non-negative radius.
    pub fn try_new(center: Vec3, radius: f32) -> Result<Self, TreeError> {
        check_finite(center)?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(TreeError::InvalidRadius(radius));
        }
        Ok(Self::new(center, radius))
    }
}

impl Aabb {
    /// A box with finite corners and `min <= max` on every axis.
    pub fn try_new(min: Vec3, max: Vec3) -> Result<Self, TreeError> {
        check_finite(min)?;
        check_finite(max)?;
        if min.cmpgt(max).any() {
            return Err(TreeError::InvalidBounds { min, max });
        }
        Ok(Self::new(min, max))
    }
}

impl<T> Tree<T> {
    /// Items within `radius` of `center`, boundary included.
    pub fn sphere_cast(&self, center: Vec3, radius: f32) -> Result<SphereCast<'_, T>, TreeError> {
        Ok(Cursor::new(self, Sphere::try_new(center, radius)?))
    }

    /// Items in the closed box `[min, max]`.
    pub fn aabb_cast(&self, min: Vec3, max: Vec3) -> Result<AabbCast<'_, T>, TreeError> {
        Ok(Cursor::new(self, Aabb::try_new(min, max)?))
    }

    /// Items inside `shape`.
    pub fn shape_cast<S: Shape>(&self, shape: S) -> ShapeCast<'_, T, S> {
        Cursor::new(self, shape)
    }

    /// Items farther than `radius` from `center`.
    pub fn inverse_sphere_cast(&self, center: Vec3, radius: f32) -> Result<InverseSphereCast<'_, T>, TreeError> {
        Ok(Cursor::new(self, Sphere::try_new(center, radius)?))
    }

    /// Items outside the closed box `[min, max]`.
    pub fn inverse_aabb_cast(&self, min: Vec3, max: Vec3) -> Result<InverseAabbCast<'_, T>, TreeError> {
        Ok(Cursor::new(self, Aabb::try_new(min, max)?))
    }

    /// Items outside `shape`.
    pub fn inverse_shape_cast<S: Shape>(&self, shape: S) -> InverseShapeCast<'_, T, S> {
        Cursor::new(self, shape)
    }
}

/// Pushes every item the cursor yields into `results`. Returns how many were pushed.
pub fn drain_into<'t, T, S, W>(cursor: Cursor<'t, T, S, W>, results: &mut impl Extend<&'t T>) -> usize
where
    S: Shape,
    W: Walk,
{
    let mut count = 0;
    results.extend(cursor.inspect(|_| count += 1));
    count
}

pub fn sphere_cast_into<'t, T>(
    tree: &'t Tree<T>,
    center: Vec3,
    radius: f32,
    results: &mut impl Extend<&'t T>,
) -> Result<usize, TreeError> {
    Ok(drain_into(tree.sphere_cast(center, radius)?, results))
}

pub fn aabb_cast_into<'t, T>(
    tree: &'t Tree<T>,
    min: Vec3,
    max: Vec3,
    results: &mut impl Extend<&'t T>,
) -> Result<usize, TreeError> {
    Ok(drain_into(tree.aabb_cast(min, max)?, results))
}

pub fn shape_cast_into<'t, T, S: Shape>(tree: &'t Tree<T>, shape: S, results: &mut impl Extend<&'t T>) -> usize {
    drain_into(Cursor::<_, _, Inclusion>::new(tree, shape), results)
}

pub fn inverse_sphere_cast_into<'t, T>(
    tree: &'t Tree<T>,
    center: Vec3,
    radius: f32,
    results: &mut impl Extend<&'t T>,
) -> Result<usize, TreeError> {
    Ok(drain_into(tree.inverse_sphere_cast(center, radius)?, results))
}

pub fn inverse_aabb_cast_into<'t, T>(
    tree: &'t Tree<T>,
    min: Vec3,
    max: Vec3,
    results: &mut impl Extend<&'t T>,
) -> Result<usize, TreeError> {
    Ok(drain_into(tree.inverse_aabb_cast(min, max)?, results))
}

pub fn inverse_shape_cast_into<'t, T, S: Shape>(
    tree: &'t Tree<T>,
    shape: S,
    results: &mut impl Extend<&'t T>,
) -> usize {
    drain_into(Cursor::<_, _, Exclusion>::new(tree, shape), results)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
