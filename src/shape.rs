use glam::Vec3;

/// A region of space that can drive a cast.
///
/// Only [`contains_point`](Shape::contains_point) and [`intersects_aabb`](Shape::intersects_aabb) are required. The box
/// containment tests default to checking the 8 corners of the box, which is exact for convex shapes; override them when
/// a cheaper or tighter test exists.
///
/// Boxes passed to these methods are `[min, max]` cell bounds.
pub trait Shape {
    fn contains_point(&self, point: Vec3) -> bool;

    /// True if any part of the box overlaps the shape. May be conservative (return true for a miss), never the reverse.
    fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool;

    /// True if the whole box lies inside the shape.
    #[inline]
    fn contains_aabb(&self, min: Vec3, max: Vec3) -> bool {
        aabb_corners(min, max)
            .into_iter()
            .all(|corner| self.contains_point(corner))
    }

    #[inline]
    fn is_point_outside(&self, point: Vec3) -> bool {
        !self.contains_point(point)
    }

    /// True if some part of the box may lie outside the shape.
    #[inline]
    fn is_aabb_not_fully_inside(&self, min: Vec3, max: Vec3) -> bool {
        !self.contains_aabb(min, max)
    }
}

/// The 8 corners of the box `[min, max]`.
#[inline]
pub fn aabb_corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
    ]
}

/// Closed axis-aligned box `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }
}

impl Shape for Aabb {
    #[inline]
    fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    #[inline]
    fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        self.min.cmple(max).all() && self.max.cmpge(min).all()
    }

    #[inline]
    fn contains_aabb(&self, min: Vec3, max: Vec3) -> bool {
        min.cmpge(self.min).all() && max.cmple(self.max).all()
    }

    /// Outside on any single axis is enough.
    #[inline]
    fn is_point_outside(&self, point: Vec3) -> bool {
        point.cmplt(self.min).any() || point.cmpgt(self.max).any()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    #[inline]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Shape for Sphere {
    #[inline]
    fn contains_point(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    #[inline]
    fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        let closest = self.center.clamp(min, max);
        closest.distance_squared(self.center) <= self.radius * self.radius
    }
}

/// Contains every point. Casting with it enumerates the whole tree without a single containment test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Everywhere;

impl Shape for Everywhere {
    #[inline]
    fn contains_point(&self, _point: Vec3) -> bool {
        true
    }

    #[inline]
    fn intersects_aabb(&self, _min: Vec3, _max: Vec3) -> bool {
        true
    }

    #[inline]
    fn contains_aabb(&self, _min: Vec3, _max: Vec3) -> bool {
        true
    }
}

impl<S: Shape + ?Sized> Shape for &S {
    #[inline]
    fn contains_point(&self, point: Vec3) -> bool {
        (**self).contains_point(point)
    }

    #[inline]
    fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        (**self).intersects_aabb(min, max)
    }

    #[inline]
    fn contains_aabb(&self, min: Vec3, max: Vec3) -> bool {
        (**self).contains_aabb(min, max)
    }

    #[inline]
    fn is_point_outside(&self, point: Vec3) -> bool {
        (**self).is_point_outside(point)
    }

    #[inline]
    fn is_aabb_not_fully_inside(&self, min: Vec3, max: Vec3) -> bool {
        (**self).is_aabb_not_fully_inside(min, max)
    }
}

impl<S: Shape + ?Sized> Shape for Box<S> {
    #[inline]
    fn contains_point(&self, point: Vec3) -> bool {
        (**self).contains_point(point)
    }

    #[inline]
    fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        (**self).intersects_aabb(min, max)
    }

    #[inline]
    fn contains_aabb(&self, min: Vec3, max: Vec3) -> bool {
        (**self).contains_aabb(min, max)
    }

    #[inline]
    fn is_point_outside(&self, point: Vec3) -> bool {
        (**self).is_point_outside(point)
    }

    #[inline]
    fn is_aabb_not_fully_inside(&self, min: Vec3, max: Vec3) -> bool {
        (**self).is_aabb_not_fully_inside(min, max)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
