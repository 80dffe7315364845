use std::f32::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// World-space vector. `y` is up; the ground plane is x/z.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    pub fn normalized_or_zero(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON || !len.is_finite() {
            return Vec3::ZERO;
        }
        self * (1.0 / len)
    }

    /// Unit vector on the ground plane for a heading/yaw; 0 faces +x.
    pub fn from_heading(heading_radians: f32) -> Vec3 {
        Vec3 {
            x: heading_radians.cos(),
            y: 0.0,
            z: heading_radians.sin(),
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Heading on the ground plane pointing from `from` toward `to`.
pub fn bearing(from: Vec3, to: Vec3) -> f32 {
    (to.z - from.z).atan2(to.x - from.x)
}

/// Wraps an angle into `(-PI, PI]`.
pub fn wrap_angle(radians: f32) -> f32 {
    if !radians.is_finite() {
        return 0.0;
    }
    let wrapped = (radians + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Axis-aligned box. Touching faces count as intersecting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: Vec3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Vec3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Box standing on `base` (feet position) with the given full extents.
    pub fn from_footprint(base: Vec3, width: f32, height: f32, depth: f32) -> Self {
        let half_w = width * 0.5;
        let half_d = depth * 0.5;
        Self::new(
            Vec3::new(base.x - half_w, base.y, base.z - half_d),
            Vec3::new(base.x + half_w, base.y + height, base.z + half_d),
        )
    }

    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn bounding_sphere(&self) -> Sphere {
        Sphere {
            center: self.center(),
            radius: self.half_extents().length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Sphere {
        Sphere {
            center: self.center + offset,
            radius: self.radius,
        }
    }

    pub fn inflated(&self, factor: f32) -> Sphere {
        Sphere {
            center: self.center,
            radius: self.radius * factor,
        }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn separated_boxes_do_not_intersect_on_any_axis() {
        let a = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let above = a.translated(Vec3::new(0.0, 1.5, 0.0));
        let beside = a.translated(Vec3::new(0.0, 0.0, -1.01));
        assert!(!a.intersects(&above));
        assert!(!a.intersects(&beside));
    }

    #[test]
    fn new_orders_corners() {
        let aabb = Aabb::new(Vec3::new(2.0, 3.0, -1.0), Vec3::new(-2.0, 0.0, 1.0));
        assert_eq!(aabb.min, Vec3::new(-2.0, 0.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(2.0, 3.0, 1.0));
    }

    #[test]
    fn footprint_box_stands_on_base() {
        let aabb = Aabb::from_footprint(Vec3::new(5.0, 0.0, 5.0), 1.0, 2.0, 1.0);
        assert_eq!(aabb.min, Vec3::new(4.5, 0.0, 4.5));
        assert_eq!(aabb.max, Vec3::new(5.5, 2.0, 5.5));
    }

    #[test]
    fn bearing_zero_faces_positive_x() {
        let heading = bearing(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));
        assert!(heading.abs() < 1e-6);
        let dir = Vec3::from_heading(heading);
        assert!((dir.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn wrap_angle_stays_in_half_open_range() {
        for raw in [-10.0f32, -PI, 0.0, PI, 3.5 * PI, 100.0] {
            let wrapped = wrap_angle(raw);
            assert!(wrapped > -PI - 1e-5 && wrapped <= PI + 1e-5, "{raw} -> {wrapped}");
            assert!((wrapped.cos() - raw.cos()).abs() < 1e-4);
            assert!((wrapped.sin() - raw.sin()).abs() < 1e-4);
        }
    }

    #[test]
    fn bounding_sphere_covers_corners() {
        let aabb = Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 4.0, 2.0));
        let sphere = aabb.bounding_sphere();
        assert!(sphere.center.distance(aabb.max) <= sphere.radius + 1e-5);
        assert!(sphere.center.distance(aabb.min) <= sphere.radius + 1e-5);
    }
}
