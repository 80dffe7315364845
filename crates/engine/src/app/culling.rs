use super::math::{Sphere, Vec3};

pub const DEFAULT_FOV_Y_RADIANS: f32 = 1.047_197_6;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 200.0;

/// Perspective camera pose. `yaw` uses the same heading convention as
/// entities (0 faces +x); positive `pitch` looks up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fov_y_radians: DEFAULT_FOV_Y_RADIANS,
            aspect: 16.0 / 9.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

impl Camera3D {
    pub fn forward(&self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        Vec3::new(
            self.yaw.cos() * cos_pitch,
            self.pitch.sin(),
            self.yaw.sin() * cos_pitch,
        )
    }

    pub fn set_aspect_from_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_camera(self)
    }
}

/// Plane `normal . p + d = 0`; positive side is inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    fn through_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalized_or_zero();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    pub fn from_camera(camera: &Camera3D) -> Self {
        let forward = camera.forward().normalized_or_zero();
        let mut right = forward.cross(Vec3::UP).normalized_or_zero();
        if right == Vec3::ZERO {
            // Looking straight up or down; any horizontal axis works.
            right = Vec3::from_heading(camera.yaw + std::f32::consts::FRAC_PI_2);
        }
        let up = right.cross(forward).normalized_or_zero();

        let half_v = (camera.fov_y_radians * 0.5).clamp(0.01, 1.55);
        let half_h = (half_v.tan() * camera.aspect.max(0.01)).atan();
        let (sin_h, cos_h) = half_h.sin_cos();
        let (sin_v, cos_v) = half_v.sin_cos();
        let eye = camera.position;

        let left_plane = Plane::through_point(forward * sin_h + right * cos_h, eye);
        let right_plane = Plane::through_point(forward * sin_h - right * cos_h, eye);
        let bottom_plane = Plane::through_point(forward * sin_v + up * cos_v, eye);
        let top_plane = Plane::through_point(forward * sin_v - up * cos_v, eye);
        let near_plane = Plane::through_point(forward, eye + forward * camera.near);
        let far_plane = Plane::through_point(-forward, eye + forward * camera.far);

        Self {
            planes: [
                left_plane,
                right_plane,
                bottom_plane,
                top_plane,
                near_plane,
                far_plane,
            ],
        }
    }

    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(sphere.center) >= -sphere.radius)
    }
}
