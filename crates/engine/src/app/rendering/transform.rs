use crate::app::Vec3;

pub const PIXELS_PER_WORLD: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Top-down projection of the ground plane: world +x is screen right and
/// world +z is screen down, centred on `focus`.
pub fn world_to_screen_px(
    world: Vec3,
    focus: Vec3,
    viewport: Viewport,
    pixels_per_world: f32,
) -> (i32, i32) {
    let x = (world.x - focus.x) * pixels_per_world + viewport.width as f32 * 0.5;
    let y = (world.z - focus.z) * pixels_per_world + viewport.height as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn focus_maps_to_viewport_center() {
        let focus = Vec3::new(12.0, 3.0, -7.0);
        assert_eq!(world_to_screen_px(focus, focus, VIEWPORT, 8.0), (400, 300));
    }

    #[test]
    fn positive_z_is_screen_down_and_height_is_ignored() {
        let (x, y) = world_to_screen_px(
            Vec3::new(2.0, 50.0, 5.0),
            Vec3::ZERO,
            VIEWPORT,
            10.0,
        );
        assert_eq!(x, 420);
        assert_eq!(y, 350);
    }
}
