use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{Entity, EntityKind, HudSnapshot, SceneWorld, Vec3};

use super::hud::{draw_hud, HostOverlay};
use super::{world_to_screen_px, Viewport, PIXELS_PER_WORLD};

const CLEAR_COLOR: [u8; 4] = [58, 92, 52, 255];
const GRID_CELL_WORLD: f32 = 5.0;
const GRID_MAJOR_EVERY: i32 = 4;
const GRID_MINOR_COLOR: [u8; 4] = [64, 100, 58, 255];
const GRID_MAJOR_COLOR: [u8; 4] = [78, 114, 70, 255];
const BUILDING_COLOR: [u8; 4] = [150, 120, 96, 255];
const PROP_COLOR: [u8; 4] = [96, 84, 70, 255];
const OUTLINE_COLOR: [u8; 4] = [36, 30, 26, 255];
const DOOR_CLOSED_COLOR: [u8; 4] = [120, 64, 32, 255];
const DOOR_OPEN_COLOR: [u8; 4] = [120, 220, 120, 255];
const MAIN_NPC_COLOR: [u8; 4] = [255, 200, 80, 255];
const BACKGROUND_NPC_COLOR: [u8; 4] = [120, 170, 230, 255];
const PLAYER_COLOR: [u8; 4] = [250, 250, 250, 255];
const HEADING_COLOR: [u8; 4] = [20, 20, 24, 255];
const ACTOR_HALF_SIZE_PX: i32 = 4;
const DOOR_HALF_SIZE_PX: i32 = 2;
const DOOR_LEAF_WORLD: f32 = 1.5;
const HEADING_TICK_WORLD: f32 = 1.5;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        hud: Option<&HudSnapshot>,
        host: &HostOverlay,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let focus = view_focus(world);
        draw_ground_grid(frame, viewport, focus);

        // Footprints first so actors and door markers stay on top.
        for entity in world.entities().iter().filter(|entity| entity.visible) {
            draw_footprint(frame, viewport, focus, entity);
        }
        for entity in world.entities().iter().filter(|entity| entity.visible) {
            draw_door_marker(frame, viewport, focus, entity);
            draw_actor(frame, viewport, focus, entity);
        }

        draw_hud(frame, viewport.width, viewport.height, hud, host);
        self.pixels.render()
    }
}

fn view_focus(world: &SceneWorld) -> Vec3 {
    world
        .entities()
        .iter()
        .find(|entity| entity.kind == EntityKind::Player)
        .map(|player| player.transform.position)
        .unwrap_or(world.camera().position)
}

fn draw_ground_grid(frame: &mut [u8], viewport: Viewport, focus: Vec3) {
    let half_w_world = viewport.width as f32 / (2.0 * PIXELS_PER_WORLD);
    let half_h_world = viewport.height as f32 / (2.0 * PIXELS_PER_WORLD);
    let ix_start = ((focus.x - half_w_world) / GRID_CELL_WORLD).floor() as i32;
    let ix_end = ((focus.x + half_w_world) / GRID_CELL_WORLD).ceil() as i32;
    let iz_start = ((focus.z - half_h_world) / GRID_CELL_WORLD).floor() as i32;
    let iz_end = ((focus.z + half_h_world) / GRID_CELL_WORLD).ceil() as i32;

    for ix in ix_start..=ix_end {
        let point = Vec3::new(ix as f32 * GRID_CELL_WORLD, 0.0, focus.z);
        let (x, _) = world_to_screen_px(point, focus, viewport, PIXELS_PER_WORLD);
        let color = grid_color(ix);
        for y in 0..viewport.height as i32 {
            write_pixel(frame, viewport, x, y, color);
        }
    }
    for iz in iz_start..=iz_end {
        let point = Vec3::new(focus.x, 0.0, iz as f32 * GRID_CELL_WORLD);
        let (_, y) = world_to_screen_px(point, focus, viewport, PIXELS_PER_WORLD);
        let color = grid_color(iz);
        for x in 0..viewport.width as i32 {
            write_pixel(frame, viewport, x, y, color);
        }
    }
}

fn grid_color(index: i32) -> [u8; 4] {
    if index.rem_euclid(GRID_MAJOR_EVERY) == 0 {
        GRID_MAJOR_COLOR
    } else {
        GRID_MINOR_COLOR
    }
}

fn draw_footprint(frame: &mut [u8], viewport: Viewport, focus: Vec3, entity: &Entity) {
    let Some(world_box) = entity.collider_world_box() else {
        return;
    };
    let (left, top) = world_to_screen_px(world_box.min, focus, viewport, PIXELS_PER_WORLD);
    let (right, bottom) = world_to_screen_px(world_box.max, focus, viewport, PIXELS_PER_WORLD);
    let color = if entity.large {
        BUILDING_COLOR
    } else {
        PROP_COLOR
    };
    fill_rect(frame, viewport, left, top, right, bottom, color);
    outline_rect(frame, viewport, left, top, right, bottom, OUTLINE_COLOR);
}

fn draw_door_marker(frame: &mut [u8], viewport: Viewport, focus: Vec3, entity: &Entity) {
    let Some(door) = entity.door.as_ref() else {
        return;
    };
    let hinge = door.interaction_point(entity.transform.position);
    let (cx, cy) = world_to_screen_px(hinge, focus, viewport, PIXELS_PER_WORLD);
    let color = if door.open {
        DOOR_OPEN_COLOR
    } else {
        DOOR_CLOSED_COLOR
    };
    let leaf_end = hinge + Vec3::from_heading(door.leaf_yaw) * DOOR_LEAF_WORLD;
    let (ex, ey) = world_to_screen_px(leaf_end, focus, viewport, PIXELS_PER_WORLD);
    draw_line(frame, viewport, (cx, cy), (ex, ey), color);
    fill_rect(
        frame,
        viewport,
        cx - DOOR_HALF_SIZE_PX,
        cy - DOOR_HALF_SIZE_PX,
        cx + DOOR_HALF_SIZE_PX,
        cy + DOOR_HALF_SIZE_PX,
        color,
    );
}

fn draw_actor(frame: &mut [u8], viewport: Viewport, focus: Vec3, entity: &Entity) {
    let color = match entity.kind {
        EntityKind::Player => PLAYER_COLOR,
        EntityKind::MainNpc => MAIN_NPC_COLOR,
        EntityKind::BackgroundNpc => BACKGROUND_NPC_COLOR,
        EntityKind::Door | EntityKind::StaticObstacle => return,
    };
    let position = entity.transform.position;
    let (cx, cy) = world_to_screen_px(position, focus, viewport, PIXELS_PER_WORLD);
    let half = (ACTOR_HALF_SIZE_PX as f32 * entity.scale.clamp(0.5, 2.0)).round() as i32;
    fill_rect(frame, viewport, cx - half, cy - half, cx + half, cy + half, color);

    let tip = position + Vec3::from_heading(entity.transform.yaw) * HEADING_TICK_WORLD;
    let (tx, ty) = world_to_screen_px(tip, focus, viewport, PIXELS_PER_WORLD);
    draw_line(frame, viewport, (cx, cy), (tx, ty), HEADING_COLOR);
}

fn fill_rect(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    color: [u8; 4],
) {
    let x0 = left.min(right).max(0);
    let x1 = left.max(right).min(viewport.width as i32 - 1);
    let y0 = top.min(bottom).max(0);
    let y1 = top.max(bottom).min(viewport.height as i32 - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            write_pixel(frame, viewport, x, y, color);
        }
    }
}

fn outline_rect(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    color: [u8; 4],
) {
    draw_line(frame, viewport, (left, top), (right, top), color);
    draw_line(frame, viewport, (right, top), (right, bottom), color);
    draw_line(frame, viewport, (right, bottom), (left, bottom), color);
    draw_line(frame, viewport, (left, bottom), (left, top), color);
}

fn draw_line(
    frame: &mut [u8],
    viewport: Viewport,
    from: (i32, i32),
    to: (i32, i32),
    color: [u8; 4],
) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let step_x = if x < to.0 { 1 } else { -1 };
    let step_y = if y < to.1 { 1 } else { -1 };
    let mut error = dx + dy;
    loop {
        write_pixel(frame, viewport, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }
}

fn write_pixel(frame: &mut [u8], viewport: Viewport, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let offset = (y as usize * viewport.width as usize + x as usize) * 4;
    if let Some(pixel) = frame.get_mut(offset..offset + 4) {
        pixel.copy_from_slice(&color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Aabb, EntityDesc};

    const VIEWPORT: Viewport = Viewport {
        width: 64,
        height: 48,
    };

    fn pixel_at(frame: &[u8], x: i32, y: i32) -> [u8; 4] {
        let offset = (y as usize * VIEWPORT.width as usize + x as usize) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn renderer_type_is_non_generic() {
        let _ = std::mem::size_of::<Renderer>();
    }

    #[test]
    fn view_focus_prefers_player_over_camera() {
        let mut world = SceneWorld::default();
        world.camera_mut().position = Vec3::new(-5.0, 3.0, -5.0);
        assert_eq!(view_focus(&world), Vec3::new(-5.0, 3.0, -5.0));

        world.spawn(EntityDesc::new(
            EntityKind::Player,
            "player",
            Vec3::new(4.0, 0.0, 2.0),
        ));
        world.apply_pending();
        assert_eq!(view_focus(&world), Vec3::new(4.0, 0.0, 2.0));
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut frame = vec![0u8; (VIEWPORT.width * VIEWPORT.height * 4) as usize];
        draw_line(&mut frame, VIEWPORT, (2, 3), (20, 11), PLAYER_COLOR);
        assert_eq!(pixel_at(&frame, 2, 3), PLAYER_COLOR);
        assert_eq!(pixel_at(&frame, 20, 11), PLAYER_COLOR);
    }

    #[test]
    fn drawing_outside_viewport_is_clipped() {
        let mut frame = vec![0u8; (VIEWPORT.width * VIEWPORT.height * 4) as usize];
        fill_rect(&mut frame, VIEWPORT, -10, -10, 200, 200, PROP_COLOR);
        draw_line(&mut frame, VIEWPORT, (-50, -50), (500, 400), PLAYER_COLOR);
        assert_eq!(frame.len(), (VIEWPORT.width * VIEWPORT.height * 4) as usize);
    }

    #[test]
    fn footprint_covers_collider_on_screen() {
        let mut frame = vec![0u8; (VIEWPORT.width * VIEWPORT.height * 4) as usize];
        let mut world = SceneWorld::default();
        world.spawn(
            EntityDesc::new(EntityKind::StaticObstacle, "hall", Vec3::ZERO)
                .with_collider(Aabb::new(
                    Vec3::new(-1.0, 0.0, -1.0),
                    Vec3::new(1.0, 3.0, 1.0),
                ))
                .large(true),
        );
        world.apply_pending();
        let entity = &world.entities()[0];
        draw_footprint(&mut frame, VIEWPORT, Vec3::ZERO, entity);
        assert_eq!(pixel_at(&frame, 32, 24), BUILDING_COLOR);
    }
}
