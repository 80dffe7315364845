mod hud;
mod renderer;
mod transform;

pub(crate) use hud::HostOverlay;
pub use renderer::Renderer;
pub use transform::{world_to_screen_px, Viewport, PIXELS_PER_WORLD};
