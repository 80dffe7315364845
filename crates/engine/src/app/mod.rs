mod culling;
mod input;
mod loop_runner;
mod math;
mod metrics;
mod rendering;
mod scene;
mod scheduler;
mod tween;

pub use culling::{Camera3D, Frustum, Plane};
pub use input::{InputAction, InputEdges};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use math::{bearing, wrap_angle, Aabb, Sphere, Vec3};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{world_to_screen_px, Renderer, Viewport, PIXELS_PER_WORLD};
pub use scene::{
    Collider, Door, Entity, EntityDesc, EntityId, EntityKind, HudDialogue, HudMessage,
    HudSnapshot, InputSnapshot, Scene, SceneCommand, SceneWorld, Transform,
    DOOR_OPEN_SWING_RADIANS,
};
pub use scheduler::{ScheduledEvent, Scheduler};
pub use tween::{ease_out_cubic, Tween};
