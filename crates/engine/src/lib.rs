pub mod app;
pub mod content;
mod paths;

pub use app::{
    bearing, ease_out_cubic, run_app, run_app_with_metrics, world_to_screen_px, wrap_angle, Aabb,
    AppError, Camera3D, Collider, Door, Entity, EntityDesc, EntityId, EntityKind, Frustum,
    HudDialogue, HudMessage, HudSnapshot, InputAction, InputEdges, InputSnapshot, LoopConfig,
    LoopMetricsSnapshot, MetricsHandle, Plane, Renderer, Scene, SceneCommand, SceneWorld,
    ScheduledEvent, Scheduler, Sphere, Transform, Tween, Vec3, Viewport,
    DOOR_OPEN_SWING_RADIANS, PIXELS_PER_WORLD, SLOW_FRAME_ENV_VAR,
};
pub use content::{
    compile_sources, compile_town_defs, ChallengeDef, ContentCompileError, ContentErrorCode,
    ContentSource, DialogueDef, DoorDef, NpcDef, NpcTier, ObjectDef, ReplyRule, SourceLocation,
    StepDef, StepTrigger, TownDefs,
};

pub use paths::{
    resolve_app_paths, resolve_paths_with, AppPaths, PathOverrides, StartupError,
    CONTENT_ENV_VAR, ROOT_ENV_VAR,
};
