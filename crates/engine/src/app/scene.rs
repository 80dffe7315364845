use std::f32::consts::FRAC_PI_2;

use super::culling::Camera3D;
use super::input::{ActionStates, InputAction, InputEdges};
use super::math::{Aabb, Sphere, Vec3};
use super::tween::Tween;

pub const DOOR_OPEN_SWING_RADIANS: f32 = -FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Restart,
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    edges: InputEdges,
    chat_submitted: Option<String>,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        edges: InputEdges,
        chat_submitted: Option<String>,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            edges,
            chat_submitted,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn edges(&self) -> InputEdges {
        self.edges
    }

    pub fn chat_submitted(&self) -> Option<&str> {
        self.chat_submitted.as_deref()
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_edges(mut self, edges: InputEdges) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_interact_pressed(mut self) -> Self {
        self.edges.interact = true;
        self
    }

    pub fn with_chat_submitted(mut self, text: impl Into<String>) -> Self {
        self.chat_submitted = Some(text.into());
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    MainNpc,
    BackgroundNpc,
    Door,
    StaticObstacle,
}

impl EntityKind {
    pub fn is_npc(self) -> bool {
        matches!(self, Self::MainNpc | Self::BackgroundNpc)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub yaw: f32,
}

/// Static collision volume in the owner's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub local: Aabb,
}

impl Collider {
    pub fn new(local: Aabb) -> Self {
        Self { local }
    }

    pub fn world_box(&self, owner_position: Vec3) -> Aabb {
        self.local.translated(owner_position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    pub open: bool,
    pub local_offset: Vec3,
    pub label: String,
    pub closed_yaw: f32,
    pub leaf_yaw: f32,
    pub swing: Option<Tween>,
}

impl Door {
    pub fn new(label: impl Into<String>, local_offset: Vec3, closed_yaw: f32) -> Self {
        Self {
            open: false,
            local_offset,
            label: label.into(),
            closed_yaw,
            leaf_yaw: closed_yaw,
            swing: None,
        }
    }

    pub fn interaction_point(&self, owner_position: Vec3) -> Vec3 {
        owner_position + self.local_offset
    }

    pub fn target_yaw(&self) -> f32 {
        if self.open {
            self.closed_yaw + DOOR_OPEN_SWING_RADIANS
        } else {
            self.closed_yaw
        }
    }

    /// Flips the open flag and restarts the swing from the current leaf
    /// angle. Returns the new open state.
    pub fn toggle(&mut self, now_tick: u64, swing_duration_ticks: u64) -> bool {
        self.open = !self.open;
        self.swing = Some(Tween::new(
            self.leaf_yaw,
            self.target_yaw(),
            now_tick,
            swing_duration_ticks,
        ));
        self.open
    }

    pub fn advance_swing(&mut self, now_tick: u64) {
        let Some(swing) = self.swing else {
            return;
        };
        self.leaf_yaw = swing.sample(now_tick);
        if swing.is_finished(now_tick) {
            self.leaf_yaw = swing.to;
            self.swing = None;
        }
    }
}

/// Everything needed to spawn an entity; optional components are attached
/// by presence.
#[derive(Debug, Clone)]
pub struct EntityDesc {
    pub kind: EntityKind,
    pub name: String,
    pub transform: Transform,
    pub collider: Option<Collider>,
    pub door: Option<Door>,
    pub local_bounds: Sphere,
    pub large: bool,
    pub tags: Vec<String>,
    pub scale: f32,
}

impl EntityDesc {
    pub fn new(kind: EntityKind, name: impl Into<String>, position: Vec3) -> Self {
        Self {
            kind,
            name: name.into(),
            transform: Transform { position, yaw: 0.0 },
            collider: None,
            door: None,
            local_bounds: Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0),
            large: false,
            tags: Vec::new(),
            scale: 1.0,
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.transform.yaw = yaw;
        self
    }

    /// Attaches a collider and derives the culling bounds from it.
    pub fn with_collider(mut self, local: Aabb) -> Self {
        self.local_bounds = local.bounding_sphere();
        self.collider = Some(Collider::new(local));
        self
    }

    pub fn with_door(mut self, door: Door) -> Self {
        self.door = Some(door);
        self
    }

    pub fn with_bounds(mut self, local_bounds: Sphere) -> Self {
        self.local_bounds = local_bounds;
        self
    }

    pub fn large(mut self, large: bool) -> Self {
        self.large = large;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub transform: Transform,
    pub collider: Option<Collider>,
    pub door: Option<Door>,
    pub local_bounds: Sphere,
    pub large: bool,
    pub tags: Vec<String>,
    pub scale: f32,
    pub visible: bool,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn world_bounds(&self) -> Sphere {
        self.local_bounds.translated(self.transform.position)
    }

    pub fn collider_world_box(&self) -> Option<Aabb> {
        self.collider
            .map(|collider| collider.world_box(self.transform.position))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    pub fn spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    next_applied_spawn_order: u64,
    camera: Camera3D,
    npc_ids: Vec<EntityId>,
    door_ids: Vec<EntityId>,
}

impl SceneWorld {
    /// Queues an entity; it becomes visible to queries after `apply_pending`.
    pub fn spawn(&mut self, desc: EntityDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            kind: desc.kind,
            name: desc.name,
            transform: desc.transform,
            collider: desc.collider,
            door: desc.door,
            local_bounds: desc.local_bounds,
            large: desc.large,
            tags: desc.tags,
            scale: desc.scale,
            visible: true,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn apply_pending(&mut self) {
        if self.pending_spawns.is_empty() {
            return;
        }
        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            if entity.kind.is_npc() {
                self.npc_ids.push(entity.id);
            }
            if entity.door.is_some() {
                self.door_ids.push(entity.id);
            }
            self.entities.push(entity);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera3D::default();
        self.npc_ids.clear();
        self.door_ids.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn npc_ids(&self) -> &[EntityId] {
        &self.npc_ids
    }

    pub fn door_ids(&self) -> &[EntityId] {
        &self.door_ids
    }

    /// World-space boxes of every registered collider, recomputed from the
    /// owners' current positions on each call.
    pub fn colliders(&self) -> impl Iterator<Item = (EntityId, Aabb)> + '_ {
        self.entities.iter().filter_map(|entity| {
            entity
                .collider_world_box()
                .map(|world_box| (entity.id, world_box))
        })
    }

    pub fn advance_door_swings(&mut self, now_tick: u64) {
        for index in 0..self.door_ids.len() {
            let id = self.door_ids[index];
            if let Some(door) = self
                .find_entity_mut(id)
                .and_then(|entity| entity.door.as_mut())
            {
                door.advance_swing(now_tick);
            }
        }
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera3D {
        &mut self.camera
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudDialogue {
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudMessage {
    pub label: String,
    pub text: String,
}

/// Text the host draws over the world view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HudSnapshot {
    pub dialogue: Option<HudDialogue>,
    pub message: Option<HudMessage>,
    pub objective_lines: Vec<String>,
    pub menu_lines: Option<Vec<String>>,
    pub visible_count: usize,
    pub hidden_count: usize,
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn hud_snapshot(&self, _world: &SceneWorld) -> Option<HudSnapshot> {
        None
    }
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load_if_needed(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        let command = self.scene.update(fixed_dt_seconds, input, &mut self.world);
        self.world.apply_pending();
        command
    }

    /// Full in-memory reset: unload, wipe the world, load again.
    pub(crate) fn hard_reset(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        self.world.clear();
        self.is_loaded = false;
        self.load_if_needed();
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn hud_snapshot(&self) -> Option<HudSnapshot> {
        self.scene.hud_snapshot(&self.world)
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestScene {
        spawn_count: usize,
        step_x: f32,
    }

    impl Scene for TestScene {
        fn load(&mut self, world: &mut SceneWorld) {
            for index in 0..self.spawn_count {
                world.spawn(EntityDesc::new(
                    EntityKind::BackgroundNpc,
                    format!("npc_{index}"),
                    Vec3::ZERO,
                ));
            }
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            if let Some(entity) = world.entities_mut().first_mut() {
                entity.transform.position.x += self.step_x;
            }
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    fn house_desc(position: Vec3) -> EntityDesc {
        EntityDesc::new(EntityKind::StaticObstacle, "house", position)
            .with_collider(Aabb::new(
                Vec3::new(-2.0, 0.0, -2.0),
                Vec3::new(2.0, 3.0, 2.0),
            ))
            .with_door(Door::new("House", Vec3::new(0.0, 0.0, 2.2), 0.0))
            .large(true)
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let a = allocator.allocate();
        let b = allocator.allocate();
        assert_ne!(a, b);
        assert_eq!(b.0, a.0 + 1);
    }

    #[test]
    fn spawned_entities_appear_only_after_apply_pending() {
        let mut world = SceneWorld::default();
        let id = world.spawn(EntityDesc::new(EntityKind::Player, "player", Vec3::ZERO));
        assert!(world.find_entity(id).is_none());

        world.apply_pending();
        let entity = world.find_entity(id).expect("player");
        assert_eq!(entity.kind, EntityKind::Player);
        assert!(entity.visible);
    }

    #[test]
    fn registries_track_npcs_and_doors_by_component_presence() {
        let mut world = SceneWorld::default();
        let npc = world.spawn(EntityDesc::new(EntityKind::MainNpc, "Lily", Vec3::ZERO));
        let bg = world.spawn(EntityDesc::new(
            EntityKind::BackgroundNpc,
            "Townsperson",
            Vec3::ZERO,
        ));
        let house = world.spawn(house_desc(Vec3::new(10.0, 0.0, 0.0)));
        let _bench = world.spawn(EntityDesc::new(
            EntityKind::StaticObstacle,
            "bench",
            Vec3::ZERO,
        ));
        world.apply_pending();

        assert_eq!(world.npc_ids(), &[npc, bg]);
        assert_eq!(world.door_ids(), &[house]);
    }

    #[test]
    fn collider_world_box_follows_owner_position() {
        let mut world = SceneWorld::default();
        let house = world.spawn(house_desc(Vec3::new(10.0, 0.0, 0.0)));
        world.apply_pending();

        let (_, before) = world.colliders().next().expect("collider");
        assert_eq!(before.min.x, 8.0);

        world.find_entity_mut(house).expect("house").transform.position.x = 20.0;
        let (_, after) = world.colliders().next().expect("collider");
        assert_eq!(after.min.x, 18.0);
    }

    #[test]
    fn door_toggle_swings_leaf_to_target_over_duration() {
        let mut door = Door::new("Bakery", Vec3::new(0.0, 0.0, 3.0), 0.0);
        assert!(door.toggle(10, 60));
        door.advance_swing(40);
        assert!(door.leaf_yaw < 0.0 && door.leaf_yaw > DOOR_OPEN_SWING_RADIANS);

        door.advance_swing(70);
        assert_eq!(door.leaf_yaw, DOOR_OPEN_SWING_RADIANS);
        assert!(door.swing.is_none());

        assert!(!door.toggle(80, 60));
        door.advance_swing(200);
        assert_eq!(door.leaf_yaw, 0.0);
    }

    #[test]
    fn door_interaction_point_is_owner_plus_offset() {
        let door = Door::new("Library", Vec3::new(0.0, 0.0, 3.0), 0.0);
        let point = door.interaction_point(Vec3::new(5.0, 0.0, -5.0));
        assert_eq!(point, Vec3::new(5.0, 0.0, -2.0));
    }

    #[test]
    fn clear_empties_registries() {
        let mut world = SceneWorld::default();
        world.spawn(house_desc(Vec3::ZERO));
        world.spawn(EntityDesc::new(EntityKind::MainNpc, "Old Tom", Vec3::ZERO));
        world.apply_pending();
        world.clear();

        assert_eq!(world.entity_count(), 0);
        assert!(world.npc_ids().is_empty());
        assert!(world.door_ids().is_empty());
    }

    #[test]
    fn hard_reset_recreates_scene_state() {
        let mut runtime = SceneRuntime::new(Box::new(TestScene {
            spawn_count: 2,
            step_x: 1.5,
        }));
        runtime.load_if_needed();
        runtime.update(1.0 / 60.0, &InputSnapshot::empty());
        assert_eq!(runtime.world().entities()[0].transform.position.x, 1.5);

        runtime.hard_reset();
        assert_eq!(runtime.world().entity_count(), 2);
        assert_eq!(runtime.world().entities()[0].transform.position.x, 0.0);
    }

    #[test]
    fn load_if_needed_is_idempotent() {
        let mut runtime = SceneRuntime::new(Box::new(TestScene {
            spawn_count: 3,
            step_x: 0.0,
        }));
        runtime.load_if_needed();
        runtime.load_if_needed();
        assert_eq!(runtime.world().entity_count(), 3);
    }

    #[test]
    fn input_snapshot_builders_round_trip() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::MoveForward, true)
            .with_interact_pressed()
            .with_chat_submitted("where is teddy")
            .with_window_size((640, 480));

        assert!(snapshot.is_down(InputAction::MoveForward));
        assert!(!snapshot.is_down(InputAction::TurnLeft));
        assert!(snapshot.edges().interact);
        assert_eq!(snapshot.chat_submitted(), Some("where is teddy"));
        assert_eq!(snapshot.window_size(), (640, 480));
    }
}
