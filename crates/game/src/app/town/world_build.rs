use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, TAU};

use engine::{
    Door, EntityDesc, EntityId, EntityKind, NpcTier, SceneWorld, Sphere, TownDefs, Vec3,
};
use rand::Rng;

use super::tuning::Tuning;
use super::wander::{WanderAgent, WanderTier};

/// Per-NPC simulation state kept beside the world entity.
#[derive(Debug, Clone)]
pub(crate) struct NpcRuntime {
    pub name: String,
    pub dialogue: String,
    pub agent: WanderAgent,
}

#[derive(Debug)]
pub(crate) struct BuiltTown {
    pub player: EntityId,
    pub npcs: HashMap<EntityId, NpcRuntime>,
}

const DOOR_MARKER_RADIUS: f32 = 0.8;
/// The player starts facing -z, toward the square.
const PLAYER_SPAWN_YAW: f32 = -FRAC_PI_2;

/// Spawns every object, door, NPC and the player, then applies the spawns
/// so registries are populated before the first tick.
pub(crate) fn build_town(
    world: &mut SceneWorld,
    defs: &TownDefs,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> BuiltTown {
    for object in defs.objects() {
        let mut desc = EntityDesc::new(EntityKind::StaticObstacle, &object.label, object.position)
            .with_yaw(object.yaw)
            .large(object.large)
            .with_tags(object.tags.clone());
        if let Some(collider) = object.collider {
            desc = desc.with_collider(collider);
        }
        world.spawn(desc);

        if let Some(door) = &object.door {
            world.spawn(
                EntityDesc::new(EntityKind::Door, &door.label, object.position)
                    .with_yaw(object.yaw)
                    .with_bounds(Sphere::new(
                        door.offset + Vec3::new(0.0, 1.0, 0.0),
                        DOOR_MARKER_RADIUS,
                    ))
                    .with_door(Door::new(&door.label, door.offset, object.yaw)),
            );
        }
    }

    let mut npcs = HashMap::new();
    for npc in defs.npcs() {
        let heading = npc.heading.unwrap_or_else(|| rng.gen_range(0.0..TAU));
        let (kind, tier) = match (npc.tier, npc.wander_radius) {
            (NpcTier::Main, Some(radius)) => (
                EntityKind::MainNpc,
                WanderTier::MainCast {
                    anchor: npc.position,
                    radius,
                },
            ),
            _ => (EntityKind::BackgroundNpc, WanderTier::Background),
        };
        let id = world.spawn(
            EntityDesc::new(kind, &npc.name, npc.position)
                .with_yaw(heading)
                .with_scale(npc.scale)
                .with_bounds(Sphere::new(Vec3::new(0.0, npc.scale, 0.0), npc.scale)),
        );
        npcs.insert(
            id,
            NpcRuntime {
                name: npc.name.clone(),
                dialogue: npc.dialogue.clone(),
                agent: WanderAgent::new(tier, heading, npc.speed),
            },
        );
    }

    let [x, y, z] = tuning.player_spawn;
    let player = world.spawn(
        EntityDesc::new(EntityKind::Player, "You", Vec3::new(x, y, z)).with_yaw(PLAYER_SPAWN_YAW),
    );
    world.apply_pending();

    BuiltTown { player, npcs }
}

#[cfg(test)]
mod tests {
    use engine::{compile_sources, ContentSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const TOWN: &str = include_str!("../../../../../assets/base/town.xml");

    fn default_defs() -> TownDefs {
        compile_sources(&[ContentSource::new("assets/base/town.xml", TOWN)])
            .expect("default town compiles")
    }

    #[test]
    fn default_town_builds_registries() {
        let defs = default_defs();
        let mut world = SceneWorld::default();
        let mut rng = StdRng::seed_from_u64(1);

        let town = build_town(&mut world, &defs, &Tuning::default(), &mut rng);

        assert_eq!(world.npc_ids().len(), defs.npcs().len());
        assert_eq!(town.npcs.len(), defs.npcs().len());
        let door_count = defs
            .objects()
            .iter()
            .filter(|object| object.door.is_some())
            .count();
        assert_eq!(world.door_ids().len(), door_count);
        assert!(door_count >= 4);
        assert_eq!(
            world.find_entity(town.player).map(|entity| entity.kind),
            Some(EntityKind::Player)
        );
        assert!(world.colliders().count() >= 10);
    }

    #[test]
    fn main_cast_are_tethered_at_spawn() {
        let defs = default_defs();
        let mut world = SceneWorld::default();
        let mut rng = StdRng::seed_from_u64(2);
        let town = build_town(&mut world, &defs, &Tuning::default(), &mut rng);

        let names = ["Mrs. Wicket", "Old Tom", "Lily"];
        for name in names {
            let (id, runtime) = town
                .npcs
                .iter()
                .find(|(_, runtime)| runtime.name == name)
                .expect("main character");
            let entity = world.find_entity(*id).expect("entity");
            assert_eq!(entity.kind, EntityKind::MainNpc);
            match runtime.agent.tier {
                WanderTier::MainCast { anchor, .. } => {
                    assert_eq!(anchor, entity.transform.position)
                }
                WanderTier::Background => panic!("{name} should be main cast"),
            }
        }
    }

    #[test]
    fn door_interaction_point_is_outside_building_collider() {
        let defs = default_defs();
        let mut world = SceneWorld::default();
        let mut rng = StdRng::seed_from_u64(3);
        build_town(&mut world, &defs, &Tuning::default(), &mut rng);

        let footprint = super::super::movement::Footprint::from_extents([1.0, 2.0, 1.0]);
        for door_id in world.door_ids() {
            let entity = world.find_entity(*door_id).expect("door");
            let door = entity.door.as_ref().expect("door component");
            let point = door.interaction_point(entity.transform.position);
            let body = footprint.at(point);
            assert!(
                world.colliders().all(|(_, world_box)| !world_box.intersects(&body)),
                "door {} is unreachable",
                door.label
            );
        }
    }

    #[test]
    fn player_spawn_is_clear_of_colliders() {
        let defs = default_defs();
        let mut world = SceneWorld::default();
        let mut rng = StdRng::seed_from_u64(4);
        let town = build_town(&mut world, &defs, &Tuning::default(), &mut rng);

        let position = world.find_entity(town.player).expect("player").transform.position;
        let body = super::super::movement::Footprint::from_extents([1.0, 2.0, 1.0]).at(position);
        assert!(world.colliders().all(|(_, world_box)| !world_box.intersects(&body)));
    }
}
