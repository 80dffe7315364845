use engine::{EntityId, SceneWorld, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum InteractionTarget {
    Npc { id: EntityId, distance: f32 },
    Door { id: EntityId, distance: f32 },
    Nothing,
}

/// Nearest NPC by distance to the player and nearest door by distance to
/// its interaction point. Spawn order breaks ties.
pub(crate) fn nearest_npc(world: &SceneWorld, player_position: Vec3) -> Option<(EntityId, f32)> {
    world
        .npc_ids()
        .iter()
        .filter_map(|id| world.find_entity(*id))
        .map(|npc| (npc.id, npc.transform.position.distance(player_position)))
        .fold(None, keep_nearest)
}

pub(crate) fn nearest_door(world: &SceneWorld, player_position: Vec3) -> Option<(EntityId, f32)> {
    world
        .door_ids()
        .iter()
        .filter_map(|id| world.find_entity(*id))
        .filter_map(|entity| {
            let door = entity.door.as_ref()?;
            let point = door.interaction_point(entity.transform.position);
            Some((entity.id, point.distance(player_position)))
        })
        .fold(None, keep_nearest)
}

/// NPCs take priority over doors; both must be strictly inside `radius`.
pub(crate) fn find_target(
    world: &SceneWorld,
    player_position: Vec3,
    radius: f32,
) -> InteractionTarget {
    if let Some((id, distance)) = nearest_npc(world, player_position) {
        if distance < radius {
            return InteractionTarget::Npc { id, distance };
        }
    }
    if let Some((id, distance)) = nearest_door(world, player_position) {
        if distance < radius {
            return InteractionTarget::Door { id, distance };
        }
    }
    InteractionTarget::Nothing
}

fn keep_nearest(
    best: Option<(EntityId, f32)>,
    candidate: (EntityId, f32),
) -> Option<(EntityId, f32)> {
    match best {
        Some(current) if current.1 <= candidate.1 => Some(current),
        _ => Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use engine::{Door, EntityDesc, EntityKind};

    use super::*;

    fn spawn_npc(world: &mut SceneWorld, name: &str, position: Vec3) -> EntityId {
        world.spawn(EntityDesc::new(EntityKind::BackgroundNpc, name, position))
    }

    fn spawn_door(world: &mut SceneWorld, owner: Vec3, offset: Vec3) -> EntityId {
        world.spawn(
            EntityDesc::new(EntityKind::Door, "Bakery", owner)
                .with_door(Door::new("Bakery", offset, 0.0)),
        )
    }

    #[test]
    fn npc_wins_over_closer_door_when_both_in_range() {
        let mut world = SceneWorld::default();
        let npc = spawn_npc(&mut world, "walker", Vec3::new(1.5, 0.0, 0.0));
        spawn_door(&mut world, Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.5, 0.0, 0.0));
        world.apply_pending();

        let target = find_target(&world, Vec3::ZERO, 2.0);
        assert_eq!(target, InteractionTarget::Npc { id: npc, distance: 1.5 });
    }

    #[test]
    fn door_distance_uses_offset_point() {
        let mut world = SceneWorld::default();
        spawn_npc(&mut world, "walker", Vec3::new(30.0, 0.0, 0.0));
        // Owner is 8 units away but the door point is 1 unit away.
        let door = spawn_door(&mut world, Vec3::new(0.0, 0.0, 8.0), Vec3::new(0.0, 0.0, -7.0));
        world.apply_pending();

        match find_target(&world, Vec3::ZERO, 2.0) {
            InteractionTarget::Door { id, distance } => {
                assert_eq!(id, door);
                assert!((distance - 1.0).abs() < 1e-5);
            }
            other => panic!("expected door, got {other:?}"),
        }
    }

    #[test]
    fn radius_is_strict_and_nothing_is_a_no_op() {
        let mut world = SceneWorld::default();
        spawn_npc(&mut world, "walker", Vec3::new(2.0, 0.0, 0.0));
        world.apply_pending();
        assert_eq!(find_target(&world, Vec3::ZERO, 2.0), InteractionTarget::Nothing);
        assert_eq!(
            find_target(&SceneWorld::default(), Vec3::ZERO, 2.0),
            InteractionTarget::Nothing
        );
    }

    #[test]
    fn nearest_of_several_npcs_is_chosen() {
        let mut world = SceneWorld::default();
        spawn_npc(&mut world, "a", Vec3::new(1.8, 0.0, 0.0));
        let b = spawn_npc(&mut world, "b", Vec3::new(0.0, 0.0, -0.9));
        spawn_npc(&mut world, "c", Vec3::new(-1.2, 0.0, 0.0));
        world.apply_pending();
        assert_eq!(nearest_npc(&world, Vec3::ZERO).map(|(id, _)| id), Some(b));
    }
}
