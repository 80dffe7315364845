use engine::{Aabb, EntityId, SceneWorld, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MoveOutcome {
    Moved,
    Blocked,
    Idle,
}

/// Box the player occupies, feet at the position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Footprint {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Footprint {
    pub(crate) fn from_extents(extents: [f32; 3]) -> Self {
        Self {
            width: extents[0],
            height: extents[1],
            depth: extents[2],
        }
    }

    pub(crate) fn at(&self, position: Vec3) -> Aabb {
        Aabb::from_footprint(position, self.width, self.height, self.depth)
    }
}

/// Accept-or-reject step against `colliders`; no sliding. Accepted
/// positions are clamped to `[-bound, bound]` on x and z.
pub(crate) fn resolve_move(
    position: Vec3,
    delta: Vec3,
    colliders: impl IntoIterator<Item = Aabb>,
    footprint: Footprint,
    bound: f32,
) -> (Vec3, MoveOutcome) {
    if delta.x == 0.0 && delta.z == 0.0 && delta.y == 0.0 {
        return (position, MoveOutcome::Idle);
    }
    let candidate = position + delta;
    let candidate_box = footprint.at(candidate);
    if colliders
        .into_iter()
        .any(|collider| collider.intersects(&candidate_box))
    {
        return (position, MoveOutcome::Blocked);
    }
    let clamped = Vec3::new(
        candidate.x.clamp(-bound, bound),
        candidate.y,
        candidate.z.clamp(-bound, bound),
    );
    (clamped, MoveOutcome::Moved)
}

pub(crate) fn try_move(
    world: &mut SceneWorld,
    entity_id: EntityId,
    delta: Vec3,
    footprint: Footprint,
    bound: f32,
) -> MoveOutcome {
    let Some(position) = world
        .find_entity(entity_id)
        .map(|entity| entity.transform.position)
    else {
        return MoveOutcome::Idle;
    };
    let (next, outcome) = resolve_move(
        position,
        delta,
        world
            .colliders()
            .filter(|(owner, _)| *owner != entity_id)
            .map(|(_, world_box)| world_box),
        footprint,
        bound,
    );
    if let Some(entity) = world.find_entity_mut(entity_id) {
        entity.transform.position = next;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use engine::{EntityDesc, EntityKind};

    use super::*;

    const PLAYER: Footprint = Footprint {
        width: 1.0,
        height: 2.0,
        depth: 1.0,
    };

    fn unit_box_at(center_x: f32, center_z: f32) -> Aabb {
        Aabb::new(
            Vec3::new(center_x - 1.0, 0.0, center_z - 1.0),
            Vec3::new(center_x + 1.0, 2.0, center_z + 1.0),
        )
    }

    #[test]
    fn move_toward_box_edge_from_one_and_a_half_is_rejected() {
        // Box edge at x = 9; player centre at 7.5, footprint half-width 0.5.
        let start = Vec3::new(7.5, 0.0, 0.0);
        let (next, outcome) = resolve_move(
            start,
            Vec3::new(1.0, 0.0, 0.0),
            [unit_box_at(10.0, 0.0)],
            PLAYER,
            48.0,
        );
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(next, start);
    }

    #[test]
    fn move_away_from_box_is_accepted() {
        let start = Vec3::new(7.5, 0.0, 0.0);
        let (next, outcome) = resolve_move(
            start,
            Vec3::new(-1.0, 0.0, 0.0),
            [unit_box_at(10.0, 0.0)],
            PLAYER,
            48.0,
        );
        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(next, Vec3::new(6.5, 0.0, 0.0));
    }

    #[test]
    fn boxes_above_head_height_do_not_block() {
        let awning = Aabb::new(Vec3::new(-1.0, 2.5, -1.0), Vec3::new(1.0, 3.0, 1.0));
        let (_, outcome) = resolve_move(
            Vec3::new(-2.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            [awning],
            PLAYER,
            48.0,
        );
        assert_eq!(outcome, MoveOutcome::Moved);
    }

    #[test]
    fn accepted_moves_are_clamped_to_world_square() {
        let (next, outcome) = resolve_move(
            Vec3::new(47.5, 0.0, -47.9),
            Vec3::new(1.0, 0.0, -1.0),
            std::iter::empty(),
            PLAYER,
            48.0,
        );
        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(next, Vec3::new(48.0, 0.0, -48.0));
    }

    #[test]
    fn zero_delta_is_idle() {
        let (_, outcome) =
            resolve_move(Vec3::ZERO, Vec3::ZERO, std::iter::empty(), PLAYER, 48.0);
        assert_eq!(outcome, MoveOutcome::Idle);
    }

    #[test]
    fn random_walk_never_enters_colliders_or_leaves_bounds() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let boxes = [unit_box_at(5.0, 5.0), unit_box_at(-10.0, 3.0), unit_box_at(0.0, -20.0)];
        let mut rng = StdRng::seed_from_u64(11);
        let mut position = Vec3::ZERO;
        for _ in 0..5_000 {
            let delta = Vec3::new(rng.gen_range(-1.5..1.5), 0.0, rng.gen_range(-1.5..1.5));
            let (next, outcome) = resolve_move(position, delta, boxes, PLAYER, 48.0);
            if outcome == MoveOutcome::Moved {
                position = next;
            }
            assert!(position.x.abs() <= 48.0 && position.z.abs() <= 48.0);
            let body = PLAYER.at(position);
            assert!(boxes.iter().all(|collider| !collider.intersects(&body)));
        }
    }

    #[test]
    fn try_move_reads_colliders_from_world() {
        let mut world = SceneWorld::default();
        let player = world.spawn(EntityDesc::new(
            EntityKind::Player,
            "You",
            Vec3::new(7.5, 0.0, 0.0),
        ));
        world.spawn(
            EntityDesc::new(EntityKind::StaticObstacle, "Bench", Vec3::new(10.0, 0.0, 0.0))
                .with_collider(Aabb::new(
                    Vec3::new(-1.0, 0.0, -1.0),
                    Vec3::new(1.0, 1.0, 1.0),
                )),
        );
        world.apply_pending();

        let outcome = try_move(&mut world, player, Vec3::new(1.0, 0.0, 0.0), PLAYER, 48.0);
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(
            world.find_entity(player).expect("player").transform.position,
            Vec3::new(7.5, 0.0, 0.0)
        );

        let outcome = try_move(&mut world, player, Vec3::new(0.0, 0.0, 3.0), PLAYER, 48.0);
        assert_eq!(outcome, MoveOutcome::Moved);
    }
}
