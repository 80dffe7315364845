use engine::{Entity, EntityKind, Frustum, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VisibilityParams {
    pub near: f32,
    pub far: f32,
    pub inflate: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct VisibilityCounts {
    pub visible: usize,
    pub hidden: usize,
}

/// First matching rule wins: close to the camera, too far from the player,
/// large scenery, then an inflated frustum test.
pub(crate) fn is_visible(
    entity: &Entity,
    camera_position: Vec3,
    player_position: Vec3,
    frustum: &Frustum,
    params: &VisibilityParams,
) -> bool {
    let position = entity.transform.position;
    if position.distance(camera_position) < params.near {
        return true;
    }
    if position.distance(player_position) > params.far {
        return false;
    }
    if entity.large {
        return true;
    }
    frustum.intersects_sphere(&entity.world_bounds().inflated(params.inflate))
}

/// Writes `Entity::visible` for every entity. The player always stays
/// visible and is not counted.
pub(crate) fn compute_visibility(
    entities: &mut [Entity],
    camera_position: Vec3,
    player_position: Vec3,
    frustum: &Frustum,
    params: &VisibilityParams,
) -> VisibilityCounts {
    let mut counts = VisibilityCounts::default();
    for entity in entities.iter_mut() {
        if entity.kind == EntityKind::Player {
            entity.visible = true;
            continue;
        }
        entity.visible = is_visible(entity, camera_position, player_position, frustum, params);
        if entity.visible {
            counts.visible += 1;
        } else {
            counts.hidden += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use engine::{Aabb, Camera3D, EntityDesc, SceneWorld};

    use super::*;

    const PARAMS: VisibilityParams = VisibilityParams {
        near: 3.0,
        far: 60.0,
        inflate: 1.2,
    };

    fn camera_facing_plus_x() -> Camera3D {
        Camera3D {
            position: Vec3::new(0.0, 1.5, 0.0),
            ..Camera3D::default()
        }
    }

    fn world_with(descs: Vec<EntityDesc>) -> SceneWorld {
        let mut world = SceneWorld::default();
        world.spawn(EntityDesc::new(EntityKind::Player, "You", Vec3::ZERO));
        for desc in descs {
            world.spawn(desc);
        }
        world.apply_pending();
        world
    }

    fn run(world: &mut SceneWorld, camera: &Camera3D) -> VisibilityCounts {
        compute_visibility(
            world.entities_mut(),
            camera.position,
            Vec3::ZERO,
            &camera.frustum(),
            &PARAMS,
        )
    }

    fn visible_by_name(world: &SceneWorld, name: &str) -> bool {
        world
            .entities()
            .iter()
            .find(|entity| entity.name == name)
            .map(|entity| entity.visible)
            .expect("entity")
    }

    #[test]
    fn rules_apply_in_order() {
        let camera = camera_facing_plus_x();
        let mut world = world_with(vec![
            EntityDesc::new(EntityKind::BackgroundNpc, "ahead", Vec3::new(20.0, 0.0, 0.0)),
            EntityDesc::new(EntityKind::BackgroundNpc, "behind", Vec3::new(-20.0, 0.0, 0.0)),
            EntityDesc::new(EntityKind::BackgroundNpc, "at_camera", Vec3::new(-1.0, 0.0, 0.0)),
            EntityDesc::new(EntityKind::StaticObstacle, "hall", Vec3::new(-25.0, 0.0, 0.0))
                .with_collider(Aabb::new(
                    Vec3::new(-5.0, 0.0, -5.0),
                    Vec3::new(5.0, 6.0, 5.0),
                ))
                .large(true),
            EntityDesc::new(EntityKind::StaticObstacle, "far_hall", Vec3::new(70.0, 0.0, 0.0))
                .large(true),
        ]);

        let counts = run(&mut world, &camera);

        assert!(visible_by_name(&world, "ahead"));
        assert!(!visible_by_name(&world, "behind"));
        assert!(visible_by_name(&world, "at_camera"));
        assert!(visible_by_name(&world, "hall"));
        assert!(!visible_by_name(&world, "far_hall"));
        assert!(visible_by_name(&world, "You"));
        assert_eq!(
            counts,
            VisibilityCounts {
                visible: 3,
                hidden: 2
            }
        );
    }

    #[test]
    fn inflated_bounds_keep_edge_objects_visible() {
        let camera = camera_facing_plus_x();
        let frustum = camera.frustum();
        // Sphere centre just outside the left plane by less than 0.2 * radius.
        let left = frustum.planes[0];
        let probe = Vec3::new(10.0, 1.5, 0.0);
        let offset = left.signed_distance(probe) + 1.1;
        let center = probe - left.normal * offset;
        let mut world = world_with(vec![EntityDesc::new(
            EntityKind::BackgroundNpc,
            "edge",
            center - Vec3::new(0.0, 1.0, 0.0),
        )]);

        assert!(!frustum.intersects_sphere(
            &world.entities()[1].world_bounds()
        ));
        run(&mut world, &camera);
        assert!(visible_by_name(&world, "edge"));
    }
}
