use engine::{Camera3D, EntityId, Scheduler, TownDefs, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::challenges::ChallengeBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CameraMode {
    ThirdPerson,
    FirstPerson,
}

impl CameraMode {
    pub(crate) fn toggled(self) -> Self {
        match self {
            Self::ThirdPerson => Self::FirstPerson,
            Self::FirstPerson => Self::ThirdPerson,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::ThirdPerson => "third_person",
            Self::FirstPerson => "first_person",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CameraRig {
    pub follow_distance: f32,
    pub height: f32,
    pub pitch: f32,
    pub eye_height: f32,
}

impl CameraMode {
    /// Places `camera` relative to the player pose. Aspect and clip planes
    /// are left to the host.
    pub(crate) fn apply(
        self,
        camera: &mut Camera3D,
        player_position: Vec3,
        player_yaw: f32,
        rig: &CameraRig,
    ) {
        camera.yaw = player_yaw;
        match self {
            Self::ThirdPerson => {
                camera.position = player_position
                    - Vec3::from_heading(player_yaw) * rig.follow_distance
                    + Vec3::new(0.0, rig.height, 0.0);
                camera.pitch = rig.pitch;
            }
            Self::FirstPerson => {
                camera.position = player_position + Vec3::new(0.0, rig.eye_height, 0.0);
                camera.pitch = 0.0;
            }
        }
    }
}

/// Deferred simulation work, fired by tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TownEvent {
    Unfreeze,
    DialogueTimeout { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DialogueFocus {
    /// NPC being talked to; `None` for lines not spoken by an NPC.
    pub npc: Option<EntityId>,
    pub speaker: String,
    pub generation: u64,
}

/// All mutable session state outside the scene world.
#[derive(Debug)]
pub(crate) struct SimContext {
    pub tick: u64,
    pub rng: StdRng,
    pub scheduler: Scheduler<TownEvent>,
    pub challenges: ChallengeBook,
    pub dialogue: Option<DialogueFocus>,
    pub dialogue_generation: u64,
    pub sound_enabled: bool,
    pub menu_open: bool,
    pub camera_mode: CameraMode,
    pub footsteps_playing: bool,
}

impl SimContext {
    pub(crate) fn new(seed: u64, defs: &TownDefs) -> Self {
        Self {
            tick: 0,
            rng: StdRng::seed_from_u64(seed),
            scheduler: Scheduler::default(),
            challenges: ChallengeBook::new(defs.challenges()),
            dialogue: None,
            dialogue_generation: 0,
            sound_enabled: true,
            menu_open: false,
            camera_mode: CameraMode::ThirdPerson,
            footsteps_playing: false,
        }
    }

    /// Focuses a new dialogue line and returns its generation. Lines that
    /// are not spoken by an NPC keep the current NPC focus.
    pub(crate) fn focus_dialogue(&mut self, npc: Option<EntityId>, speaker: &str) -> u64 {
        self.dialogue_generation = self.dialogue_generation.wrapping_add(1);
        let npc = npc.or_else(|| self.dialogue.as_ref().and_then(|focus| focus.npc));
        self.dialogue = Some(DialogueFocus {
            npc,
            speaker: speaker.to_string(),
            generation: self.dialogue_generation,
        });
        self.dialogue_generation
    }

    pub(crate) fn focused_npc(&self) -> Option<EntityId> {
        self.dialogue.as_ref().and_then(|focus| focus.npc)
    }

    /// Clears the focus if `generation` is still current (or always when
    /// `None`). Returns the focus that was cleared.
    pub(crate) fn clear_dialogue(&mut self, generation: Option<u64>) -> Option<DialogueFocus> {
        match (&self.dialogue, generation) {
            (Some(focus), Some(expected)) if focus.generation != expected => None,
            (Some(_), _) => self.dialogue.take(),
            (None, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_dialogue_timeouts_are_ignored() {
        let mut ctx = SimContext::new(1, &TownDefs::default());
        let first = ctx.focus_dialogue(Some(EntityId(4)), "Lily");
        let second = ctx.focus_dialogue(None, "Town Tour");

        assert_eq!(ctx.clear_dialogue(Some(first)), None);
        assert_eq!(ctx.focused_npc(), Some(EntityId(4)));

        let cleared = ctx.clear_dialogue(Some(second)).expect("cleared");
        assert_eq!(cleared.npc, Some(EntityId(4)));
        assert_eq!(ctx.dialogue, None);
        assert_eq!(ctx.clear_dialogue(None), None);
    }

    #[test]
    fn third_person_camera_sits_behind_and_above() {
        let rig = CameraRig {
            follow_distance: 8.0,
            height: 4.0,
            pitch: -0.35,
            eye_height: 1.6,
        };
        let mut camera = Camera3D::default();
        CameraMode::ThirdPerson.apply(&mut camera, Vec3::new(2.0, 0.0, 0.0), 0.0, &rig);
        assert_eq!(camera.position, Vec3::new(-6.0, 4.0, 0.0));
        assert_eq!(camera.pitch, -0.35);

        CameraMode::FirstPerson.apply(&mut camera, Vec3::new(2.0, 0.0, 0.0), 0.0, &rig);
        assert_eq!(camera.position, Vec3::new(2.0, 1.6, 0.0));
        assert_eq!(CameraMode::FirstPerson.toggled(), CameraMode::ThirdPerson);
    }
}
