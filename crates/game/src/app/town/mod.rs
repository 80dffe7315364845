mod challenges;
mod context;
mod dialogue;
mod interaction;
mod movement;
mod presentation;
mod tuning;
mod visibility;
mod wander;
mod world_build;


use std::collections::HashMap;

use engine::{
    bearing, wrap_angle, EntityId, HudSnapshot, InputAction, InputSnapshot, Scene, SceneCommand,
    SceneWorld, TownDefs, Vec3,
};
use tracing::{debug, info};

use challenges::{ChallengeEvent, ChallengeNotice, StartOutcome};
use context::{CameraRig, SimContext, TownEvent};
use interaction::InteractionTarget;
use movement::{Footprint, MoveOutcome};
use presentation::{HudState, Presenter, SoundIntent};
use tuning::{seconds_to_ticks, Tuning};
use visibility::{VisibilityCounts, VisibilityParams};
use wander::WanderParams;
use world_build::NpcRuntime;

pub(crate) use tuning::{load_tuning, TuningError, TUNING_FILE_NAME};

const ALREADY_COMPLETED_LINE: &str = "You've already completed this challenge.";

/// The town simulation. One tick runs input events, player movement,
/// camera, visibility, gated NPC wander, door swings, scheduled events and
/// finally the challenge proximity check.
pub(crate) struct TownScene<P: Presenter = HudState> {
    defs: TownDefs,
    tuning: Tuning,
    presenter: P,
    ctx: SimContext,
    player: Option<EntityId>,
    npcs: HashMap<EntityId, NpcRuntime>,
    visibility: VisibilityCounts,
}

impl TownScene<HudState> {
    pub(crate) fn new(defs: TownDefs, tuning: Tuning) -> Self {
        Self::with_presenter(defs, tuning, HudState::default())
    }
}

impl<P: Presenter> TownScene<P> {
    pub(crate) fn with_presenter(defs: TownDefs, tuning: Tuning, presenter: P) -> Self {
        let ctx = SimContext::new(tuning.seed, &defs);
        Self {
            defs,
            tuning,
            presenter,
            ctx,
            player: None,
            npcs: HashMap::new(),
            visibility: VisibilityCounts::default(),
        }
    }

    fn player_pose(&self, world: &SceneWorld) -> Option<(Vec3, f32)> {
        let entity = world.find_entity(self.player?)?;
        Some((entity.transform.position, entity.transform.yaw))
    }

    fn emit_sound(&mut self, intent: SoundIntent) {
        if self.ctx.sound_enabled {
            self.presenter.on_sound_intent(intent);
        } else {
            debug!(sound = intent.as_str(), "sound_suppressed");
        }
    }

    /// Surfaces a dialogue line and arms its timeout.
    fn show_line(&mut self, npc: Option<EntityId>, speaker: &str, text: &str, dt: f32) {
        let generation = self.ctx.focus_dialogue(npc, speaker);
        let timeout_ticks = seconds_to_ticks(self.tuning.dialogue_timeout_seconds, dt);
        self.ctx.scheduler.schedule(
            self.ctx.tick + timeout_ticks,
            self.ctx.focused_npc(),
            TownEvent::DialogueTimeout { generation },
        );
        self.presenter.on_dialogue_changed(speaker, text);
    }

    /// Dismisses the dialogue if `generation` is current (any when `None`)
    /// and releases a frozen NPC.
    fn close_dialogue(&mut self, generation: Option<u64>) {
        let Some(focus) = self.ctx.clear_dialogue(generation) else {
            return;
        };
        self.presenter.on_dialogue_cleared();
        let reason = if generation.is_some() { "timeout" } else { "closed" };
        debug!(speaker = %focus.speaker, reason, "dialogue_dismissed");
        if let Some(npc) = focus.npc {
            self.release_npc(npc, "dialogue_dismissed");
        }
    }

    fn release_npc(&mut self, npc: EntityId, reason: &'static str) {
        if let Some(runtime) = self.npcs.get_mut(&npc) {
            if runtime.agent.unfreeze() {
                info!(npc = %runtime.name, reason, "npc_unfrozen");
            }
        }
    }

    fn refresh_challenge_views(&mut self) {
        let views = self.ctx.challenges.views();
        self.presenter.on_challenge_list_changed(&views);
        let active = self.ctx.challenges.active_view();
        self.presenter.on_active_challenge_changed(active.as_ref());
    }

    fn publish(&mut self, notices: Vec<ChallengeNotice>, dt: f32) {
        let mut changed = false;
        for notice in notices {
            match notice {
                ChallengeNotice::Started { title, description } => {
                    changed = true;
                    self.show_line(None, &title, &description, dt);
                }
                ChallengeNotice::Reminder { title, description } => {
                    self.show_line(None, &title, &description, dt);
                }
                ChallengeNotice::AlreadyCompleted { title } => {
                    self.show_line(None, &title, ALREADY_COMPLETED_LINE, dt);
                }
                ChallengeNotice::StepCompleted {
                    title,
                    step_index,
                    speaker,
                    line,
                } => {
                    changed = true;
                    info!(challenge = %title, step = step_index, "challenge_step_completed");
                    if let Some(line) = line {
                        let speaker = speaker.unwrap_or_else(|| title.clone());
                        self.show_line(None, &speaker, &line, dt);
                    }
                }
                ChallengeNotice::Completed { title, reward } => {
                    changed = true;
                    info!(challenge = %title, "challenge_completed");
                    self.show_line(None, &title, &format!("Challenge complete! {reward}"), dt);
                    self.emit_sound(SoundIntent::ChallengeComplete);
                }
            }
        }
        if changed {
            self.refresh_challenge_views();
        }
    }

    fn start_challenge(&mut self, id: &str, dt: f32) -> StartOutcome {
        let mut notices = Vec::new();
        let outcome = self.ctx.challenges.start(id, &mut notices);
        match &outcome {
            StartOutcome::Started { switched_from } => {
                info!(challenge = id, switched_from = ?switched_from, "challenge_started");
            }
            StartOutcome::AlreadyActive => debug!(challenge = id, "challenge_already_active"),
            StartOutcome::AlreadyCompleted => {
                info!(challenge = id, "challenge_already_completed")
            }
            StartOutcome::Unknown => debug!(challenge = id, "challenge_unknown"),
        }
        self.publish(notices, dt);
        outcome
    }

    fn handle_menu_choice(&mut self, choice: u8, dt: f32) {
        let Some(id) = (choice as usize)
            .checked_sub(1)
            .and_then(|index| self.ctx.challenges.id_at(index))
            .map(str::to_string)
        else {
            debug!(choice, "menu_choice_out_of_range");
            return;
        };
        self.ctx.menu_open = false;
        self.start_challenge(&id, dt);
    }

    fn interact(&mut self, world: &mut SceneWorld, dt: f32) {
        let Some((player_position, _)) = self.player_pose(world) else {
            return;
        };
        match interaction::find_target(world, player_position, self.tuning.interaction_radius) {
            InteractionTarget::Npc { id, distance } => {
                debug!(target = id.0, distance, "interact_npc");
                self.talk_to(id, player_position, world, dt);
            }
            InteractionTarget::Door { id, distance } => {
                debug!(target = id.0, distance, "interact_door");
                self.toggle_door(id, dt, world);
            }
            InteractionTarget::Nothing => debug!("interact_nothing_in_range"),
        }
    }

    fn talk_to(&mut self, npc: EntityId, player_position: Vec3, world: &mut SceneWorld, dt: f32) {
        if let Some(previous) = self.ctx.focused_npc().filter(|&previous| previous != npc) {
            self.release_npc(previous, "focus_moved");
        }
        let freeze_ticks = seconds_to_ticks(self.tuning.npc_freeze_seconds, dt);
        let until_tick = self.ctx.tick + freeze_ticks;
        let Some(runtime) = self.npcs.get_mut(&npc) else {
            return;
        };
        if let Some(entity) = world.find_entity_mut(npc) {
            let facing = bearing(entity.transform.position, player_position);
            entity.transform.yaw = facing;
            runtime.agent.heading = facing;
        }
        runtime.agent.freeze(until_tick);
        self.ctx
            .scheduler
            .schedule(until_tick, Some(npc), TownEvent::Unfreeze);

        let name = runtime.name.clone();
        let line = dialogue::ambient_line(self.defs.dialogue(&runtime.dialogue), &mut self.ctx.rng)
            .to_string();
        info!(npc = %name, until_tick, "npc_frozen");

        self.show_line(Some(npc), &name, &line, dt);
        self.emit_sound(SoundIntent::Interact);

        let mut notices = Vec::new();
        self.ctx.challenges.notify_event(
            ChallengeEvent::TalkedTo(&name),
            world,
            player_position,
            &mut notices,
        );
        self.publish(notices, dt);
    }

    fn toggle_door(&mut self, door_id: EntityId, dt: f32, world: &mut SceneWorld) {
        let swing_ticks = seconds_to_ticks(self.tuning.door_swing_seconds, dt);
        let Some(door) = world
            .find_entity_mut(door_id)
            .and_then(|entity| entity.door.as_mut())
        else {
            return;
        };
        let open = door.toggle(self.ctx.tick, swing_ticks);
        let label = door.label.clone();
        let text = if open {
            format!("The {label} door swings open.")
        } else {
            format!("The {label} door swings shut.")
        };
        info!(door = %label, open, "door_toggled");
        self.presenter
            .on_interaction_message(&label, &text, self.tuning.message_duration_ms);
        self.emit_sound(SoundIntent::Door);
    }

    fn submit_chat(&mut self, text: &str, dt: f32) {
        let Some(npc) = self.ctx.focused_npc() else {
            debug!("chat_ignored_no_focus");
            return;
        };
        let Some(runtime) = self.npcs.get(&npc) else {
            return;
        };
        let name = runtime.name.clone();
        let reply =
            dialogue::respond(self.defs.dialogue(&runtime.dialogue), &text.to_lowercase()).to_string();
        debug!(npc = %name, input_len = text.len(), "chat_replied");
        self.show_line(Some(npc), &name, &reply, dt);
    }

    fn move_player(&mut self, input: &InputSnapshot, world: &mut SceneWorld, dt: f32) {
        let Some(player) = self.player else {
            return;
        };
        let forward = axis(input, InputAction::MoveForward, InputAction::MoveBack);
        let turn = axis(input, InputAction::TurnRight, InputAction::TurnLeft);
        let Some(entity) = world.find_entity_mut(player) else {
            return;
        };
        entity.transform.yaw =
            wrap_angle(entity.transform.yaw + turn * self.tuning.player_turn_speed * dt);
        let delta = Vec3::from_heading(entity.transform.yaw) * (forward * self.tuning.player_speed * dt);

        let outcome = movement::try_move(
            world,
            player,
            delta,
            Footprint::from_extents(self.tuning.player_footprint),
            self.tuning.player_bound,
        );
        if outcome == MoveOutcome::Blocked {
            debug!("player_move_blocked");
        }
        let walking = outcome == MoveOutcome::Moved;
        if walking != self.ctx.footsteps_playing {
            self.ctx.footsteps_playing = walking;
            self.emit_sound(if walking {
                SoundIntent::FootstepStart
            } else {
                SoundIntent::FootstepStop
            });
        }
    }

    fn update_camera(&self, world: &mut SceneWorld) {
        let Some((position, yaw)) = self.player_pose(world) else {
            return;
        };
        let rig = CameraRig {
            follow_distance: self.tuning.camera_follow_distance,
            height: self.tuning.camera_height,
            pitch: self.tuning.camera_pitch,
            eye_height: self.tuning.eye_height,
        };
        self.ctx
            .camera_mode
            .apply(world.camera_mut(), position, yaw, &rig);
    }

    fn update_visibility(&mut self, world: &mut SceneWorld) {
        let Some((player_position, _)) = self.player_pose(world) else {
            return;
        };
        let camera = *world.camera();
        let params = VisibilityParams {
            near: self.tuning.visibility_near,
            far: self.tuning.visibility_far,
            inflate: self.tuning.cull_inflate,
        };
        self.visibility = visibility::compute_visibility(
            world.entities_mut(),
            camera.position,
            player_position,
            &camera.frustum(),
            &params,
        );
    }

    fn advance_npcs(&mut self, world: &mut SceneWorld, dt: f32) {
        let Some((player_position, _)) = self.player_pose(world) else {
            return;
        };
        let params = WanderParams {
            soft_bound: self.tuning.npc_soft_bound,
            turn_chance: self.tuning.heading_change_chance,
            max_turn_radians: self.tuning.heading_jitter_radians(),
        };
        for index in 0..world.npc_ids().len() {
            let id = world.npc_ids()[index];
            let (Some(entity), Some(runtime)) = (world.find_entity_mut(id), self.npcs.get_mut(&id))
            else {
                continue;
            };
            if runtime.agent.is_frozen()
                || entity.transform.position.distance(player_position) > self.tuning.ai_update_radius
            {
                continue;
            }
            let transform = &mut entity.transform;
            runtime.agent.advance(
                &mut transform.position,
                &mut transform.yaw,
                dt,
                &params,
                &mut self.ctx.rng,
            );
        }
    }

    fn run_scheduled(&mut self) {
        for event in self.ctx.scheduler.drain_due(self.ctx.tick) {
            match event.action {
                TownEvent::Unfreeze => {
                    if let Some(runtime) = event.target.and_then(|npc| self.npcs.get_mut(&npc)) {
                        if runtime.agent.expire_freeze(self.ctx.tick) {
                            info!(npc = %runtime.name, reason = "freeze_expired", "npc_unfrozen");
                        }
                    }
                }
                TownEvent::DialogueTimeout { generation } => self.close_dialogue(Some(generation)),
            }
        }
    }

    fn check_proximity(&mut self, world: &SceneWorld, dt: f32) {
        if self.ctx.challenges.active_id().is_none() {
            return;
        }
        let Some((player_position, _)) = self.player_pose(world) else {
            return;
        };
        let mut notices = Vec::new();
        self.ctx.challenges.notify_event(
            ChallengeEvent::ProximityCheck,
            world,
            player_position,
            &mut notices,
        );
        self.publish(notices, dt);
    }

    fn menu_footer(&self) -> Vec<String> {
        vec![
            "1-9: start challenge".to_string(),
            format!(
                "N: sound {}",
                if self.ctx.sound_enabled { "on" } else { "off" }
            ),
            format!("V: camera ({})", self.ctx.camera_mode.as_str()),
            "F5: restart  Tab: close".to_string(),
        ]
    }
}

fn axis(input: &InputSnapshot, positive: InputAction, negative: InputAction) -> f32 {
    match (input.is_down(positive), input.is_down(negative)) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

impl<P: Presenter> Scene for TownScene<P> {
    fn load(&mut self, world: &mut SceneWorld) {
        self.ctx = SimContext::new(self.tuning.seed, &self.defs);
        let town = world_build::build_town(world, &self.defs, &self.tuning, &mut self.ctx.rng);
        self.player = Some(town.player);
        self.npcs = town.npcs;
        self.visibility = VisibilityCounts::default();
        self.presenter.on_dialogue_cleared();
        self.refresh_challenge_views();
        self.update_camera(world);
        info!(
            entity_count = world.entity_count(),
            npc_count = world.npc_ids().len(),
            door_count = world.door_ids().len(),
            challenge_count = self.ctx.challenges.len(),
            seed = self.tuning.seed,
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.quit_requested() || input.is_down(InputAction::Quit) {
            return SceneCommand::Quit;
        }
        let dt = fixed_dt_seconds;
        let edges = input.edges();
        if edges.restart {
            info!("restart_requested");
            return SceneCommand::Restart;
        }
        if edges.toggle_menu {
            self.ctx.menu_open = !self.ctx.menu_open;
            info!(menu_open = self.ctx.menu_open, "menu_toggled");
        }
        if edges.toggle_sound {
            if self.ctx.sound_enabled && self.ctx.footsteps_playing {
                self.emit_sound(SoundIntent::FootstepStop);
                self.ctx.footsteps_playing = false;
            }
            self.ctx.sound_enabled = !self.ctx.sound_enabled;
            info!(sound_enabled = self.ctx.sound_enabled, "sound_toggled");
        }
        if self.ctx.menu_open {
            if let Some(choice) = edges.menu_choice {
                self.handle_menu_choice(choice, dt);
            }
            return SceneCommand::None;
        }

        self.ctx.tick += 1;
        self.presenter
            .advance_clock((dt * 1000.0).round() as u32);

        if edges.toggle_camera {
            self.ctx.camera_mode = self.ctx.camera_mode.toggled();
            info!(camera_mode = self.ctx.camera_mode.as_str(), "camera_mode_changed");
        }
        if edges.close_dialogue {
            self.close_dialogue(None);
        }
        if let Some(text) = input.chat_submitted() {
            self.submit_chat(text, dt);
        }
        if edges.interact {
            self.interact(world, dt);
        }

        self.move_player(input, world, dt);
        self.update_camera(world);
        self.update_visibility(world);
        self.advance_npcs(world, dt);
        world.advance_door_swings(self.ctx.tick);
        self.run_scheduled();
        self.check_proximity(world, dt);

        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        info!(
            entity_count = world.entity_count(),
            tick = self.ctx.tick,
            "scene_unloaded"
        );
        self.player = None;
        self.npcs.clear();
        self.ctx.scheduler.clear();
    }

    fn hud_snapshot(&self, _world: &SceneWorld) -> Option<HudSnapshot> {
        let footer = self.ctx.menu_open.then(|| self.menu_footer());
        self.presenter.hud().map(|hud| {
            hud.snapshot(
                footer.as_deref(),
                self.visibility.visible,
                self.visibility.hidden,
            )
        })
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some(format!(
            "Hamlet | {} | visible {} hidden {} | tick {}",
            self.ctx.camera_mode.as_str(),
            self.visibility.visible,
            self.visibility.hidden,
            self.ctx.tick
        ))
    }
}
