use std::f32::consts::PI;

use engine::{bearing, wrap_angle, Vec3};
use rand::Rng;

/// Reference tick rate that NPC speeds are authored against.
pub(crate) const REFERENCE_TPS: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WanderTier {
    Background,
    MainCast { anchor: Vec3, radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WanderParams {
    pub soft_bound: f32,
    pub turn_chance: f32,
    pub max_turn_radians: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WanderStep {
    Stepped,
    /// Background NPC reversed at the soft world boundary.
    Bounced,
    /// Main-cast NPC turned back toward its anchor.
    Returning,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WanderAgent {
    pub heading: f32,
    pub speed: f32,
    pub tier: WanderTier,
    frozen_speed: Option<f32>,
    frozen_until: Option<u64>,
}

impl WanderAgent {
    pub(crate) fn new(tier: WanderTier, heading: f32, speed: f32) -> Self {
        Self {
            heading: wrap_angle(heading),
            speed,
            tier,
            frozen_speed: None,
            frozen_until: None,
        }
    }

    /// One AI tick: maybe perturb the heading, then take a step unless the
    /// tier's boundary rule redirects instead. `position` and `yaw` belong
    /// to the NPC's transform.
    pub(crate) fn advance(
        &mut self,
        position: &mut Vec3,
        yaw: &mut f32,
        fixed_dt_seconds: f32,
        params: &WanderParams,
        rng: &mut impl Rng,
    ) -> WanderStep {
        let step_len = self.speed * fixed_dt_seconds * REFERENCE_TPS;
        let mut candidate_heading = self.heading;
        if rng.gen::<f32>() < params.turn_chance {
            candidate_heading += rng.gen_range(-params.max_turn_radians..=params.max_turn_radians);
        }
        let projected = *position + Vec3::from_heading(candidate_heading) * step_len;

        let step = match self.tier {
            WanderTier::Background => {
                self.heading = candidate_heading;
                if projected.x.abs() > params.soft_bound || projected.z.abs() > params.soft_bound {
                    self.heading += PI;
                    WanderStep::Bounced
                } else {
                    *position = projected;
                    WanderStep::Stepped
                }
            }
            WanderTier::MainCast { anchor, radius } => {
                if horizontal_distance(projected, anchor) <= radius {
                    self.heading = candidate_heading;
                    *position = projected;
                    WanderStep::Stepped
                } else {
                    self.heading = bearing(*position, anchor);
                    WanderStep::Returning
                }
            }
        };
        self.heading = wrap_angle(self.heading);
        *yaw = self.heading;
        step
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen_speed.is_some()
    }

    /// Stops the NPC until `until_tick`. A repeat freeze extends the window
    /// but keeps the originally stashed speed.
    pub(crate) fn freeze(&mut self, until_tick: u64) {
        if self.frozen_speed.is_none() {
            self.frozen_speed = Some(self.speed);
        }
        self.speed = 0.0;
        self.frozen_until = Some(until_tick);
    }

    /// Restores the stashed speed. Returns false if the NPC was not frozen.
    pub(crate) fn unfreeze(&mut self) -> bool {
        self.frozen_until = None;
        match self.frozen_speed.take() {
            Some(speed) => {
                self.speed = speed;
                true
            }
            None => false,
        }
    }

    /// Handles a scheduled unfreeze; events from a superseded freeze are ignored.
    pub(crate) fn expire_freeze(&mut self, now_tick: u64) -> bool {
        match self.frozen_until {
            Some(until) if now_tick >= until => self.unfreeze(),
            _ => false,
        }
    }
}

fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}
