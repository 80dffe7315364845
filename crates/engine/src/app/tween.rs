/// Ease-out cubic: fast start, settles into the target.
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Tick-based scalar animation from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start_tick: u64,
    pub duration_ticks: u64,
}

impl Tween {
    pub fn new(from: f32, to: f32, start_tick: u64, duration_ticks: u64) -> Self {
        Self {
            from,
            to,
            start_tick,
            duration_ticks: duration_ticks.max(1),
        }
    }

    pub fn progress(&self, now_tick: u64) -> f32 {
        let elapsed = now_tick.saturating_sub(self.start_tick);
        (elapsed as f32 / self.duration_ticks as f32).min(1.0)
    }

    pub fn sample(&self, now_tick: u64) -> f32 {
        let eased = ease_out_cubic(self.progress(now_tick));
        self.from + (self.to - self.from) * eased
    }

    pub fn is_finished(&self, now_tick: u64) -> bool {
        now_tick.saturating_sub(self.start_tick) >= self.duration_ticks
    }
}
