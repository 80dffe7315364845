use super::scene::EntityId;

/// A deferred action due at `fire_tick`, optionally aimed at an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent<A> {
    pub fire_tick: u64,
    pub target: Option<EntityId>,
    pub action: A,
    sequence: u64,
}

/// Tick-driven replacement for wall-clock timers. Events fire in
/// `(fire_tick, schedule order)` order and are never cancelled; consumers
/// ignore events whose target state has moved on.
#[derive(Debug)]
pub struct Scheduler<A> {
    pending: Vec<ScheduledEvent<A>>,
    next_sequence: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_sequence: 0,
        }
    }
}

impl<A> Scheduler<A> {
    pub fn schedule(&mut self, fire_tick: u64, target: Option<EntityId>, action: A) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.pending.push(ScheduledEvent {
            fire_tick,
            target,
            action,
            sequence,
        });
    }

    pub fn drain_due(&mut self, now_tick: u64) -> Vec<ScheduledEvent<A>> {
        if !self.pending.iter().any(|event| event.fire_tick <= now_tick) {
            return Vec::new();
        }
        let (mut due, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|event| event.fire_tick <= now_tick);
        self.pending = rest;
        due.sort_by_key(|event| (event.fire_tick, event.sequence));
        due
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_fires_before_its_tick() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(10, Some(EntityId(1)), "unfreeze");

        assert!(scheduler.drain_due(9).is_empty());
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn due_events_fire_once_in_tick_then_schedule_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(12, Some(EntityId(1)), "late");
        scheduler.schedule(10, Some(EntityId(2)), "first");
        scheduler.schedule(10, Some(EntityId(3)), "second");
        scheduler.schedule(40, Some(EntityId(4)), "future");

        let due = scheduler.drain_due(12);
        let actions = due.iter().map(|event| event.action).collect::<Vec<_>>();
        assert_eq!(actions, vec!["first", "second", "late"]);
        assert_eq!(due[0].target, Some(EntityId(2)));
        assert!(scheduler.drain_due(12).is_empty());
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn untargeted_events_fire_like_any_other() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(5, None, "timeout");
        scheduler.schedule(5, Some(EntityId(7)), "unfreeze");

        let due = scheduler.drain_due(5);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].target, None);
        assert_eq!(due[0].action, "timeout");
    }

    #[test]
    fn clear_drops_everything() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(1, Some(EntityId(1)), ());
        scheduler.clear();
        assert!(scheduler.drain_due(u64::MAX).is_empty());
    }
}
