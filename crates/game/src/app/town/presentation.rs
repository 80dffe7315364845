use engine::{HudDialogue, HudMessage, HudSnapshot};
use tracing::{debug, info};

use super::challenges::ChallengeView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SoundIntent {
    FootstepStart,
    FootstepStop,
    Door,
    Interact,
    ChallengeComplete,
}

impl SoundIntent {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::FootstepStart => "footstep-start",
            Self::FootstepStop => "footstep-stop",
            Self::Door => "door",
            Self::Interact => "interact",
            Self::ChallengeComplete => "challenge-complete",
        }
    }
}

/// Outbound surface of the simulation. Implementors render text and play
/// sounds; the simulation never waits on them.
pub(crate) trait Presenter {
    fn on_dialogue_changed(&mut self, speaker: &str, text: &str);
    fn on_dialogue_cleared(&mut self);
    fn on_interaction_message(&mut self, label: &str, text: &str, duration_ms: u32);
    fn on_challenge_list_changed(&mut self, challenges: &[ChallengeView]);
    fn on_active_challenge_changed(&mut self, challenge: Option<&ChallengeView>);
    fn on_sound_intent(&mut self, intent: SoundIntent);

    /// Wall-clock progress for timed presentation such as messages.
    fn advance_clock(&mut self, _elapsed_ms: u32) {}

    fn hud(&self) -> Option<&HudState> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TimedMessage {
    message: HudMessage,
    remaining_ms: u32,
}

/// Presenter backing the native HUD. There is no audio backend, so sound
/// intents are logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct HudState {
    dialogue: Option<HudDialogue>,
    message: Option<TimedMessage>,
    challenges: Vec<ChallengeView>,
    active: Option<ChallengeView>,
}

impl HudState {
    pub(crate) fn dialogue(&self) -> Option<&HudDialogue> {
        self.dialogue.as_ref()
    }

    pub(crate) fn message(&self) -> Option<&HudMessage> {
        self.message.as_ref().map(|timed| &timed.message)
    }

    /// Pause-menu listing; entries are numbered for the 1-9 keys.
    pub(crate) fn menu_lines(&self, footer: &[String]) -> Vec<String> {
        let mut lines = vec!["CHALLENGES".to_string()];
        for (index, challenge) in self.challenges.iter().enumerate() {
            let status = if challenge.completed {
                " [done]"
            } else if challenge.active {
                " [active]"
            } else {
                ""
            };
            lines.push(format!("{}. {}{}", index + 1, challenge.title, status));
            if challenge.active {
                lines.push(format!("   {}", challenge.description));
            }
        }
        if self.challenges.is_empty() {
            lines.push("(none)".to_string());
        }
        lines.push(String::new());
        lines.extend(footer.iter().cloned());
        lines
    }

    pub(crate) fn objective_lines(&self) -> Vec<String> {
        let Some(active) = &self.active else {
            return Vec::new();
        };
        let mut lines = vec![format!(
            "{} ({}/{})",
            active.title,
            active.completed_steps(),
            active.steps.len()
        )];
        if let Some(step) = active.current_step() {
            lines.push(format!("> {}", step.description));
        }
        lines
    }

    pub(crate) fn snapshot(
        &self,
        menu_footer: Option<&[String]>,
        visible_count: usize,
        hidden_count: usize,
    ) -> HudSnapshot {
        HudSnapshot {
            dialogue: self.dialogue().cloned(),
            message: self.message().cloned(),
            objective_lines: self.objective_lines(),
            menu_lines: menu_footer.map(|footer| self.menu_lines(footer)),
            visible_count,
            hidden_count,
        }
    }
}

impl Presenter for HudState {
    fn on_dialogue_changed(&mut self, speaker: &str, text: &str) {
        self.dialogue = Some(HudDialogue {
            speaker: speaker.to_string(),
            text: text.to_string(),
        });
    }

    fn on_dialogue_cleared(&mut self) {
        self.dialogue = None;
    }

    fn on_interaction_message(&mut self, label: &str, text: &str, duration_ms: u32) {
        self.message = Some(TimedMessage {
            message: HudMessage {
                label: label.to_string(),
                text: text.to_string(),
            },
            remaining_ms: duration_ms,
        });
    }

    fn on_challenge_list_changed(&mut self, challenges: &[ChallengeView]) {
        self.challenges = challenges.to_vec();
    }

    fn on_active_challenge_changed(&mut self, challenge: Option<&ChallengeView>) {
        debug!(
            challenge = challenge.map(|view| view.id.as_str()),
            "objective_changed"
        );
        self.active = challenge.cloned();
    }

    fn on_sound_intent(&mut self, intent: SoundIntent) {
        info!(sound = intent.as_str(), "sound_intent");
    }

    fn advance_clock(&mut self, elapsed_ms: u32) {
        let expired = match self.message.as_mut() {
            Some(timed) => {
                timed.remaining_ms = timed.remaining_ms.saturating_sub(elapsed_ms);
                timed.remaining_ms == 0
            }
            None => false,
        };
        if expired {
            self.message = None;
        }
    }

    fn hud(&self) -> Option<&HudState> {
        Some(self)
    }
}

/// Presenter that records every callback, for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct PresentationLog {
    pub events: Vec<PresentedEvent>,
    pub hud: HudState,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PresentedEvent {
    Dialogue { speaker: String, text: String },
    DialogueCleared,
    Message { label: String, text: String },
    ChallengeList(Vec<ChallengeView>),
    ActiveChallenge(Option<ChallengeView>),
    Sound(SoundIntent),
}

#[cfg(test)]
impl PresentationLog {
    pub(crate) fn dialogue_texts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PresentedEvent::Dialogue { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn sounds(&self) -> Vec<SoundIntent> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PresentedEvent::Sound(intent) => Some(*intent),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Presenter for PresentationLog {
    fn on_dialogue_changed(&mut self, speaker: &str, text: &str) {
        self.events.push(PresentedEvent::Dialogue {
            speaker: speaker.to_string(),
            text: text.to_string(),
        });
        self.hud.on_dialogue_changed(speaker, text);
    }

    fn on_dialogue_cleared(&mut self) {
        self.events.push(PresentedEvent::DialogueCleared);
        self.hud.on_dialogue_cleared();
    }

    fn on_interaction_message(&mut self, label: &str, text: &str, duration_ms: u32) {
        self.events.push(PresentedEvent::Message {
            label: label.to_string(),
            text: text.to_string(),
        });
        self.hud.on_interaction_message(label, text, duration_ms);
    }

    fn on_challenge_list_changed(&mut self, challenges: &[ChallengeView]) {
        self.events
            .push(PresentedEvent::ChallengeList(challenges.to_vec()));
        self.hud.on_challenge_list_changed(challenges);
    }

    fn on_active_challenge_changed(&mut self, challenge: Option<&ChallengeView>) {
        self.events
            .push(PresentedEvent::ActiveChallenge(challenge.cloned()));
        self.hud.on_active_challenge_changed(challenge);
    }

    fn on_sound_intent(&mut self, intent: SoundIntent) {
        self.events.push(PresentedEvent::Sound(intent));
    }

    fn advance_clock(&mut self, elapsed_ms: u32) {
        self.hud.advance_clock(elapsed_ms);
    }

    fn hud(&self) -> Option<&HudState> {
        Some(&self.hud)
    }
}

#[cfg(test)]
mod tests {
    use super::super::challenges::StepView;
    use super::*;

    fn view(active: bool, done: [bool; 2]) -> ChallengeView {
        ChallengeView {
            id: "bakery_run".to_string(),
            title: "Bakery Run".to_string(),
            description: "Fetch bread.".to_string(),
            steps: vec![
                StepView {
                    description: "Talk to Old Tom".to_string(),
                    completed: done[0],
                },
                StepView {
                    description: "Visit the bakery".to_string(),
                    completed: done[1],
                },
            ],
            completed: false,
            active,
        }
    }

    #[test]
    fn objective_lines_show_progress_and_current_step() {
        let mut hud = HudState::default();
        assert!(hud.objective_lines().is_empty());

        let active = view(true, [true, false]);
        hud.on_active_challenge_changed(Some(&active));
        assert_eq!(
            hud.objective_lines(),
            vec!["Bakery Run (1/2)".to_string(), "> Visit the bakery".to_string()]
        );
    }

    #[test]
    fn messages_expire_after_their_duration() {
        let mut hud = HudState::default();
        hud.on_interaction_message("Bakery", "The door swings open.", 100);
        hud.advance_clock(60);
        assert!(hud.message().is_some());
        hud.advance_clock(40);
        assert!(hud.message().is_none());
    }

    #[test]
    fn snapshot_carries_dialogue_and_counts() {
        let mut hud = HudState::default();
        hud.on_dialogue_changed("Lily", "Have you seen the library?");
        let snapshot = hud.snapshot(None, 4, 9);
        assert_eq!(
            snapshot.dialogue,
            Some(HudDialogue {
                speaker: "Lily".to_string(),
                text: "Have you seen the library?".to_string(),
            })
        );
        assert_eq!((snapshot.visible_count, snapshot.hidden_count), (4, 9));

        hud.on_dialogue_cleared();
        assert_eq!(hud.snapshot(None, 0, 0).dialogue, None);
    }

    #[test]
    fn menu_lists_challenges_with_status() {
        let mut hud = HudState::default();
        let mut done = view(false, [true, true]);
        done.completed = true;
        done.title = "Find Teddy".to_string();
        hud.on_challenge_list_changed(&[done, view(true, [false, false])]);

        let footer = vec!["N: sound on".to_string()];
        let lines = hud.snapshot(Some(&footer), 0, 0).menu_lines.expect("menu");
        assert_eq!(
            lines,
            vec![
                "CHALLENGES".to_string(),
                "1. Find Teddy [done]".to_string(),
                "2. Bakery Run [active]".to_string(),
                "   Fetch bread.".to_string(),
                String::new(),
                "N: sound on".to_string(),
            ]
        );
    }
}
