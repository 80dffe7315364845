use engine::{ChallengeDef, SceneWorld, StepTrigger, Vec3};

/// Read-only projection handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChallengeView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub steps: Vec<StepView>,
    pub completed: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StepView {
    pub description: String,
    pub completed: bool,
}

impl ChallengeView {
    pub(crate) fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.completed).count()
    }

    pub(crate) fn current_step(&self) -> Option<&StepView> {
        self.steps.iter().find(|step| !step.completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StartOutcome {
    Started { switched_from: Option<String> },
    AlreadyActive,
    AlreadyCompleted,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChallengeEvent<'a> {
    TalkedTo(&'a str),
    ProximityCheck,
}

/// Something the player should be told after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChallengeNotice {
    Started { title: String, description: String },
    Reminder { title: String, description: String },
    AlreadyCompleted { title: String },
    StepCompleted {
        title: String,
        step_index: usize,
        speaker: Option<String>,
        line: Option<String>,
    },
    Completed { title: String, reward: String },
}

#[derive(Debug, Clone)]
struct ChallengeState {
    def: ChallengeDef,
    step_done: Vec<bool>,
    completed: bool,
}

impl ChallengeState {
    fn reset_steps(&mut self) {
        self.step_done.iter_mut().for_each(|done| *done = false);
    }

    fn first_incomplete_step(&self) -> Option<usize> {
        self.step_done.iter().position(|done| !done)
    }
}

/// Ordered catalog with at most one active challenge.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChallengeBook {
    challenges: Vec<ChallengeState>,
    active: Option<usize>,
}

impl ChallengeBook {
    pub(crate) fn new(defs: &[ChallengeDef]) -> Self {
        Self {
            challenges: defs
                .iter()
                .map(|def| ChallengeState {
                    step_done: vec![false; def.steps.len()],
                    def: def.clone(),
                    completed: false,
                })
                .collect(),
            active: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.challenges.len()
    }

    pub(crate) fn id_at(&self, index: usize) -> Option<&str> {
        self.challenges
            .get(index)
            .map(|challenge| challenge.def.id.as_str())
    }

    pub(crate) fn active_id(&self) -> Option<&str> {
        self.active.and_then(|index| self.id_at(index))
    }

    pub(crate) fn start(&mut self, id: &str, notices: &mut Vec<ChallengeNotice>) -> StartOutcome {
        let Some(index) = self
            .challenges
            .iter()
            .position(|challenge| challenge.def.id == id)
        else {
            return StartOutcome::Unknown;
        };

        let target = &self.challenges[index];
        if target.completed {
            notices.push(ChallengeNotice::AlreadyCompleted {
                title: target.def.title.clone(),
            });
            return StartOutcome::AlreadyCompleted;
        }
        if self.active == Some(index) {
            notices.push(ChallengeNotice::Reminder {
                title: target.def.title.clone(),
                description: target.def.description.clone(),
            });
            return StartOutcome::AlreadyActive;
        }

        let switched_from = self.active.map(|previous| {
            let previous = &mut self.challenges[previous];
            previous.reset_steps();
            previous.def.id.clone()
        });
        self.active = Some(index);
        let target = &self.challenges[index];
        notices.push(ChallengeNotice::Started {
            title: target.def.title.clone(),
            description: target.def.description.clone(),
        });
        StartOutcome::Started { switched_from }
    }

    /// Evaluates only the active challenge's first incomplete step.
    pub(crate) fn notify_event(
        &mut self,
        event: ChallengeEvent<'_>,
        world: &SceneWorld,
        player_position: Vec3,
        notices: &mut Vec<ChallengeNotice>,
    ) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        let challenge = &self.challenges[active];
        let Some(step_index) = challenge.first_incomplete_step() else {
            return false;
        };
        let satisfied = match (&challenge.def.steps[step_index].trigger, event) {
            (StepTrigger::Talk { npc }, ChallengeEvent::TalkedTo(name)) => npc == name,
            (StepTrigger::Near { tag, radius }, ChallengeEvent::ProximityCheck) => {
                world.entities().iter().any(|entity| {
                    entity.has_tag(tag)
                        && entity.transform.position.distance(player_position) <= *radius
                })
            }
            _ => false,
        };
        satisfied && self.complete_step_if_ready(step_index, notices)
    }

    /// Marks `step_index` of the active challenge done if every earlier step
    /// is done. Repeat calls are no-ops. Returns true if the step changed.
    pub(crate) fn complete_step_if_ready(
        &mut self,
        step_index: usize,
        notices: &mut Vec<ChallengeNotice>,
    ) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        let challenge = &mut self.challenges[active];
        if step_index >= challenge.step_done.len()
            || challenge.step_done[step_index]
            || challenge.step_done[..step_index].iter().any(|done| !done)
        {
            return false;
        }

        challenge.step_done[step_index] = true;
        let step = &challenge.def.steps[step_index];
        let speaker = match &step.trigger {
            StepTrigger::Talk { npc } => Some(npc.clone()),
            StepTrigger::Near { .. } => None,
        };
        notices.push(ChallengeNotice::StepCompleted {
            title: challenge.def.title.clone(),
            step_index,
            speaker,
            line: step.say.clone(),
        });

        if challenge.step_done.iter().all(|done| *done) {
            challenge.completed = true;
            notices.push(ChallengeNotice::Completed {
                title: challenge.def.title.clone(),
                reward: challenge.def.reward.clone(),
            });
            self.active = None;
        }
        true
    }

    pub(crate) fn views(&self) -> Vec<ChallengeView> {
        (0..self.challenges.len())
            .map(|index| self.view_at(index))
            .collect()
    }

    pub(crate) fn active_view(&self) -> Option<ChallengeView> {
        self.active.map(|index| self.view_at(index))
    }

    fn view_at(&self, index: usize) -> ChallengeView {
        let challenge = &self.challenges[index];
        ChallengeView {
            id: challenge.def.id.clone(),
            title: challenge.def.title.clone(),
            description: challenge.def.description.clone(),
            steps: challenge
                .def
                .steps
                .iter()
                .zip(&challenge.step_done)
                .map(|(step, done)| StepView {
                    description: step.description.clone(),
                    completed: *done,
                })
                .collect(),
            completed: challenge.completed,
            active: self.active == Some(index),
        }
    }
}
