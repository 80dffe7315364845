/// Held (level-triggered) logical signals. Discrete presses such as
/// interact or menu toggles travel as edges on `InputSnapshot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    TurnLeft,
    TurnRight,
    Quit,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::TurnLeft => 2,
            InputAction::TurnRight => 3,
            InputAction::Quit => 4,
        }
    }
}

/// Edge-triggered presses collected between two ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputEdges {
    pub interact: bool,
    pub toggle_camera: bool,
    pub toggle_menu: bool,
    pub close_dialogue: bool,
    pub toggle_sound: bool,
    pub restart: bool,
    pub menu_choice: Option<u8>,
}
