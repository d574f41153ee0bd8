//! Modal selection menu: `Closed -> Open -> Closed`.

use crate::core::actions::{EditKey, InputAction};
use crate::error::{EngineError, EngineResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub disabled: bool,
    pub is_active: bool,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}

pub type MenuResolve = Box<dyn FnOnce(Option<MenuItem>) + Send>;

pub struct MenuState {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub title: Option<String>,
    on_resolve: MenuResolve,
}

impl std::fmt::Debug for MenuState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuState")
            .field("items", &self.items)
            .field("selected", &self.selected)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub enum MenuController {
    #[default]
    Closed,
    Open(MenuState),
}

/// What the engine should do with a key after the menu saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    /// The menu used the key; repaint.
    Consumed,
    /// The menu resolved and closed.
    Closed,
    /// The menu closed and the key should go to the editor.
    PassThrough,
    /// Not a menu key and the menu stays open.
    Ignored,
}

impl MenuController {
    /// Open a menu. Fails without calling `on_resolve` when one is already open.
    pub fn open(
        &mut self,
        items: Vec<MenuItem>,
        title: Option<String>,
        on_resolve: MenuResolve,
    ) -> EngineResult<()> {
        if self.is_open() {
            return Err(EngineError::MenuAlreadyOpen);
        }
        let selected = items
            .iter()
            .position(|item| item.is_active && !item.disabled)
            .or_else(|| items.iter().position(|item| !item.disabled))
            .unwrap_or(0);
        tracing::debug!(items = items.len(), selected, "menu opened");
        *self = MenuController::Open(MenuState {
            items,
            selected,
            title,
            on_resolve,
        });
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        matches!(self, MenuController::Open(_))
    }

    pub fn state(&self) -> Option<&MenuState> {
        match self {
            MenuController::Open(state) => Some(state),
            MenuController::Closed => None,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state().map(|state| state.selected)
    }

    /// Step `delta` enabled items, wrapping. Disabled items are never selected.
    pub fn move_selection(&mut self, delta: isize) {
        let MenuController::Open(state) = self else {
            return;
        };
        let len = state.items.len() as isize;
        if len == 0 || state.items.iter().all(|item| item.disabled) {
            return;
        }
        let step = delta.signum();
        for _ in 0..delta.unsigned_abs() {
            let mut next = state.selected as isize;
            loop {
                next = (next + step).rem_euclid(len);
                if !state.items[next as usize].disabled {
                    break;
                }
            }
            state.selected = next as usize;
        }
    }

    /// Resolve with the selected item.
    pub fn select(&mut self) -> bool {
        let chosen = match self.state() {
            Some(state) => match state.items.get(state.selected) {
                Some(item) if !item.disabled => Some(item.clone()),
                _ => return false,
            },
            None => return false,
        };
        self.resolve(chosen)
    }

    /// Resolve with `None`. Returns whether a menu was open.
    pub fn cancel(&mut self) -> bool {
        self.resolve(None)
    }

    fn resolve(&mut self, chosen: Option<MenuItem>) -> bool {
        match std::mem::take(self) {
            MenuController::Open(state) => {
                tracing::debug!(chosen = ?chosen.as_ref().map(|item| &item.id), "menu resolved");
                (state.on_resolve)(chosen);
                true
            }
            MenuController::Closed => false,
        }
    }

    pub fn handle_action(&mut self, action: &InputAction) -> MenuOutcome {
        if !self.is_open() {
            return MenuOutcome::Ignored;
        }
        match action {
            InputAction::Key(EditKey::Up) => {
                self.move_selection(-1);
                MenuOutcome::Consumed
            }
            InputAction::Key(EditKey::Down) | InputAction::Key(EditKey::Tab) => {
                self.move_selection(1);
                MenuOutcome::Consumed
            }
            InputAction::Submit => {
                if self.select() {
                    MenuOutcome::Closed
                } else {
                    MenuOutcome::Consumed
                }
            }
            InputAction::Key(EditKey::Escape) => {
                self.cancel();
                MenuOutcome::Closed
            }
            InputAction::InsertChar(_) | InputAction::InsertText(_) | InputAction::Paste { .. } => {
                self.cancel();
                MenuOutcome::PassThrough
            }
            _ => MenuOutcome::Ignored,
        }
    }
}
