//! Read-mostly state pushed in by the host: toggle modes and status metadata.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoContinueMode {
    #[default]
    Off,
    On,
    Dual,
}

impl AutoContinueMode {
    pub fn label(self) -> &'static str {
        match self {
            AutoContinueMode::Off => "off",
            AutoContinueMode::On => "on",
            AutoContinueMode::Dual => "dual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalMode {
    #[default]
    Ask,
    Auto,
}

impl ApprovalMode {
    pub fn label(self) -> &'static str {
        match self {
            ApprovalMode::Auto => "auto",
            ApprovalMode::Ask => "ask",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleState {
    pub auto_continue: AutoContinueMode,
    pub approval: ApprovalMode,
    pub thinking: String,
    pub debug: bool,
}

impl Default for ToggleState {
    fn default() -> Self {
        Self {
            auto_continue: AutoContinueMode::Off,
            approval: ApprovalMode::Ask,
            thinking: "normal".to_string(),
            debug: false,
        }
    }
}

/// Partial update for [`ToggleState`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleUpdate {
    pub auto_continue: Option<AutoContinueMode>,
    pub approval: Option<ApprovalMode>,
    pub thinking: Option<String>,
    pub debug: Option<bool>,
}

impl ToggleState {
    /// Returns whether anything changed.
    pub fn apply(&mut self, update: ToggleUpdate) -> bool {
        let before = self.clone();
        if let Some(mode) = update.auto_continue {
            self.auto_continue = mode;
        }
        if let Some(mode) = update.approval {
            self.approval = mode;
        }
        if let Some(label) = update.thinking {
            self.thinking = label;
        }
        if let Some(debug) = update.debug {
            self.debug = debug;
        }
        *self != before
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMeta {
    pub model: Option<String>,
    pub context_percent: Option<u8>,
    pub profile: Option<String>,
    pub directory: Option<String>,
    pub session: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMetaUpdate {
    pub model: Option<String>,
    pub context_percent: Option<u8>,
    pub profile: Option<String>,
    pub directory: Option<String>,
    pub session: Option<String>,
}

impl StatusMeta {
    pub fn apply(&mut self, update: StatusMetaUpdate) -> bool {
        let before = self.clone();
        if update.model.is_some() {
            self.model = update.model;
        }
        if let Some(percent) = update.context_percent {
            self.context_percent = Some(percent.min(100));
        }
        if update.profile.is_some() {
            self.profile = update.profile;
        }
        if update.directory.is_some() {
            self.directory = update.directory;
        }
        if update.session.is_some() {
            self.session = update.session;
        }
        *self != before
    }
}
