//! Slash-command suggestions.

/// Marker that starts a command.
pub const COMMAND_MARKER: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub description: String,
    pub category: String,
}

impl CommandSpec {
    pub fn new(
        command: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug)]
pub struct SuggestionEngine {
    catalog: Vec<CommandSpec>,
    max_results: usize,
    visible: Vec<usize>,
    selected: usize,
}

impl SuggestionEngine {
    pub fn new(catalog: Vec<CommandSpec>, max_results: usize) -> Self {
        Self {
            catalog,
            max_results,
            visible: Vec::new(),
            selected: 0,
        }
    }

    /// Recompute the candidates for `text` with the cursor at char index `cursor`.
    pub fn update(&mut self, text: &str, cursor: usize) {
        let previous = self.selected_spec().map(|spec| spec.command.clone());
        self.visible = matching_indices(&self.catalog, text, cursor, self.max_results);
        self.selected = previous
            .and_then(|command| {
                self.visible
                    .iter()
                    .position(|idx| self.catalog[*idx].command == command)
            })
            .unwrap_or(0);
    }

    pub fn clear(&mut self) {
        self.visible.clear();
        self.selected = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn visible(&self) -> Vec<&CommandSpec> {
        self.visible.iter().map(|idx| &self.catalog[*idx]).collect()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_spec(&self) -> Option<&CommandSpec> {
        self.visible
            .get(self.selected)
            .map(|idx| &self.catalog[*idx])
    }

    /// Move the selection, wrapping at both ends.
    pub fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }
}

/// Catalog indices whose command starts with the token before the first space, in catalog order.
fn matching_indices(
    catalog: &[CommandSpec],
    text: &str,
    cursor: usize,
    max_results: usize,
) -> Vec<usize> {
    if !text.starts_with(COMMAND_MARKER) {
        return Vec::new();
    }
    let token_end = text.chars().position(|ch| ch == ' ');
    if let Some(space) = token_end {
        let args: String = text.chars().skip(space + 1).collect();
        if cursor > space && !args.trim().is_empty() {
            return Vec::new();
        }
    }
    let token: String = text
        .chars()
        .take(token_end.unwrap_or(usize::MAX))
        .collect::<String>()
        .to_lowercase();

    catalog
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.command.to_lowercase().starts_with(&token))
        .map(|(idx, _)| idx)
        .take(max_results)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CommandSpec, SuggestionEngine};

    fn engine() -> SuggestionEngine {
        SuggestionEngine::new(
            vec![
                CommandSpec::new("/help", "Show help", "general"),
                CommandSpec::new("/history", "Show history", "general"),
                CommandSpec::new("/hint", "Get a hint", "general"),
                CommandSpec::new("/model", "Pick a model", "session"),
            ],
            5,
        )
    }

    fn commands(engine: &SuggestionEngine) -> Vec<&str> {
        engine
            .visible()
            .into_iter()
            .map(|spec| spec.command.as_str())
            .collect()
    }

    #[test]
    fn prefix_matches_in_catalog_order() {
        let mut engine = engine();
        engine.update("/h", 2);
        assert_eq!(commands(&engine), vec!["/help", "/history", "/hint"]);
        engine.update("/HE", 3);
        assert_eq!(commands(&engine), vec!["/help"]);
    }

    #[test]
    fn cleared_without_marker_or_while_editing_arguments() {
        let mut engine = engine();
        engine.update("help", 4);
        assert!(engine.is_empty());
        engine.update("/model gpt", 10);
        assert!(engine.is_empty());
        engine.update("/model ", 7);
        assert_eq!(commands(&engine), vec!["/model"]);
        engine.update("/mo gpt", 2);
        assert_eq!(commands(&engine), vec!["/model"]);
    }

    #[test]
    fn capped_at_max_results() {
        let catalog = (0..8)
            .map(|idx| CommandSpec::new(format!("/c{idx}"), "", ""))
            .collect();
        let mut engine = SuggestionEngine::new(catalog, 5);
        engine.update("/", 1);
        assert_eq!(engine.visible().len(), 5);
    }

    #[test]
    fn selection_survives_refilter_when_still_present() {
        let mut engine = engine();
        engine.update("/h", 2);
        engine.move_selection(2);
        assert_eq!(engine.selected_spec().map(|s| s.command.as_str()), Some("/hint"));
        engine.update("/hi", 3);
        assert_eq!(commands(&engine), vec!["/history", "/hint"]);
        assert_eq!(engine.selected_index(), 1);
        engine.update("/he", 3);
        assert_eq!(engine.selected_index(), 0);
    }

    #[test]
    fn selection_wraps() {
        let mut engine = engine();
        engine.update("/h", 2);
        engine.move_selection(-1);
        assert_eq!(engine.selected_index(), 2);
        engine.move_selection(1);
        assert_eq!(engine.selected_index(), 0);
    }
}
