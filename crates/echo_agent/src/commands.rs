use pinned_tui::CommandSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Model,
    Login,
    Clear,
    Quit,
    Unknown(String),
}

/// Commands offered as suggestions while typing `/`.
pub fn catalog() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("/help", "Show available commands", "general"),
        CommandSpec::new("/model", "Choose the model", "session"),
        CommandSpec::new("/login", "Enter an API key", "session"),
        CommandSpec::new("/clear", "Hide the help panel", "general"),
        CommandSpec::new("/quit", "Exit", "general"),
    ]
}

pub fn help_lines() -> Vec<String> {
    let mut lines: Vec<String> = catalog()
        .into_iter()
        .map(|spec| format!("{:<10} {}", spec.command, spec.description))
        .collect();
    lines.push(String::new());
    lines.push("ctrl+o     expand the last tool result".to_string());
    lines.push("⌥A ⌥V ⌥T   cycle auto-continue, approval, thinking".to_string());
    lines.push("ctrl+c     interrupt the run, or clear the line".to_string());
    lines
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_string();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/model" => SlashCommand::Model,
        "/login" => SlashCommand::Login,
        "/clear" => SlashCommand::Clear,
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::{catalog, parse_slash_command, SlashCommand};

    #[test]
    fn parses_known_and_unknown_commands() {
        assert_eq!(parse_slash_command("hello"), None);
        assert_eq!(parse_slash_command("  /model gpt"), Some(SlashCommand::Model));
        assert_eq!(parse_slash_command("/exit"), Some(SlashCommand::Quit));
        assert_eq!(
            parse_slash_command("/nope"),
            Some(SlashCommand::Unknown("/nope".to_string()))
        );
    }

    #[test]
    fn every_catalog_entry_parses() {
        for spec in catalog() {
            assert!(!matches!(
                parse_slash_command(&spec.command),
                Some(SlashCommand::Unknown(_)) | None
            ));
        }
    }
}
