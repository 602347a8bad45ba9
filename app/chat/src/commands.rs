//! Parsing of REPL input lines.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Examples,
    Example(usize),
    History,
    About,
    Ask(String),
    Empty,
    Invalid(String),
}

pub fn is_exit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit" | "q")
}

pub fn parse(input: &str) -> Command {
    let input = input.trim();
    if input.is_empty() {
        return Command::Empty;
    }
    if is_exit(input) {
        return Command::Exit;
    }

    let Some(rest) = input.strip_prefix('/') else {
        return Command::Ask(input.to_string());
    };

    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("examples"), None) => Command::Examples,
        (Some("history"), None) => Command::History,
        (Some("about"), None) => Command::About,
        (Some("example"), Some(n)) => match n.parse::<usize>() {
            Ok(n) => Command::Example(n),
            Err(_) => Command::Invalid(format!("'{}' is not an example number", n)),
        },
        (Some("example"), None) => Command::Invalid("usage: /example <n>".to_string()),
        _ => Command::Invalid(format!("Unknown command '/{}'", rest)),
    }
}
