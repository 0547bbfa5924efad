/// Line protocol for the daemon's stdin.
///
/// Plain lines are scene names. Lines starting with ':' are commands.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Scene(String),
    Discover,
    Reload,
    Quit,
    Unknown(String),
    Empty,
}

pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    match line.strip_prefix(':') {
        Some("discover") => Input::Discover,
        Some("reload") => Input::Reload,
        Some("quit") | Some("q") => Input::Quit,
        Some(other) => Input::Unknown(other.to_string()),
        None => Input::Scene(line.to_string()),
    }
}
