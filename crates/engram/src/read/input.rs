//! Line commands typed while reading.

/// Speed step for `+` and `-`.
pub const WPM_STEP: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Acknowledge a stop, or play/pause when none is active.
    Enter,
    TogglePlay,
    Rewind,
    Faster,
    Slower,
    /// Jump to a 1-based word number.
    Seek(usize),
    History,
    Quit,
}

/// Parse one line of input. Unknown input yields `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let command = match parts.next() {
        None => Command::Enter,
        Some("p") => Command::TogglePlay,
        Some("r") => Command::Rewind,
        Some("+") => Command::Faster,
        Some("-") => Command::Slower,
        Some("h") => Command::History,
        Some("q") => Command::Quit,
        Some("g") => Command::Seek(parts.next()?.parse().ok()?),
        Some(_) => return None,
    };
    Some(command)
}

pub const HELP: &str =
    "Enter: continue / play-pause   p: play-pause   r: rewind   +/-: speed   g N: go to word N   h: history   q: quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(""), Some(Command::Enter));
        assert_eq!(parse_command("  \n"), Some(Command::Enter));
        assert_eq!(parse_command("p"), Some(Command::TogglePlay));
        assert_eq!(parse_command("+"), Some(Command::Faster));
        assert_eq!(parse_command("-"), Some(Command::Slower));
        assert_eq!(parse_command("q"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_seek() {
        assert_eq!(parse_command("g 120"), Some(Command::Seek(120)));
        assert_eq!(parse_command("g"), None);
        assert_eq!(parse_command("g many"), None);
    }

    #[test]
    fn test_unknown_input() {
        assert_eq!(parse_command("jump"), None);
    }
}
