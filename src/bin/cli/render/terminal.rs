use cardstack_lib::flashcards::{CardStatus, SessionStats};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Wrap `text` in `color` when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn status_color(status: CardStatus) -> &'static str {
    match status {
        CardStatus::New => Color::CYAN,
        CardStatus::Easy => Color::GREEN,
        CardStatus::Good => Color::YELLOW,
        CardStatus::Again => Color::RED,
    }
}

pub fn stats_line(stats: &SessionStats, use_color: bool) -> String {
    format!(
        "{} easy, {} good, {} again",
        paint(&stats.easy.to_string(), Color::GREEN, use_color),
        paint(&stats.good.to_string(), Color::YELLOW, use_color),
        paint(&stats.again.to_string(), Color::RED, use_color),
    )
}

/// Shorten `text` to at most `max` characters, on one line
pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 40), "line one line two");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_paint_without_color() {
        assert_eq!(paint("x", Color::BOLD, false), "x");
        assert_eq!(paint("again", status_color(CardStatus::Again), false), "again");
        let stats = SessionStats { easy: 1, good: 2, again: 3 };
        assert_eq!(stats_line(&stats, false), "1 easy, 2 good, 3 again");
    }
}
