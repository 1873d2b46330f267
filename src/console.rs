//! Terminal output for the CLI.
//!
//! Colors are used only when stdout is a terminal and `NO_COLOR` is unset.

use crate::models::{ChapterRecord, NovelRecord};
use std::io::{self, IsTerminal};

/// ANSI styles used by the CLI.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Writes labelled progress lines and run summaries to stdout.
#[derive(Debug)]
pub struct Console {
    colors: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self::with_colors(std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal())
    }

    pub fn with_colors(colors: bool) -> Self {
        Self { colors }
    }

    /// Wraps `text` in the escape codes for `styles`.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors || styles.is_empty() {
            return text.to_string();
        }
        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    fn line(&self, label: &str, color: Style, message: &str) -> String {
        format!("[{}] {}", self.style(label, &[color, Style::Bold]), message)
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.line("INFO", Style::Blue, message));
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.line("OK", Style::Green, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.line("WARN", Style::Yellow, message));
    }

    pub fn step(&self, message: &str) {
        println!("{}", self.line("STEP", Style::Cyan, message));
    }

    /// Blank line, then a heading.
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", self.style(title, &[Style::Magenta, Style::Bold]));
    }

    pub fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }

    /// Title, author and completion state of a novel on one line.
    pub fn novel_line(&self, novel: &NovelRecord) -> String {
        let title = novel.title.as_deref().unwrap_or("(untitled)");
        let mut line = self.style(title, &[Style::Bold]);
        if let Some(author) = &novel.author {
            line.push_str(&format!(" by {}", author));
        }
        let state = if novel.is_completed { "completed" } else { "ongoing" };
        line.push_str(&format!(" {}", self.style(&format!("({})", state), &[Style::Dim])));
        line
    }

    /// Number, title and size of a downloaded chapter.
    pub fn chapter_line(&self, chapter: &ChapterRecord) -> String {
        let number = self.style(&format!("{:>5}", chapter.number), &[Style::Cyan]);
        let title = if chapter.title.is_empty() {
            self.style("(untitled)", &[Style::Dim])
        } else {
            chapter.title.clone()
        };
        let size = if chapter.has_content() {
            self.style(&format!("{} chars", chapter.body.chars().count()), &[Style::Dim])
        } else {
            self.style("no content", &[Style::Yellow])
        };
        format!("{} {} {}", number, title, size)
    }
}
