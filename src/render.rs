//! TUI rendering traits for chores types.
//!
//! Extension traits that add colored terminal rendering to chores-core types
//! using owo_colors.

use chores_core::history::HistoryEntry;
use chores_core::palette::UNASSIGNED_COLOR;
use chores_core::model::rule::describe;
use chores_core::{Chore, ChoreCalendarEvent, TeamMember};
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// Parse "#RRGGBB" into its components.
fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Render `text` in a hex color, or plain if the color doesn't parse.
pub fn paint(text: &str, hex: &str) -> String {
    match hex_to_rgb(hex) {
        Some((r, g, b)) => text.truecolor(r, g, b).to_string(),
        None => text.to_string(),
    }
}

impl Render for TeamMember {
    fn render(&self) -> String {
        format!("{} {}", paint("●", &self.color), self.name)
    }
}

fn assignee_label(assignee: Option<&TeamMember>) -> String {
    match assignee {
        Some(member) => member.render(),
        None => format!("{} {}", paint("●", UNASSIGNED_COLOR), "Unassigned".dimmed()),
    }
}

/// A chore with its assignee resolved.
pub struct ChoreRow<'a> {
    pub chore: &'a Chore,
    pub assignee: Option<&'a TeamMember>,
}

impl Render for ChoreRow<'_> {
    fn render(&self) -> String {
        let chore = self.chore;
        let mut line = format!(
            "{}  {}  {}",
            chore.title.bold(),
            describe(chore.recurrence.as_ref()).dimmed(),
            assignee_label(self.assignee)
        );

        if let Some(description) = &chore.description {
            line.push_str(&format!("\n   {}", description.dimmed()));
        }
        line.push_str(&format!("\n   {}", format!("id: {}", chore.id).dimmed()));
        line
    }
}

impl Render for ChoreCalendarEvent {
    fn render(&self) -> String {
        let (mark, title) = if self.is_completed {
            ("✓".green().to_string(), self.title.strikethrough().dimmed().to_string())
        } else {
            ("○".to_string(), self.title.clone())
        };

        format!("{} {} {}", mark, title, assignee_label(self.assignee.as_ref()))
    }
}

impl Render for HistoryEntry {
    fn render(&self) -> String {
        let by = match &self.completed_by_color {
            Some(color) => format!("{} {}", paint("●", color), self.completed_by),
            None => self.completed_by.dimmed().to_string(),
        };
        let at = self
            .completed_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        format!(
            "{}  {}  {}  {}",
            self.occurrence_date.format("%a %b %-d"),
            self.chore_title.bold(),
            by,
            format!("at {}", at).dimmed()
        )
    }
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        -1 => "Yesterday".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
