//! Terminal rendering for daybook types.

use daybook_core::date::days_until;
use daybook_core::event::Event;
use daybook_core::occurrence::{EventOnDate, TaskOnDate};
use daybook_core::task::Task;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

fn checkbox(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

fn due_note(task: &Task) -> String {
    if task.is_recurring() {
        return "(repeats)".dimmed().to_string();
    }
    match days_until(task.due_date) {
        Some(d) if d < 0 => format!("({}d overdue)", -d).red().to_string(),
        Some(0) => "(due today)".yellow().to_string(),
        Some(d) => format!("(in {d}d)").dimmed().to_string(),
        None => String::new(),
    }
}

impl Render for Task {
    fn render(&self) -> String {
        let id = &self.id[..8.min(self.id.len())];
        format!(
            "{} {} {} {}",
            checkbox(self.completed),
            id.dimmed(),
            self.text,
            due_note(self)
        )
    }
}

impl Render for TaskOnDate {
    fn render(&self) -> String {
        let template = self.template();
        let id = &template.id[..8.min(template.id.len())];
        let marker = match self {
            TaskOnDate::Template(_) => String::new(),
            TaskOnDate::Occurrence(_) => "↻ ".dimmed().to_string(),
        };
        format!(
            "{} {} {marker}{}",
            checkbox(self.completed()),
            id.dimmed(),
            template.text
        )
    }
}

fn time_range(event: &Event) -> String {
    if event.all_day {
        return "all day".to_string();
    }
    let start = format!("{:02}:{:02}", event.hour, event.minutes);
    let end_minute = event.end_minute_of_day();
    let end = format!("{:02}:{:02}", end_minute / 60, end_minute % 60);
    format!("{start}–{end}")
}

impl Render for EventOnDate {
    fn render(&self) -> String {
        let event = self.template();
        let location = event
            .location
            .as_deref()
            .map(|l| format!(" @ {l}"))
            .unwrap_or_default();
        format!(
            "  {} {}{}",
            time_range(event).cyan(),
            event.text,
            location.dimmed()
        )
    }
}
