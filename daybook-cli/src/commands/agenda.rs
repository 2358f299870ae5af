use anyhow::Result;
use chrono::{Duration, NaiveDate};
use daybook_core::date::date_key;
use daybook_core::occurrence::{events_on_date, tasks_on_date};
use daybook_core::store::Store;
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn run(store: &Store, from: NaiveDate, days: u32) -> Result<()> {
    let days = days.max(1);

    for offset in 0..days {
        let date = from + Duration::days(i64::from(offset));
        let tasks = tasks_on_date(store.tasks(), date);
        let events = events_on_date(store.events(), date);

        if days > 1 && tasks.is_empty() && events.is_empty() {
            continue;
        }

        println!("{}", date_key(date).bold());
        for event in &events {
            println!("{}", event.render());
        }
        for task in &tasks {
            println!("{}", task.render());
        }
        if tasks.is_empty() && events.is_empty() {
            println!("  {}", "nothing scheduled".dimmed());
        }
    }
    Ok(())
}
