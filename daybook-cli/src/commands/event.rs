use anyhow::Result;
use chrono::NaiveDate;
use daybook_core::event::NewEvent;
use daybook_core::recurrence::RecurrencePattern;
use daybook_core::store::Store;

#[allow(clippy::too_many_arguments)]
pub fn run(
    store: &mut Store,
    text: String,
    date: NaiveDate,
    start: Option<(u32, u32)>,
    end: Option<(u32, u32)>,
    location: Option<String>,
    all_day: bool,
    recurrence: Option<RecurrencePattern>,
) -> Result<()> {
    if !all_day && start.is_none() {
        anyhow::bail!("Pass --at HH:MM, or --all-day");
    }
    let (hour, minutes) = start.unwrap_or((0, 0));
    let (end_hour, end_minutes) = match end {
        Some((h, m)) => (Some(h), Some(m)),
        None => (None, None),
    };

    let event = store.add_event(NewEvent {
        text,
        date,
        hour,
        minutes,
        end_hour,
        end_minutes,
        location,
        all_day,
        recurrence,
        ..NewEvent::default()
    })?;

    println!("Added event {}", &event.id[..8]);
    Ok(())
}
