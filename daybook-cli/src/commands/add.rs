use anyhow::Result;
use chrono::NaiveDate;
use daybook_core::recurrence::RecurrencePattern;
use daybook_core::store::Store;
use daybook_core::task::{NewTask, Priority};

pub fn run(
    store: &mut Store,
    text: String,
    due_date: Option<NaiveDate>,
    priority: Option<Priority>,
    recurrence: Option<RecurrencePattern>,
) -> Result<()> {
    if recurrence.is_some() && due_date.is_none() {
        anyhow::bail!("A repeating task needs --due as its anchor date");
    }

    let task = store.add_task(NewTask {
        text,
        due_date,
        priority,
        recurrence,
        ..NewTask::default()
    })?;

    println!("Added task {}", &task.id[..8]);
    Ok(())
}
