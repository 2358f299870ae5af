use anyhow::Result;
use chrono::NaiveDate;
use daybook_core::date::date_key;
use daybook_core::store::Store;
use daybook_core::task::TaskPatch;

pub fn run(store: &mut Store, id: &str, on: Option<NaiveDate>, done: bool) -> Result<()> {
    let matches: Vec<String> = store
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(id))
        .map(|t| t.id.clone())
        .collect();
    let task_id = match matches.as_slice() {
        [one] => one.clone(),
        [] => anyhow::bail!("No task matches '{id}'"),
        _ => anyhow::bail!("'{id}' is ambiguous ({} matches)", matches.len()),
    };

    let is_recurring = store
        .task(&task_id)
        .is_some_and(daybook_core::task::Task::is_recurring);
    if is_recurring && on.is_none() {
        anyhow::bail!("This task repeats; pass --on YYYY-MM-DD to pick the occurrence");
    }

    let task = store.update_task(&task_id, TaskPatch::completed(done), on)?;

    match (done, on) {
        (true, Some(date)) => println!("Done: {} on {}", task.text, date_key(date)),
        (true, None) => println!("Done: {}", task.text),
        (false, Some(date)) => println!("Reopened: {} on {}", task.text, date_key(date)),
        (false, None) => println!("Reopened: {}", task.text),
    }
    Ok(())
}
