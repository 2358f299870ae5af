use anyhow::Result;
use daybook_core::store::Store;

use crate::render::Render;

pub fn run(store: &Store, all: bool) -> Result<()> {
    let mut tasks: Vec<_> = store
        .tasks()
        .iter()
        .filter(|t| all || !t.completed)
        .collect();
    tasks.sort_by_key(|t| t.order);

    if tasks.is_empty() {
        println!("No tasks");
        return Ok(());
    }
    for task in tasks {
        println!("{}", task.render());
    }
    Ok(())
}
