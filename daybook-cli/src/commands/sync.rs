use std::sync::Arc;

use anyhow::Result;
use daybook_core::config::GlobalConfig;
use daybook_core::remote::{Collection, LiveEvent, Provider, RemoteStore};
use daybook_core::store::Store;
use daybook_core::sync::SyncEngine;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;

pub async fn run(store: &mut Store, config: &GlobalConfig, watch: bool) -> Result<()> {
    let Some(user_id) = &config.user_id else {
        anyhow::bail!(
            "Not signed in.\n\n\
            Set user_id (and provider) in {}",
            GlobalConfig::config_path()?.display()
        );
    };
    let Some(provider_name) = &config.provider else {
        anyhow::bail!(
            "No provider configured.\n\n\
            Set provider in {}",
            GlobalConfig::config_path()?.display()
        );
    };

    let remote: Arc<dyn RemoteStore> = Arc::new(Provider::from_name(provider_name));
    let mut engine = SyncEngine::new(remote.clone(), user_id.clone());

    engine.start(store).await?;
    println!(
        "Synced: {} tasks, {} events, {} journal days, {} projects",
        store.tasks().len(),
        store.events().len(),
        store.journal().len(),
        store.projects().len()
    );

    if !watch {
        return Ok(());
    }

    // Funnel all four collection feeds into one channel.
    let (tx, mut rx) = mpsc::unbounded_channel::<LiveEvent>();
    for collection in Collection::ALL {
        let mut feed = remote.subscribe(user_id, collection).await?;
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(event) = feed.recv().await {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    println!("{}", "Watching for remote changes (ctrl-c to stop)".dimmed());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };
                describe(&event);
                engine.apply_live(store, event)?;
            }
        }
    }
    Ok(())
}

fn describe(event: &LiveEvent) {
    match event {
        LiveEvent::TaskUpserted(task) => println!("task updated: {}", task.text),
        LiveEvent::TaskDeleted(id) => println!("task deleted: {id}"),
        LiveEvent::EventUpserted(ev) => println!("event updated: {}", ev.text),
        LiveEvent::EventDeleted(id) => println!("event deleted: {id}"),
        LiveEvent::JournalUpserted(entry) => println!("journal updated: {}", entry.key()),
        LiveEvent::JournalDeleted(key) => println!("journal deleted: {key}"),
        LiveEvent::ProjectUpserted(project) => println!("project updated: {}", project.name),
        LiveEvent::ProjectDeleted(id) => println!("project deleted: {id}"),
    }
}
