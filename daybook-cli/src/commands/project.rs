use anyhow::Result;
use clap::Subcommand;
use daybook_core::store::Store;
use owo_colors::OwoColorize;

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project
    Add { name: String },
    /// List projects, most recently updated first
    List,
    /// Replace a project's notes
    Write {
        /// Project id, or a unique prefix of one
        id: String,
        content: String,
    },
    /// Delete a project
    Delete {
        /// Project id, or a unique prefix of one
        id: String,
    },
}

fn resolve(store: &Store, prefix: &str) -> Result<String> {
    let matches: Vec<String> = store
        .projects()
        .iter()
        .filter(|p| p.id.starts_with(prefix))
        .map(|p| p.id.clone())
        .collect();
    match matches.as_slice() {
        [one] => Ok(one.clone()),
        [] => anyhow::bail!("No project matches '{prefix}'"),
        _ => anyhow::bail!("'{prefix}' is ambiguous ({} matches)", matches.len()),
    }
}

pub fn run(store: &mut Store, command: ProjectCommands) -> Result<()> {
    match command {
        ProjectCommands::Add { name } => {
            let project = store.add_project(&name)?;
            println!("Added project {} ({})", project.name, &project.id[..8]);
        }
        ProjectCommands::List => {
            let projects = store.projects_by_recency();
            if projects.is_empty() {
                println!("No projects");
            }
            for project in projects {
                println!(
                    "{} {} {}",
                    (&project.id[..8]).dimmed(),
                    project.name,
                    project.updated_at.format("(%Y-%m-%d)").dimmed()
                );
            }
        }
        ProjectCommands::Write { id, content } => {
            let id = resolve(store, &id)?;
            let project = store.save_project_content(&id, content)?;
            println!("Updated {}", project.name);
        }
        ProjectCommands::Delete { id } => {
            let id = resolve(store, &id)?;
            store.delete_project(&id)?;
            println!("Deleted project");
        }
    }
    Ok(())
}
