use anyhow::Result;
use chrono::NaiveDate;
use daybook_core::date::date_key;
use daybook_core::journal::prompt_for_date;
use daybook_core::store::Store;
use owo_colors::OwoColorize;

pub fn run(store: &mut Store, date: NaiveDate, write: Option<String>) -> Result<()> {
    if let Some(content) = write {
        store.save_journal_entry(date, content)?;
        println!("Saved journal for {}", date_key(date));
        return Ok(());
    }

    println!("{}", date_key(date).bold());
    println!("{}", prompt_for_date(date).italic().dimmed());
    match store.journal_entry(date) {
        Some(entry) => println!("\n{}", entry.content),
        None => println!("\n{}", "no entry yet".dimmed()),
    }
    Ok(())
}
