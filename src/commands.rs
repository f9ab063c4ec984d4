use std::io::{self, Write};

use chrono::{Days, NaiveDate};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::error::SproutsError;
use crate::models::{Frequency, NewTask, Task, TaskEdit};
use crate::plants::PlantCatalog;
use crate::schedule::{classify, DueBucket};
use crate::species::SpeciesLookup;
use crate::storage::BlobStore;
use crate::store::TaskStore;

/// Parses a due date: `YYYY-MM-DD`, `today` or `tomorrow`.
pub fn parse_due_date(input: &str, today: NaiveDate) -> Result<NaiveDate, SproutsError> {
    match input.trim().to_lowercase().as_str() {
        "" | "today" => Ok(today),
        "tomorrow" => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| SproutsError::Validation("Date out of range.".into())),
        s => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
            SproutsError::Validation(format!("Invalid due date '{}': {}. Use YYYY-MM-DD.", input, e))
        }),
    }
}

/// Parses a recurrence argument. `none`, `off` and `never` turn recurrence off.
pub fn parse_recurrence(input: &str) -> Result<Option<Frequency>, SproutsError> {
    match input.trim().to_lowercase().as_str() {
        "" | "none" | "off" | "never" => Ok(None),
        s => s.parse().map(Some),
    }
}

/// Short form of an id for tables: its last 8 characters.
///
/// The head of a v7 id is a millisecond timestamp shared by ids created close
/// together, the tail is random. `TaskStore::resolve_id` accepts either end.
pub fn short_id(id: &str) -> &str {
    id.len()
        .checked_sub(8)
        .and_then(|start| id.get(start..))
        .unwrap_or(id)
}

/// Adds a new care task. Returns the new id.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add<B: BlobStore>(
    store: &mut TaskStore<B>,
    title: String,
    plant: Option<String>,
    description: Option<String>,
    due: String,
    recur: Option<String>,
    today: NaiveDate,
    silent: bool,
) -> Option<String> {
    let due_date = match parse_due_date(&due, today) {
        Ok(d) => d,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return None;
        }
    };
    let frequency = match recur.as_deref().map(parse_recurrence).transpose() {
        Ok(f) => f.flatten(),
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return None;
        }
    };

    let new = NewTask { title, plant_name: plant, description, due_date, frequency };
    match store.create(new) {
        Ok(t) => {
            if !silent { println!("Task added (id = {})", short_id(&t.id)); }
            Some(t.id.clone())
        }
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            None
        }
    }
}

/// Marks a task as complete. A recurring task gets its next occurrence.
pub fn cmd_complete<B: BlobStore>(store: &mut TaskStore<B>, id: &str, silent: bool) {
    let id = match store.resolve_id(id) {
        Ok(id) => id,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    match store.complete(&id) {
        Ok(done) if done.already_completed => {
            if !silent { println!("Task {} was already complete.", short_id(&id)); }
        }
        Ok(done) => {
            if !silent {
                println!("Task {} marked as complete.", short_id(&id));
                if let Some(next) = &done.spawned {
                    println!("Next '{}' scheduled for {} (id = {})", next.title, next.due_date, short_id(&next.id));
                }
            }
        }
        Err(e) => {
            if !silent { eprintln!("{}", e); }
        }
    }
}

/// Removes a single task. Other occurrences of the same series stay.
pub fn cmd_remove<B: BlobStore>(store: &mut TaskStore<B>, id: &str, silent: bool) {
    let id = match store.resolve_id(id) {
        Ok(id) => id,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    match store.delete(&id) {
        Some(t) => {
            if !silent { println!("Task {} removed.", short_id(&t.id)); }
        }
        None => {
            if !silent { eprintln!("Task {} not found.", short_id(&id)); }
        }
    }
}

/// Edits the descriptive fields of a task and every other occurrence in its
/// series. Empty strings clear optional fields.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit<B: BlobStore>(
    store: &mut TaskStore<B>,
    id: &str,
    title: Option<String>,
    plant: Option<String>,
    description: Option<String>,
    recur: Option<String>,
    silent: bool,
) {
    let id = match store.resolve_id(id) {
        Ok(id) => id,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    let Some(current) = store.get(&id) else { return };

    let mut edit = TaskEdit::from_task(current);
    if let Some(t) = title { edit.title = t; }
    if let Some(p) = plant { edit.plant_name = Some(p); }
    if let Some(d) = description { edit.description = Some(d); }
    if let Some(r) = recur {
        match parse_recurrence(&r) {
            Ok(f) => edit.frequency = f,
            Err(e) => {
                if !silent { eprintln!("{}", e); }
                return;
            }
        }
    }

    match store.edit(&id, edit) {
        Ok(1) => {
            if !silent { println!("Task {} updated.", short_id(&id)); }
        }
        Ok(n) => {
            if !silent { println!("Task {} updated along with {} related occurrences.", short_id(&id), n - 1); }
        }
        Err(e) => {
            if !silent { eprintln!("{}", e); }
        }
    }
}

/// Moves one task to a new due date.
pub fn cmd_reschedule<B: BlobStore>(store: &mut TaskStore<B>, id: &str, due: &str, today: NaiveDate, silent: bool) {
    let result = parse_due_date(due, today)
        .and_then(|d| store.resolve_id(id).map(|id| (id, d)))
        .and_then(|(id, d)| store.reschedule(&id, d).map(|t| (t.id.clone(), t.due_date)));
    match result {
        Ok((id, d)) => {
            if !silent { println!("Task {} now due {}.", short_id(&id), d); }
        }
        Err(e) => {
            if !silent { eprintln!("{}", e); }
        }
    }
}

fn bucket_color(bucket: &DueBucket, overdue: bool) -> Color {
    match bucket {
        DueBucket::Today => Color::Red,
        DueBucket::Tomorrow => Color::Yellow,
        DueBucket::InDays(_) => Color::Green,
        DueBucket::Calendar(_) if overdue => Color::Red,
        DueBucket::Calendar(_) => Color::Reset,
    }
}

fn task_table(tasks: &[&Task], today: NaiveDate) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Plant").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new("Repeats").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let bucket = classify(t.due_date, today);
        let overdue = t.due_date < today && !t.is_completed();
        let due_color = if t.is_completed() { Color::Grey } else { bucket_color(&bucket, overdue) };
        let (status, status_color) = match t.completed_date {
            Some(d) => (format!("Done {}", d.with_timezone(&chrono::Local).format("%b %-d")), Color::Green),
            None if overdue => ("Overdue".to_string(), Color::Red),
            None => ("Pending".to_string(), Color::Yellow),
        };

        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.title),
            Cell::new(t.plant_name.as_deref().unwrap_or_default()),
            Cell::new(bucket.to_string()).fg(due_color),
            Cell::new(t.due_date),
            Cell::new(t.frequency().map(|f| f.label()).unwrap_or("-")),
            Cell::new(status).fg(status_color),
        ]);
    }
    table
}

/// Lists tasks grouped into Today and Upcoming, plus Completed with `all`.
pub fn cmd_list<B: BlobStore>(store: &TaskStore<B>, all: bool, today: NaiveDate) {
    let agenda = store.agenda(today);
    if store.is_empty() {
        println!("No tasks yet. Add your first plant care task with `sprouts add`.");
        return;
    }

    if !agenda.today.is_empty() {
        println!("Today");
        println!("{}", task_table(&agenda.today, today));
    }
    if !agenda.upcoming.is_empty() {
        println!("{}", if agenda.today.is_empty() { "Tasks" } else { "Upcoming" });
        println!("{}", task_table(&agenda.upcoming, today));
    }
    if !agenda.completed.is_empty() {
        if all {
            println!("Completed ({})", agenda.completed.len());
            println!("{}", task_table(&agenda.completed, today));
        } else {
            println!("Completed ({}) - use --all to show", agenda.completed.len());
        }
    }
    if let Some(next) = store.next_task() {
        let plant = next.plant_name.as_deref().map(|p| format!(" ({})", p)).unwrap_or_default();
        println!("Next: {}{} due {}.", next.title, plant, classify(next.due_date, today));
    }
}

/// Shows every occurrence of the series a task belongs to.
pub fn cmd_chain<B: BlobStore>(store: &TaskStore<B>, id: &str, today: NaiveDate) {
    let id = match store.resolve_id(id) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    match store.chain(&id) {
        Some(mut tasks) => {
            tasks.sort_by_key(|t| t.due_date);
            println!("{}", task_table(&tasks, today));
        }
        None => eprintln!("Task {} not found.", short_id(&id)),
    }
}

/// Adds a plant to the collection, looking up its care data.
pub fn cmd_plant_add<B: BlobStore>(
    catalog: &mut PlantCatalog<B>,
    name: String,
    photo: Option<String>,
    lookup: &dyn SpeciesLookup,
    silent: bool,
) -> Option<String> {
    match catalog.add(&name, photo, lookup) {
        Ok(added) => {
            if !silent {
                println!("Plant '{}' added (id = {})", added.plant.name, short_id(&added.plant.id));
                if let Some(e) = &added.enrichment_error {
                    println!("Care data could not be fetched: {}", e);
                }
            }
            Some(added.plant.id)
        }
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            None
        }
    }
}

/// Lists the plant collection.
pub fn cmd_plant_list<B: BlobStore>(catalog: &PlantCatalog<B>) {
    if catalog.plants().is_empty() {
        println!("No plants found.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Name", "Watering", "Sunlight", "Photo"]);
    for p in catalog.plants() {
        table.add_row(vec![
            short_id(&p.id).to_string(),
            p.name.clone(),
            p.watering.clone().unwrap_or_else(|| "Unknown".into()),
            if p.sunlight.is_empty() { "Unknown".into() } else { p.sunlight.join(", ") },
            p.photo_uri.clone().unwrap_or_else(|| "-".into()),
        ]);
    }
    println!("{table}");
}

/// Removes a plant by id, id prefix or name.
pub fn cmd_plant_remove<B: BlobStore>(catalog: &mut PlantCatalog<B>, key: &str, silent: bool) {
    let removed = catalog.find(key).map(|p| p.id.clone()).and_then(|id| catalog.remove(&id));
    match removed {
        Some(p) => {
            if !silent { println!("Plant '{}' removed.", p.name); }
        }
        None => {
            if !silent { eprintln!("Plant '{}' not found.", key); }
        }
    }
}

/// Deletes all tasks and plants.
pub fn cmd_reset<B: BlobStore, P: BlobStore>(store: &mut TaskStore<B>, catalog: &mut PlantCatalog<P>, force: bool) {
    if !force {
        print!("Are you sure you want to delete all tasks and plants? This cannot be undone. [y/N] ");
        let _ = io::stdout().flush();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() || input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }

    match store.reset().and_then(|_| catalog.reset()) {
        Ok(()) => println!("Database reset successfully."),
        Err(e) => eprintln!("Failed to reset database: {}", e),
    }
}
