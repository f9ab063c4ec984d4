use chrono::NaiveDate;
use ratatui::widgets::TableState;

use crate::commands::{parse_due_date, parse_recurrence};
use crate::models::{NewTask, Task, TaskEdit};
use crate::plants::PlantCatalog;
use crate::species::SpeciesLookup;
use crate::storage::BlobStore;
use crate::store::TaskStore;

#[derive(PartialEq, Debug)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

#[derive(PartialEq, Debug)]
pub enum ViewMode {
    Tasks,
    Plants,
}

#[derive(PartialEq, Debug)]
pub enum InputField {
    None,
    Title,
    Plant,
    Description,
    Recur,
    Due,
}

pub enum DisplayItem {
    Section(String, usize), // Label, count
    Task(Task),
}

/// State for the multi-step "Add" wizards.
#[derive(Default)]
pub struct AddState {
    pub title: String,
    pub plant: Option<String>,
    pub description: Option<String>,
    pub due: String,
    pub step: usize, // Tasks: 0 Title, 1 Plant, 2 Description, 3 Due, 4 Recur. Plants: 0 Name, 1 Photo
}

pub struct App {
    pub store: TaskStore<Box<dyn BlobStore>>,
    pub catalog: PlantCatalog<Box<dyn BlobStore>>,
    pub lookup: Box<dyn SpeciesLookup>,
    pub display_items: Vec<DisplayItem>,
    pub state: TableState,
    pub plant_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<String>,
    pub add_state: AddState,
    pub show_completed: bool,
    /// One-line feedback shown above the help bar.
    pub status: Option<String>,
    pub today: NaiveDate,
}

impl App {
    pub fn new(
        store: TaskStore<Box<dyn BlobStore>>,
        catalog: PlantCatalog<Box<dyn BlobStore>>,
        lookup: Box<dyn SpeciesLookup>,
        today: NaiveDate,
    ) -> App {
        let mut app = App {
            store,
            catalog,
            lookup,
            display_items: Vec::new(),
            state: TableState::default(),
            plant_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            show_completed: false,
            status: None,
            today,
        };
        app.reload();
        app
    }

    fn list_len(&self) -> usize {
        match self.view_mode {
            ViewMode::Tasks => self.display_items.len(),
            ViewMode::Plants => self.catalog.plants().len(),
        }
    }

    fn list_state(&mut self) -> &mut TableState {
        match self.view_mode {
            ViewMode::Tasks => &mut self.state,
            ViewMode::Plants => &mut self.plant_state,
        }
    }

    /// Selects the next row in the current list.
    pub fn next(&mut self) {
        let len = self.list_len();
        if len == 0 { return; }
        let state = self.list_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous row in the current list.
    pub fn previous(&mut self) {
        let len = self.list_len();
        if len == 0 { return; }
        let state = self.list_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    /// The task under the cursor, if the cursor is on a task row.
    pub fn selected_task(&self) -> Option<&Task> {
        if self.view_mode != ViewMode::Tasks { return None; }
        match self.state.selected().and_then(|i| self.display_items.get(i)) {
            Some(DisplayItem::Task(t)) => Some(t),
            _ => None,
        }
    }

    /// Marks the selected task as complete.
    pub fn complete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else { return };
        self.status = match self.store.complete(&id) {
            Ok(done) => done.spawned.map(|next| format!("Next '{}' due {}", next.title, next.due_date)),
            Err(e) => Some(e.to_string()),
        };
        self.reload();
    }

    /// Deletes the selected task or plant.
    pub fn delete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => {
                if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                    self.store.delete(&id);
                }
            }
            ViewMode::Plants => {
                let id = self
                    .plant_state
                    .selected()
                    .and_then(|i| self.catalog.plants().get(i))
                    .map(|p| p.id.clone());
                if let Some(id) = id {
                    self.catalog.remove(&id);
                }
            }
        }
        self.reload();
    }

    /// Rebuilds the sectioned display list from the store.
    pub fn reload(&mut self) {
        let agenda = self.store.agenda(self.today);
        let mut items = Vec::new();

        if !agenda.today.is_empty() {
            items.push(DisplayItem::Section("Today".into(), agenda.today.len()));
            items.extend(agenda.today.iter().map(|t| DisplayItem::Task((*t).clone())));
        }
        if !agenda.upcoming.is_empty() {
            let label = if agenda.today.is_empty() { "Tasks" } else { "Upcoming" };
            items.push(DisplayItem::Section(label.into(), agenda.upcoming.len()));
            items.extend(agenda.upcoming.iter().map(|t| DisplayItem::Task((*t).clone())));
        }
        if !agenda.completed.is_empty() {
            items.push(DisplayItem::Section("Completed".into(), agenda.completed.len()));
            if self.show_completed {
                items.extend(agenda.completed.iter().map(|t| DisplayItem::Task((*t).clone())));
            }
        }
        self.display_items = items;

        clamp_selection(&mut self.state, self.display_items.len());
        clamp_selection(&mut self.plant_state, self.catalog.plants().len());
    }

    /// Toggles the visibility of completed tasks.
    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.reload();
    }

    /// Toggles between Task and Plant views.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::Plants,
            ViewMode::Plants => ViewMode::Tasks,
        };
    }

    /// Opens the "Add" wizard for the current view.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
        self.status = None;
    }

    /// Opens the editor for one field of the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        let Some(t) = self.selected_task() else { return };
        let prefill = match field {
            InputField::Title => t.title.clone(),
            InputField::Plant => t.plant_name.clone().unwrap_or_default(),
            InputField::Description => t.description.clone().unwrap_or_default(),
            InputField::Recur => t.frequency().map(|f| f.label().to_string()).unwrap_or_default(),
            InputField::Due => t.due_date.to_string(),
            InputField::None => return,
        };
        self.target_id = Some(t.id.clone());
        self.input_buffer = prefill;
        self.input_field = field;
        self.input_mode = InputMode::Editing;
        self.status = None;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
    }

    /// Handles Enter in the input box. Each submission finishes its store
    /// call before the next key is read.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    fn take_optional(&mut self) -> Option<String> {
        let s = std::mem::take(&mut self.input_buffer);
        if s.trim().is_empty() { None } else { Some(s) }
    }

    fn handle_adding_input(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => match self.add_state.step {
                0 => { // Title
                    if !self.input_buffer.trim().is_empty() {
                        self.add_state.title = std::mem::take(&mut self.input_buffer);
                        self.add_state.step += 1;
                    }
                }
                1 => { // Plant
                    self.add_state.plant = self.take_optional();
                    self.add_state.step += 1;
                }
                2 => { // Description
                    self.add_state.description = self.take_optional();
                    self.add_state.step += 1;
                }
                3 => { // Due
                    match parse_due_date(&self.input_buffer, self.today) {
                        Ok(_) => {
                            self.add_state.due = std::mem::take(&mut self.input_buffer);
                            self.add_state.step += 1;
                            self.status = None;
                        }
                        Err(e) => self.status = Some(e.to_string()),
                    }
                }
                4 => { // Recur
                    let frequency = match parse_recurrence(&self.input_buffer) {
                        Ok(f) => f,
                        Err(e) => {
                            self.status = Some(e.to_string());
                            return;
                        }
                    };
                    let due_date = parse_due_date(&self.add_state.due, self.today).unwrap_or(self.today);
                    let new = NewTask {
                        title: std::mem::take(&mut self.add_state.title),
                        plant_name: self.add_state.plant.take(),
                        description: self.add_state.description.take(),
                        due_date,
                        frequency,
                    };
                    self.status = match self.store.create(new) {
                        Ok(t) => Some(format!("Added '{}'", t.title)),
                        Err(e) => Some(e.to_string()),
                    };
                    self.cancel_input();
                    self.reload();
                }
                _ => {}
            },
            ViewMode::Plants => match self.add_state.step {
                0 => { // Name
                    if !self.input_buffer.trim().is_empty() {
                        self.add_state.title = std::mem::take(&mut self.input_buffer);
                        self.add_state.step += 1;
                    }
                }
                1 => { // Photo
                    let photo = self.take_optional();
                    let name = std::mem::take(&mut self.add_state.title);
                    self.status = match self.catalog.add(&name, photo, self.lookup.as_ref()) {
                        Ok(added) => match added.enrichment_error {
                            Some(e) => Some(format!("Added '{}' without care data: {}", added.plant.name, e)),
                            None => Some(format!("Added '{}'", added.plant.name)),
                        },
                        Err(e) => Some(e.to_string()),
                    };
                    self.cancel_input();
                    self.reload();
                }
                _ => {}
            },
        }
    }

    fn handle_editing_input(&mut self) {
        let Some(id) = self.target_id.clone() else { return };
        let Some(current) = self.store.get(&id) else {
            self.cancel_input();
            self.reload();
            return;
        };

        let value = self.input_buffer.clone();
        let result = match self.input_field {
            InputField::Due => parse_due_date(&value, self.today)
                .and_then(|d| self.store.reschedule(&id, d).map(|_| ())),
            InputField::None => Ok(()),
            _ => {
                let mut edit = TaskEdit::from_task(current);
                let parsed = match self.input_field {
                    InputField::Title => {
                        edit.title = value;
                        Ok(())
                    }
                    InputField::Plant => {
                        edit.plant_name = Some(value);
                        Ok(())
                    }
                    InputField::Description => {
                        edit.description = Some(value);
                        Ok(())
                    }
                    _ => parse_recurrence(&value).map(|f| edit.frequency = f),
                };
                parsed.and_then(|_| self.store.edit(&id, edit).map(|_| ()))
            }
        };

        match result {
            Ok(()) => {
                self.cancel_input();
                self.reload();
            }
            // Keep the box open so the user can correct the value.
            Err(e) => self.status = Some(e.to_string()),
        }
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}
