use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::commands::short_id;
use crate::schedule::{classify, DueBucket};
use super::app::{App, DisplayItem, InputField, InputMode, ViewMode};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(1), // Status
            Constraint::Length(3), // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Tasks => {
            let today = app.today;
            let rows: Vec<Row> = app
                .display_items
                .iter()
                .map(|item| match item {
                    DisplayItem::Section(label, count) => {
                        Row::new(vec![Cell::from(""), Cell::from(format!("{} ({})", label, count))])
                            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    }
                    DisplayItem::Task(t) => {
                        let bucket = classify(t.due_date, today);
                        let style = if t.is_completed() {
                            Style::default().fg(Color::DarkGray)
                        } else if t.due_date < today {
                            Style::default().fg(Color::Red)
                        } else {
                            match bucket {
                                DueBucket::Today => Style::default().fg(Color::Yellow),
                                DueBucket::Tomorrow | DueBucket::InDays(_) => Style::default().fg(Color::Green),
                                DueBucket::Calendar(_) => Style::default(),
                            }
                        };

                        Row::new(vec![
                            Cell::from(short_id(&t.id).to_string()),
                            Cell::from(format!("{} {}", if t.is_completed() { "[x]" } else { "[ ]" }, t.title)),
                            Cell::from(t.plant_name.clone().unwrap_or_default()),
                            Cell::from(bucket.to_string()),
                            Cell::from(t.frequency().map(|f| f.label()).unwrap_or("")),
                            Cell::from(t.description.clone().unwrap_or_default()),
                        ]).style(style)
                    }
                })
                .collect();

            let widths = [
                Constraint::Length(9),
                Constraint::Min(20),
                Constraint::Length(16),
                Constraint::Length(10),
                Constraint::Length(9),
                Constraint::Min(10),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Task", "Plant", "Due", "Repeats", "Notes"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title("Sprouts - Tasks"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        ViewMode::Plants => {
            let rows: Vec<Row> = app
                .catalog
                .plants()
                .iter()
                .map(|p| {
                    Row::new(vec![
                        Cell::from(p.name.clone()),
                        Cell::from(p.watering.clone().unwrap_or_else(|| "Unknown".into())),
                        Cell::from(if p.sunlight.is_empty() { "Unknown".to_string() } else { p.sunlight.join(", ") }),
                    ])
                })
                .collect();

            let widths = [
                Constraint::Min(20),
                Constraint::Length(16),
                Constraint::Min(20),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["Name", "Watering", "Sunlight"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title("Sprouts - Plants"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.plant_state);
        }
    }

    let status = match (&app.status, app.store.has_pending_write()) {
        (Some(msg), _) => msg.clone(),
        (None, true) => "Changes not saved yet, will retry on next change".to_string(),
        (None, false) => String::new(),
    };
    f.render_widget(Paragraph::new(status).style(Style::default().fg(Color::Yellow)), chunks[1]);

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Tasks => "q: Quit | a: Add | Space: Done | n: Title | p: Plant | i: Notes | r: Repeat | t: Due | c: Toggle Done | d: Del | v: Plants",
            ViewMode::Plants => "q: Quit | a: Add Plant | d: Del | v: View Tasks",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[2]);

    if app.input_mode == InputMode::Normal {
        return;
    }

    let area = centered_rect(60, 3, f.area());
    f.render_widget(Clear, area);

    let title = match app.input_mode {
        InputMode::Adding => match app.view_mode {
            ViewMode::Tasks => match app.add_state.step {
                0 => "Add Task: Enter Title",
                1 => "Add Task: Enter Plant Name (Optional)",
                2 => "Add Task: Enter Description (Optional)",
                3 => "Add Task: Enter Due Date (YYYY-MM-DD, empty for today)",
                4 => "Add Task: Repeat (daily, 2-3 days, 4-5 days, weekly, biweekly, monthly or empty)",
                _ => "Add Task",
            },
            ViewMode::Plants => match app.add_state.step {
                0 => "Add Plant: Enter Name",
                1 => "Add Plant: Enter Photo Path (Optional)",
                _ => "Add Plant",
            },
        },
        _ => match app.input_field {
            InputField::Title => "Edit Title (whole series)",
            InputField::Plant => "Edit Plant (whole series)",
            InputField::Description => "Edit Description (whole series)",
            InputField::Recur => "Edit Repeat (whole series, 'none' to stop)",
            InputField::Due => "Edit Due Date (this task only)",
            InputField::None => "Edit",
        },
    };

    let input = Paragraph::new(app.input_buffer.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(input, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
