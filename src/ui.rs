use std::collections::HashMap;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span as TextSpan};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::domain::{Span, Task, TaskRegistry, TaxonomyKind};
use crate::storage::{load_tracker, save_tracker};
use crate::trackers::{recent_trackers, remember_tracker};

const RUNNING_ROW_COLOR: Color = Color::LightYellow;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const TOTALS_BAR_WIDTH: usize = 12;

pub fn run_dashboard(
	registry: &mut TaskRegistry,
	tracker_path: &mut PathBuf,
	tick_ms: u64,
) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, registry, tracker_path, tick_ms);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	registry: &mut TaskRegistry,
	tracker_path: &mut PathBuf,
	tick_ms: u64,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::default();

	loop {
		let now = Local::now().naive_local();

		// The event loop owns both cadences: the redraw below is the tick,
		// this check is the roll.
		if registry.roll_all(now.date()) {
			if let Err(err) = persist(tracker_path.as_path(), registry) {
				app.status = format!("error: {err}");
			}
		}

		let view = build_view(registry, now);
		app.clamp_selection(&view);
		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(StdDuration::from_millis(tick_ms))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, registry, tracker_path),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, registry, tracker_path),
					InputMode::Normal => handle_normal_key(&mut app, key.code, registry, tracker_path, &view),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(12), Constraint::Length(5)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage(40),
			Constraint::Percentage(28),
			Constraint::Percentage(32),
		])
		.split(layout[0]);

	render_tasks_panel(frame, body[0], app, view);
	render_today_panel(frame, body[1], view);
	render_totals_panel(frame, body[2], view);
	render_footer(frame, layout[1], app);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_tasks_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = view
		.task_rows
		.iter()
		.map(|row| ListItem::new(row.line.clone()))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.task_rows.is_empty() {
		state.select(Some(app.task_index.min(view.task_rows.len() - 1)));
	}

	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no tasks yet, press 'a' to add one)")]
	} else {
		items
	})
	.block(
		Block::default()
			.borders(Borders::ALL)
			.title(format!("Tasks ({})", view.task_rows.len())),
	)
	.highlight_style(
		Style::default()
			.bg(HIGHLIGHT_BACKGROUND_COLOR)
			.add_modifier(Modifier::BOLD),
	);

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_today_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let mut items = view
		.today_rows
		.iter()
		.map(|line| ListItem::new(line.clone()))
		.collect::<Vec<_>>();
	if items.is_empty() {
		items.push(ListItem::new("(no time tracked today)"));
	}

	let title = format!(
		"{} | total {}",
		view.today.format("%A, %d %B %Y"),
		view.today_total.format_hms()
	);
	let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(list, area);
}

fn render_totals_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let mut lines = Vec::new();
	for group in &view.totals {
		lines.push(Line::from(TextSpan::styled(
			group.title,
			Style::default().add_modifier(Modifier::BOLD),
		)));

		if group.rows.is_empty() {
			lines.push(Line::from("(none)"));
		} else {
			let max_seconds = group
				.rows
				.iter()
				.map(|(_, span)| span.total_seconds())
				.max()
				.unwrap_or(0)
				.max(1);
			for (label, span) in &group.rows {
				let width = ((span.total_seconds() as f64 / max_seconds as f64)
					* TOTALS_BAR_WIDTH as f64)
					.round() as usize;
				lines.push(Line::from(format!(
					"{:>9} {} {}",
					span.format_hms(),
					label,
					"=".repeat(width.max(1))
				)));
			}
		}
		lines.push(Line::from(""));
	}

	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Totals"));
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("arrows/jk navigate | space start/stop | a add | e edit | d delete task"),
			Line::from("p projects | t tags | l life areas | g switch tracker | q quit"),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines)
		.block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	registry: &mut TaskRegistry,
	tracker_path: &mut PathBuf,
	view: &ViewModel,
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Up | KeyCode::Char('k') => {
			app.move_task_selection(-1, view);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			app.move_task_selection(1, view);
			false
		}
		KeyCode::Char(' ') => {
			if let Some(task_id) = app.selected_task_id(view) {
				app.status = match toggle_task(registry, tracker_path.as_path(), &task_id) {
					Ok(message) => message,
					Err(err) => format!("error: {err}"),
				};
			} else {
				app.status = "No task selected".to_string();
			}
			false
		}
		KeyCode::Char('a') => {
			app.mode = InputMode::Prompt(PromptState::new(
				"Task name",
				PromptKind::TaskName { existing: None },
			));
			false
		}
		KeyCode::Char('e') => {
			if let Some(task_id) = app.selected_task_id(view) {
				let name = registry
					.task(&task_id)
					.map(|task| task.name.clone())
					.unwrap_or_default();
				app.mode = InputMode::Prompt(PromptState::with_input(
					"Task name",
					name,
					PromptKind::TaskName {
						existing: Some(task_id),
					},
				));
			} else {
				app.status = "Select a task to edit first".to_string();
			}
			false
		}
		KeyCode::Char('d') => {
			if let Some(task_id) = app.selected_task_id(view) {
				if let Some(task) = registry.task(&task_id) {
					app.mode = InputMode::Select(build_delete_task_select(&task_id, &task.name));
				}
			} else {
				app.status = "Select a task to delete first".to_string();
			}
			false
		}
		KeyCode::Char('p') => {
			app.mode = InputMode::Select(build_taxonomy_browse_select(registry, TaxonomyKind::Project));
			false
		}
		KeyCode::Char('t') => {
			app.mode = InputMode::Select(build_taxonomy_browse_select(registry, TaxonomyKind::Tag));
			false
		}
		KeyCode::Char('l') => {
			app.mode = InputMode::Select(build_taxonomy_browse_select(registry, TaxonomyKind::LifeArea));
			false
		}
		KeyCode::Char('g') => {
			match build_tracker_switch_select(tracker_path.as_path()) {
				Ok(select) => app.mode = InputMode::Select(select),
				Err(err) => app.status = err,
			}
			false
		}
		_ => false,
	}
}

fn handle_prompt_key(
	app: &mut App,
	code: KeyCode,
	registry: &mut TaskRegistry,
	tracker_path: &mut PathBuf,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt.clone(), registry, tracker_path.as_path()) {
				Ok(PromptOutcome::NextSelect(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(
	app: &mut App,
	code: KeyCode,
	registry: &mut TaskRegistry,
	tracker_path: &mut PathBuf,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), registry, tracker_path) {
				Ok(SelectOutcome::NextPrompt(prompt)) => app.mode = InputMode::Prompt(prompt),
				Ok(SelectOutcome::NextSelect(next_select)) => app.mode = InputMode::Select(next_select),
				Ok(SelectOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(
	prompt: PromptState,
	registry: &mut TaskRegistry,
	tracker_path: &Path,
) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::TaskName { existing } => {
			let name = required_text(&prompt.input, "task name")?;
			let draft = TaskDraft {
				existing,
				name,
				project: None,
				life_area: None,
			};
			Ok(PromptOutcome::NextSelect(build_project_select(registry, draft)))
		}
		PromptKind::TaskTags { draft } => {
			let tags = parse_tags(&prompt.input);
			let name = draft.name.clone();
			match &draft.existing {
				Some(task_id) => {
					registry.update_task(task_id, &draft.name, draft.project, tags, draft.life_area)?;
					persist(tracker_path, registry)?;
					Ok(PromptOutcome::Done(format!("updated task: {name}")))
				}
				None => {
					registry.add_task(&draft.name, draft.project, tags, draft.life_area)?;
					persist(tracker_path, registry)?;
					Ok(PromptOutcome::Done(format!("created task: {name}")))
				}
			}
		}
		PromptKind::TaxonomyAdd { kind } => {
			let value = required_text(&prompt.input, kind.label())?;
			registry.add_taxonomy_entry(kind, &value)?;
			persist(tracker_path, registry)?;
			Ok(PromptOutcome::Done(format!("created {}: {value}", kind.label())))
		}
		PromptKind::TaxonomyRename { kind, old } => {
			let new = required_text(&prompt.input, kind.label())?;
			registry.rename_taxonomy_entry(kind, &old, &new)?;
			persist(tracker_path, registry)?;
			Ok(PromptOutcome::Done(format!("renamed {}: {old} -> {new}", kind.label())))
		}
	}
}

fn submit_select(
	select: SelectState,
	registry: &mut TaskRegistry,
	tracker_path: &mut PathBuf,
) -> Result<SelectOutcome, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::TaskProject { mut draft } => {
			draft.project = selected_value;
			Ok(SelectOutcome::NextSelect(build_life_area_select(registry, draft)))
		}
		SelectKind::TaskLifeArea { mut draft } => {
			draft.life_area = selected_value;
			let current_tags = draft
				.existing
				.as_deref()
				.and_then(|task_id| registry.task(task_id))
				.map(|task| task.tags.join(", "))
				.unwrap_or_default();
			Ok(SelectOutcome::NextPrompt(PromptState::with_input(
				"Tags (comma separated, optional)",
				current_tags,
				PromptKind::TaskTags { draft },
			)))
		}
		SelectKind::TaxonomyBrowse { kind } => match selected_value {
			None => Ok(SelectOutcome::NextPrompt(PromptState::new(
				format!("New {} name", kind.label()),
				PromptKind::TaxonomyAdd { kind },
			))),
			Some(value) => Ok(SelectOutcome::NextSelect(build_taxonomy_action_select(kind, value))),
		},
		SelectKind::TaxonomyAction { kind, value } => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			match action {
				"rename" => Ok(SelectOutcome::NextPrompt(PromptState::with_input(
					format!("Rename {} '{value}'", kind.label()),
					value.clone(),
					PromptKind::TaxonomyRename { kind, old: value },
				))),
				"delete" => Ok(SelectOutcome::NextSelect(build_taxonomy_delete_select(kind, value))),
				_ => Ok(SelectOutcome::Done("Cancelled".to_string())),
			}
		}
		SelectKind::TaxonomyDeleteConfirm { kind, value } => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action == "delete" {
				registry.delete_taxonomy_entry(kind, &value)?;
				persist(tracker_path.as_path(), registry)?;
				Ok(SelectOutcome::Done(format!("deleted {}: {value}", kind.label())))
			} else {
				Ok(SelectOutcome::Done("Delete cancelled".to_string()))
			}
		}
		SelectKind::DeleteTaskConfirm { task_id, name } => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action == "delete" {
				let now = Local::now().naive_local();
				registry.delete_task(&task_id, now)?;
				persist(tracker_path.as_path(), registry)?;
				Ok(SelectOutcome::Done(format!("deleted task: {name}")))
			} else {
				Ok(SelectOutcome::Done("Delete cancelled".to_string()))
			}
		}
		SelectKind::TrackerSwitch => {
			let selected_path = selected_value
				.map(PathBuf::from)
				.ok_or_else(|| "selected tracker path is missing".to_string())?;
			switch_tracker(registry, tracker_path, selected_path).map(SelectOutcome::Done)
		}
	}
}

fn build_project_select(registry: &TaskRegistry, draft: TaskDraft) -> SelectState {
	let mut options = vec![SelectOption::new("No project", None, Style::default())];
	for project in registry.taxonomy(TaxonomyKind::Project) {
		options.push(SelectOption::new(
			project.clone(),
			Some(project.clone()),
			Style::default(),
		));
	}

	let mut select = SelectState::new("Select project", SelectKind::TaskProject { draft: draft.clone() }, options);
	if let Some(current) = draft
		.existing
		.as_deref()
		.and_then(|task_id| registry.task(task_id))
		.and_then(|task| task.project.clone())
	{
		select.selected = select
			.options
			.iter()
			.position(|option| option.value.as_deref() == Some(current.as_str()))
			.unwrap_or(0);
	}
	select
}

fn build_life_area_select(registry: &TaskRegistry, draft: TaskDraft) -> SelectState {
	let mut options = vec![SelectOption::new("No life area", None, Style::default())];
	for life_area in registry.taxonomy(TaxonomyKind::LifeArea) {
		options.push(SelectOption::new(
			life_area.clone(),
			Some(life_area.clone()),
			Style::default(),
		));
	}

	let mut select = SelectState::new(
		"Select life area",
		SelectKind::TaskLifeArea { draft: draft.clone() },
		options,
	);
	if let Some(current) = draft
		.existing
		.as_deref()
		.and_then(|task_id| registry.task(task_id))
		.and_then(|task| task.life_area.clone())
	{
		select.selected = select
			.options
			.iter()
			.position(|option| option.value.as_deref() == Some(current.as_str()))
			.unwrap_or(0);
	}
	select
}

fn build_taxonomy_browse_select(registry: &TaskRegistry, kind: TaxonomyKind) -> SelectState {
	let mut options = vec![SelectOption::new(
		format!("(new {})", kind.label()),
		None,
		Style::default().fg(Color::LightGreen),
	)];
	for entry in registry.taxonomy(kind) {
		options.push(SelectOption::new(entry.clone(), Some(entry.clone()), Style::default()));
	}

	SelectState::new(
		format!("Manage {}s", kind.label()),
		SelectKind::TaxonomyBrowse { kind },
		options,
	)
}

fn build_taxonomy_action_select(kind: TaxonomyKind, value: String) -> SelectState {
	let title = format!("{} '{value}'", kind.label());
	let options = vec![
		SelectOption::new("Rename", Some("rename".to_string()), Style::default()),
		SelectOption::new(
			"Delete",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	SelectState::new(title, SelectKind::TaxonomyAction { kind, value }, options)
}

fn build_taxonomy_delete_select(kind: TaxonomyKind, value: String) -> SelectState {
	let title = format!("Delete {} '{value}' everywhere?", kind.label());
	let options = vec![
		SelectOption::new(
			"Delete",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(title, SelectKind::TaxonomyDeleteConfirm { kind, value }, options);
	select.selected = 1;
	select
}

fn build_delete_task_select(task_id: &str, name: &str) -> SelectState {
	let options = vec![
		SelectOption::new(
			"Delete",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		format!("Delete task '{name}'?"),
		SelectKind::DeleteTaskConfirm {
			task_id: task_id.to_string(),
			name: name.to_string(),
		},
		options,
	);
	// Default to cancel to prevent accidental deletions.
	select.selected = 1;
	select
}

fn build_tracker_switch_select(current_path: &Path) -> Result<SelectState, String> {
	let mut paths = recent_trackers(100).map_err(|err| format!("failed to load recent trackers: {err}"))?;
	let current_path = current_path.to_path_buf();
	if !paths.iter().any(|path| path == &current_path) {
		paths.insert(0, current_path.clone());
	}

	let current_value = current_path.display().to_string();
	let options = paths
		.into_iter()
		.map(|path| {
			let value = path.display().to_string();
			let is_current = value == current_value;
			let exists = path.exists();
			let mut label = value.clone();
			if is_current {
				label = format!("* {label}");
			}
			if !exists {
				label = format!("[missing] {label}");
			}

			let style = if is_current {
				Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
			} else if exists {
				Style::default()
			} else {
				Style::default().fg(Color::DarkGray)
			};

			SelectOption::new(label, Some(value), style)
		})
		.collect::<Vec<_>>();

	let mut select = SelectState::new("Switch tracker", SelectKind::TrackerSwitch, options);
	select.selected = select
		.options
		.iter()
		.position(|option| option.value.as_deref() == Some(current_value.as_str()))
		.unwrap_or(0);
	Ok(select)
}

fn build_view(registry: &TaskRegistry, now: NaiveDateTime) -> ViewModel {
	let today = now.date();

	let task_rows = registry
		.tick_all(now)
		.into_iter()
		.map(|overview| {
			let marker = if overview.running { "RUN" } else { "   " };
			let meta = [
				overview.project.clone().unwrap_or_else(|| "-".to_string()),
				overview.life_area.clone().unwrap_or_else(|| "-".to_string()),
				if overview.tags.is_empty() {
					"-".to_string()
				} else {
					overview.tags.join(", ")
				},
			]
			.join(" | ");

			let style = if overview.running {
				Style::default().fg(RUNNING_ROW_COLOR).add_modifier(Modifier::BOLD)
			} else {
				Style::default()
			};
			let line = Line::from(vec![
				TextSpan::styled(format!("{marker} "), style),
				TextSpan::styled(format!("{:>9} ", overview.elapsed), style),
				TextSpan::styled(overview.name.clone(), style),
				TextSpan::styled(format!(" | {meta}"), Style::default().fg(Color::DarkGray)),
			]);

			TaskRow {
				task_id: overview.id,
				line,
			}
		})
		.collect::<Vec<_>>();

	let mut today_entries = registry
		.tasks()
		.iter()
		.map(|task| {
			let mut span = task.ledger().get(today);
			if let Some(started_at) = task.started_at() {
				span += Span::between(started_at, now);
			}
			(task.name.clone(), span)
		})
		.filter(|(_, span)| !span.is_zero())
		.collect::<Vec<_>>();
	today_entries.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));

	let today_total = today_entries
		.iter()
		.fold(Span::ZERO, |acc, (_, span)| acc + *span);
	let today_rows = today_entries
		.into_iter()
		.map(|(name, span)| Line::from(format!("{:>9} {name}", span.format_hms())))
		.collect::<Vec<_>>();

	let totals = vec![
		TotalsGroup {
			title: "By Project",
			rows: totals_by(registry, now, |task| match &task.project {
				Some(project) => vec![(project.clone(), 1)],
				None => vec![("No Project".to_string(), 1)],
			}),
		},
		TotalsGroup {
			title: "By Life Area",
			rows: totals_by(registry, now, |task| match &task.life_area {
				Some(life_area) => vec![(life_area.clone(), 1)],
				None => vec![("No Life Area".to_string(), 1)],
			}),
		},
		TotalsGroup {
			title: "By Tag",
			rows: totals_by(registry, now, |task| {
				if task.tags.is_empty() {
					vec![("No Tags".to_string(), 1)]
				} else {
					let share = task.tags.len() as u64;
					task.tags.iter().map(|tag| (tag.clone(), share)).collect()
				}
			}),
		},
	];

	ViewModel {
		today,
		task_rows,
		today_rows,
		today_total,
		totals,
	}
}

// Tags split a task's total evenly; projects and life areas take it whole.
fn totals_by(
	registry: &TaskRegistry,
	now: NaiveDateTime,
	keys_for: impl Fn(&Task) -> Vec<(String, u64)>,
) -> Vec<(String, Span)> {
	let mut totals = HashMap::<String, Span>::new();
	for task in registry.tasks() {
		let elapsed = task.current_elapsed(now);
		for (key, divisor) in keys_for(task) {
			let share = Span::from_secs(elapsed.total_seconds() / divisor.max(1));
			*totals.entry(key).or_insert(Span::ZERO) += share;
		}
	}

	let mut rows = totals
		.into_iter()
		.filter(|(_, span)| !span.is_zero())
		.collect::<Vec<_>>();
	rows.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
	rows
}

fn toggle_task(
	registry: &mut TaskRegistry,
	tracker_path: &Path,
	task_id: &str,
) -> Result<String, String> {
	let name = registry
		.task(task_id)
		.map(|task| task.name.clone())
		.unwrap_or_else(|| "unknown task".to_string());
	let now = Local::now().naive_local();
	let started = registry.toggle(task_id, now)?;
	persist(tracker_path, registry)?;
	if started {
		Ok(format!("started: {name}"))
	} else {
		Ok(format!("stopped: {name}"))
	}
}

fn switch_tracker(
	registry: &mut TaskRegistry,
	tracker_path: &mut PathBuf,
	next_path: PathBuf,
) -> Result<String, String> {
	if &next_path == tracker_path {
		return Ok(format!("already using tracker: {}", tracker_path.display()));
	}

	if !next_path.exists() {
		return Err(format!("tracker does not exist: {}", next_path.display()));
	}

	let next_registry = load_tracker(&next_path).map_err(|err| err.to_string())?;
	*registry = next_registry;
	*tracker_path = next_path;

	match remember_tracker(tracker_path.as_path()) {
		Ok(()) => Ok(format!("switched tracker: {}", tracker_path.display())),
		Err(err) => Ok(format!(
			"switched tracker: {} (warning: failed to store recents: {err})",
			tracker_path.display()
		)),
	}
}

fn persist(path: &Path, registry: &TaskRegistry) -> Result<(), String> {
	save_tracker(path, registry).map_err(|err| err.to_string())
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn parse_tags(input: &str) -> Vec<String> {
	input
		.split(',')
		.map(str::trim)
		.filter(|tag| !tag.is_empty())
		.map(str::to_string)
		.collect()
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextSelect(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
enum SelectOutcome {
	NextPrompt(PromptState),
	NextSelect(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
struct TaskDraft {
	existing: Option<String>,
	name: String,
	project: Option<String>,
	life_area: Option<String>,
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}

	fn with_input(title: impl Into<String>, input: String, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input,
			kind,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	TaskName { existing: Option<String> },
	TaskTags { draft: TaskDraft },
	TaxonomyAdd { kind: TaxonomyKind },
	TaxonomyRename { kind: TaxonomyKind, old: String },
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum SelectKind {
	TaskProject { draft: TaskDraft },
	TaskLifeArea { draft: TaskDraft },
	TaxonomyBrowse { kind: TaxonomyKind },
	TaxonomyAction { kind: TaxonomyKind, value: String },
	TaxonomyDeleteConfirm { kind: TaxonomyKind, value: String },
	DeleteTaskConfirm { task_id: String, name: String },
	TrackerSwitch,
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	task_index: usize,
	mode: InputMode,
	status: String,
}

impl Default for App {
	fn default() -> Self {
		Self {
			task_index: 0,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}
}

impl App {
	fn clamp_selection(&mut self, view: &ViewModel) {
		if view.task_rows.is_empty() {
			self.task_index = 0;
		} else {
			self.task_index = self.task_index.min(view.task_rows.len() - 1);
		}
	}

	fn move_task_selection(&mut self, delta: i32, view: &ViewModel) {
		if view.task_rows.is_empty() {
			self.task_index = 0;
			return;
		}

		if delta > 0 {
			self.task_index = (self.task_index + delta as usize).min(view.task_rows.len() - 1);
		} else {
			self.task_index = self.task_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_task_id(&self, view: &ViewModel) -> Option<String> {
		view.task_rows
			.get(self.task_index)
			.map(|row| row.task_id.clone())
	}
}

struct ViewModel {
	today: NaiveDate,
	task_rows: Vec<TaskRow>,
	today_rows: Vec<Line<'static>>,
	today_total: Span,
	totals: Vec<TotalsGroup>,
}

struct TaskRow {
	task_id: String,
	line: Line<'static>,
}

struct TotalsGroup {
	title: &'static str,
	rows: Vec<(String, Span)>,
}
