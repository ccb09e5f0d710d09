mod config;
mod domain;
mod snapshot;
mod storage;
mod trackers;
mod ui;

use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::load_config;
use crate::domain::{Span, TaskRegistry, TaxonomyKind};
use crate::storage::{load_tracker, save_tracker};
use crate::trackers::{recent_trackers, remember_tracker, resolve_tracker_path};
use crate::ui::run_dashboard;

#[derive(Debug, Parser)]
#[command(name = "tempo-tracker", about = "Terminal-first task time tracker")]
struct Cli {
	#[arg(long)]
	tracker: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LabelKind {
	Project,
	Tag,
	LifeArea,
}

impl From<LabelKind> for TaxonomyKind {
	fn from(kind: LabelKind) -> Self {
		match kind {
			LabelKind::Project => TaxonomyKind::Project,
			LabelKind::Tag => TaxonomyKind::Tag,
			LabelKind::LifeArea => TaxonomyKind::LifeArea,
		}
	}
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	AddTask {
		#[arg(long)]
		name: String,
		#[arg(long)]
		project: Option<String>,
		#[arg(long = "tag")]
		tags: Vec<String>,
		#[arg(long)]
		life_area: Option<String>,
	},
	Toggle {
		#[arg(long)]
		task: String,
	},
	Start {
		#[arg(long)]
		task: String,
	},
	Stop {
		#[arg(long)]
		task: String,
	},
	DeleteTask {
		#[arg(long)]
		task: String,
	},
	AddLabel {
		#[arg(long)]
		kind: LabelKind,
		#[arg(long)]
		name: String,
	},
	RenameLabel {
		#[arg(long)]
		kind: LabelKind,
		#[arg(long)]
		old: String,
		#[arg(long)]
		new: String,
	},
	DeleteLabel {
		#[arg(long)]
		kind: LabelKind,
		#[arg(long)]
		name: String,
	},
	ListTasks,
	Summary {
		#[arg(long)]
		day: Option<String>,
	},
	Trackers {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	if let Some(Command::Trackers { limit }) = &cli.command {
		print_recent_trackers(*limit)?;
		return Ok(());
	}

	let config = load_config();
	let mut tracker_path = resolve_tracker_path(cli.tracker, config.tracker.clone())?;
	let mut registry = load_tracker(&tracker_path)?;
	if let Err(err) = remember_tracker(&tracker_path) {
		eprintln!("warning: failed to store recent tracker: {err}");
	}

	// A day boundary may have passed since the tracker was last open.
	if registry.roll_all(Local::now().date_naive()) {
		save_tracker(&tracker_path, &registry)?;
	}

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {
			save_tracker(&tracker_path, &registry)?;
			println!("initialized tracker at {}", tracker_path.display());
		}
		Command::Dashboard => {
			run_dashboard(&mut registry, &mut tracker_path, config.tick_ms)?;
		}
		Command::AddTask {
			name,
			project,
			tags,
			life_area,
		} => {
			let task_id = registry.add_task(&name, project, tags, life_area)?;
			save_tracker(&tracker_path, &registry)?;
			println!("created task {task_id}");
		}
		Command::Toggle { task } => {
			let task_id = resolve_task_id(&registry, &task)?;
			let started = registry.toggle(&task_id, Local::now().naive_local())?;
			save_tracker(&tracker_path, &registry)?;
			println!("{} {task_id}", if started { "started" } else { "stopped" });
		}
		Command::Start { task } => {
			let task_id = resolve_task_id(&registry, &task)?;
			if registry.task(&task_id).is_some_and(|entry| entry.is_running()) {
				return Err(format!("task already running: {task_id}").into());
			}
			registry.toggle(&task_id, Local::now().naive_local())?;
			save_tracker(&tracker_path, &registry)?;
			println!("started {task_id}");
		}
		Command::Stop { task } => {
			let task_id = resolve_task_id(&registry, &task)?;
			if !registry.task(&task_id).is_some_and(|entry| entry.is_running()) {
				return Err(format!("task is not running: {task_id}").into());
			}
			registry.toggle(&task_id, Local::now().naive_local())?;
			save_tracker(&tracker_path, &registry)?;
			println!("stopped {task_id}");
		}
		Command::DeleteTask { task } => {
			let task_id = resolve_task_id(&registry, &task)?;
			registry.delete_task(&task_id, Local::now().naive_local())?;
			save_tracker(&tracker_path, &registry)?;
			println!("deleted task {task_id}");
		}
		Command::AddLabel { kind, name } => {
			registry.add_taxonomy_entry(kind.into(), &name)?;
			save_tracker(&tracker_path, &registry)?;
			println!("created {}: {name}", TaxonomyKind::from(kind).label());
		}
		Command::RenameLabel { kind, old, new } => {
			registry.rename_taxonomy_entry(kind.into(), &old, &new)?;
			save_tracker(&tracker_path, &registry)?;
			println!("renamed {}: {old} -> {new}", TaxonomyKind::from(kind).label());
		}
		Command::DeleteLabel { kind, name } => {
			registry.delete_taxonomy_entry(kind.into(), &name)?;
			save_tracker(&tracker_path, &registry)?;
			println!("deleted {}: {name}", TaxonomyKind::from(kind).label());
		}
		Command::ListTasks => {
			print_tasks(&registry);
		}
		Command::Summary { day } => {
			print_summary(&registry, day.as_deref())?;
		}
		Command::Trackers { .. } => {}
	}

	Ok(())
}

fn print_recent_trackers(limit: usize) -> Result<(), Box<dyn Error>> {
	let rows = recent_trackers(limit)?;
	if rows.is_empty() {
		println!("no recent trackers");
		return Ok(());
	}

	for (index, path) in rows.iter().enumerate() {
		println!("{:>2}. {}", index + 1, path.display());
	}

	Ok(())
}

fn resolve_task_id(registry: &TaskRegistry, input: &str) -> Result<String, Box<dyn Error>> {
	if registry.task(input).is_some() {
		return Ok(input.to_string());
	}

	let matches = registry
		.tasks()
		.iter()
		.filter(|task| task.name == input)
		.collect::<Vec<_>>();
	match matches.as_slice() {
		[] => Err(format!("task not found: {input}").into()),
		[task] => Ok(task.id.clone()),
		_ => Err(format!("task name is ambiguous, use its id: {input}").into()),
	}
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
	} else {
		Ok(Local::now().date_naive())
	}
}

fn print_tasks(registry: &TaskRegistry) {
	if registry.tasks().is_empty() {
		println!("no tasks yet");
		return;
	}

	for task in registry.tasks() {
		let project = task.project.as_deref().unwrap_or("-");
		let life_area = task.life_area.as_deref().unwrap_or("-");
		let tags = if task.tags.is_empty() {
			"-".to_string()
		} else {
			task.tags.join(", ")
		};
		println!(
			"{} | {} | {} | {} | {} | {} | {}",
			task.id,
			if task.is_running() { "RUN" } else { "   " },
			task.lifetime_total().format_hms(),
			task.name,
			project,
			life_area,
			tags
		);
	}
}

fn print_summary(registry: &TaskRegistry, day: Option<&str>) -> Result<(), Box<dyn Error>> {
	let day = parse_day(day)?;

	println!("summary for {}", day.format("%Y-%m-%d"));
	let mut task_rows = registry
		.tasks()
		.iter()
		.map(|task| (task, task.ledger().get(day)))
		.filter(|(_, span)| !span.is_zero())
		.collect::<Vec<_>>();
	task_rows.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.name.cmp(&right.0.name)));

	if task_rows.is_empty() {
		println!("no tracked time for this day");
		return Ok(());
	}

	println!("\nby task:");
	for (task, span) in &task_rows {
		println!("{} | {} | {}", span.format_hms(), task.id, task.name);
	}

	let mut by_project: HashMap<String, Span> = HashMap::new();
	let mut by_life_area: HashMap<String, Span> = HashMap::new();
	let mut by_tag: HashMap<String, Span> = HashMap::new();

	for (task, span) in &task_rows {
		let project = task.project.clone().unwrap_or_else(|| "No Project".to_string());
		*by_project.entry(project).or_insert(Span::ZERO) += *span;

		let life_area = task
			.life_area
			.clone()
			.unwrap_or_else(|| "No Life Area".to_string());
		*by_life_area.entry(life_area).or_insert(Span::ZERO) += *span;

		if task.tags.is_empty() {
			*by_tag.entry("No Tags".to_string()).or_insert(Span::ZERO) += *span;
		} else {
			// A tagged task's time is split evenly across its tags.
			let share = Span::from_secs(span.total_seconds() / task.tags.len() as u64);
			for tag in &task.tags {
				*by_tag.entry(tag.clone()).or_insert(Span::ZERO) += share;
			}
		}
	}

	println!("\nby project:");
	for (name, span) in sort_span_map(by_project) {
		println!("{} | {}", span.format_hms(), name);
	}

	println!("\nby life area:");
	for (name, span) in sort_span_map(by_life_area) {
		println!("{} | {}", span.format_hms(), name);
	}

	println!("\nby tag:");
	for (name, span) in sort_span_map(by_tag) {
		println!("{} | {}", span.format_hms(), name);
	}

	Ok(())
}

fn sort_span_map(map: HashMap<String, Span>) -> Vec<(String, Span)> {
	let mut rows = map.into_iter().collect::<Vec<_>>();
	rows.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
	rows
}
