use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{DailyLedger, Span, Task, TaskRegistry, TaxonomyKind, generate_id};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub life_area: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub daily_time: BTreeMap<NaiveDate, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerRecord {
    #[serde(default)]
    pub tasks: Vec<Value>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub life_areas: Vec<String>,
}

pub fn to_record(registry: &TaskRegistry) -> TrackerRecord {
    TrackerRecord {
        tasks: registry.tasks().iter().map(task_to_value).collect(),
        projects: registry.taxonomy(TaxonomyKind::Project).to_vec(),
        tags: registry.taxonomy(TaxonomyKind::Tag).to_vec(),
        life_areas: registry.taxonomy(TaxonomyKind::LifeArea).to_vec(),
    }
}

pub fn from_record(record: TrackerRecord) -> TaskRegistry {
    let mut projects = dedup(record.projects);
    let mut tags = dedup(record.tags);
    let mut life_areas = dedup(record.life_areas);

    let mut tasks = Vec::new();
    let mut saw_active = false;
    for value in record.tasks {
        // A task that does not decode is skipped; the rest of the file
        // still loads.
        let Ok(task_record) = serde_json::from_value::<TaskRecord>(value) else {
            continue;
        };
        if task_record.name.trim().is_empty() {
            continue;
        }

        let mut ledger = DailyLedger::new();
        for (day, seconds) in task_record.daily_time {
            ledger.record(day, span_from_seconds(seconds));
        }

        // At most one task may load as running: the first valid active
        // record wins, the rest are forced idle. A start timestamp without
        // the active flag is stale and discarded.
        let started_at = if task_record.is_active && !saw_active {
            task_record.start_time
        } else {
            None
        };
        saw_active |= started_at.is_some();

        restore_reference(&mut projects, task_record.project.as_deref());
        for tag in &task_record.tags {
            restore_reference(&mut tags, Some(tag));
        }
        restore_reference(&mut life_areas, task_record.life_area.as_deref());

        tasks.push(Task {
            id: generate_id(),
            name: task_record.name,
            project: task_record.project,
            tags: task_record.tags,
            life_area: task_record.life_area,
            started_at,
            lifetime_total: span_from_seconds(task_record.total_time),
            ledger,
        });
    }

    TaskRegistry {
        tasks,
        projects,
        tags,
        life_areas,
    }
}

fn task_to_value(task: &Task) -> Value {
    let record = TaskRecord {
        name: task.name.clone(),
        project: task.project.clone(),
        tags: task.tags.clone(),
        life_area: task.life_area.clone(),
        is_active: task.is_running(),
        start_time: task.started_at(),
        total_time: task.lifetime_total().total_seconds() as f64,
        daily_time: task
            .ledger()
            .iter()
            .map(|(day, span)| (day, span.total_seconds() as f64))
            .collect(),
    };
    serde_json::to_value(record).expect("task record must encode as JSON")
}

fn span_from_seconds(seconds: f64) -> Span {
    Span::from_secs(seconds.max(0.0) as u64)
}

fn dedup(entries: Vec<String>) -> Vec<String> {
    let mut unique = Vec::new();
    for entry in entries {
        if !entry.trim().is_empty() && !unique.contains(&entry) {
            unique.push(entry);
        }
    }
    unique
}

fn restore_reference(entries: &mut Vec<String>, value: Option<&str>) {
    if let Some(value) = value {
        if !entries.iter().any(|entry| entry == value) {
            entries.push(value.to_string());
        }
    }
}
