use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

use chrono::{NaiveDate, NaiveDateTime};
use rand::{Rng, distributions::Alphanumeric, thread_rng};

const ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Span {
    seconds: u64,
}

impl Span {
    pub const ZERO: Span = Span { seconds: 0 };

    pub fn from_secs(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(end >= start, "interval end precedes its start");
        let seconds = (end - start).num_seconds().max(0) as u64;
        Self { seconds }
    }

    pub fn total_seconds(self) -> u64 {
        self.seconds
    }

    pub fn is_zero(self) -> bool {
        self.seconds == 0
    }

    pub fn format_hms(self) -> String {
        let hours = self.seconds / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let seconds = self.seconds % 60;
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl Add for Span {
    type Output = Span;

    fn add(self, other: Span) -> Span {
        Span {
            seconds: self.seconds.saturating_add(other.seconds),
        }
    }
}

impl AddAssign for Span {
    fn add_assign(&mut self, other: Span) {
        self.seconds = self.seconds.saturating_add(other.seconds);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyLedger {
    entries: BTreeMap<NaiveDate, Span>,
}

impl DailyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, day: NaiveDate, elapsed: Span) {
        *self.entries.entry(day).or_insert(Span::ZERO) += elapsed;
    }

    pub fn open_day(&mut self, day: NaiveDate) {
        self.entries.entry(day).or_insert(Span::ZERO);
    }

    pub fn get(&self, day: NaiveDate) -> Span {
        self.entries.get(&day).copied().unwrap_or(Span::ZERO)
    }

    pub fn total(&self) -> Span {
        self.entries
            .values()
            .fold(Span::ZERO, |acc, value| acc + *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Span)> + '_ {
        self.entries.iter().map(|(day, span)| (*day, *span))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub project: Option<String>,
    pub tags: Vec<String>,
    pub life_area: Option<String>,
    pub(crate) started_at: Option<NaiveDateTime>,
    pub(crate) lifetime_total: Span,
    pub(crate) ledger: DailyLedger,
}

impl Task {
    fn new(
        name: String,
        project: Option<String>,
        tags: Vec<String>,
        life_area: Option<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            name,
            project,
            tags,
            life_area,
            started_at: None,
            lifetime_total: Span::ZERO,
            ledger: DailyLedger::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<NaiveDateTime> {
        self.started_at
    }

    pub fn lifetime_total(&self) -> Span {
        self.lifetime_total
    }

    pub fn ledger(&self) -> &DailyLedger {
        &self.ledger
    }

    pub fn start(&mut self, now: NaiveDateTime) -> Result<(), String> {
        if self.started_at.is_some() {
            return Err(format!("task already running: {}", self.name));
        }

        self.started_at = Some(now);
        Ok(())
    }

    pub fn stop(&mut self, now: NaiveDateTime) -> Result<Span, String> {
        let Some(started_at) = self.started_at.take() else {
            return Err(format!("task is not running: {}", self.name));
        };

        let elapsed = Span::between(started_at, now);
        self.lifetime_total += elapsed;
        self.ledger.record(now.date(), elapsed);
        Ok(elapsed)
    }

    pub fn current_elapsed(&self, now: NaiveDateTime) -> Span {
        match self.started_at {
            Some(started_at) => self.lifetime_total + Span::between(started_at, now),
            None => self.lifetime_total,
        }
    }

    pub fn roll(&mut self, today: NaiveDate) -> bool {
        let Some(mut started_at) = self.started_at else {
            return false;
        };
        if started_at.date() >= today {
            return false;
        }

        // Close the running interval at each midnight between the start and
        // today, then re-anchor the interval at the final boundary.
        while started_at.date() < today {
            let boundary = started_at
                .date()
                .succ_opt()
                .expect("next day must exist")
                .and_hms_opt(0, 0, 0)
                .expect("midnight must be valid");
            let elapsed = Span::between(started_at, boundary);
            self.lifetime_total += elapsed;
            self.ledger.record(started_at.date(), elapsed);
            started_at = boundary;
        }

        self.started_at = Some(started_at);
        self.ledger.open_day(today);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyKind {
    Project,
    Tag,
    LifeArea,
}

impl TaxonomyKind {
    pub fn label(self) -> &'static str {
        match self {
            TaxonomyKind::Project => "project",
            TaxonomyKind::Tag => "tag",
            TaxonomyKind::LifeArea => "life area",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskOverview {
    pub id: String,
    pub name: String,
    pub running: bool,
    pub elapsed: String,
    pub project: Option<String>,
    pub tags: Vec<String>,
    pub life_area: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskRegistry {
    pub(crate) tasks: Vec<Task>,
    pub(crate) projects: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) life_areas: Vec<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|task| task.is_running())
    }

    pub fn taxonomy(&self, kind: TaxonomyKind) -> &[String] {
        match kind {
            TaxonomyKind::Project => &self.projects,
            TaxonomyKind::Tag => &self.tags,
            TaxonomyKind::LifeArea => &self.life_areas,
        }
    }

    pub fn add_task(
        &mut self,
        name: &str,
        project: Option<String>,
        tags: Vec<String>,
        life_area: Option<String>,
    ) -> Result<String, String> {
        let name = required_text(name, "task name")?;
        let tags = dedup_tags(tags);
        self.check_references(project.as_deref(), &tags, life_area.as_deref())?;

        let task = Task::new(name, project, tags, life_area);
        let task_id = task.id.clone();
        self.tasks.push(task);
        Ok(task_id)
    }

    pub fn update_task(
        &mut self,
        task_id: &str,
        name: &str,
        project: Option<String>,
        tags: Vec<String>,
        life_area: Option<String>,
    ) -> Result<(), String> {
        let name = required_text(name, "task name")?;
        let tags = dedup_tags(tags);
        self.check_references(project.as_deref(), &tags, life_area.as_deref())?;

        let task = self.task_mut(task_id)?;
        task.name = name;
        task.project = project;
        task.tags = tags;
        task.life_area = life_area;
        Ok(())
    }

    pub fn toggle(&mut self, task_id: &str, now: NaiveDateTime) -> Result<bool, String> {
        let target_running = self
            .task(task_id)
            .map(|task| task.is_running())
            .ok_or_else(|| format!("task not found: {task_id}"))?;

        if target_running {
            self.task_mut(task_id)?.stop(now)?;
            return Ok(false);
        }

        // Only one task may accumulate time at any instant.
        if let Some(active) = self.tasks.iter_mut().find(|task| task.is_running()) {
            active.stop(now)?;
        }

        self.task_mut(task_id)?.start(now)?;
        Ok(true)
    }

    pub fn delete_task(&mut self, task_id: &str, now: NaiveDateTime) -> Result<(), String> {
        let position = self
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or_else(|| format!("task not found: {task_id}"))?;

        if self.tasks[position].is_running() {
            self.tasks[position].stop(now)?;
        }
        self.tasks.remove(position);
        Ok(())
    }

    pub fn add_taxonomy_entry(&mut self, kind: TaxonomyKind, value: &str) -> Result<(), String> {
        let value = required_text(value, kind.label())?;
        if self.taxonomy(kind).contains(&value) {
            return Err(format!("{} already exists: {value}", kind.label()));
        }

        self.taxonomy_mut(kind).push(value);
        Ok(())
    }

    pub fn rename_taxonomy_entry(
        &mut self,
        kind: TaxonomyKind,
        old: &str,
        new: &str,
    ) -> Result<(), String> {
        let new = required_text(new, kind.label())?;
        if !self.taxonomy(kind).iter().any(|entry| entry == old) {
            return Err(format!("{} not found: {old}", kind.label()));
        }
        if self.taxonomy(kind).iter().any(|entry| *entry == new) {
            return Err(format!("{} already exists: {new}", kind.label()));
        }

        for entry in self.taxonomy_mut(kind) {
            if entry == old {
                *entry = new.clone();
            }
        }

        match kind {
            TaxonomyKind::Project => {
                for task in &mut self.tasks {
                    if task.project.as_deref() == Some(old) {
                        task.project = Some(new.clone());
                    }
                }
            }
            TaxonomyKind::Tag => {
                for task in &mut self.tasks {
                    for tag in &mut task.tags {
                        if tag == old {
                            *tag = new.clone();
                        }
                    }
                }
            }
            TaxonomyKind::LifeArea => {
                for task in &mut self.tasks {
                    if task.life_area.as_deref() == Some(old) {
                        task.life_area = Some(new.clone());
                    }
                }
            }
        }

        Ok(())
    }

    pub fn delete_taxonomy_entry(&mut self, kind: TaxonomyKind, value: &str) -> Result<(), String> {
        let entries = self.taxonomy_mut(kind);
        let before = entries.len();
        entries.retain(|entry| entry != value);
        if entries.len() == before {
            return Err(format!("{} not found: {value}", kind.label()));
        }

        match kind {
            TaxonomyKind::Project => {
                for task in &mut self.tasks {
                    if task.project.as_deref() == Some(value) {
                        task.project = None;
                    }
                }
            }
            TaxonomyKind::Tag => {
                for task in &mut self.tasks {
                    task.tags.retain(|tag| tag != value);
                }
            }
            TaxonomyKind::LifeArea => {
                for task in &mut self.tasks {
                    if task.life_area.as_deref() == Some(value) {
                        task.life_area = None;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn tick_all(&self, now: NaiveDateTime) -> Vec<TaskOverview> {
        self.tasks
            .iter()
            .map(|task| TaskOverview {
                id: task.id.clone(),
                name: task.name.clone(),
                running: task.is_running(),
                elapsed: task.current_elapsed(now).format_hms(),
                project: task.project.clone(),
                tags: task.tags.clone(),
                life_area: task.life_area.clone(),
            })
            .collect()
    }

    pub fn roll_all(&mut self, today: NaiveDate) -> bool {
        let mut rolled = false;
        for task in &mut self.tasks {
            rolled |= task.roll(today);
        }
        rolled
    }

    fn task_mut(&mut self, task_id: &str) -> Result<&mut Task, String> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or_else(|| format!("task not found: {task_id}"))
    }

    fn taxonomy_mut(&mut self, kind: TaxonomyKind) -> &mut Vec<String> {
        match kind {
            TaxonomyKind::Project => &mut self.projects,
            TaxonomyKind::Tag => &mut self.tags,
            TaxonomyKind::LifeArea => &mut self.life_areas,
        }
    }

    fn check_references(
        &self,
        project: Option<&str>,
        tags: &[String],
        life_area: Option<&str>,
    ) -> Result<(), String> {
        if let Some(project) = project {
            if !self.projects.iter().any(|entry| entry == project) {
                return Err(format!("project not found: {project}"));
            }
        }
        for tag in tags {
            if !self.tags.iter().any(|entry| entry == tag) {
                return Err(format!("tag not found: {tag}"));
            }
        }
        if let Some(life_area) = life_area {
            if !self.life_areas.iter().any(|entry| entry == life_area) {
                return Err(format!("life area not found: {life_area}"));
            }
        }
        Ok(())
    }
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
    let value = input.trim();
    if value.is_empty() {
        Err(format!("{field_name} is required"))
    } else {
        Ok(value.to_string())
    }
}

fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique = Vec::new();
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{Span, TaskRegistry, TaxonomyKind};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn instant(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> NaiveDateTime {
        date(year, month, day).and_hms_opt(hour, minute, second).unwrap()
    }

    fn registry_with_task() -> (TaskRegistry, String) {
        let mut registry = TaskRegistry::new();
        registry
            .add_taxonomy_entry(TaxonomyKind::Project, "Paper")
            .expect("project should be created");
        let task_id = registry
            .add_task("Write spec", Some("Paper".to_string()), Vec::new(), None)
            .expect("task should be created");
        (registry, task_id)
    }

    #[test]
    fn tracks_ninety_second_session() {
        let (mut registry, task_id) = registry_with_task();
        let started = instant(2024, 3, 15, 9, 0, 0);
        let stopped = instant(2024, 3, 15, 9, 1, 30);

        registry.toggle(&task_id, started).expect("start should work");
        registry.toggle(&task_id, stopped).expect("stop should work");

        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(task.lifetime_total().total_seconds(), 90);
        assert_eq!(task.ledger().get(date(2024, 3, 15)).total_seconds(), 90);
        assert!(!task.is_running());
    }

    #[test]
    fn sums_alternating_start_stop_intervals() {
        let (mut registry, task_id) = registry_with_task();
        let intervals = [(9, 0, 0, 10), (11, 0, 0, 20), (13, 0, 0, 30)];

        for (hour, minute, second, length) in intervals {
            registry
                .toggle(&task_id, instant(2024, 3, 15, hour, minute, second))
                .expect("start should work");
            registry
                .toggle(&task_id, instant(2024, 3, 15, hour, minute, second + length))
                .expect("stop should work");
        }

        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(task.lifetime_total().total_seconds(), 60);
        assert_eq!(task.ledger().total().total_seconds(), 60);
    }

    #[test]
    fn current_elapsed_never_decreases_while_running() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 15, 9, 0, 0))
            .expect("start should work");

        let task = registry.task(&task_id).expect("task should exist");
        let first = task.current_elapsed(instant(2024, 3, 15, 9, 0, 30));
        let second = task.current_elapsed(instant(2024, 3, 15, 9, 0, 31));
        assert!(second >= first);
        assert_eq!(first.total_seconds(), 30);
    }

    #[test]
    fn current_elapsed_is_lifetime_when_idle() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 15, 9, 0, 0))
            .expect("start should work");
        registry
            .toggle(&task_id, instant(2024, 3, 15, 9, 5, 0))
            .expect("stop should work");

        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(
            task.current_elapsed(instant(2024, 3, 15, 18, 0, 0)).total_seconds(),
            300
        );
    }

    #[test]
    fn splits_midnight_rollover() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 15, 23, 59, 50))
            .expect("start should work");

        assert!(registry.roll_all(date(2024, 3, 16)));

        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(task.ledger().get(date(2024, 3, 15)).total_seconds(), 10);
        assert_eq!(task.ledger().get(date(2024, 3, 16)).total_seconds(), 0);
        assert_eq!(task.started_at(), Some(instant(2024, 3, 16, 0, 0, 0)));

        registry
            .toggle(&task_id, instant(2024, 3, 16, 0, 0, 5))
            .expect("stop should work");
        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(task.ledger().get(date(2024, 3, 16)).total_seconds(), 5);
        assert_eq!(task.lifetime_total().total_seconds(), 15);
    }

    #[test]
    fn roll_walks_skipped_days() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 14, 22, 0, 0))
            .expect("start should work");

        assert!(registry.roll_all(date(2024, 3, 16)));

        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(task.ledger().get(date(2024, 3, 14)).total_seconds(), 7200);
        assert_eq!(task.ledger().get(date(2024, 3, 15)).total_seconds(), 86400);
        assert_eq!(task.ledger().get(date(2024, 3, 16)).total_seconds(), 0);
        assert_eq!(task.lifetime_total().total_seconds(), 93600);
        assert_eq!(task.started_at(), Some(instant(2024, 3, 16, 0, 0, 0)));
    }

    #[test]
    fn roll_is_idempotent_for_a_given_day() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 15, 23, 0, 0))
            .expect("start should work");

        assert!(registry.roll_all(date(2024, 3, 16)));
        let after_first = registry.clone();
        assert!(!registry.roll_all(date(2024, 3, 16)));
        assert_eq!(registry, after_first);
    }

    #[test]
    fn roll_leaves_idle_tasks_untouched() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 15, 9, 0, 0))
            .expect("start should work");
        registry
            .toggle(&task_id, instant(2024, 3, 15, 10, 0, 0))
            .expect("stop should work");

        assert!(!registry.roll_all(date(2024, 3, 18)));

        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(task.ledger().iter().count(), 1);
        assert_eq!(task.ledger().get(date(2024, 3, 18)).total_seconds(), 0);
    }

    #[test]
    fn at_most_one_task_runs_after_any_toggle_sequence() {
        let mut registry = TaskRegistry::new();
        let mut task_ids = Vec::new();
        for name in ["Alpha", "Beta", "Gamma"] {
            task_ids.push(
                registry
                    .add_task(name, None, Vec::new(), None)
                    .expect("task should be created"),
            );
        }

        let mut clock = instant(2024, 3, 15, 9, 0, 0);
        let sequence = [0usize, 1, 2, 1, 1];
        for index in sequence {
            registry
                .toggle(&task_ids[index], clock)
                .expect("toggle should work");
            clock += chrono::Duration::seconds(60);
            let running = registry
                .tasks()
                .iter()
                .filter(|task| task.is_running())
                .count();
            assert!(running <= 1);
        }
    }

    #[test]
    fn toggle_stops_previous_task_and_flushes_its_time() {
        let mut registry = TaskRegistry::new();
        let first = registry
            .add_task("Alpha", None, Vec::new(), None)
            .expect("task should be created");
        let second = registry
            .add_task("Beta", None, Vec::new(), None)
            .expect("task should be created");

        registry
            .toggle(&first, instant(2024, 3, 15, 9, 0, 0))
            .expect("start should work");
        registry
            .toggle(&second, instant(2024, 3, 15, 9, 1, 0))
            .expect("toggle should work");

        let alpha = registry.task(&first).expect("task should exist");
        assert!(!alpha.is_running());
        assert_eq!(alpha.lifetime_total().total_seconds(), 60);
        assert_eq!(alpha.ledger().get(date(2024, 3, 15)).total_seconds(), 60);
        assert!(registry.task(&second).expect("task should exist").is_running());
    }

    #[test]
    fn delete_stops_running_task_first() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 15, 9, 0, 0))
            .expect("start should work");

        registry
            .delete_task(&task_id, instant(2024, 3, 15, 9, 30, 0))
            .expect("delete should work");

        assert!(registry.tasks().is_empty());
        assert!(registry.active_task().is_none());
    }

    #[test]
    fn rejects_empty_task_name() {
        let mut registry = TaskRegistry::new();
        let result = registry.add_task("   ", None, Vec::new(), None);
        assert!(result.is_err());
        assert!(registry.tasks().is_empty());
    }

    #[test]
    fn rejects_unknown_references() {
        let mut registry = TaskRegistry::new();
        assert!(
            registry
                .add_task("Alpha", Some("Ghost".to_string()), Vec::new(), None)
                .is_err()
        );
        registry
            .add_taxonomy_entry(TaxonomyKind::Tag, "deep")
            .expect("tag should be created");
        assert!(
            registry
                .add_task("Alpha", None, vec!["shallow".to_string()], None)
                .is_err()
        );
        assert!(registry.tasks().is_empty());
    }

    #[test]
    fn renames_project_across_referencing_tasks() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .rename_taxonomy_entry(TaxonomyKind::Project, "Paper", "Thesis")
            .expect("rename should work");

        assert_eq!(registry.taxonomy(TaxonomyKind::Project), ["Thesis".to_string()]);
        assert_eq!(
            registry.task(&task_id).expect("task should exist").project.as_deref(),
            Some("Thesis")
        );
    }

    #[test]
    fn rejects_rename_collision_without_changes() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .add_taxonomy_entry(TaxonomyKind::Project, "Thesis")
            .expect("project should be created");

        let before = registry.clone();
        assert!(
            registry
                .rename_taxonomy_entry(TaxonomyKind::Project, "Paper", "Thesis")
                .is_err()
        );
        assert_eq!(registry, before);
        assert_eq!(
            registry.task(&task_id).expect("task should exist").project.as_deref(),
            Some("Paper")
        );
    }

    #[test]
    fn deleting_a_tag_clears_it_from_every_task() {
        let mut registry = TaskRegistry::new();
        registry
            .add_taxonomy_entry(TaxonomyKind::Tag, "deep")
            .expect("tag should be created");
        registry
            .add_taxonomy_entry(TaxonomyKind::Tag, "review")
            .expect("tag should be created");

        let mut task_ids = Vec::new();
        for name in ["Alpha", "Beta", "Gamma"] {
            task_ids.push(
                registry
                    .add_task(
                        name,
                        None,
                        vec!["deep".to_string(), "review".to_string()],
                        None,
                    )
                    .expect("task should be created"),
            );
        }

        registry
            .delete_taxonomy_entry(TaxonomyKind::Tag, "deep")
            .expect("delete should work");

        assert_eq!(registry.taxonomy(TaxonomyKind::Tag), ["review".to_string()]);
        for task_id in &task_ids {
            let task = registry.task(task_id).expect("task should exist");
            assert_eq!(task.tags, ["review".to_string()]);
        }
    }

    #[test]
    fn deleting_a_project_nulls_references() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .delete_taxonomy_entry(TaxonomyKind::Project, "Paper")
            .expect("delete should work");

        assert!(registry.taxonomy(TaxonomyKind::Project).is_empty());
        assert!(registry.task(&task_id).expect("task should exist").project.is_none());
    }

    #[test]
    fn update_task_validates_references() {
        let (mut registry, task_id) = registry_with_task();
        assert!(
            registry
                .update_task(&task_id, "Write spec", Some("Ghost".to_string()), Vec::new(), None)
                .is_err()
        );

        registry
            .add_taxonomy_entry(TaxonomyKind::LifeArea, "Work")
            .expect("life area should be created");
        registry
            .update_task(&task_id, "Draft spec", None, Vec::new(), Some("Work".to_string()))
            .expect("update should work");

        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(task.name, "Draft spec");
        assert!(task.project.is_none());
        assert_eq!(task.life_area.as_deref(), Some("Work"));
    }

    #[test]
    fn start_and_stop_reject_invalid_transitions() {
        let (mut registry, task_id) = registry_with_task();
        let now = instant(2024, 3, 15, 9, 0, 0);

        let task = registry.task_mut(&task_id).expect("task should exist");
        assert!(task.stop(now).is_err());
        task.start(now).expect("start should work");
        assert!(task.start(now).is_err());
    }

    #[test]
    fn ledger_total_matches_lifetime_across_rollover() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 15, 23, 0, 0))
            .expect("start should work");
        registry.roll_all(date(2024, 3, 16));
        registry
            .toggle(&task_id, instant(2024, 3, 16, 1, 0, 0))
            .expect("stop should work");
        registry
            .toggle(&task_id, instant(2024, 3, 16, 9, 0, 0))
            .expect("start should work");
        registry
            .toggle(&task_id, instant(2024, 3, 16, 9, 30, 0))
            .expect("stop should work");

        let task = registry.task(&task_id).expect("task should exist");
        assert_eq!(
            task.ledger().total().total_seconds(),
            task.lifetime_total().total_seconds()
        );
        assert_eq!(task.lifetime_total().total_seconds(), 3600 + 3600 + 1800);
    }

    #[test]
    fn overview_reflects_running_state() {
        let (mut registry, task_id) = registry_with_task();
        registry
            .toggle(&task_id, instant(2024, 3, 15, 9, 0, 0))
            .expect("start should work");

        let rows = registry.tick_all(instant(2024, 3, 15, 9, 1, 30));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].running);
        assert_eq!(rows[0].elapsed, "00:01:30");
        assert_eq!(rows[0].project.as_deref(), Some("Paper"));
    }

    #[test]
    fn formats_zero_padded_hms() {
        assert_eq!(Span::ZERO.format_hms(), "00:00:00");
        assert_eq!(Span::from_secs(90).format_hms(), "00:01:30");
        assert_eq!(Span::from_secs(3661).format_hms(), "01:01:01");
        assert_eq!(Span::from_secs(360_000).format_hms(), "100:00:00");
    }

    #[test]
    fn span_addition_saturates() {
        let total = Span::from_secs(u64::MAX) + Span::from_secs(10);
        assert_eq!(total.total_seconds(), u64::MAX);
    }
}
