use std::env;
use std::fs;
use std::io::{Error, ErrorKind, Write};
use std::path::{Path, PathBuf};

const RECENT_TRACKERS_FILE: &str = "recent_trackers.txt";
const MAX_RECENT_TRACKERS: usize = 50;

pub fn resolve_tracker_path(
	cli_path: Option<PathBuf>,
	config_path: Option<PathBuf>,
) -> Result<PathBuf, Error> {
	if let Some(path) = cli_path {
		return Ok(absolutize(path));
	}

	if let Some(path) = env::var_os("TEMPO_TRACKER") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return Ok(absolutize(path));
		}
	}

	if let Some(path) = config_path {
		return Ok(absolutize(path));
	}

	if let Ok(mut recent) = recent_trackers(MAX_RECENT_TRACKERS) {
		if let Some(path) = recent.drain(..).next() {
			return Ok(path);
		}
	}

	Err(Error::new(
		ErrorKind::NotFound,
		"no tracker selected: pass --tracker <path>, set TEMPO_TRACKER, or pick one from `trackers`",
	))
}

pub fn remember_tracker(path: &Path) -> Result<(), std::io::Error> {
	let path = absolutize(path.to_path_buf());
	let mut entries = recent_trackers(MAX_RECENT_TRACKERS)?;
	entries.retain(|entry| entry != &path);
	entries.insert(0, path);
	entries.truncate(MAX_RECENT_TRACKERS);
	save_recent_trackers(&entries)
}

pub fn recent_trackers(limit: usize) -> Result<Vec<PathBuf>, std::io::Error> {
	let path = recent_trackers_path();
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
		Err(err) => return Err(err),
	};

	let mut rows = Vec::new();
	for line in raw.lines() {
		let trimmed = line.trim();
		if trimmed.is_empty() {
			continue;
		}
		rows.push(PathBuf::from(trimmed));
		if rows.len() >= limit {
			break;
		}
	}

	Ok(rows)
}

fn save_recent_trackers(entries: &[PathBuf]) -> Result<(), std::io::Error> {
	let state_dir = state_dir();
	fs::create_dir_all(&state_dir)?;

	let mut file = fs::File::create(recent_trackers_path())?;
	for path in entries {
		writeln!(file, "{}", path.display())?;
	}

	Ok(())
}

fn recent_trackers_path() -> PathBuf {
	state_dir().join(RECENT_TRACKERS_FILE)
}

pub fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os("TEMPO_STATE_DIR") {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join("tempo_tracker");
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join("tempo_tracker");
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path)
			.join(".local")
			.join("state")
			.join("tempo_tracker");
	}

	PathBuf::from(".tempo_tracker")
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}
