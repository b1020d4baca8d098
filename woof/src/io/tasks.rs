//! Task files: markdown documents with an optional frontmatter preamble.
//!
//! ```text
//! ---
//! status: todo
//! labels: [api, db]
//! created: 2026-01-02
//! ---
//! # Add the endpoint
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::frontmatter;

pub const TASK_EXTENSION: &str = "md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Lenient parse; anything unrecognised counts as open work.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "done" | "complete" | "completed" => TaskStatus::Done,
            "in-progress" | "in_progress" | "doing" | "wip" => TaskStatus::InProgress,
            _ => TaskStatus::Todo,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFile {
    pub path: PathBuf,
    /// File name, used for ordering and display.
    pub name: String,
    /// First `# ` heading, falling back to the file stem.
    pub title: String,
    pub status: TaskStatus,
    pub labels: Vec<String>,
    pub created: Option<String>,
    pub completed: Option<String>,
}

impl TaskFile {
    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Done
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    /// One-line summary: `title [labels] (status)`.
    pub fn describe(&self) -> String {
        let mut line = self.title.clone();
        if !self.labels.is_empty() {
            line.push_str(&format!(" [{}]", self.labels.join(", ")));
        }
        line.push_str(&format!(" ({})", self.status.as_str()));
        line
    }
}

/// Parse a task document. `path` is only used for naming.
pub fn parse_task(path: &Path, contents: &str) -> TaskFile {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = frontmatter::body(contents)
        .lines()
        .find_map(|line| line.trim().strip_prefix("# ").map(str::trim))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or(stem);
    TaskFile {
        path: path.to_path_buf(),
        name,
        title,
        status: frontmatter::get(contents, "status")
            .map(|s| TaskStatus::parse(&s))
            .unwrap_or(TaskStatus::Todo),
        labels: frontmatter::get(contents, "labels")
            .map(|l| frontmatter::parse_list(&l))
            .unwrap_or_default(),
        created: frontmatter::get(contents, "created"),
        completed: frontmatter::get(contents, "completed"),
    }
}

pub fn load_task(path: &Path) -> Result<TaskFile> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse_task(path, &contents))
}

/// Every `*.md` file directly inside `dir`, sorted by file name.
pub fn scan_tasks(dir: &Path) -> Result<Vec<TaskFile>> {
    if !dir.is_dir() {
        bail!(
            "tasks directory {} not found (create one with `woof new`)",
            dir.display()
        );
    }
    let mut tasks = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || !has_task_extension(&path) {
            continue;
        }
        match load_task(&path) {
            Ok(task) => tasks.push(task),
            Err(err) => warn!(path = %path.display(), err = %err, "skipping unreadable task file"),
        }
    }
    tasks.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(dir = %dir.display(), count = tasks.len(), "scanned task files");
    Ok(tasks)
}

/// Keep open tasks (or all with `include_done`) carrying `label`, if given.
pub fn select_tasks(tasks: &[TaskFile], label: Option<&str>, include_done: bool) -> Vec<TaskFile> {
    tasks
        .iter()
        .filter(|task| include_done || task.is_open())
        .filter(|task| label.is_none_or(|l| task.has_label(l)))
        .cloned()
        .collect()
}

/// Check a directly targeted task path: existing file with the `.md` extension.
pub fn validate_task_path(path: &Path) -> Result<PathBuf> {
    if !has_task_extension(path) {
        bail!(
            "invalid task file {}: expected a .{TASK_EXTENSION} file",
            path.display()
        );
    }
    if !path.exists() {
        bail!("task file {} does not exist", path.display());
    }
    if !path.is_file() {
        bail!("task file {} is not a regular file", path.display());
    }
    Ok(path.to_path_buf())
}

/// Set `status: done` and `completed: <today>`, keeping other keys.
pub fn mark_done(path: &Path, today: &str) -> Result<TaskFile> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let updated = frontmatter::upsert(
        &contents,
        &[("status", TaskStatus::Done.as_str()), ("completed", today)],
    );
    fs::write(path, &updated).with_context(|| format!("write {}", path.display()))?;
    Ok(parse_task(path, &updated))
}

/// Write a new `todo` task named after `title`. Refuses to overwrite.
pub fn create_task(dir: &Path, title: &str, labels: &[String], today: &str) -> Result<PathBuf> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(anyhow!("task title must contain letters or digits"));
    }
    fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    let path = dir.join(format!("{slug}.{TASK_EXTENSION}"));
    if path.exists() {
        bail!("task file {} already exists", path.display());
    }
    let mut doc = String::from("---\nstatus: todo\n");
    if !labels.is_empty() {
        doc.push_str(&format!("labels: {}\n", frontmatter::format_list(labels)));
    }
    doc.push_str(&format!("created: {today}\n---\n\n# {}\n", title.trim()));
    fs::write(&path, doc).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Lowercase ASCII words joined by `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn has_task_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TASK_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write task");
        path
    }

    #[test]
    fn parses_frontmatter_and_title() {
        let doc = "---\nstatus: in-progress\nlabels: [api, db]\ncreated: 2026-01-02\n---\n\n\
                   # Add endpoint\n\nDetails\n";
        let task = parse_task(Path::new("tasks/add-endpoint.md"), doc);
        assert_eq!(task.name, "add-endpoint.md");
        assert_eq!(task.title, "Add endpoint");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.labels, vec!["api", "db"]);
        assert_eq!(task.created.as_deref(), Some("2026-01-02"));
        assert_eq!(task.describe(), "Add endpoint [api, db] (in-progress)");
    }

    #[test]
    fn missing_frontmatter_means_open_todo_named_after_file() {
        let task = parse_task(Path::new("fix-bug.md"), "Just text\n");
        assert_eq!(task.title, "fix-bug");
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.labels.is_empty());
    }

    #[test]
    fn scan_skips_non_markdown_and_sorts() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), "b.md", "# B\n");
        write(temp.path(), "a.md", "# A\n");
        write(temp.path(), "notes.txt", "ignored");
        fs::create_dir(temp.path().join("nested.md")).expect("mkdir");
        let names: Vec<String> = scan_tasks(temp.path())
            .expect("scan")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[test]
    fn scan_missing_dir_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = scan_tasks(&temp.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn select_filters_done_and_labels() {
        let tasks = vec![
            parse_task(Path::new("a.md"), "---\nlabels: [API]\n---\n# A\n"),
            parse_task(Path::new("b.md"), "---\nstatus: done\nlabels: api\n---\n# B\n"),
            parse_task(Path::new("c.md"), "---\nlabels: [ui]\n---\n# C\n"),
        ];
        let names = |v: Vec<TaskFile>| v.into_iter().map(|t| t.name).collect::<Vec<_>>();
        assert_eq!(names(select_tasks(&tasks, None, false)), vec!["a.md", "c.md"]);
        assert_eq!(names(select_tasks(&tasks, Some("api"), false)), vec!["a.md"]);
        assert_eq!(
            names(select_tasks(&tasks, Some("api"), true)),
            vec!["a.md", "b.md"]
        );
        assert!(select_tasks(&tasks, Some("infra"), true).is_empty());
    }

    #[test]
    fn validate_task_path_checks_extension_and_existence() {
        let temp = tempfile::tempdir().expect("tempdir");
        let good = write(temp.path(), "task.md", "# T\n");
        let txt = write(temp.path(), "task.txt", "# T\n");
        assert_eq!(validate_task_path(&good).expect("valid"), good);
        assert!(
            validate_task_path(&txt)
                .unwrap_err()
                .to_string()
                .contains("expected a .md file")
        );
        assert!(
            validate_task_path(&temp.path().join("missing.md"))
                .unwrap_err()
                .to_string()
                .contains("does not exist")
        );
    }

    #[test]
    fn mark_done_updates_status_and_date() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write(temp.path(), "t.md", "---\nstatus: todo\nlabels: [x]\n---\n\n# T\n");
        let task = mark_done(&path, "2026-03-04").expect("mark done");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed.as_deref(), Some("2026-03-04"));
        assert_eq!(task.labels, vec!["x"]);
        let reloaded = load_task(&path).expect("load");
        assert_eq!(reloaded, task);
    }

    #[test]
    fn create_task_writes_slugged_file_once() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("tasks");
        let labels = vec!["api".to_string()];
        let path =
            create_task(&dir, "Add /health endpoint!", &labels, "2026-01-02").expect("create");
        assert_eq!(path, dir.join("add-health-endpoint.md"));
        let task = load_task(&path).expect("load");
        assert_eq!(task.title, "Add /health endpoint!");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.labels, labels);
        assert_eq!(task.created.as_deref(), Some("2026-01-02"));

        let err = create_task(&dir, "add health endpoint", &[], "2026-01-02").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Hello,  World  "), "hello-world");
        assert_eq!(slugify("!!!"), "");
    }
}
