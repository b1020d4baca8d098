//! Agent instruction text rendered from an embedded template.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::marker::COMPLETION_MARKER;
use crate::io::tasks::TaskFile;

const AGENT_TEMPLATE: &str = include_str!("prompts/agent.md");

/// Task entry as the template sees it.
#[derive(Debug, Clone, Serialize)]
struct TaskContext {
    path: String,
    summary: String,
}

impl TaskContext {
    fn from_task(task: &TaskFile) -> Self {
        Self {
            path: task.path.display().to_string(),
            summary: task.describe(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptInputs<'a> {
    pub tasks: &'a [TaskFile],
    /// The run targets one file directly rather than the open pool.
    pub single_file: bool,
    /// Date the agent should stamp into `completed:`.
    pub today: &'a str,
}

struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("agent", AGENT_TEMPLATE)
            .context("load agent prompt template")?;
        Ok(Self { env })
    }

    fn render(&self, inputs: &PromptInputs<'_>) -> Result<String> {
        let tasks: Vec<TaskContext> = inputs.tasks.iter().map(TaskContext::from_task).collect();
        let template = self.env.get_template("agent")?;
        let rendered = template.render(context! {
            tasks => tasks,
            single_file => inputs.single_file,
            today => inputs.today,
            marker => COMPLETION_MARKER,
        })?;
        Ok(rendered)
    }
}

/// Render the agent prompt for `inputs`.
pub fn build_prompt(inputs: &PromptInputs<'_>) -> Result<String> {
    let prompt = PromptEngine::new()?
        .render(inputs)
        .context("render agent prompt")?;
    debug!(
        tasks = inputs.tasks.len(),
        single_file = inputs.single_file,
        bytes = prompt.len(),
        "built agent prompt"
    );
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::io::tasks::parse_task;

    fn tasks() -> Vec<TaskFile> {
        vec![
            parse_task(
                Path::new("tasks/a.md"),
                "---\nlabels: [api]\n---\n# Add endpoint\n",
            ),
            parse_task(Path::new("tasks/b.md"), "# Write docs\n"),
        ]
    }

    #[test]
    fn pool_prompt_lists_tasks_and_marker_rule() {
        let tasks = tasks();
        let prompt = build_prompt(&PromptInputs {
            tasks: &tasks,
            single_file: false,
            today: "2026-01-02",
        })
        .expect("render");
        assert!(prompt.contains("Open tasks, in order:"));
        assert!(prompt.contains("- `tasks/a.md`: Add endpoint [api] (todo)"));
        assert!(prompt.contains("- `tasks/b.md`: Write docs (todo)"));
        assert!(prompt.contains("completed: 2026-01-02"));
        assert!(prompt.contains(&format!(
            "Only when every task listed above is done, print `{COMPLETION_MARKER}`"
        )));
    }

    #[test]
    fn single_file_prompt_targets_one_task() {
        let tasks = tasks();
        let prompt = build_prompt(&PromptInputs {
            tasks: &tasks[..1],
            single_file: true,
            today: "2026-01-02",
        })
        .expect("render");
        assert!(prompt.contains("Work only on this task file:"));
        assert!(!prompt.contains("tasks/b.md"));
        assert!(prompt.contains(&format!(
            "When this task is done, print `{COMPLETION_MARKER}`"
        )));
    }
}
