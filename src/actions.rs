use crate::analyzer::AiAnalysis;
use crate::calendar;
use crate::errors::TaskError;
use crate::models::{Frequency, Priority, Subtask, Task, TaskMap, TaskPatch};
use serde_json::Value;
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reads a weekly target the way a number input is read: leading digits
/// after optional whitespace, anything after them ignored. Zero, negative
/// and non-numeric input give no target; targets too large for `u32` are
/// clamped to `u32::MAX`.
pub fn parse_frequency(input: &str) -> Option<Frequency> {
    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..end];
    if digits.is_empty() {
        return None;
    }
    // A non-empty run of ASCII digits only fails to parse on overflow.
    Frequency::weekly(digits.parse::<u32>().unwrap_or(u32::MAX))
}

/// Weekly target from a JSON request body: absent or `null` means none, a
/// positive integer is the target (clamped to `u32::MAX`), anything else is
/// rejected.
pub fn frequency_from_json(value: Option<&Value>) -> Result<Option<Frequency>, TaskError> {
    let Some(value) = value.filter(|value| !value.is_null()) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|count| Frequency::weekly(u32::try_from(count).unwrap_or(u32::MAX)))
        .map(Some)
        .ok_or_else(|| TaskError::InvalidFrequency(value.to_string()))
}

/// Builds a fresh, not yet completed task record.
pub fn new_task(
    text: &str,
    scheduled_date: &str,
    frequency: Option<Frequency>,
    created_at: i64,
) -> Result<Task, TaskError> {
    if text.trim().is_empty() {
        return Err(TaskError::BlankText);
    }
    if calendar::parse_date(scheduled_date).is_none() {
        return Err(TaskError::InvalidDate(scheduled_date.to_string()));
    }

    Ok(Task {
        id: new_id(),
        text: text.to_string(),
        completed: false,
        priority: Priority::Medium,
        created_at,
        scheduled_date: scheduled_date.to_string(),
        subtasks: Vec::new(),
        frequency,
    })
}

pub fn find_task(tasks: &TaskMap, id: &str) -> Result<Task, TaskError> {
    tasks
        .get(id)
        .cloned()
        .ok_or_else(|| TaskError::NotFound(id.to_string()))
}

/// Newest first.
pub fn sorted_tasks(tasks: &TaskMap) -> Vec<Task> {
    let mut list: Vec<Task> = tasks.values().cloned().collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    list
}

pub fn toggle_patch(task: &Task) -> TaskPatch {
    TaskPatch {
        completed: Some(!task.completed),
        ..TaskPatch::default()
    }
}

pub fn toggle_subtask_patch(task: &Task, subtask_id: &str) -> Result<TaskPatch, TaskError> {
    if !task.subtasks.iter().any(|subtask| subtask.id == subtask_id) {
        return Err(TaskError::SubtaskNotFound(subtask_id.to_string()));
    }

    let subtasks = task
        .subtasks
        .iter()
        .map(|subtask| Subtask {
            completed: if subtask.id == subtask_id {
                !subtask.completed
            } else {
                subtask.completed
            },
            ..subtask.clone()
        })
        .collect();

    Ok(TaskPatch {
        subtasks: Some(subtasks),
        ..TaskPatch::default()
    })
}

/// Appends the suggested steps as new sub-tasks and adopts the suggested
/// priority.
pub fn breakdown_patch(task: &Task, analysis: &AiAnalysis) -> TaskPatch {
    let mut subtasks = task.subtasks.clone();
    subtasks.extend(analysis.steps.iter().map(|step| Subtask {
        id: new_id(),
        text: step.clone(),
        completed: false,
    }));

    TaskPatch {
        priority: Some(analysis.priority_suggestion),
        subtasks: Some(subtasks),
        ..TaskPatch::default()
    }
}
