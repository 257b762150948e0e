use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Week,
}

/// Weekly repetition target. `count` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub count: u32,
    pub unit: FrequencyUnit,
}

impl Frequency {
    pub fn weekly(count: u32) -> Option<Self> {
        (count > 0).then_some(Self {
            count,
            unit: FrequencyUnit::Week,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// One stored task record. Field names are the stable record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: i64,
    pub scheduled_date: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
}

/// Partial update applied by `TaskStore::patch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub subtasks: Option<Vec<Subtask>>,
}

impl TaskPatch {
    pub fn apply(self, task: &mut Task) {
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(subtasks) = self.subtasks {
            task.subtasks = subtasks;
        }
    }
}

pub type TaskMap = BTreeMap<String, Task>;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    #[serde(default)]
    pub todos: TaskMap,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub text: String,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub frequency: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskForm {
    pub text: String,
    #[serde(default)]
    pub scheduled_date: String,
    #[serde(default)]
    pub frequency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub current: u32,
    pub target: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub goal_progress: Option<GoalProgress>,
}

#[derive(Debug, Serialize)]
pub struct DailyProgress {
    pub completed_count: usize,
    pub total_count: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct GoalSummary {
    pub text: String,
    pub completions: u32,
    pub target: u32,
}

#[derive(Debug, Serialize)]
pub struct WeeklyGoalProgress {
    pub total_completions: u32,
    pub total_targets: u32,
    pub percentage: f64,
    pub goals: Vec<GoalSummary>,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: String,
    pub progress: DailyProgress,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub calendar: crate::calendar::CalendarPosition,
    pub daily: DailyProgress,
    pub completed_this_week: usize,
    pub weekly_goals: WeeklyGoalProgress,
}

#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub applied: bool,
    pub task: Task,
}
