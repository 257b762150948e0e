use crate::calendar::{self, CalendarPosition, date_key};
use crate::models::{
    DailyProgress, DashboardResponse, GoalProgress, GoalSummary, Task, TaskView, TodayResponse,
    WeeklyGoalProgress,
};
use chrono::{IsoWeek, NaiveDate};
use std::collections::BTreeMap;

/// Grouping key for recurring goals.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn scheduled_in_week(task: &Task, week: IsoWeek) -> bool {
    calendar::parse_date(&task.scheduled_date)
        .map(|date| calendar::iso_year_week(date) == week)
        .unwrap_or(false)
}

/// Tasks scheduled for `today`, compared as `YYYY-MM-DD` strings.
pub fn tasks_for_day<'a>(tasks: &'a [Task], today: &'a str) -> impl Iterator<Item = &'a Task> {
    tasks.iter().filter(move |task| task.scheduled_date == today)
}

pub fn compute_daily_progress(tasks: &[Task], today: &str) -> DailyProgress {
    let (completed_count, total_count) =
        tasks_for_day(tasks, today).fold((0, 0), |(done, total), task| {
            (done + usize::from(task.completed), total + 1)
        });

    DailyProgress {
        completed_count,
        total_count,
        percentage: percentage(completed_count, total_count),
    }
}

/// Completed tasks of any kind scheduled inside `week`.
pub fn completed_in_week(tasks: &[Task], week: IsoWeek) -> usize {
    tasks
        .iter()
        .filter(|task| task.completed && scheduled_in_week(task, week))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GoalTally {
    target: u32,
    completions: u32,
}

/// Weekly goal targets and completions per normalized text, built in one pass
/// over a snapshot.
#[derive(Debug, Clone, Default)]
pub struct GoalIndex {
    goals: BTreeMap<String, GoalTally>,
}

impl GoalIndex {
    pub fn build(tasks: &[Task], week: IsoWeek) -> Self {
        let mut goals = BTreeMap::new();

        // First task carrying a frequency defines the target for its text.
        for task in tasks {
            if let Some(frequency) = task.frequency {
                goals
                    .entry(normalize_text(&task.text))
                    .or_insert(GoalTally {
                        target: frequency.count,
                        completions: 0,
                    });
            }
        }

        for task in tasks
            .iter()
            .filter(|task| task.completed && scheduled_in_week(task, week))
        {
            if let Some(tally) = goals.get_mut(&normalize_text(&task.text)) {
                tally.completions = tally.completions.saturating_add(1);
            }
        }

        Self { goals }
    }

    /// Unclamped completions this week for the goal matching `text`.
    pub fn completions(&self, text: &str) -> u32 {
        self.goals
            .get(&normalize_text(text))
            .map(|tally| tally.completions)
            .unwrap_or(0)
    }

    pub fn summary(&self) -> WeeklyGoalProgress {
        let mut total_completions = 0u32;
        let mut total_targets = 0u32;
        let mut goals = Vec::with_capacity(self.goals.len());

        for (text, tally) in &self.goals {
            total_completions = total_completions.saturating_add(tally.completions.min(tally.target));
            total_targets = total_targets.saturating_add(tally.target);
            goals.push(GoalSummary {
                text: text.clone(),
                completions: tally.completions,
                target: tally.target,
            });
        }

        WeeklyGoalProgress {
            total_completions,
            total_targets,
            percentage: percentage(total_completions as usize, total_targets as usize),
            goals,
        }
    }
}

pub fn compute_weekly_goal_progress(tasks: &[Task], current_week: IsoWeek) -> WeeklyGoalProgress {
    GoalIndex::build(tasks, current_week).summary()
}

/// Live `{current, target}` for a task that carries its own frequency.
pub fn goal_progress_for(task: &Task, index: &GoalIndex) -> Option<GoalProgress> {
    task.frequency.map(|frequency| GoalProgress {
        current: index.completions(&task.text),
        target: frequency.count,
    })
}

pub fn build_today_at(today: NaiveDate, tasks: &[Task]) -> TodayResponse {
    let date = date_key(today);
    let index = GoalIndex::build(tasks, calendar::iso_year_week(today));

    let views = tasks_for_day(tasks, &date)
        .map(|task| TaskView {
            goal_progress: goal_progress_for(task, &index),
            task: task.clone(),
        })
        .collect();

    TodayResponse {
        progress: compute_daily_progress(tasks, &date),
        tasks: views,
        date,
    }
}

pub fn build_dashboard_at(today: NaiveDate, tasks: &[Task]) -> DashboardResponse {
    let date = date_key(today);
    let week = calendar::iso_year_week(today);

    DashboardResponse {
        calendar: CalendarPosition::at(today),
        daily: compute_daily_progress(tasks, &date),
        completed_this_week: completed_in_week(tasks, week),
        weekly_goals: compute_weekly_goal_progress(tasks, week),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, Priority};
    use chrono::Duration;

    fn task(id: &str, text: &str, date: NaiveDate, completed: bool, count: Option<u32>) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed,
            priority: Priority::Medium,
            created_at: 0,
            scheduled_date: date_key(date),
            subtasks: vec![],
            frequency: count.and_then(Frequency::weekly),
        }
    }

    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 7).unwrap()
    }

    fn week_of(date: NaiveDate) -> IsoWeek {
        calendar::iso_year_week(date)
    }

    #[test]
    fn daily_progress_of_empty_list_is_zero() {
        let progress = compute_daily_progress(&[], "2026-01-07");
        assert_eq!(progress.completed_count, 0);
        assert_eq!(progress.total_count, 0);
        assert_eq!(progress.percentage, 0.0);
    }

    #[test]
    fn daily_progress_counts_only_exact_date_matches() {
        let today = wednesday();
        let mut tasks = vec![
            task("a", "Read", today, true, None),
            task("b", "Write", today, false, None),
            task("c", "Cook", today + Duration::days(1), true, None),
        ];
        tasks.push(Task {
            scheduled_date: "2026-1-7".into(),
            ..task("d", "Malformed", today, true, None)
        });

        let progress = compute_daily_progress(&tasks, "2026-01-07");
        assert_eq!(progress.completed_count, 1);
        assert_eq!(progress.total_count, 2);
        assert_eq!(progress.percentage, 50.0);
    }

    #[test]
    fn no_recurring_tasks_gives_empty_weekly_progress() {
        let today = wednesday();
        let tasks = vec![task("a", "Read", today, true, None)];
        let progress = compute_weekly_goal_progress(&tasks, week_of(today));
        assert_eq!(progress.total_completions, 0);
        assert_eq!(progress.total_targets, 0);
        assert_eq!(progress.percentage, 0.0);
        assert!(progress.goals.is_empty());
    }

    #[test]
    fn over_completion_is_clamped_at_target() {
        let today = wednesday();
        let tasks: Vec<Task> = (0..5)
            .map(|i| task(&format!("t{i}"), "Swim", today, true, Some(3)))
            .collect();

        let progress = compute_weekly_goal_progress(&tasks, week_of(today));
        assert_eq!(progress.total_completions, 3);
        assert_eq!(progress.total_targets, 3);
        assert_eq!(progress.percentage, 100.0);
        assert_eq!(progress.goals[0].completions, 5);
    }

    #[test]
    fn text_variants_share_one_goal() {
        let today = wednesday();
        let tasks = vec![
            task("a", "Run", today, true, Some(3)),
            task("b", " run ", today, true, None),
            task("c", "RUN", today - Duration::days(1), true, None),
        ];

        let progress = compute_weekly_goal_progress(&tasks, week_of(today));
        assert_eq!(progress.goals.len(), 1);
        assert_eq!(progress.goals[0].text, "run");
        assert_eq!(progress.total_targets, 3);
        assert_eq!(progress.total_completions, 3);
    }

    #[test]
    fn first_definition_sets_the_target() {
        let today = wednesday();
        let tasks = vec![
            task("a", "Yoga", today, false, Some(2)),
            task("b", "yoga", today, false, Some(5)),
        ];

        let progress = compute_weekly_goal_progress(&tasks, week_of(today));
        assert_eq!(progress.total_targets, 2);
    }

    #[test]
    fn exercise_scenario_counts_only_this_week() {
        let today = wednesday();
        let tasks = vec![
            task("a", "Exercise", today, true, Some(3)),
            task("b", "Exercise", today + Duration::days(1), false, Some(3)),
            task("c", "Exercise", today - Duration::days(7), true, Some(3)),
        ];

        let progress = compute_weekly_goal_progress(&tasks, week_of(today));
        assert_eq!(progress.total_completions, 1);
        assert_eq!(progress.total_targets, 3);
        assert!((progress.percentage - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn same_week_number_in_another_year_does_not_count() {
        let this_year = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        let last_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(calendar::iso_week(this_year), 2);
        assert_eq!(calendar::iso_week(last_year), 1);
        let last_year_same_week = last_year + Duration::days(7);
        assert_eq!(calendar::iso_week(last_year_same_week), 2);

        let tasks = vec![
            task("a", "Stretch", this_year, false, Some(2)),
            task("b", "Stretch", last_year_same_week, true, None),
        ];

        let progress = compute_weekly_goal_progress(&tasks, week_of(this_year));
        assert_eq!(progress.total_completions, 0);
        assert_eq!(completed_in_week(&tasks, week_of(this_year)), 0);
    }

    #[test]
    fn malformed_scheduled_dates_never_count_toward_the_week() {
        let today = wednesday();
        let malformed = |id: &str, text: &str, date: &str| Task {
            scheduled_date: date.to_string(),
            ..task(id, text, today, true, None)
        };
        let tasks = vec![
            task("a", "Run", today, true, Some(3)),
            malformed("b", "run", "2026-1-7"),
            malformed("c", " RUN ", "2026-01-07T00:00"),
            malformed("d", "Run", ""),
        ];
        let week = week_of(today);

        let progress = compute_weekly_goal_progress(&tasks, week);
        assert_eq!(progress.total_completions, 1);
        assert_eq!(progress.total_targets, 3);
        assert_eq!(completed_in_week(&tasks, week), 1);

        let index = GoalIndex::build(&tasks, week);
        assert_eq!(
            goal_progress_for(&tasks[0], &index),
            Some(GoalProgress { current: 1, target: 3 })
        );
    }

    #[test]
    fn goal_annotation_uses_unclamped_count_and_own_target() {
        let today = wednesday();
        let tasks = vec![
            task("a", "Walk", today, true, Some(1)),
            task("b", "walk", today, true, Some(4)),
            task("c", "walk", today, false, None),
        ];
        let index = GoalIndex::build(&tasks, week_of(today));

        assert_eq!(
            goal_progress_for(&tasks[1], &index),
            Some(GoalProgress { current: 2, target: 4 })
        );
        assert_eq!(goal_progress_for(&tasks[2], &index), None);
    }

    #[test]
    fn today_view_annotates_recurring_tasks() {
        let today = wednesday();
        let tasks = vec![
            task("a", "Read", today, true, Some(2)),
            task("b", "Laundry", today, false, None),
            task("c", "Read", today - Duration::days(1), true, None),
        ];

        let view = build_today_at(today, &tasks);
        assert_eq!(view.date, "2026-01-07");
        assert_eq!(view.tasks.len(), 2);
        assert_eq!(view.progress.completed_count, 1);
        let read = view.tasks.iter().find(|v| v.task.id == "a").unwrap();
        assert_eq!(read.goal_progress, Some(GoalProgress { current: 2, target: 2 }));
    }

    #[test]
    fn dashboard_combines_every_metric() {
        let today = wednesday();
        let tasks = vec![
            task("a", "Read", today, true, Some(2)),
            task("b", "Cook", today - Duration::days(2), true, None),
            task("c", "Cook", today - Duration::days(14), true, None),
        ];

        let dashboard = build_dashboard_at(today, &tasks);
        assert_eq!(dashboard.calendar.week, 2);
        assert_eq!(dashboard.daily.total_count, 1);
        assert_eq!(dashboard.completed_this_week, 2);
        assert_eq!(dashboard.weekly_goals.total_completions, 1);
        assert_eq!(dashboard.weekly_goals.total_targets, 2);
    }
}
