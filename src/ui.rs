use crate::calendar::{self, CalendarPosition, date_key};
use crate::models::{GoalProgress, Task};
use crate::progress::{
    GoalIndex, build_dashboard_at, compute_daily_progress, goal_progress_for, tasks_for_day,
};
use crate::templates::TASK_TEMPLATES;
use chrono::NaiveDate;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Daily,
    Dashboard,
    Register,
}

impl Tab {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("dashboard") => Tab::Dashboard,
            Some("register") => Tab::Register,
            _ => Tab::Daily,
        }
    }
}

pub struct Page<'a> {
    pub today: NaiveDate,
    pub tasks: &'a [Task],
    pub tab: Tab,
    pub prefill: &'a str,
    /// Task currently being broken down by the analyzer.
    pub analyzing: Option<String>,
}

pub fn render_index(page: &Page<'_>) -> String {
    let position = CalendarPosition::at(page.today);
    let content = match page.tab {
        Tab::Daily => render_daily(page),
        Tab::Dashboard => render_dashboard(page),
        Tab::Register => render_register(page),
    };
    let banner = page
        .analyzing
        .as_ref()
        .map(|_| r#"<div class="banner">AI is analyzing a task, creating actionable steps...</div>"#)
        .unwrap_or_default();

    INDEX_HTML
        .replace("{{TODAY}}", &page.today.format("%A, %-d %B").to_string())
        .replace("{{WEEK}}", &position.week.to_string())
        .replace("{{TOTAL_WEEKS}}", &position.total_weeks.to_string())
        .replace("{{DAY}}", &position.day_of_year.to_string())
        .replace("{{TOTAL_DAYS}}", &position.total_days.to_string())
        .replace("{{NAV_DAILY}}", active(page.tab == Tab::Daily))
        .replace("{{NAV_DASHBOARD}}", active(page.tab == Tab::Dashboard))
        .replace("{{NAV_REGISTER}}", active(page.tab == Tab::Register))
        .replace("{{BANNER}}", banner)
        .replace("{{CONTENT}}", &content)
}

fn active(is_active: bool) -> &'static str {
    if is_active { "tab active" } else { "tab" }
}

fn render_daily(page: &Page<'_>) -> String {
    let today = date_key(page.today);
    let daily = compute_daily_progress(page.tasks, &today);
    let index = GoalIndex::build(page.tasks, calendar::iso_year_week(page.today));
    let weekly = index.summary();

    let mut html = String::new();
    html.push_str(r#"<section class="panel">"#);
    html.push_str(&progress_card(
        "Daily progress",
        daily.completed_count,
        daily.total_count,
        daily.percentage,
        "bar",
    ));
    html.push_str(&progress_card(
        "Weekly goals",
        weekly.total_completions as usize,
        weekly.total_targets as usize,
        weekly.percentage,
        "bar goals",
    ));
    html.push_str("</section>");

    let todays: Vec<&Task> = tasks_for_day(page.tasks, &today).collect();
    if todays.is_empty() {
        html.push_str(
            r#"<section class="empty"><h3>Nothing scheduled for today</h3><p class="hint">Use the Schedule tab to add tasks.</p></section>"#,
        );
        return html;
    }

    html.push_str(r#"<section class="list">"#);
    for task in todays {
        let busy = page.analyzing.as_deref() == Some(task.id.as_str());
        html.push_str(&render_task(task, goal_progress_for(task, &index), busy));
    }
    html.push_str("</section>");
    html
}

fn progress_card(title: &str, done: usize, total: usize, percentage: f64, bar: &str) -> String {
    format!(
        r#"<div class="stat"><span class="label">{title}</span><span class="value">{done} of {total}</span><div class="track"><div class="{bar}" style="width: {percentage:.1}%"></div></div></div>"#
    )
}

fn render_task(task: &Task, goal: Option<GoalProgress>, busy: bool) -> String {
    let id = escape_html(&task.id);
    let mut html = String::new();
    let done_class = if task.completed { " done" } else { "" };

    let _ = write!(
        html,
        r#"<article class="task{done_class}"><div class="task-row"><form method="post" action="/tasks/{id}/toggle"><button class="check" type="submit" aria-label="Toggle">{mark}</button></form><div class="task-body"><span class="task-text">{text}</span><div class="badges"><span class="badge {priority_class}">{priority}</span>"#,
        mark = if task.completed { "&#10003;" } else { "" },
        text = escape_html(&task.text),
        priority_class = task.priority.as_str().to_lowercase(),
        priority = task.priority.as_str(),
    );

    if let Some(goal) = goal {
        let _ = write!(
            html,
            r#"<span class="badge goal">Goal: {}/{}</span>"#,
            goal.current, goal.target
        );
    }
    if !task.subtasks.is_empty() {
        let finished = task.subtasks.iter().filter(|s| s.completed).count();
        let _ = write!(
            html,
            r#"<span class="badge">{finished}/{} subtasks</span>"#,
            task.subtasks.len()
        );
    }
    html.push_str("</div></div>");

    let _ = write!(
        html,
        r#"<form method="post" action="/tasks/{id}/breakdown"><button class="ghost" type="submit"{disabled}>{label}</button></form><form method="post" action="/tasks/{id}/delete" onsubmit="return confirm('Delete this task? This cannot be undone.');"><button class="ghost danger" type="submit">Delete</button></form></div>"#,
        disabled = if busy { " disabled" } else { "" },
        label = if busy { "Analyzing..." } else { "Break down" },
    );

    if !task.subtasks.is_empty() {
        html.push_str(r#"<ul class="subtasks">"#);
        for subtask in &task.subtasks {
            let _ = write!(
                html,
                r#"<li class="{class}"><form method="post" action="/tasks/{id}/subtasks/{sid}/toggle"><button class="sub" type="submit">{mark} {text}</button></form></li>"#,
                class = if subtask.completed { "done" } else { "" },
                sid = escape_html(&subtask.id),
                mark = if subtask.completed { "&#9745;" } else { "&#9744;" },
                text = escape_html(&subtask.text),
            );
        }
        html.push_str("</ul>");
    }

    html.push_str("</article>");
    html
}

fn render_dashboard(page: &Page<'_>) -> String {
    let dashboard = build_dashboard_at(page.today, page.tasks);
    let weekly = &dashboard.weekly_goals;

    let mut html = String::from(r#"<section class="panel">"#);
    let _ = write!(
        html,
        r#"<div class="stat"><span class="label">Completed today</span><span class="value">{}</span><span class="hint">of {} tasks</span></div>"#,
        dashboard.daily.completed_count, dashboard.daily.total_count
    );
    let _ = write!(
        html,
        r#"<div class="stat"><span class="label">Completed this week</span><span class="value">{}</span><span class="hint">Week {}/{}</span></div>"#,
        dashboard.completed_this_week, dashboard.calendar.week, dashboard.calendar.total_weeks
    );
    html.push_str("</section>");

    let _ = write!(
        html,
        r#"<section class="stat wide"><span class="label">Weekly goal progress</span><span class="value">{:.0}%</span><span class="hint">{} of {} goals</span><div class="track"><div class="bar goals" style="width: {:.1}%"></div></div>"#,
        weekly.percentage, weekly.total_completions, weekly.total_targets, weekly.percentage
    );
    if !weekly.goals.is_empty() {
        html.push_str(r#"<ul class="goals-list">"#);
        for goal in &weekly.goals {
            let _ = write!(
                html,
                "<li><span>{}</span><span>{}/{}</span></li>",
                escape_html(&goal.text),
                goal.completions.min(goal.target),
                goal.target
            );
        }
        html.push_str("</ul>");
    }
    html.push_str("</section>");
    html
}

fn render_register(page: &Page<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<section class="stat wide"><h2>New task</h2><form class="register" method="post" action="/tasks"><label>What needs to be done?<input type="text" name="text" value="{text}" placeholder="e.g. Buy groceries" autofocus required /></label><div class="pair"><label>When?<input type="date" name="scheduled_date" value="{date}" /></label><label>Times per week<input type="number" name="frequency" min="1" placeholder="Optional" /></label></div><button class="primary" type="submit">Schedule task</button></form></section>"#,
        text = escape_html(page.prefill),
        date = date_key(page.today),
    );

    html.push_str(r#"<section class="templates"><h3>Or start from a template</h3><div class="chips">"#);
    for template in TASK_TEMPLATES {
        let _ = write!(
            html,
            r#"<a class="chip" href="/?tab=register&amp;text={}">+ {}</a>"#,
            encode_query(template),
            escape_html(template)
        );
    }
    html.push_str("</div></section>");
    html
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn encode_query(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b' ' => encoded.push('+'),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Weekly Tasks</title>
  <style>
    :root {
      --bg: #0f172a;
      --card: #162033;
      --ink: #eae0d5;
      --muted: rgba(234, 224, 213, 0.55);
      --line: rgba(234, 224, 213, 0.08);
      --accent: #38bdf8;
      --danger: #f87171;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Trebuchet MS", sans-serif;
      padding: 32px 18px 120px;
    }

    .app {
      width: min(720px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    header h1 {
      margin: 0 0 8px;
      font-size: 2rem;
    }

    header p {
      margin: 2px 0;
      color: var(--muted);
      font-size: 0.9rem;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
    }

    .stat {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 24px;
      padding: 20px;
      display: grid;
      gap: 8px;
    }

    .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    .value {
      font-size: 1.6rem;
      font-weight: 600;
    }

    .hint {
      color: var(--muted);
      font-size: 0.85rem;
      margin: 0;
    }

    .track {
      background: var(--bg);
      height: 10px;
      border-radius: 999px;
      overflow: hidden;
    }

    .bar {
      background: var(--ink);
      height: 100%;
    }

    .bar.goals {
      background: var(--accent);
    }

    .list {
      display: grid;
      gap: 12px;
    }

    .task {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 20px;
      padding: 14px 16px;
    }

    .task.done .task-text {
      text-decoration: line-through;
      color: var(--muted);
    }

    .task-row {
      display: flex;
      align-items: center;
      gap: 12px;
    }

    .task-body {
      flex: 1;
      display: grid;
      gap: 6px;
    }

    .badges {
      display: flex;
      flex-wrap: wrap;
      gap: 6px;
    }

    .badge {
      font-size: 0.65rem;
      font-weight: 700;
      letter-spacing: 0.08em;
      padding: 2px 8px;
      border-radius: 999px;
      background: var(--line);
    }

    .badge.high {
      color: var(--danger);
    }

    .badge.goal {
      color: var(--accent);
    }

    button {
      appearance: none;
      border: none;
      cursor: pointer;
      font: inherit;
      color: inherit;
    }

    .check {
      width: 28px;
      height: 28px;
      border-radius: 50%;
      border: 2px solid var(--muted);
      background: transparent;
    }

    .ghost {
      background: transparent;
      color: var(--muted);
      font-size: 0.8rem;
    }

    .ghost.danger:hover {
      color: var(--danger);
    }

    .subtasks {
      list-style: none;
      margin: 10px 0 0 40px;
      padding: 0;
    }

    .sub {
      background: transparent;
      font-size: 0.9rem;
      padding: 4px 0;
    }

    .subtasks .done .sub {
      color: var(--muted);
      text-decoration: line-through;
    }

    .empty {
      text-align: center;
      padding: 64px 0;
      opacity: 0.6;
    }

    .goals-list {
      list-style: none;
      padding: 0;
      margin: 8px 0 0;
      display: grid;
      gap: 6px;
    }

    .goals-list li {
      display: flex;
      justify-content: space-between;
      color: var(--muted);
    }

    .register {
      display: grid;
      gap: 16px;
    }

    .register label {
      display: grid;
      gap: 6px;
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    .register input {
      background: var(--bg);
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 14px 18px;
      color: var(--ink);
      font: inherit;
      color-scheme: dark;
    }

    .pair {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 12px;
    }

    .primary {
      background: var(--ink);
      color: var(--bg);
      border-radius: 16px;
      padding: 16px;
      font-weight: 700;
    }

    .chips {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    .chip {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 999px;
      padding: 8px 12px;
      font-size: 0.8rem;
      color: var(--ink);
      text-decoration: none;
    }

    .banner {
      background: var(--card);
      border: 1px solid var(--accent);
      border-radius: 16px;
      padding: 12px 16px;
      color: var(--accent);
    }

    nav {
      position: fixed;
      bottom: 20px;
      left: 50%;
      transform: translateX(-50%);
      width: min(420px, calc(100% - 32px));
      background: rgba(22, 32, 51, 0.92);
      border: 1px solid var(--line);
      border-radius: 40px;
      display: flex;
      justify-content: space-around;
      padding: 12px;
    }

    .tab {
      color: var(--muted);
      text-decoration: none;
      font-size: 0.7rem;
      font-weight: 700;
      letter-spacing: 0.12em;
      text-transform: uppercase;
      padding: 8px 14px;
      border-radius: 20px;
    }

    .tab.active {
      color: var(--ink);
      background: var(--line);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Your Tasks</h1>
      <p>{{TODAY}}</p>
      <p>Week: {{WEEK}}/{{TOTAL_WEEKS}}</p>
      <p>Day: {{DAY}}/{{TOTAL_DAYS}}</p>
    </header>
    {{BANNER}}
    {{CONTENT}}
  </main>
  <nav>
    <a class="{{NAV_DAILY}}" href="/?tab=daily">Tasks</a>
    <a class="{{NAV_DASHBOARD}}" href="/?tab=dashboard">Dashboard</a>
    <a class="{{NAV_REGISTER}}" href="/?tab=register">Schedule</a>
  </nav>
</body>
</html>
"#;
