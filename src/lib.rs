pub mod actions;
pub mod analyzer;
pub mod app;
pub mod breakdown;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod state;
pub mod store;
pub mod templates;
pub mod ui;

pub use app::router;
pub use calendar::{day_of_year, iso_week, total_days_in_year, total_weeks_in_year};
pub use config::Config;
pub use progress::{compute_daily_progress, compute_weekly_goal_progress};
pub use state::AppState;
pub use store::{JsonFileStore, TaskStore};
