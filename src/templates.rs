/// Predefined tasks offered on the registration tab.
pub const TASK_TEMPLATES: &[&str] = &[
    "Exercise for 30 minutes",
    "Read 20 pages",
    "Meditate for 10 minutes",
    "Drink 2 liters of water",
    "Plan tomorrow's tasks",
    "Review weekly goals",
    "Tidy up the workspace",
    "Call a friend or family member",
    "Study a new language",
    "Go to bed before 11pm",
];
