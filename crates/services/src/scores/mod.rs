mod scoreboard;
mod service;

pub use scoreboard::{OverallStats, ScoreGroup, Scoreboard, aggregate, matches_search};
pub use service::{LIST_LIMIT, ScoreService};
