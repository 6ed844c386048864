//! Ingredient performance analysis
//!
//! Turns the `projects` mirror into ranked per-ingredient tables graded
//! against the channel's own baseline, plus the combination, predictive and
//! retention views used by `db combos`, `kit suggest` and `db analyze --deep`.

pub mod aggregator;
pub mod grading;
pub mod insights;
pub mod report;

pub use aggregator::{
    aggregate, ChannelBaseline, IngredientKind, IngredientReport, IngredientSection, IngredientStats,
    Recommendations,
};
pub use grading::{grade, retention_band, Grade};
pub use insights::{
    best_value, combos, deep_analysis, predict_scores, ComboStats, DeepSection, DeepStats,
    IngredientScore, PredictedScores,
};
pub use report::{format_thousands, render_console, render_scoreboard, write_scoreboard};
