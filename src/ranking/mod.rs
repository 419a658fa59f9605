//! Ranking and adversarial counter-check: scores candidate insights and
//! keeps the top 3.

pub mod counter;
pub mod score;

pub use counter::{CounterCheck, counter_check};
pub use score::{penalty_for, rank_insights, score_insight};
