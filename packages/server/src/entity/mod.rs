pub mod contest;
pub mod entry;
pub mod judge_score;
pub mod public_vote;
