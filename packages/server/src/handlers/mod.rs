pub mod contest;
pub mod entry;
pub mod results;
