pub mod answer;
pub mod interview;
