mod classify;
mod engine;

pub use classify::{classify, Advice, Label};
pub use engine::prefix_report;
