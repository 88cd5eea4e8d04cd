pub mod logging;
pub mod parallel;
pub mod progress;
