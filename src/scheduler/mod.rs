pub mod refresh_controller;
pub mod refresh_scheduler;
pub mod status_line;
pub mod tasks;
