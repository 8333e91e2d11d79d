//! Scheduled maintenance for Tomblr.
//!
//! This crate provides:
//! - A cron scheduler that runs maintenance jobs on a fixed cadence
//! - The abandoned upload sweep that frees chunk staging space

pub mod jobs;
pub mod scheduler;

pub use jobs::cleanup::UploadCleanupJob;
pub use scheduler::CronScheduler;
