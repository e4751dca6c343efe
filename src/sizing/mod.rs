//! Background folder size measurement
//!
//! The scheduler decides when a project folder is measured, races each
//! measurement against a timeout, stores the outcome and announces it on an
//! event channel. Callers get their project back immediately; the size shows
//! up later as a [`ProjectSizeUpdated`] event.

mod events;
mod measurer;
mod scheduler;

pub use events::ProjectSizeUpdated;
pub use measurer::{FolderMeasurer, WalkingMeasurer};
pub use scheduler::{BulkMeasurement, MeasurementHandle, SizeScheduler};
