mod daily;
mod store;
mod tracker;

pub use daily::{DailyRecord, DayProgress, DrinkEvent};
pub use store::DailyRecordStore;
pub use tracker::{FulfillmentTracker, ToggleOutcome};
