pub mod date;
pub mod table;
pub mod time;

pub use date::{parse_date_range, DateRange};
pub use time::{format_duration, format_tracked_hours, now, parse_dt, time_ago};
