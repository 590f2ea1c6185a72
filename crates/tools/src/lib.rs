pub mod announce;
pub mod render;
pub mod schedule;

pub use announce::Announcement;
pub use render::{RenderError, render_region};
pub use schedule::{Schedule, ScheduleError};
