pub mod event;

pub use event::{AppEvent, GridAction};
