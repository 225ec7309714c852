pub mod core;
pub mod runtime;
pub mod terminal;
pub mod ui;
pub mod widgets;

pub use self::core::value;
pub use self::core::value::Value;

pub use runtime::event;
pub use runtime::event::{AppEvent, GridAction};

pub use terminal::input_event;
pub use terminal::terminal_event;

pub use ui::frame;
pub use ui::span;
pub use ui::style;

pub use widgets::grid::{Category, ColumnSpec, Grid};
pub use widgets::grid::cell::CellKind;
pub use widgets::grid::row::{GridRow, RowType};
pub use widgets::traits::{Drawable, InteractionResult, Interactive, RenderContext};
