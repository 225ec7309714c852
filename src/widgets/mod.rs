pub mod base;
pub mod grid;
pub mod text_edit;
pub mod traits;

pub use grid::{Category, ColumnSpec, Grid};
pub use grid::cell::{CellEdit, CellKind, CellState};
pub use grid::navigation::FieldId;
pub use grid::placement::PlacementMetrics;
pub use grid::row::{GridRow, RowType};
pub use traits::{DrawOutput, Drawable, FocusMode, InteractionResult, Interactive, RenderContext};
