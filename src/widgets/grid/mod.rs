//! Inline editable grid: rows × columns of in-place editable cells with
//! dirty tracking, commit-on-blur, keyboard navigation, and an expandable
//! overlay editor for long text.
//!
//! The grid owns editing state only. Rows arrive as an immutable-per-render
//! snapshot via [`Grid::set_rows`]; every structural change (insert,
//! duplicate, delete, category selection) and every commit leaves as a
//! [`GridAction`] for the data layer to apply.

pub mod cell;
pub mod expandable;
pub mod navigation;
pub mod placement;
pub mod row;

use std::collections::HashMap;

use unicode_width::UnicodeWidthStr;

use crate::core::value::{Value, format_number};
use crate::runtime::event::GridAction;
use crate::terminal::{CursorPos, KeyCode, KeyEvent, KeyModifiers, MouseEvent, Size};
use crate::ui::frame::{Frame, clip_text_to_width};
use crate::ui::span::{Span, SpanLine};
use crate::ui::style::{Color, Style};
use crate::widgets::base::WidgetBase;
use crate::widgets::traits::{
    DrawOutput, Drawable, FocusMode, InteractionResult, Interactive, RenderContext,
};

use cell::{CellEdit, CellKind, CellState};
use expandable::{ExpandableOverlay, OverlayRect, should_auto_expand};
use navigation::{FieldId, next_field, previous_field};
use placement::{AnchorRect, PlacementMetrics, ScrollOffset};
use row::GridRow;

/// Column layout and affordance description, supplied by the caller once at
/// construction. Whether a given row's cell is actually editable is decided
/// per row by `GridRow::editable_fields`.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    field: String,
    header: String,
    kind: CellKind,
    min_width: usize,
    expandable: bool,
    category: bool,
    placeholder: Option<String>,
}

impl ColumnSpec {
    pub fn new(field: impl Into<String>, header: impl Into<String>) -> Self {
        let header = header.into();
        let min_width = UnicodeWidthStr::width(header.as_str()).max(6);
        Self {
            field: field.into(),
            header,
            kind: CellKind::Text,
            min_width,
            expandable: false,
            category: false,
            placeholder: None,
        }
    }

    pub fn with_kind(mut self, kind: CellKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_min_width(mut self, min_width: usize) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Long text in this column may expand into the overlay editor.
    pub fn expandable(mut self) -> Self {
        self.expandable = true;
        self
    }

    /// Cell cycles through the grid's category catalog instead of taking
    /// text input; changes leave as `SelectCategory` intents.
    pub fn category(mut self) -> Self {
        self.category = true;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: String,
    pub label: String,
}

impl Category {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowAction {
    Insert,
    Duplicate,
    Delete,
}

const ACTION_SLOT_WIDTH: usize = 4;
const MIN_OVERLAY_WIDTH: i32 = 28;

/// Resolved document-space geometry, recomputed on demand and never cached
/// across events so row inserts/deletes can't leave it stale.
struct GridLayout {
    label_rows: usize,
    header_rows: usize,
    gutter_width: usize,
    col_starts: Vec<usize>,
    col_widths: Vec<usize>,
    actions_start: usize,
    row_starts: Vec<usize>,
    row_heights: Vec<usize>,
    total_height: usize,
}

impl GridLayout {
    fn body_start(&self) -> usize {
        self.label_rows + self.header_rows
    }

    fn row_at(&self, doc_row: i32) -> Option<usize> {
        if doc_row < 0 {
            return None;
        }
        let doc_row = doc_row as usize;
        self.row_starts
            .iter()
            .zip(&self.row_heights)
            .position(|(start, height)| (*start..start + height).contains(&doc_row))
    }

    fn col_at(&self, doc_col: i32) -> Option<usize> {
        if doc_col < 0 {
            return None;
        }
        let doc_col = doc_col as usize;
        self.col_starts
            .iter()
            .zip(&self.col_widths)
            .position(|(start, width)| (*start..start + width).contains(&doc_col))
    }
}

pub struct Grid {
    base: WidgetBase,
    columns: Vec<ColumnSpec>,
    rows: Vec<GridRow>,
    /// Edit state per (row id, field name); rebuilt against every snapshot.
    cells: HashMap<(u64, String), CellState>,
    categories: Vec<Category>,
    read_only: bool,
    active: Option<FieldId>,
    /// The single expanded overlay, grid-wide. Opening a new one always
    /// force-commits this one first.
    overlay: Option<ExpandableOverlay>,
    metrics: PlacementMetrics,
    viewport: Size,
}

impl Grid {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(id, ""),
            columns: Vec::new(),
            rows: Vec::new(),
            cells: HashMap::new(),
            categories: Vec::new(),
            read_only: false,
            active: None,
            overlay: None,
            metrics: Self::default_metrics(),
            viewport: Size {
                width: 80,
                height: 24,
            },
        }
    }

    /// Terminal-scaled placement metrics: one-row gap, a helper line under
    /// the overlay, two rows of box chrome.
    pub fn default_metrics() -> PlacementMetrics {
        PlacementMetrics {
            gap: 1,
            edge_buffer: 2,
            helper_height: 1,
            line_unit: 1,
            padding: 2,
            min_height: 3,
            max_height: 8,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base = WidgetBase::new(self.base.id().to_string(), label);
        self
    }

    pub fn with_column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_metrics(mut self, metrics: PlacementMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_rows(mut self, rows: Vec<GridRow>) -> Self {
        self.set_rows(rows);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn active_field(&self) -> Option<&FieldId> {
        self.active.as_ref()
    }

    pub fn expanded_field(&self) -> Option<&FieldId> {
        self.overlay.as_ref().map(ExpandableOverlay::field)
    }

    /// Replace the row snapshot. Cell buffers survive for fields that still
    /// exist; committed values that changed externally overwrite the buffer
    /// of every cell the user is not actively focused on.
    pub fn set_rows(&mut self, rows: Vec<GridRow>) {
        let mut cells = HashMap::<(u64, String), CellState>::new();
        for row in &rows {
            for column in &self.columns {
                if !row.is_editable(&column.field) {
                    continue;
                }
                let key = (row.id, column.field.clone());
                let focused = self
                    .active
                    .as_ref()
                    .is_some_and(|a| a.row_id == row.id && a.field == column.field);
                let mut state = self
                    .cells
                    .remove(&key)
                    .unwrap_or_else(|| CellState::new(column.kind, row.value(&column.field).clone()));
                state.sync_committed(row.value(&column.field), focused);
                cells.insert(key, state);
            }
        }
        self.cells = cells;
        self.rows = rows;

        if let Some(active) = self.active.clone()
            && self.cell(&active).is_none()
        {
            self.active = None;
        }
        // An overlay whose anchor vanished has nothing left to commit to.
        if let Some(overlay) = &self.overlay
            && self.cell(overlay.field()).is_none()
        {
            self.overlay = None;
        }
    }

    fn cell(&self, field: &FieldId) -> Option<&CellState> {
        self.cells.get(&(field.row_id, field.field.clone()))
    }

    fn cell_mut(&mut self, field: &FieldId) -> Option<&mut CellState> {
        self.cells.get_mut(&(field.row_id, field.field.clone()))
    }

    fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.field == field)
    }

    fn column_index(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.field == field)
    }

    fn row_index_of(&self, row_id: u64) -> Option<usize> {
        self.rows.iter().position(|row| row.id == row_id)
    }

    /// Row-major sequence of currently focusable fields.
    pub fn focusable_fields(&self) -> Vec<FieldId> {
        if self.read_only {
            return Vec::new();
        }
        let mut out = Vec::new();
        for row in &self.rows {
            for column in &self.columns {
                if row.is_editable(&column.field) {
                    out.push(FieldId::new(row.id, column.field.clone()));
                }
            }
        }
        out
    }

    // -----------------------------------------------------------------
    // Layout & measurement
    // -----------------------------------------------------------------

    fn layout(&self) -> GridLayout {
        let label_rows = usize::from(!self.base.label().is_empty());
        let header_rows = 1;
        let digits = self.rows.len().max(1).to_string().len();
        let gutter_width = digits + 2;

        let col_widths: Vec<usize> = self
            .columns
            .iter()
            .map(|column| {
                let mut width = column
                    .min_width
                    .max(UnicodeWidthStr::width(column.header.as_str()));
                for row in &self.rows {
                    for line in self.cell_display(row, column) {
                        width = width.max(UnicodeWidthStr::width(line.as_str()));
                    }
                }
                width
            })
            .collect();

        let mut col_starts = Vec::<usize>::with_capacity(col_widths.len());
        let mut cursor = gutter_width;
        for width in &col_widths {
            col_starts.push(cursor);
            cursor += width + 2;
        }
        let actions_start = cursor;

        let mut row_starts = Vec::<usize>::with_capacity(self.rows.len());
        let mut row_heights = Vec::<usize>::with_capacity(self.rows.len());
        let mut doc_row = label_rows + header_rows;
        for row in &self.rows {
            row_starts.push(doc_row);
            let height = self
                .columns
                .iter()
                .map(|column| self.cell_display(row, column).len())
                .max()
                .unwrap_or(1)
                .max(1);
            row_heights.push(height);
            doc_row += height;
        }

        let total_height = if self.rows.is_empty() && !self.read_only {
            doc_row + 1 // call-to-action line
        } else {
            doc_row
        };

        GridLayout {
            label_rows,
            header_rows,
            gutter_width,
            col_starts,
            col_widths,
            actions_start,
            row_starts,
            row_heights,
            total_height,
        }
    }

    /// Visual lines of one cell: the live buffer for editable cells, the
    /// committed value rendered statically otherwise.
    fn cell_display(&self, row: &GridRow, column: &ColumnSpec) -> Vec<String> {
        if column.category {
            let id = row.value(&column.field).to_edit_text();
            let label = self
                .categories
                .iter()
                .find(|category| category.id == id)
                .map(|category| category.label.clone())
                .unwrap_or(id);
            return vec![label];
        }

        let editable = !self.read_only && row.is_editable(&column.field);
        if editable
            && let Some(state) = self.cells.get(&(row.id, column.field.clone()))
        {
            if state.local().is_empty()
                && let Some(placeholder) = &column.placeholder
            {
                return vec![placeholder.clone()];
            }
            return match column.kind {
                CellKind::Multiline => {
                    let lines: Vec<String> =
                        state.lines().iter().map(|line| line.to_string()).collect();
                    let max = self.metrics.max_height.max(1) as usize;
                    if lines.len() <= max {
                        lines
                    } else {
                        // Auto-resize caps at max height; beyond that the
                        // window follows the cursor.
                        let start = self.multiline_window_start(row.id, column, state, max);
                        lines[start..start + max].to_vec()
                    }
                }
                _ => vec![state.local().replace('\n', "⏎")],
            };
        }

        match (column.kind, row.value(&column.field)) {
            (CellKind::Currency, Value::Number(number)) => vec![format!("{number:.2}")],
            // One visual line per source line; NBSP keeps empty lines from
            // collapsing the row height.
            (CellKind::Multiline, Value::Text(text)) => text
                .split('\n')
                .map(|line| {
                    if line.is_empty() {
                        "\u{a0}".to_string()
                    } else {
                        line.to_string()
                    }
                })
                .collect(),
            (_, Value::Text(text)) => vec![text.replace('\n', "⏎")],
            (_, Value::Number(number)) => vec![format_number(*number)],
            (_, Value::None) => vec![String::new()],
        }
    }

    /// First visible line of a multiline cell whose content exceeds the
    /// height cap. The window follows the cursor on the active cell and
    /// pins to the top elsewhere.
    fn multiline_window_start(
        &self,
        row_id: u64,
        column: &ColumnSpec,
        state: &CellState,
        max: usize,
    ) -> usize {
        let total = state.lines().len();
        let active = self
            .active
            .as_ref()
            .is_some_and(|a| a.row_id == row_id && a.field == column.field);
        let cursor_line = if active { state.cursor_line_col().0 } else { 0 };
        cursor_line
            .saturating_sub(max - 1)
            .min(total.saturating_sub(max))
    }

    fn anchor_rect_in(&self, layout: &GridLayout, field: &FieldId) -> Option<AnchorRect> {
        let row_idx = self.row_index_of(field.row_id)?;
        let col_idx = self.column_index(&field.field)?;
        let row = &self.rows[row_idx];
        let column = &self.columns[col_idx];
        let height = self.cell_display(row, column).len().max(1);
        Some(AnchorRect {
            top: *layout.row_starts.get(row_idx)? as i32,
            left: *layout.col_starts.get(col_idx)? as i32,
            width: *layout.col_widths.get(col_idx)? as i32,
            height: height as i32,
        })
    }

    fn document_height(&self, layout: &GridLayout) -> i32 {
        layout.total_height.max(self.viewport.height as usize) as i32
    }

    // -----------------------------------------------------------------
    // Overlay lifecycle
    // -----------------------------------------------------------------

    /// Open pipeline: measure the anchor, size from content, place, show.
    /// Any missing geometry aborts the open and the field stays collapsed.
    /// A previously open overlay is force-committed first, so its commit
    /// intent is ordered before anything the new overlay produces.
    fn open_overlay(&mut self, field: FieldId, select_all: bool, actions: &mut Vec<GridAction>) {
        self.close_overlay_commit(actions);
        if self.read_only {
            return;
        }
        let Some(column) = self.column(&field.field) else {
            return;
        };
        if !column.expandable {
            return;
        }
        let layout = self.layout();
        let Some(anchor) = self.anchor_rect_in(&layout, &field) else {
            return;
        };
        let Some(cell) = self.cell(&field) else {
            return;
        };
        let saved = cell.local().to_string();

        let height = placement::desired_height(&saved, &self.metrics);
        let pos = placement::compute_position(
            anchor,
            self.document_height(&layout),
            ScrollOffset::default(),
            height,
            &self.metrics,
        );
        let rect = OverlayRect {
            top: pos.top.max(0),
            left: pos.left,
            width: anchor.width.max(MIN_OVERLAY_WIDTH),
            height,
        };
        self.overlay = Some(ExpandableOverlay::new(
            field,
            saved,
            rect,
            self.metrics.helper_height,
            select_all,
        ));
    }

    fn close_overlay_commit(&mut self, actions: &mut Vec<GridAction>) {
        let Some(overlay) = self.overlay.take() else {
            return;
        };
        let field = overlay.field().clone();
        let Some(row_index) = self.row_index_of(field.row_id) else {
            return;
        };
        if let Some(value) = self.cell_mut(&field).and_then(CellState::take_commit) {
            actions.push(GridAction::CommitField {
                row_index,
                field: field.field,
                value,
            });
        }
    }

    fn close_overlay_revert(&mut self, actions: &mut Vec<GridAction>) {
        let Some(overlay) = self.overlay.take() else {
            return;
        };
        let field = overlay.field().clone();
        let saved = overlay.saved().to_string();
        if let Some(cell) = self.cell_mut(&field) {
            cell.set_local(saved.clone());
        }
        if let Some(row_index) = self.row_index_of(field.row_id) {
            actions.push(GridAction::ValueChanged {
                row_index,
                field: field.field,
                value: saved,
            });
        }
    }

    /// Recompute overlay geometry against the current viewport. Runs at
    /// resize time only; scrolling needs no recompute because the overlay
    /// lives in document coordinates.
    fn reposition_overlay(&mut self, actions: &mut Vec<GridAction>) {
        let Some(field) = self.expanded_field().cloned() else {
            return;
        };
        let layout = self.layout();
        let Some(anchor) = self.anchor_rect_in(&layout, &field) else {
            // Anchor gone mid-flight: the overlay can no longer be placed.
            self.close_overlay_commit(actions);
            return;
        };
        let content = self.cell(&field).map(CellState::local).unwrap_or_default();
        let height = placement::desired_height(content, &self.metrics);
        let pos = placement::compute_position(
            anchor,
            self.document_height(&layout),
            ScrollOffset::default(),
            height,
            &self.metrics,
        );
        if let Some(overlay) = &mut self.overlay {
            overlay.set_rect(OverlayRect {
                top: pos.top.max(0),
                left: pos.left,
                width: anchor.width.max(MIN_OVERLAY_WIDTH),
                height,
            });
        }
    }

    // -----------------------------------------------------------------
    // Focus
    // -----------------------------------------------------------------

    /// Move focus to `target`, committing whatever was being edited
    /// first: every focus move is a blur for the field it leaves.
    fn focus_field(&mut self, target: FieldId, actions: &mut Vec<GridAction>) {
        if self.active.as_ref() == Some(&target) {
            return;
        }
        self.commit_active(actions);
        self.active = Some(target.clone());

        let auto_open = self.column(&target.field).is_some_and(|c| c.expandable)
            && self
                .cell(&target)
                .is_some_and(|cell| should_auto_expand(cell.local()));
        if auto_open {
            self.open_overlay(target, false, actions);
        }
    }

    fn commit_active(&mut self, actions: &mut Vec<GridAction>) {
        if self.overlay.is_some() {
            self.close_overlay_commit(actions);
            return;
        }
        let Some(active) = self.active.clone() else {
            return;
        };
        let Some(row_index) = self.row_index_of(active.row_id) else {
            return;
        };
        if let Some(value) = self.cell_mut(&active).and_then(CellState::take_commit) {
            actions.push(GridAction::CommitField {
                row_index,
                field: active.field,
                value,
            });
        }
    }

    fn focus_adjacent(&mut self, forward: bool, actions: &mut Vec<GridAction>) {
        let fields = self.focusable_fields();
        let target = match &self.active {
            Some(active) => {
                if forward {
                    next_field(&fields, active)
                } else {
                    previous_field(&fields, active)
                }
            }
            None if forward => fields.first().cloned(),
            None => fields.last().cloned(),
        };
        match target {
            Some(target) => self.focus_field(target, actions),
            // Clamped at the edge: commit still happened for Tab semantics,
            // focus stays where it is.
            None => self.commit_active(actions),
        }
    }

    fn focus_vertical(&mut self, delta: i32, actions: &mut Vec<GridAction>) -> bool {
        let Some(active) = self.active.clone() else {
            return if delta > 0 {
                self.focus_adjacent(true, actions);
                true
            } else {
                false
            };
        };
        let Some(row_idx) = self.row_index_of(active.row_id) else {
            return false;
        };
        let mut idx = row_idx as i32 + delta;
        while idx >= 0 && (idx as usize) < self.rows.len() {
            let row = &self.rows[idx as usize];
            // Same column when possible, else the row's first editable field.
            let target = if row.is_editable(&active.field) {
                Some(FieldId::new(row.id, active.field.clone()))
            } else {
                self.columns
                    .iter()
                    .find(|column| row.is_editable(&column.field))
                    .map(|column| FieldId::new(row.id, column.field.clone()))
            };
            if let Some(target) = target {
                self.focus_field(target, actions);
                return true;
            }
            idx += delta;
        }
        false
    }

    // -----------------------------------------------------------------
    // Row intents
    // -----------------------------------------------------------------

    fn active_row(&self) -> Option<(usize, &GridRow)> {
        let active = self.active.as_ref()?;
        let index = self.row_index_of(active.row_id)?;
        Some((index, &self.rows[index]))
    }

    fn cycle_category(&self, row: &GridRow, field: &str) -> Option<String> {
        if self.categories.is_empty() {
            return None;
        }
        let current = row.value(field).to_edit_text();
        let at = self
            .categories
            .iter()
            .position(|category| category.id == current);
        let next = match at {
            Some(at) => (at + 1) % self.categories.len(),
            None => 0,
        };
        Some(self.categories[next].id.clone())
    }

    // -----------------------------------------------------------------
    // Key handling
    // -----------------------------------------------------------------

    fn on_key_overlay(&mut self, key: KeyEvent) -> InteractionResult {
        let mut actions = Vec::<GridAction>::new();
        let Some(mut overlay) = self.overlay.take() else {
            return InteractionResult::ignored();
        };
        let field = overlay.field().clone();
        let row_index = self.row_index_of(field.row_id);
        let Some(cell) = self.cells.get_mut(&(field.row_id, field.field.clone())) else {
            // Anchor vanished under the overlay; drop it silently.
            return InteractionResult::handled();
        };

        use expandable::OverlayEvent;
        match overlay.on_key(cell, key) {
            OverlayEvent::Edited => {
                let value = cell.local().to_string();
                self.overlay = Some(overlay);
                if let Some(row_index) = row_index {
                    actions.push(GridAction::ValueChanged {
                        row_index,
                        field: field.field,
                        value,
                    });
                }
                InteractionResult::with_actions(actions)
            }
            OverlayEvent::Moved => {
                self.overlay = Some(overlay);
                InteractionResult::handled()
            }
            OverlayEvent::Ignored => {
                // The overlay is modal for its field; unclaimed keys stop here.
                self.overlay = Some(overlay);
                InteractionResult::consumed()
            }
            OverlayEvent::Commit => {
                self.overlay = Some(overlay);
                self.close_overlay_commit(&mut actions);
                InteractionResult::with_actions(actions)
            }
            OverlayEvent::CommitAndNext => {
                self.overlay = Some(overlay);
                self.close_overlay_commit(&mut actions);
                self.focus_adjacent(true, &mut actions);
                InteractionResult::with_actions(actions)
            }
            OverlayEvent::CommitAndPrev => {
                self.overlay = Some(overlay);
                self.close_overlay_commit(&mut actions);
                self.focus_adjacent(false, &mut actions);
                InteractionResult::with_actions(actions)
            }
            OverlayEvent::Revert => {
                self.overlay = Some(overlay);
                self.close_overlay_revert(&mut actions);
                InteractionResult::with_actions(actions)
            }
        }
    }

    fn on_key_grid(&mut self, key: KeyEvent) -> InteractionResult {
        let mut actions = Vec::<GridAction>::new();

        match key.code {
            KeyCode::Tab => {
                self.focus_adjacent(true, &mut actions);
                return InteractionResult::with_actions(actions);
            }
            KeyCode::BackTab => {
                self.focus_adjacent(false, &mut actions);
                return InteractionResult::with_actions(actions);
            }
            KeyCode::Up | KeyCode::Down if key.modifiers.contains(KeyModifiers::ALT) => {
                let delta = if key.code == KeyCode::Up { 1 } else { -1 };
                if let Some(active) = self.active.clone()
                    && let Some(row_index) = self.row_index_of(active.row_id)
                    && let Some(cell) = self.cell_mut(&active)
                    && cell.step_by(delta) == CellEdit::Changed
                {
                    let value = cell.local().to_string();
                    actions.push(GridAction::ValueChanged {
                        row_index,
                        field: active.field,
                        value,
                    });
                    return InteractionResult::with_actions(actions);
                }
                return InteractionResult::ignored();
            }
            KeyCode::Up => {
                if self.focus_vertical(-1, &mut actions) {
                    return InteractionResult::with_actions(actions);
                }
                return InteractionResult::ignored();
            }
            KeyCode::Down => {
                if self.focus_vertical(1, &mut actions) {
                    return InteractionResult::with_actions(actions);
                }
                return InteractionResult::ignored();
            }
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(active) = self.active.clone() {
                    // Manual expansion: select everything for replacement.
                    self.open_overlay(active, true, &mut actions);
                    return InteractionResult::with_actions(actions);
                }
                return InteractionResult::ignored();
            }
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.read_only {
                    return InteractionResult::ignored();
                }
                if self.rows.is_empty() {
                    return InteractionResult::with_action(GridAction::InsertRowAfter { index: 0 });
                }
                if let Some((index, row)) = self.active_row()
                    && row.can_add_row
                {
                    self.commit_active(&mut actions);
                    actions.push(GridAction::InsertRowAfter { index });
                    return InteractionResult::with_actions(actions);
                }
                return InteractionResult::ignored();
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some((index, row)) = self.active_row()
                    && row.can_duplicate
                    && !self.read_only
                {
                    self.commit_active(&mut actions);
                    actions.push(GridAction::DuplicateRow { index });
                    return InteractionResult::with_actions(actions);
                }
                return InteractionResult::ignored();
            }
            KeyCode::Char('x') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some((index, row)) = self.active_row()
                    && row.can_delete
                    && !self.read_only
                {
                    actions.push(GridAction::DeleteRow { index });
                    return InteractionResult::with_actions(actions);
                }
                return InteractionResult::ignored();
            }
            KeyCode::Esc => {
                if let Some(active) = self.active.clone()
                    && let Some(cell) = self.cell_mut(&active)
                    && cell.is_dirty()
                {
                    cell.revert();
                    self.active = None;
                    return InteractionResult::handled();
                }
                return InteractionResult::ignored();
            }
            _ => {}
        }

        let Some(active) = self.active.clone() else {
            return InteractionResult::ignored();
        };
        let Some(row_index) = self.row_index_of(active.row_id) else {
            return InteractionResult::ignored();
        };
        let Some(column) = self.column(&active.field) else {
            return InteractionResult::ignored();
        };

        if column.category {
            if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter)
                && let Some(category_id) = self.cycle_category(&self.rows[row_index], &active.field)
            {
                return InteractionResult::with_action(GridAction::SelectCategory {
                    index: row_index,
                    category_id,
                });
            }
            return InteractionResult::ignored();
        }

        // Enter on a single-line cell releases the edit: same commit path
        // as any other blur. Multiline cells take Enter as a newline below.
        if key.code == KeyCode::Enter && column.kind != CellKind::Multiline {
            self.commit_active(&mut actions);
            return InteractionResult::with_actions(actions);
        }

        let Some(cell) = self.cell_mut(&active) else {
            return InteractionResult::ignored();
        };
        match cell.on_key(key) {
            CellEdit::Changed => {
                let value = cell.local().to_string();
                actions.push(GridAction::ValueChanged {
                    row_index,
                    field: active.field,
                    value,
                });
                InteractionResult::with_actions(actions)
            }
            CellEdit::Moved => InteractionResult::handled(),
            CellEdit::Ignored => InteractionResult::ignored(),
        }
    }

    // -----------------------------------------------------------------
    // Mouse handling (document coordinates)
    // -----------------------------------------------------------------

    fn row_action_slots(row: &GridRow) -> Vec<RowAction> {
        let mut slots = Vec::new();
        if row.can_add_row {
            slots.push(RowAction::Insert);
        }
        if row.can_duplicate {
            slots.push(RowAction::Duplicate);
        }
        if row.can_delete {
            slots.push(RowAction::Delete);
        }
        slots
    }

    fn on_mouse_grid(&mut self, doc_row: i32, doc_col: i32) -> InteractionResult {
        let mut actions = Vec::<GridAction>::new();

        if let Some(overlay) = &self.overlay {
            if overlay.hit_test(doc_row, doc_col) {
                return InteractionResult::consumed();
            }
            let layout = self.layout();
            let on_anchor = self
                .anchor_rect_in(&layout, overlay.field())
                .is_some_and(|anchor| anchor.contains(doc_row, doc_col));
            if on_anchor {
                // Anchor and overlay are one logical field; a click on the
                // anchor is not an outside click.
                return InteractionResult::consumed();
            }
            self.close_overlay_commit(&mut actions);
        }

        let layout = self.layout();

        if self.rows.is_empty() {
            if !self.read_only && doc_row as usize == layout.body_start() {
                actions.push(GridAction::InsertRowAfter { index: 0 });
            }
            return InteractionResult::with_actions(actions);
        }

        let Some(row_idx) = layout.row_at(doc_row) else {
            return if actions.is_empty() {
                InteractionResult::ignored()
            } else {
                InteractionResult::with_actions(actions)
            };
        };
        let row = &self.rows[row_idx];

        if doc_col >= layout.actions_start as i32 && !self.read_only {
            let slot = (doc_col as usize - layout.actions_start) / ACTION_SLOT_WIDTH;
            if let Some(action) = Self::row_action_slots(row).get(slot) {
                self.commit_active(&mut actions);
                actions.push(match action {
                    RowAction::Insert => GridAction::InsertRowAfter { index: row_idx },
                    RowAction::Duplicate => GridAction::DuplicateRow { index: row_idx },
                    RowAction::Delete => GridAction::DeleteRow { index: row_idx },
                });
            }
            return InteractionResult::with_actions(actions);
        }

        if let Some(col_idx) = layout.col_at(doc_col) {
            let column = &self.columns[col_idx];
            if !self.read_only && row.is_editable(&column.field) {
                let target = FieldId::new(row.id, column.field.clone());
                self.focus_field(target, &mut actions);
            }
        }
        InteractionResult::with_actions(actions)
    }

    // -----------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------

    fn pad(text: &str, width: usize) -> String {
        let clipped = clip_text_to_width(text, width);
        let used = UnicodeWidthStr::width(clipped.as_str());
        format!("{}{}", clipped, " ".repeat(width - used))
    }

    fn cell_style(&self, row: &GridRow, column: &ColumnSpec, active: bool) -> Style {
        let editable = !self.read_only && row.is_editable(&column.field);
        if !editable {
            return Style::default();
        }
        let state = self.cells.get(&(row.id, column.field.clone()));
        let dirty = state.is_some_and(CellState::is_dirty);
        let empty = state.is_some_and(|state| state.local().is_empty());

        // The dirty flag must stay observable without reading the buffer.
        let mut style = if dirty {
            Style::new().color(Color::Yellow).bold()
        } else if active {
            Style::new().color(Color::Cyan)
        } else if empty && column.placeholder.is_some() {
            Style::new().color(Color::DarkGrey)
        } else {
            Style::default()
        };
        if active {
            style = style.bold();
        }
        style
    }

    fn draw_header(&self, layout: &GridLayout) -> SpanLine {
        let mut line = vec![Span::new(" ".repeat(layout.gutter_width))];
        for (idx, column) in self.columns.iter().enumerate() {
            line.push(Span::styled(
                Self::pad(&column.header, layout.col_widths[idx] + 2),
                Style::new().bold(),
            ));
        }
        line
    }

    fn draw_row(
        &self,
        layout: &GridLayout,
        row_idx: usize,
        ordinal: usize,
        lines: &mut Vec<SpanLine>,
        host_focused: bool,
    ) {
        let row = &self.rows[row_idx];
        let digits = layout.gutter_width - 2;
        let height = layout.row_heights[row_idx];
        let active_row = self
            .active
            .as_ref()
            .is_some_and(|active| active.row_id == row.id);

        let cell_lines: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|column| self.cell_display(row, column))
            .collect();

        for line_idx in 0..height {
            let mut line = Vec::<Span>::new();

            if line_idx == 0 {
                let marker = if active_row && host_focused { '❯' } else { ' ' };
                let number = if row.show_row_number {
                    row.display_number
                        .clone()
                        .unwrap_or_else(|| ordinal.to_string())
                } else {
                    String::new()
                };
                line.push(Span::styled(
                    format!("{marker}{number:>digits$} "),
                    Style::new().color(Color::DarkGrey),
                ));
            } else {
                line.push(Span::new(" ".repeat(layout.gutter_width)));
            }

            for (col_idx, column) in self.columns.iter().enumerate() {
                let text = cell_lines[col_idx]
                    .get(line_idx)
                    .map(String::as_str)
                    .unwrap_or("");
                let active = active_row
                    && self
                        .active
                        .as_ref()
                        .is_some_and(|a| a.field == column.field);
                line.push(Span::styled(
                    Self::pad(text, layout.col_widths[col_idx] + 2),
                    self.cell_style(row, column, active),
                ));
            }

            if line_idx == 0 && !self.read_only {
                for action in Self::row_action_slots(row) {
                    let (glyph, color) = match action {
                        RowAction::Insert => ("[+]", Color::Green),
                        RowAction::Duplicate => ("[=]", Color::Cyan),
                        RowAction::Delete => ("[x]", Color::Red),
                    };
                    line.push(Span::styled(format!(" {glyph}"), Style::new().color(color)));
                }
            }

            lines.push(line);
        }
    }
}

impl Drawable for Grid {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn label(&self) -> &str {
        self.base.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        let layout = self.layout();
        let mut lines = Vec::<SpanLine>::new();

        if !self.base.label().is_empty() {
            lines.push(vec![Span::styled(
                self.base.label().to_string(),
                Style::new().bold(),
            )]);
        }
        lines.push(self.draw_header(&layout));

        if self.rows.is_empty() {
            if !self.read_only {
                let marker = if ctx.focused { "❯" } else { " " };
                lines.push(vec![Span::styled(
                    format!("{marker} + Add first row"),
                    Style::new().color(Color::Green).bold(),
                )]);
            }
            return DrawOutput { lines };
        }

        let mut ordinal = 0usize;
        for row_idx in 0..self.rows.len() {
            if self.rows[row_idx].show_row_number {
                ordinal += 1;
            }
            self.draw_row(&layout, row_idx, ordinal, &mut lines, ctx.focused);
        }

        let mut frame = Frame::new(lines);
        if let Some(overlay) = &self.overlay
            && let Some(cell) = self.cell(overlay.field())
        {
            let rect = overlay.rect();
            frame.overlay(rect.top, rect.left, &overlay.draw(cell));
        }
        DrawOutput { lines: frame.lines }
    }
}

impl Interactive for Grid {
    fn focus_mode(&self) -> FocusMode {
        FocusMode::Group
    }

    fn on_key(&mut self, key: KeyEvent) -> InteractionResult {
        // Ctrl/Alt chords stay grid bindings even while an overlay is open;
        // the grid paths that need it commit the overlay before acting.
        let chord = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        if self.overlay.is_some() && !chord {
            self.on_key_overlay(key)
        } else {
            self.on_key_grid(key)
        }
    }

    fn on_mouse(&mut self, event: MouseEvent) -> InteractionResult {
        self.on_mouse_grid(event.row as i32, event.column as i32)
    }

    fn on_resize(&mut self, viewport: Size) -> InteractionResult {
        self.viewport = viewport;
        let mut actions = Vec::<GridAction>::new();
        self.reposition_overlay(&mut actions);
        let mut result = InteractionResult::handled();
        result.actions = actions;
        result
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        if let Some(overlay) = &self.overlay {
            let cell = self.cell(overlay.field())?;
            let (row, col) = overlay.cursor_doc_pos(cell);
            return Some(CursorPos {
                row: row.max(0) as u16,
                col: col.max(0) as u16,
            });
        }

        let active = self.active.as_ref()?;
        let layout = self.layout();
        let anchor = self.anchor_rect_in(&layout, active)?;
        let cell = self.cell(active)?;
        let (line, col) = cell.cursor_line_col();
        let visual_line = {
            let column = self.column(&active.field)?;
            let total = cell.lines().len();
            let max = self.metrics.max_height.max(1) as usize;
            if column.kind() == CellKind::Multiline && total > max {
                line.saturating_sub(self.multiline_window_start(active.row_id, column, cell, max))
            } else {
                line
            }
        };
        let prefix: String = cell
            .lines()
            .get(line)
            .map(|text| text.chars().take(col).collect())
            .unwrap_or_default();
        Some(CursorPos {
            row: (anchor.top + visual_line as i32).max(0) as u16,
            col: (anchor.left as usize + UnicodeWidthStr::width(prefix.as_str())) as u16,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::frame::spans_text;

    fn categories() -> Vec<Category> {
        vec![
            Category::new("channel", "Channel letters"),
            Category::new("flat", "Flat cut"),
            Category::new("vinyl", "Vinyl"),
        ]
    }

    fn order_grid(rows: Vec<GridRow>) -> Grid {
        Grid::new("lines")
            .with_column(
                ColumnSpec::new("description", "Description")
                    .expandable()
                    .with_min_width(20)
                    .with_placeholder("Item description"),
            )
            .with_column(ColumnSpec::new("qty", "Qty").with_kind(CellKind::Number))
            .with_column(ColumnSpec::new("unit_price", "Unit price").with_kind(CellKind::Currency))
            .with_column(ColumnSpec::new("category", "Category").category())
            .with_categories(categories())
            .with_rows(rows)
    }

    fn two_rows() -> Vec<GridRow> {
        vec![
            GridRow::new(1)
                .with_value("description", "Front-lit channel set")
                .with_value("qty", 2.0)
                .with_value("unit_price", 180.0)
                .with_value("category", "channel")
                .editable("description")
                .editable("qty")
                .editable("unit_price")
                .editable("category"),
            GridRow::new(2)
                .with_value("description", "Install hardware")
                .with_value("qty", 1.0)
                .editable("description")
                .editable("qty"),
        ]
    }

    fn press(grid: &mut Grid, key: KeyEvent) -> Vec<GridAction> {
        grid.on_key(key).actions
    }

    fn type_text(grid: &mut Grid, text: &str) -> Vec<GridAction> {
        let mut actions = Vec::new();
        for ch in text.chars() {
            actions.extend(press(grid, KeyEvent::char(ch)));
        }
        actions
    }

    #[test]
    fn tab_focuses_first_field_and_walks_row_major() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert_eq!(grid.active_field(), Some(&FieldId::new(1, "description")));

        // Overlay auto-opened (21 chars > 10): Tab commits and moves on.
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert_eq!(grid.active_field(), Some(&FieldId::new(1, "qty")));
    }

    #[test]
    fn auto_open_requires_strictly_more_than_ten_chars() {
        let rows = vec![
            GridRow::new(1)
                .with_value("description", "abcdefghij") // 10 chars
                .editable("description"),
            GridRow::new(2)
                .with_value("description", "abcdefghijk") // 11 chars
                .editable("description"),
        ];
        let mut grid = order_grid(rows);

        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert_eq!(grid.active_field(), Some(&FieldId::new(1, "description")));
        assert!(grid.expanded_field().is_none());

        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert_eq!(grid.expanded_field(), Some(&FieldId::new(2, "description")));
    }

    #[test]
    fn opening_second_overlay_commits_the_first() {
        let rows = vec![
            GridRow::new(1)
                .with_value("description", "Front-lit channel set")
                .editable("description"),
            GridRow::new(2)
                .with_value("description", "Halo-lit channel set")
                .editable("description"),
        ];
        let mut grid = order_grid(rows);

        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert_eq!(grid.expanded_field(), Some(&FieldId::new(1, "description")));
        type_text(&mut grid, "!");

        // Tab commits A, then B auto-opens; the commit must come first.
        let actions = press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert_eq!(
            actions.first(),
            Some(&GridAction::CommitField {
                row_index: 0,
                field: "description".to_string(),
                value: Value::from("Front-lit channel set!"),
            })
        );
        assert_eq!(grid.expanded_field(), Some(&FieldId::new(2, "description")));
    }

    #[test]
    fn scenario_manual_expand_type_then_tab_commits_and_moves() {
        let rows = vec![
            GridRow::new(1)
                .editable("description")
                .editable("qty")
                .with_value("qty", 1.0),
        ];
        let mut grid = order_grid(rows);

        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert!(grid.expanded_field().is_none()); // empty field, no auto-open

        press(&mut grid, KeyEvent::ctrl(KeyCode::Char('e')));
        assert!(grid.expanded_field().is_some());

        let text = "Custom laser-cut aluminum letters";
        type_text(&mut grid, text);

        let actions = press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert!(actions.contains(&GridAction::CommitField {
            row_index: 0,
            field: "description".to_string(),
            value: Value::from(text),
        }));
        assert!(grid.expanded_field().is_none());
        assert_eq!(grid.active_field(), Some(&FieldId::new(1, "qty")));
    }

    #[test]
    fn escape_in_overlay_reverts_to_saved_value() {
        let rows = vec![
            GridRow::new(1)
                .with_value("description", "Original long text here")
                .editable("description"),
        ];
        let mut grid = order_grid(rows);
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        type_text(&mut grid, " plus junk");

        let actions = press(&mut grid, KeyEvent::plain(KeyCode::Esc));
        assert!(grid.expanded_field().is_none());
        assert!(
            actions
                .iter()
                .all(|action| !matches!(action, GridAction::CommitField { .. }))
        );
        // Buffer restored, later blur commits nothing.
        let actions = press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert!(
            actions
                .iter()
                .all(|action| !matches!(action, GridAction::CommitField { .. }))
        );
    }

    #[test]
    fn outside_click_commits_and_closes_the_overlay() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        type_text(&mut grid, "!");
        assert!(grid.expanded_field().is_some());

        let actions = grid
            .on_mouse(MouseEvent {
                column: 0,
                row: 0,
                button: crate::terminal::MouseButton::Left,
            })
            .actions;
        assert!(grid.expanded_field().is_none());
        assert!(
            actions
                .iter()
                .any(|action| matches!(action, GridAction::CommitField { row_index: 0, .. }))
        );
    }

    #[test]
    fn set_rows_resyncs_unfocused_cells_only() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab)); // description row 1
        press(&mut grid, KeyEvent::plain(KeyCode::Tab)); // qty row 1
        type_text(&mut grid, "5");

        let mut rows = two_rows();
        rows[0].data.insert("qty".to_string(), Value::Number(9.0));
        rows[1]
            .data
            .insert("description".to_string(), Value::from("Rewritten elsewhere"));
        grid.set_rows(rows);

        // Focused qty cell keeps the in-progress buffer.
        let qty = grid.cell(&FieldId::new(1, "qty")).expect("qty cell");
        assert_eq!(qty.local(), "25");
        assert!(qty.is_dirty());

        // Unfocused cell resynced and clean.
        let other = grid
            .cell(&FieldId::new(2, "description"))
            .expect("description cell");
        assert_eq!(other.local(), "Rewritten elsewhere");
        assert!(!other.is_dirty());
    }

    #[test]
    fn enter_commits_single_line_cell_in_place() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        press(&mut grid, KeyEvent::plain(KeyCode::Tab)); // qty
        type_text(&mut grid, "7");

        let actions = press(&mut grid, KeyEvent::plain(KeyCode::Enter));
        assert_eq!(
            actions,
            vec![GridAction::CommitField {
                row_index: 0,
                field: "qty".to_string(),
                value: Value::Number(27.0),
            }]
        );
        // Focus did not move.
        assert_eq!(grid.active_field(), Some(&FieldId::new(1, "qty")));
    }

    #[test]
    fn navigation_clamps_without_wrapping() {
        let rows = vec![GridRow::new(1).with_value("qty", 1.0).editable("qty")];
        let mut grid = order_grid(rows);
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        let active = grid.active_field().cloned();

        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert_eq!(grid.active_field().cloned(), active);
        press(&mut grid, KeyEvent::plain(KeyCode::BackTab));
        assert_eq!(grid.active_field().cloned(), active);
    }

    #[test]
    fn category_cell_cycles_catalog_as_intent() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert_eq!(grid.active_field(), Some(&FieldId::new(1, "category")));

        let actions = press(&mut grid, KeyEvent::char(' '));
        assert_eq!(
            actions,
            vec![GridAction::SelectCategory {
                index: 0,
                category_id: "flat".to_string(),
            }]
        );
    }

    #[test]
    fn row_intents_respect_capability_flags() {
        let mut rows = two_rows();
        rows[1].can_delete = false;
        rows[1].can_duplicate = false;
        let mut grid = order_grid(rows);

        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        press(&mut grid, KeyEvent::plain(KeyCode::Esc)); // close the auto-opened overlay
        press(&mut grid, KeyEvent::plain(KeyCode::Down)); // row 2 description
        assert_eq!(grid.active_field(), Some(&FieldId::new(2, "description")));

        assert!(press(&mut grid, KeyEvent::ctrl(KeyCode::Char('x'))).is_empty());
        assert!(press(&mut grid, KeyEvent::ctrl(KeyCode::Char('d'))).is_empty());
        let actions = press(&mut grid, KeyEvent::ctrl(KeyCode::Char('n')));
        assert!(actions.contains(&GridAction::InsertRowAfter { index: 1 }));
    }

    #[test]
    fn chords_stay_grid_bindings_while_an_overlay_is_open() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab)); // description auto-opens
        assert!(grid.expanded_field().is_some());

        // Ctrl+E re-expands with the content selected, never types an `e`.
        let actions = press(&mut grid, KeyEvent::ctrl(KeyCode::Char('e')));
        assert!(
            !actions
                .iter()
                .any(|a| matches!(a, GridAction::ValueChanged { .. }))
        );
        assert!(grid.expanded_field().is_some());
        let buffer = grid
            .cells
            .get(&(1, "description".to_string()))
            .map(CellState::local);
        assert_eq!(buffer, Some("Front-lit channel set"));

        // Row intents fire through the open overlay instead of editing it.
        let actions = press(&mut grid, KeyEvent::ctrl(KeyCode::Char('x')));
        assert_eq!(actions, vec![GridAction::DeleteRow { index: 0 }]);
    }

    #[test]
    fn resize_flips_the_overlay_above_when_space_below_runs_out() {
        let mut rows: Vec<GridRow> = (1..=9)
            .map(|id| {
                GridRow::new(id)
                    .with_value("description", "Letter A")
                    .editable("description")
            })
            .collect();
        rows.push(
            GridRow::new(10)
                .with_value("description", "Front-lit channel set")
                .editable("description"),
        );
        let mut grid = order_grid(rows);
        grid.on_resize(Size {
            width: 80,
            height: 40,
        });

        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        for _ in 0..9 {
            press(&mut grid, KeyEvent::plain(KeyCode::Down));
        }
        assert_eq!(grid.expanded_field(), Some(&FieldId::new(10, "description")));
        // Anchor sits at document row 10 (header plus nine rows); with a
        // tall document the box opens below it.
        let rect = grid.overlay.as_ref().map(ExpandableOverlay::rect);
        assert_eq!(rect.map(|r| r.top), Some(12));

        // Box, gap, and helper no longer fit below the anchor: flip above.
        grid.on_resize(Size {
            width: 80,
            height: 14,
        });
        let rect = grid.overlay.as_ref().map(ExpandableOverlay::rect);
        assert_eq!(rect.map(|r| r.top), Some(4));
    }

    #[test]
    fn resize_with_a_vanished_anchor_closes_without_reverting() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        type_text(&mut grid, "!");
        assert!(grid.expanded_field().is_some());

        grid.rows.remove(0); // anchor row gone, edit buffer still live
        let result = grid.on_resize(Size {
            width: 80,
            height: 24,
        });
        assert!(grid.expanded_field().is_none());
        assert!(result.actions.is_empty());
        // Closed through the commit path: the edit is kept, not rolled back.
        let buffer = grid
            .cells
            .get(&(1, "description".to_string()))
            .map(CellState::local);
        assert_eq!(buffer, Some("Front-lit channel set!"));
    }

    #[test]
    fn empty_grid_offers_first_row_cta() {
        let mut grid = order_grid(Vec::new());
        let ctx = RenderContext::new(
            true,
            Size {
                width: 80,
                height: 24,
            },
        );
        let output = grid.draw(&ctx);
        let body: Vec<String> = output.lines.iter().map(|l| spans_text(l)).collect();
        assert!(body.iter().any(|line| line.contains("Add first row")));

        let actions = press(&mut grid, KeyEvent::ctrl(KeyCode::Char('n')));
        assert_eq!(actions, vec![GridAction::InsertRowAfter { index: 0 }]);
    }

    #[test]
    fn read_only_grid_renders_no_cta_and_focuses_nothing() {
        let mut grid = order_grid(Vec::new()).read_only(true);
        let ctx = RenderContext::new(
            true,
            Size {
                width: 80,
                height: 24,
            },
        );
        let output = grid.draw(&ctx);
        assert_eq!(output.lines.len(), 1); // header only

        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert!(grid.active_field().is_none());
    }

    #[test]
    fn dirty_cells_render_with_an_observable_style() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        press(&mut grid, KeyEvent::plain(KeyCode::Tab)); // qty, no overlay
        type_text(&mut grid, "3");

        let ctx = RenderContext::new(
            true,
            Size {
                width: 120,
                height: 40,
            },
        );
        let output = grid.draw(&ctx);
        let dirty_spans: Vec<&Span> = output
            .lines
            .iter()
            .flatten()
            .filter(|span| span.style.color == Some(Color::Yellow))
            .collect();
        assert!(!dirty_spans.is_empty());
        assert!(dirty_spans.iter().any(|span| span.text.contains("23")));
    }

    #[test]
    fn disabled_multiline_renders_nbsp_for_empty_lines() {
        let rows = vec![
            GridRow::new(1).with_value("notes", "first\n\nthird"), // not editable
        ];
        let grid = Grid::new("g")
            .with_column(ColumnSpec::new("notes", "Notes").with_kind(CellKind::Multiline))
            .with_rows(rows);

        let ctx = RenderContext::new(
            true,
            Size {
                width: 80,
                height: 24,
            },
        );
        let output = grid.draw(&ctx);
        // Header + three visual lines for one logical row.
        assert_eq!(output.lines.len(), 4);
        assert!(spans_text(&output.lines[2]).contains('\u{a0}'));
    }

    #[test]
    fn editable_multiline_height_caps_at_max() {
        let text = (0..12).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let rows = vec![GridRow::new(1).with_value("notes", text).editable("notes")];
        let grid = Grid::new("g")
            .with_column(ColumnSpec::new("notes", "Notes").with_kind(CellKind::Multiline))
            .with_rows(rows);

        let ctx = RenderContext::new(
            true,
            Size {
                width: 80,
                height: 40,
            },
        );
        let output = grid.draw(&ctx);
        // Header plus a row clamped to the metrics' max height.
        assert_eq!(output.lines.len(), 1 + 8);
    }

    #[test]
    fn deleting_the_anchor_row_drops_focus_and_overlay_silently() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        assert!(grid.expanded_field().is_some());

        let rows = vec![two_rows().remove(1)];
        grid.set_rows(rows);
        assert!(grid.expanded_field().is_none());
        assert!(grid.active_field().is_none());
    }

    #[test]
    fn alt_arrows_step_numeric_cells() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        press(&mut grid, KeyEvent::plain(KeyCode::Tab)); // qty = 2
        let actions = press(&mut grid, KeyEvent::alt(KeyCode::Up));
        assert_eq!(
            actions,
            vec![GridAction::ValueChanged {
                row_index: 0,
                field: "qty".to_string(),
                value: "3".to_string(),
            }]
        );
    }

    #[test]
    fn escape_reverts_dirty_cell_then_bubbles_when_clean() {
        let mut grid = order_grid(two_rows());
        press(&mut grid, KeyEvent::plain(KeyCode::Tab));
        press(&mut grid, KeyEvent::plain(KeyCode::Tab)); // qty
        type_text(&mut grid, "9");

        assert!(grid.on_key(KeyEvent::plain(KeyCode::Esc)).handled);
        // Focus was released and the buffer restored; a second Escape has
        // nothing to revert and bubbles to the host.
        assert!(!grid.on_key(KeyEvent::plain(KeyCode::Esc)).handled);
    }
}
