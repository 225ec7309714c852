use std::io;
use std::time::Duration;

use gridply::input_event::{CursorPos, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use gridply::terminal::Terminal;
use gridply::terminal_event::TerminalEvent;
use gridply::ui::span::{Span, SpanLine};
use gridply::ui::style::Style;
use gridply::widgets::traits::{Drawable, Interactive, RenderContext};
use gridply::{Category, GridAction, GridRow};
use gridply::widgets::grid::cell::CellKind;
use gridply::widgets::grid::{ColumnSpec, Grid};

/// Rows the title header occupies above the grid in the document.
const TITLE_ROWS: usize = 2;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
    }
}

fn run() -> io::Result<()> {
    let mut terminal = Terminal::new()?;
    terminal.enter()?;

    let result = event_loop(&mut terminal);

    terminal.exit()?;
    result
}

fn event_loop(terminal: &mut Terminal) -> io::Result<()> {
    let mut app = OrderApp::new();
    let mut render_requested = true;

    loop {
        if terminal.poll(Duration::from_millis(100))? {
            match terminal.read_event()? {
                TerminalEvent::Key(key) => {
                    if app.handle_key(key) {
                        render_requested = true;
                    }
                }
                TerminalEvent::Mouse(mouse) => {
                    if app.handle_mouse(mouse) {
                        render_requested = true;
                    }
                }
                TerminalEvent::Resize { width, height } => {
                    app.handle_resize(gridply::terminal::Size { width, height });
                    render_requested = true;
                }
            }
        }

        if render_requested {
            app.render(terminal)?;
            render_requested = false;
        }

        if app.should_exit() {
            break;
        }
    }

    Ok(())
}

/// One order line item. The application owns these; the grid only ever sees
/// snapshots and sends edit intents back.
#[derive(Debug, Clone)]
struct LineItem {
    id: u64,
    description: String,
    qty: f64,
    unit_price: f64,
    category: String,
}

impl LineItem {
    fn blank(id: u64) -> Self {
        Self {
            id,
            description: String::new(),
            qty: 1.0,
            unit_price: 0.0,
            category: "vinyl".to_string(),
        }
    }
}

struct OrderApp {
    items: Vec<LineItem>,
    next_id: u64,
    grid: Grid,
    /// Document row at the top of the viewport.
    scroll: usize,
    exit: bool,
}

impl OrderApp {
    fn new() -> Self {
        let items = vec![
            LineItem {
                id: 1,
                description: "Front-lit channel letter set, 18in".to_string(),
                qty: 1.0,
                unit_price: 1450.0,
                category: "channel".to_string(),
            },
            LineItem {
                id: 2,
                description: "Flat cut acrylic logo".to_string(),
                qty: 2.0,
                unit_price: 210.0,
                category: "flat".to_string(),
            },
            LineItem {
                id: 3,
                description: "Window vinyl, per panel".to_string(),
                qty: 6.0,
                unit_price: 45.0,
                category: "vinyl".to_string(),
            },
        ];

        let grid = Grid::new("order-lines")
            .with_column(
                ColumnSpec::new("description", "Description")
                    .expandable()
                    .with_min_width(28)
                    .with_placeholder("Item description"),
            )
            .with_column(
                ColumnSpec::new("qty", "Qty")
                    .with_kind(CellKind::Number)
                    .with_min_width(5),
            )
            .with_column(
                ColumnSpec::new("unit_price", "Unit price")
                    .with_kind(CellKind::Currency)
                    .with_min_width(10),
            )
            .with_column(ColumnSpec::new("category", "Category").category())
            .with_categories(vec![
                Category::new("channel", "Channel letters"),
                Category::new("flat", "Flat cut"),
                Category::new("vinyl", "Vinyl"),
            ]);

        let mut app = Self {
            items,
            next_id: 4,
            grid,
            scroll: 0,
            exit: false,
        };
        app.refresh_grid();
        app
    }

    fn should_exit(&self) -> bool {
        self.exit
    }

    fn snapshot(&self) -> Vec<GridRow> {
        self.items
            .iter()
            .map(|item| {
                GridRow::new(item.id)
                    .with_value("description", item.description.clone())
                    .with_value("qty", item.qty)
                    .with_value("unit_price", item.unit_price)
                    .with_value("category", item.category.clone())
                    .editable("description")
                    .editable("qty")
                    .editable("unit_price")
                    .editable("category")
            })
            .collect()
    }

    fn refresh_grid(&mut self) {
        self.grid.set_rows(self.snapshot());
    }

    fn subtotal(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.qty * item.unit_price)
            .sum()
    }

    fn apply(&mut self, actions: Vec<GridAction>) {
        let mut changed = false;
        for action in actions {
            match action {
                // Live keystroke sync; the grid owns the buffer until commit.
                GridAction::ValueChanged { .. } => {}
                GridAction::CommitField {
                    row_index,
                    field,
                    value,
                } => {
                    if let Some(item) = self.items.get_mut(row_index) {
                        match field.as_str() {
                            "description" => item.description = value.to_edit_text(),
                            "qty" => item.qty = value.as_number().unwrap_or(0.0),
                            "unit_price" => item.unit_price = value.as_number().unwrap_or(0.0),
                            _ => {}
                        }
                        changed = true;
                    }
                }
                GridAction::InsertRowAfter { index } => {
                    let item = LineItem::blank(self.next_id);
                    self.next_id += 1;
                    let at = if self.items.is_empty() {
                        0
                    } else {
                        (index + 1).min(self.items.len())
                    };
                    self.items.insert(at, item);
                    changed = true;
                }
                GridAction::DuplicateRow { index } => {
                    if let Some(source) = self.items.get(index).cloned() {
                        let mut copy = source;
                        copy.id = self.next_id;
                        self.next_id += 1;
                        self.items.insert(index + 1, copy);
                        changed = true;
                    }
                }
                GridAction::DeleteRow { index } => {
                    if index < self.items.len() {
                        self.items.remove(index);
                        changed = true;
                    }
                }
                GridAction::SelectCategory { index, category_id } => {
                    if let Some(item) = self.items.get_mut(index) {
                        item.category = category_id;
                        changed = true;
                    }
                }
            }
        }
        if changed {
            self.refresh_grid();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.exit = true;
            return true;
        }
        match key.code {
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(5);
                return true;
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(5);
                return true;
            }
            _ => {}
        }

        let result = self.grid.on_key(key);
        let handled = result.handled;
        let render = result.request_render;
        self.apply(result.actions);

        // Unclaimed arrows scroll the page.
        if !handled {
            match key.code {
                KeyCode::Down => {
                    self.scroll = self.scroll.saturating_add(1);
                    return true;
                }
                KeyCode::Up => {
                    self.scroll = self.scroll.saturating_sub(1);
                    return true;
                }
                _ => {}
            }
        }
        handled && render
    }

    /// Translate a viewport click into grid document coordinates.
    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let doc_row = mouse.row as usize + self.scroll;
        if doc_row < TITLE_ROWS {
            return false;
        }
        let result = self.grid.on_mouse(MouseEvent {
            column: mouse.column,
            row: (doc_row - TITLE_ROWS) as u16,
            button: mouse.button,
        });
        let render = result.request_render;
        self.apply(result.actions);
        render
    }

    fn handle_resize(&mut self, size: gridply::terminal::Size) {
        let result = self.grid.on_resize(size);
        self.apply(result.actions);
    }

    fn render(&mut self, terminal: &mut Terminal) -> io::Result<()> {
        let viewport = terminal.size();
        let ctx = RenderContext::new(true, viewport);

        let mut lines: Vec<SpanLine> = Vec::new();
        lines.push(vec![Span::styled(
            "Sign shop order #1042".to_string(),
            Style::new().bold(),
        )]);
        lines.push(Vec::new());
        lines.extend(self.grid.draw(&ctx).lines);
        lines.push(Vec::new());
        lines.push(vec![Span::new(format!("Subtotal: ${:.2}", self.subtotal()))]);
        lines.push(vec![Span::styled(
            "Tab next · Ctrl+E expand · Ctrl+N insert · Ctrl+D duplicate · Ctrl+X delete · Ctrl+C quit"
                .to_string(),
            Style::new().color(gridply::ui::style::Color::DarkGrey),
        )]);

        let max_scroll = lines.len().saturating_sub(viewport.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        let cursor = self.grid.cursor_pos().and_then(|pos| {
            let doc_row = pos.row as usize + TITLE_ROWS;
            let viewport_row = doc_row.checked_sub(self.scroll)?;
            if viewport_row >= viewport.height as usize {
                return None;
            }
            Some(CursorPos {
                col: pos.col,
                row: viewport_row as u16,
            })
        });

        terminal.draw(&lines, self.scroll, cursor)
    }
}
