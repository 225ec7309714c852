use crate::runtime::event::GridAction;
use crate::terminal::{CursorPos, KeyEvent, MouseEvent, Size};
use crate::ui::span::SpanLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Node does not participate in focus cycling.
    None,
    /// A single focusable leaf.
    Leaf,
    /// A component that manages focus internally among its children.
    Group,
}

#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Whether the host currently routes input to this widget.
    pub focused: bool,
    pub viewport: Size,
}

impl RenderContext {
    pub fn new(focused: bool, viewport: Size) -> Self {
        Self { focused, viewport }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DrawOutput {
    pub lines: Vec<SpanLine>,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionResult {
    pub handled: bool,
    pub request_render: bool,
    pub actions: Vec<GridAction>,
}

impl InteractionResult {
    pub fn ignored() -> Self {
        Self::default()
    }

    /// Consumed the event but nothing on screen changed.
    pub fn consumed() -> Self {
        Self {
            handled: true,
            request_render: false,
            actions: Vec::new(),
        }
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            request_render: true,
            actions: Vec::new(),
        }
    }

    pub fn with_action(action: GridAction) -> Self {
        Self::with_actions(vec![action])
    }

    pub fn with_actions(actions: Vec<GridAction>) -> Self {
        Self {
            handled: true,
            request_render: true,
            actions,
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.handled |= other.handled;
        self.request_render |= other.request_render;
        self.actions.extend(other.actions);
    }
}

pub trait Drawable {
    fn id(&self) -> &str;
    fn label(&self) -> &str {
        ""
    }
    fn draw(&self, ctx: &RenderContext) -> DrawOutput;
}

pub trait Interactive {
    fn focus_mode(&self) -> FocusMode;

    fn on_key(&mut self, key: KeyEvent) -> InteractionResult;

    /// Pointer press in document coordinates (the host translates viewport
    /// clicks through its own scroll offset before calling this).
    fn on_mouse(&mut self, _event: MouseEvent) -> InteractionResult {
        InteractionResult::ignored()
    }

    fn on_resize(&mut self, _viewport: Size) -> InteractionResult {
        InteractionResult::ignored()
    }

    /// Hardware cursor position relative to the widget's first line, when
    /// the widget wants a visible caret.
    fn cursor_pos(&self) -> Option<CursorPos> {
        None
    }
}
