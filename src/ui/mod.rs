pub mod frame;
pub mod span;
pub mod style;

pub use frame::Frame;
pub use span::{Span, SpanLine};
pub use style::{Color, Style};
