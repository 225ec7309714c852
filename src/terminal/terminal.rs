use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind, poll, read,
};
use crossterm::style::{
    Attribute, Color as CtColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
    SetForegroundColor,
};
use crossterm::{cursor, execute, queue, terminal};
use std::io::{self, Stdout, Write};
use std::time::Duration;

use crate::terminal::input_event::{CursorPos, KeyEvent, MouseButton, MouseEvent};
use crate::terminal::terminal_event::TerminalEvent;
use crate::ui::span::SpanLine;
use crate::ui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

pub struct Terminal {
    stdout: Stdout,
    size: Size,
}

impl Terminal {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self {
            stdout: io::stdout(),
            size: Size { width, height },
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn enter(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.stdout,
            terminal::DisableLineWrap,
            cursor::Hide,
            EnableMouseCapture,
            terminal::Clear(terminal::ClearType::All),
        )
    }

    pub fn exit(&mut self) -> io::Result<()> {
        let restore = execute!(
            self.stdout,
            DisableMouseCapture,
            cursor::Show,
            terminal::EnableLineWrap,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0),
        );
        let raw = terminal::disable_raw_mode();
        restore.and(raw)
    }

    pub fn poll(&self, timeout: Duration) -> io::Result<bool> {
        poll(timeout)
    }

    /// Block until the next event this engine cares about: key presses,
    /// pointer presses, and resizes. Key releases and pointer drags are
    /// skipped.
    pub fn read_event(&mut self) -> io::Result<TerminalEvent> {
        loop {
            match read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    return Ok(TerminalEvent::Key(KeyEvent {
                        code: key.code,
                        modifiers: key.modifiers,
                    }));
                }
                Event::Mouse(mouse) => {
                    if let MouseEventKind::Down(button) = mouse.kind {
                        let button = match button {
                            crossterm::event::MouseButton::Left => MouseButton::Left,
                            crossterm::event::MouseButton::Right => MouseButton::Right,
                            crossterm::event::MouseButton::Middle => MouseButton::Middle,
                        };
                        return Ok(TerminalEvent::Mouse(MouseEvent {
                            column: mouse.column,
                            row: mouse.row,
                            button,
                        }));
                    }
                }
                Event::Resize(width, height) => {
                    self.size = Size { width, height };
                    return Ok(TerminalEvent::Resize { width, height });
                }
                _ => {}
            }
        }
    }

    /// Paint the visible slice of `lines` starting at document row `scroll`,
    /// then park the hardware cursor at `cursor_pos` (viewport coordinates)
    /// if the focused widget wants one.
    pub fn draw(
        &mut self,
        lines: &[SpanLine],
        scroll: usize,
        cursor_pos: Option<CursorPos>,
    ) -> io::Result<()> {
        for viewport_row in 0..self.size.height {
            queue!(
                self.stdout,
                cursor::MoveTo(0, viewport_row),
                terminal::Clear(terminal::ClearType::CurrentLine),
            )?;
            let Some(line) = lines.get(scroll + viewport_row as usize) else {
                continue;
            };
            for span in line {
                if let Some(color) = span.style.color {
                    queue!(self.stdout, SetForegroundColor(to_ct_color(color)))?;
                }
                if let Some(background) = span.style.background {
                    queue!(self.stdout, SetBackgroundColor(to_ct_color(background)))?;
                }
                if span.style.bold {
                    queue!(self.stdout, SetAttribute(Attribute::Bold))?;
                }
                queue!(self.stdout, Print(span.text.as_str()))?;
                queue!(self.stdout, SetAttribute(Attribute::Reset), ResetColor)?;
            }
        }

        match cursor_pos {
            Some(pos) if pos.row < self.size.height => {
                queue!(self.stdout, cursor::MoveTo(pos.col, pos.row), cursor::Show)?;
            }
            _ => queue!(self.stdout, cursor::Hide)?,
        }
        self.stdout.flush()
    }
}

fn to_ct_color(color: Color) -> CtColor {
    match color {
        Color::Black => CtColor::Black,
        Color::DarkGrey => CtColor::DarkGrey,
        Color::Red => CtColor::Red,
        Color::Green => CtColor::Green,
        Color::Yellow => CtColor::Yellow,
        Color::Blue => CtColor::Blue,
        Color::Magenta => CtColor::Magenta,
        Color::Cyan => CtColor::Cyan,
        Color::White => CtColor::White,
    }
}
