use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ui::span::{Span, SpanLine};

/// One rendered document: a stack of span lines, possibly taller than the
/// viewport. Overlays are composited here, in document coordinates, so they
/// scroll with the content they are anchored to.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub lines: Vec<SpanLine>,
}

impl Frame {
    pub fn new(lines: Vec<SpanLine>) -> Self {
        Self { lines }
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn push(&mut self, line: SpanLine) {
        self.lines.push(line);
    }

    /// Composite `patch` on top of the frame with its top-left corner at
    /// document position (`top`, `left`). Rows above the document are
    /// clipped; rows below it extend the frame.
    pub fn overlay(&mut self, top: i32, left: i32, patch: &[SpanLine]) {
        let left = left.max(0) as usize;
        for (idx, patch_line) in patch.iter().enumerate() {
            let doc_row = top + idx as i32;
            if doc_row < 0 {
                continue;
            }
            let doc_row = doc_row as usize;
            while self.lines.len() <= doc_row {
                self.lines.push(Vec::new());
            }

            let base = std::mem::take(&mut self.lines[doc_row]);
            let patch_width = spans_width(patch_line);
            let mut line = fit_spans_to_width(clip_spans(&base, left), left);
            line.extend(patch_line.iter().cloned());
            line.extend(skip_spans(&base, left + patch_width));
            self.lines[doc_row] = line;
        }
    }
}

pub fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(Span::width).sum()
}

pub fn clip_text_to_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let mut used = 0usize;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used.saturating_add(ch_width) > max_width {
            break;
        }
        out.push(ch);
        used = used.saturating_add(ch_width);
    }
    out
}

/// Keep the leading `width` display columns of `spans`.
pub fn clip_spans(spans: &[Span], width: usize) -> SpanLine {
    let mut out = Vec::<Span>::new();
    let mut used = 0usize;
    for span in spans {
        if used >= width {
            break;
        }
        let clipped = clip_text_to_width(span.text.as_str(), width - used);
        if clipped.is_empty() {
            continue;
        }
        used += UnicodeWidthStr::width(clipped.as_str());
        out.push(Span::styled(clipped, span.style));
    }
    out
}

/// Drop the leading `cols` display columns of `spans`. A wide character
/// straddling the cut is replaced by a single space.
pub fn skip_spans(spans: &[Span], cols: usize) -> SpanLine {
    let mut out = Vec::<Span>::new();
    let mut remaining = cols;
    for span in spans {
        let span_width = span.width();
        if remaining >= span_width {
            remaining -= span_width;
            continue;
        }
        if remaining == 0 {
            out.push(span.clone());
            continue;
        }

        let mut kept = String::new();
        let mut skipped = 0usize;
        for ch in span.text.chars() {
            if skipped < remaining {
                skipped += UnicodeWidthChar::width(ch).unwrap_or(0);
                if skipped > remaining {
                    // Wide char straddles the cut.
                    kept.push(' ');
                }
                continue;
            }
            kept.push(ch);
        }
        remaining = 0;
        if !kept.is_empty() {
            out.push(Span::styled(kept, span.style));
        }
    }
    out
}

/// Clip to `width` columns and pad the remainder with spaces.
pub fn fit_spans_to_width(spans: SpanLine, width: usize) -> SpanLine {
    let mut out = clip_spans(&spans, width);
    let used = spans_width(&out);
    if used < width {
        out.push(Span::new(" ".repeat(width - used)));
    }
    out
}

/// Flatten a line to plain text; layout assertions in tests read this.
pub fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}
