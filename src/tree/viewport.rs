//! Windowed viewport over the flat sequence.
//!
//! Every calculation here is O(1) in the sequence length: the renderer only
//! touches the rows inside [`Viewport::visible_range`].

/// Rows assumed when no usable height has been set (20 minus the header).
pub const FALLBACK_VISIBLE_ROWS: usize = 19;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Total rows available, header included. Zero or negative means unknown.
    pub height: i32,
    /// Index of the selected row.
    pub cursor: usize,
    /// Index of the first visible row.
    pub offset: usize,
}

impl Viewport {
    /// Content rows before the position indicator is reserved.
    fn base_count(&self) -> usize {
        match usize::try_from(self.height.saturating_sub(1)) {
            Ok(n) if n > 0 => n,
            _ => FALLBACK_VISIBLE_ROWS,
        }
    }

    /// Whether `len` rows overflow the viewport and need a position indicator.
    pub fn needs_indicator(&self, len: usize) -> bool {
        len > self.base_count()
    }

    /// Number of content rows that fit: height minus the header, minus one
    /// more for the position indicator when the rows overflow. Never below 1.
    pub fn effective_visible_count(&self, len: usize) -> usize {
        let mut count = self.base_count();
        if len > count {
            count -= 1;
        }
        count.max(1)
    }

    fn max_offset(&self, len: usize) -> usize {
        len.saturating_sub(self.effective_visible_count(len))
    }

    /// Half-open `[start, end)` range of rows to render.
    pub fn visible_range(&self, len: usize) -> (usize, usize) {
        if len == 0 {
            return (0, 0);
        }
        let count = self.effective_visible_count(len);
        let start = self.offset.min(self.max_offset(len));
        (start, (start + count).min(len))
    }

    /// Scroll the minimum amount that brings the cursor back into view.
    pub fn ensure_cursor_visible(&mut self, len: usize) {
        if len == 0 {
            self.offset = 0;
            return;
        }
        let count = self.effective_visible_count(len);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        }
        if self.cursor >= self.offset + count {
            self.offset = self.cursor + 1 - count;
        }
        self.offset = self.offset.min(self.max_offset(len));
    }

    /// Clamp the cursor into `[0, len)`, or 0 for an empty sequence.
    pub fn clamp_cursor(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Move the cursor by `delta` rows, stopping at either end.
    pub fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor.saturating_add_signed(delta);
        self.cursor = target.min(len - 1);
        self.ensure_cursor_visible(len);
    }

    /// `(current_page, total_pages)`, both 1-based.
    pub fn page_info(&self, len: usize) -> (usize, usize) {
        let page_size = self.effective_visible_count(len);
        let total = len.div_ceil(page_size).max(1);
        let current = (self.offset / page_size + 1).min(total);
        (current, total)
    }

    /// ` Page X/Y (a-b of n)` for the current window.
    pub fn position_indicator(&self, len: usize) -> String {
        let (start, end) = self.visible_range(len);
        let (page, pages) = self.page_info(len);
        format!(" Page {}/{} ({}-{} of {})", page, pages, start + 1, end, len)
    }
}
