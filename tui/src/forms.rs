//! Form primitives: editable text fields and focus cycling.

use unicode_width::UnicodeWidthStr;

/// A single-line editable text field with a char-indexed cursor.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    value: String,
    /// Cursor position in chars, 0..=len.
    cursor: usize,
    /// Render as bullets (passwords).
    pub masked: bool,
}

impl TextField {
    #[must_use]
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index();
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.value.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    /// Text to render, with a trailing window so the cursor stays visible
    /// in a field `width` columns wide.
    #[must_use]
    pub fn display(&self, width: usize) -> String {
        let shown: String = if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        };
        if shown.width() <= width {
            return shown;
        }
        // Keep the tail; editing happens at the end in practice.
        let mut out = String::new();
        for c in shown.chars().rev() {
            if out.width() + c.to_string().width() > width.saturating_sub(1) {
                break;
            }
            out.insert(0, c);
        }
        format!("…{out}")
    }
}

/// Cyclic focus over `count` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Focus {
    pub index: usize,
    pub count: usize,
}

impl Focus {
    #[must_use]
    pub const fn new(count: usize) -> Self {
        Self { index: 0, count }
    }

    pub fn next(&mut self) {
        if self.count > 0 {
            self.index = (self.index + 1) % self.count;
        }
    }

    pub fn previous(&mut self) {
        if self.count > 0 {
            self.index = (self.index + self.count - 1) % self.count;
        }
    }

    #[must_use]
    pub const fn is(&self, index: usize) -> bool {
        self.index == index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_respects_char_boundaries() {
        let mut field = TextField::default();
        for c in "naïve".chars() {
            field.insert(c);
        }
        field.left();
        field.backspace(); // removes 'v'
        assert_eq!(field.value(), "naïe");

        field.end();
        field.backspace();
        field.backspace();
        assert_eq!(field.value(), "na");
    }

    #[test]
    fn masked_display_hides_content() {
        let mut field = TextField::masked();
        field.set("secret");
        assert_eq!(field.display(20), "••••••");
    }

    #[test]
    fn long_values_window_to_the_tail() {
        let mut field = TextField::default();
        field.set("0123456789abcdef");
        let shown = field.display(8);
        assert!(shown.starts_with('…'));
        assert!(shown.ends_with("def"));
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut focus = Focus::new(3);
        focus.previous();
        assert_eq!(focus.index, 2);
        focus.next();
        assert_eq!(focus.index, 0);
    }
}
