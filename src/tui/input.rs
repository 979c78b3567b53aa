use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// 单行文本输入，支持 UTF-8，光标按字符计数
#[derive(Debug, Clone, Default)]
pub struct InputBox {
    content: String,
    cursor: usize,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在光标处插入字符
    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte(&self.content, self.cursor);
        self.content.insert(byte_pos, c);
        self.cursor += 1;
    }

    /// Backspace: 删除光标前的字符
    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.remove_at_cursor();
        }
    }

    /// Delete: 删除光标后的字符
    pub fn delete_forward(&mut self) {
        if self.cursor < self.char_count() {
            self.remove_at_cursor();
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn remove_at_cursor(&mut self) {
        let start = char_to_byte(&self.content, self.cursor);
        let end = char_to_byte(&self.content, self.cursor + 1);
        self.content.drain(start..end);
    }
}

/// UTF-8 安全的字符位置转字节位置
fn char_to_byte(s: &str, char_pos: usize) -> usize {
    s.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// 输入行：label + 文本 + 光标（仅在编辑时高亮）
pub fn input_line(input: &InputBox, label: &str, editing: bool) -> Line<'static> {
    let chars: Vec<char> = input.content().chars().collect();
    let cursor_pos = input.cursor_pos().min(chars.len());
    let before: String = chars[..cursor_pos].iter().collect();
    let cursor_char = chars
        .get(cursor_pos)
        .map(|c| c.to_string())
        .unwrap_or_else(|| " ".to_string());
    let after: String = chars.iter().skip(cursor_pos + 1).collect();

    let mut spans = vec![
        Span::styled(
            format!("{label} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(before, Style::default().fg(Color::White)),
    ];

    if editing {
        spans.push(Span::styled(
            cursor_char,
            Style::default().fg(Color::Black).bg(Color::White),
        ));
        spans.push(Span::styled(after, Style::default().fg(Color::White)));
    } else if input.content().is_empty() {
        spans.push(Span::styled(
            "press / to search".to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(cursor_char, Style::default().fg(Color::White)));
        spans.push(Span::styled(after, Style::default().fg(Color::White)));
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in s.chars() {
            input.insert(c);
        }
        input
    }

    #[test]
    fn test_edit_in_middle() {
        let mut input = typed("gt");
        input.move_left();
        input.insert('i');
        assert_eq!(input.content(), "git");
        assert_eq!(input.cursor_pos(), 2);
        input.move_end();
        input.delete_back();
        assert_eq!(input.content(), "gi");
        input.move_home();
        input.delete_forward();
        assert_eq!(input.content(), "i");
        input.move_left();
        input.delete_back();
        assert_eq!(input.content(), "i");
    }

    #[test]
    fn test_multibyte_chars() {
        let mut input = typed("包管理");
        input.move_left();
        input.delete_back();
        assert_eq!(input.content(), "包理");
        input.move_right();
        input.move_right();
        assert_eq!(input.cursor_pos(), 2);
        input.delete_forward();
        assert_eq!(input.content(), "包理");
    }

    #[test]
    fn test_input_line_placeholder() {
        let line = input_line(&InputBox::new(), "/", false);
        assert!(line.spans.iter().any(|s| s.content.contains("press / to search")));
        let line = input_line(&typed("wget"), "/", true);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "/ wget ");
    }
}
