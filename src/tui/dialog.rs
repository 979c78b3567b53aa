use super::layout::centered_rect;
use super::theme::{AMBER, BRIGHT_WHITE, SEL_BG};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOption {
    Confirm,
    Cancel,
}

impl DialogOption {
    pub const ALL: [DialogOption; 2] = [DialogOption::Confirm, DialogOption::Cancel];

    fn label(self) -> &'static str {
        match self {
            DialogOption::Confirm => "Confirm",
            DialogOption::Cancel => "Cancel",
        }
    }

    fn toggled(self) -> Self {
        match self {
            DialogOption::Confirm => DialogOption::Cancel,
            DialogOption::Cancel => DialogOption::Confirm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Hidden,
    Visible {
        title: String,
        message: String,
        selected: DialogOption,
    },
}

/// 确认对话框：可见时吞掉所有输入，直到确认或取消
#[derive(Debug, Default)]
pub struct ConfirmDialog {
    state: DialogState,
}

impl ConfirmDialog {
    pub fn show(&mut self, title: &str, message: String, default_confirm: bool) {
        self.state = DialogState::Visible {
            title: title.to_string(),
            message,
            selected: if default_confirm {
                DialogOption::Confirm
            } else {
                DialogOption::Cancel
            },
        };
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.state, DialogState::Hidden)
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    /// 处理按键；结束时隐藏自身并返回 `Some(是否确认)`
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<bool> {
        let DialogState::Visible { selected, .. } = &mut self.state else {
            return None;
        };
        let confirmed = match key.code {
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Char('h')
            | KeyCode::Char('l') => {
                *selected = selected.toggled();
                return None;
            }
            KeyCode::Enter => *selected == DialogOption::Confirm,
            KeyCode::Char('y') | KeyCode::Char('Y') => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return None,
        };
        self.state = DialogState::Hidden;
        Some(confirmed)
    }
}

pub fn render_dialog(f: &mut Frame, dialog: &ConfirmDialog, area: Rect) {
    let DialogState::Visible {
        title,
        message,
        selected,
    } = dialog.state()
    else {
        return;
    };

    let width = (message.chars().count() as u16 + 8).max(36).min(area.width);
    let rect = centered_rect(width, 7, area);
    f.render_widget(Clear, rect);

    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(AMBER));

    let mut buttons: Vec<Span> = Vec::new();
    for option in DialogOption::ALL {
        let style = if option == *selected {
            Style::default()
                .bg(SEL_BG)
                .fg(BRIGHT_WHITE)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        buttons.push(Span::styled(format!("  {}  ", option.label()), style));
        buttons.push(Span::raw("   "));
    }
    buttons.pop();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(buttons),
    ];
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_resolves_highlighted_option() {
        let mut dialog = ConfirmDialog::default();
        dialog.show("Upgrade Package", "Upgrade wget?".into(), true);
        assert_eq!(dialog.handle_key(key(KeyCode::Right)), None);
        assert!(dialog.is_visible());
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), Some(false));
        assert!(!dialog.is_visible());
    }

    #[test]
    fn test_destructive_default_is_cancel() {
        let mut dialog = ConfirmDialog::default();
        dialog.show("Brew Cleanup", "Run brew cleanup?".into(), false);
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), Some(false));

        dialog.show("Brew Cleanup", "Run brew cleanup?".into(), false);
        assert_eq!(dialog.handle_key(key(KeyCode::Char('h'))), None);
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), Some(true));
    }

    #[test]
    fn test_explicit_keys_and_swallow() {
        let mut dialog = ConfirmDialog::default();
        dialog.show("Install Package", "Install git?".into(), false);
        assert_eq!(dialog.handle_key(key(KeyCode::Char('q'))), None);
        assert_eq!(dialog.handle_key(key(KeyCode::Char('y'))), Some(true));

        dialog.show("Install Package", "Install git?".into(), true);
        assert_eq!(dialog.handle_key(key(KeyCode::Esc)), Some(false));
        assert_eq!(dialog.handle_key(key(KeyCode::Char('y'))), None);
    }
}
