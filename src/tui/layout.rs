use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// 标准三段式布局：Header(3) + Content(弹性) + Footer(3)
pub fn main_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

/// 仪表盘各面板的区域；控制器和渲染共用，保证可见行数一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLayout {
    pub header: Rect,
    pub installed: Rect,
    pub search: Rect,
    pub dependencies: Rect,
    pub logs: Rect,
    pub status: Rect,
}

impl DashboardLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = main_layout(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(35),
                Constraint::Percentage(30),
            ])
            .split(columns[1]);

        Self {
            header: chunks[0],
            installed: columns[0],
            search: right[0],
            dependencies: right[1],
            logs: right[2],
            status: chunks[2],
        }
    }

    /// 已安装表格：去掉边框和表头
    pub fn installed_rows(&self) -> usize {
        (self.installed.height.saturating_sub(3) as usize).max(1)
    }

    /// 搜索结果：去掉边框和输入行
    pub fn search_rows(&self) -> usize {
        (self.search.height.saturating_sub(3) as usize).max(1)
    }

    pub fn dependency_rows(&self) -> usize {
        (self.dependencies.height.saturating_sub(2) as usize).max(1)
    }

    pub fn log_rows(&self) -> usize {
        (self.logs.height.saturating_sub(2) as usize).max(1)
    }
}

/// 居中的弹出区域，尺寸不超过 area
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// 带边框的面板，焦点决定边框颜色
pub fn panel_block(title: String, focused: bool) -> Block<'static> {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
}

/// 渲染通用 header
pub fn render_header(f: &mut Frame, line: Line, area: Rect) {
    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

/// 渲染通用 footer
pub fn render_footer(f: &mut Frame, line: Line, area: Rect) {
    let footer = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(footer, area);
}

/// 内容超出时在面板右侧画滚动条
pub fn render_scrollbar(f: &mut Frame, area: Rect, total: usize, visible: usize, position: usize) {
    if total <= visible {
        return;
    }
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));

    let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(visible)).position(position);

    f.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            horizontal: 0,
            vertical: 1,
        }),
        &mut scrollbar_state,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_rows_default_terminal() {
        let layout = DashboardLayout::new(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.header.height, 3);
        assert_eq!(layout.status.height, 3);
        assert_eq!(layout.installed.height, 18);
        assert_eq!(layout.installed_rows(), 15);
        assert_eq!(layout.installed.width + layout.search.width, 80);
        assert!(layout.log_rows() >= 1);
    }

    #[test]
    fn test_rows_never_zero() {
        let layout = DashboardLayout::new(Rect::new(0, 0, 10, 4));
        assert_eq!(layout.installed_rows(), 1);
        assert_eq!(layout.search_rows(), 1);
        assert_eq!(layout.dependency_rows(), 1);
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered_rect(40, 7, area), Rect::new(20, 8, 40, 7));
        assert_eq!(centered_rect(200, 50, area), area);
    }
}
