//! 仪表盘渲染：只读控制器状态，不做任何修改

use super::controller::Controller;
use super::dialog::render_dialog;
use super::input::input_line;
use super::layout::{self, panel_block, DashboardLayout};
use super::oplog::LogLevel;
use super::state::{OperationStatus, PanelFocus};
use super::theme::{log_color, AMBER, BLUE, BRIGHT_WHITE, DESC_DIM, DIM, ERR, OK, SEL_BG, WARN};
use crate::package_manager::{Package, PackageDetail, Tap};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render_dashboard(f: &mut Frame, c: &Controller, spinner_frame: usize) {
    let area = f.area();
    let layout = DashboardLayout::new(area);

    render_header(f, c, layout.header);
    render_installed(f, c, &layout);
    render_search(f, c, &layout);
    render_dependencies(f, c, &layout);
    render_logs(f, c, &layout);
    render_status(f, c, spinner_frame, layout.status);
    render_dialog(f, &c.dialog, area);
}

/// 依赖面板的文本行；控制器用它计算滚动范围
pub fn detail_lines(detail: &PackageDetail) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(match &detail.version {
        Some(version) => format!("{} {}", detail.name, version),
        None => detail.name.clone(),
    });
    lines.extend(detail.description.iter().cloned());
    lines.extend(detail.homepage.iter().cloned());
    lines.push(String::new());

    if detail.dependencies.is_empty() {
        lines.push("No dependencies".to_string());
    } else {
        lines.push(format!("Dependencies ({})", detail.dependencies.len()));
        push_tree(&mut lines, &detail.dependencies);
    }
    if !detail.build_dependencies.is_empty() {
        lines.push(String::new());
        lines.push(format!("Build dependencies ({})", detail.build_dependencies.len()));
        push_tree(&mut lines, &detail.build_dependencies);
    }
    if let Some(caveats) = &detail.caveats {
        lines.push(String::new());
        lines.push("Caveats".to_string());
        lines.extend(caveats.lines().map(|l| format!("  {l}")));
    }
    lines
}

/// tap 面板的文本行，官方 tap 带标记
pub fn tap_lines(taps: &[Tap]) -> Vec<String> {
    if taps.is_empty() {
        return vec!["No taps found".to_string()];
    }
    taps.iter()
        .map(|tap| {
            if tap.official {
                format!("{} ✓ official", tap.name)
            } else {
                tap.name.clone()
            }
        })
        .collect()
}

fn push_tree(lines: &mut Vec<String>, items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        let branch = if i + 1 == items.len() { "└──" } else { "├──" };
        lines.push(format!("{branch} {item}"));
    }
}

/// 按字符截断，超出时以省略号结尾
fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        format!("{s:<width$}")
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn padded(area: Rect) -> Rect {
    area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    })
}

fn dim_line(text: String) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(DIM)))
}

// ===== Header =====

fn render_header(f: &mut Frame, c: &Controller, area: Rect) {
    let mut spans = vec![
        Span::styled(
            "🍺 brewdash",
            Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   {} installed", c.store.installed_count()),
            Style::default().fg(BRIGHT_WHITE),
        ),
        Span::styled(
            format!("   {} outdated", c.store.outdated_count()),
            Style::default().fg(WARN),
        ),
        Span::styled(
            format!("   {} taps", c.store.tap_count()),
            Style::default().fg(BLUE),
        ),
    ];
    if let Some(filter) = c.store.filters().describe() {
        spans.push(Span::styled(
            format!("   filter: {filter}"),
            Style::default().fg(DIM),
        ));
    }
    layout::render_header(f, Line::from(spans), area);
}

// ===== 已安装 =====

fn render_installed(f: &mut Frame, c: &Controller, layout: &DashboardLayout) {
    let area = layout.installed;
    let focused = c.focus == PanelFocus::Installed;
    let block = panel_block(
        format!(" 📦 Installed ({}) ", c.store.installed_count()),
        focused,
    );
    f.render_widget(block, area);
    let inner = padded(area);

    let name_w = ((inner.width as usize) * 45 / 100).max(10);
    let ver_w = 18;
    let mut lines = vec![Line::from(Span::styled(
        format!("  {} {} {:<7}", fit("NAME", name_w), fit("VERSION", ver_w), "TYPE"),
        Style::default().fg(DIM).add_modifier(Modifier::BOLD),
    ))];

    if c.installed.is_empty() {
        let text = if matches!(c.status(), OperationStatus::InProgress(_)) {
            "Loading..."
        } else {
            "No packages"
        };
        lines.push(dim_line(text.to_string()));
    }

    let rows = layout.installed_rows();
    let sel = c.installed_sel;
    for (i, pkg) in c.installed.iter().enumerate().skip(sel.offset).take(rows) {
        let selected = focused && i == sel.index;
        lines.push(installed_row(c, pkg, selected, name_w, ver_w));
    }

    f.render_widget(Paragraph::new(lines), inner);
    layout::render_scrollbar(f, area, c.installed.len(), rows, sel.offset);
}

fn installed_row(c: &Controller, pkg: &Package, selected: bool, name_w: usize, ver_w: usize) -> Line<'static> {
    let base = if selected {
        Style::default().bg(SEL_BG)
    } else {
        Style::default()
    };
    let marker = if selected { "► " } else { "  " };
    let name_style = if selected {
        base.fg(BRIGHT_WHITE).add_modifier(Modifier::BOLD)
    } else {
        base.fg(BLUE)
    };
    let type_color = if pkg.kind.is_cask() { AMBER } else { DESC_DIM };

    let mut spans = vec![
        Span::styled(marker, base.fg(BRIGHT_WHITE)),
        Span::styled(fit(&pkg.name, name_w), name_style),
        Span::styled(format!(" {}", fit(&version_text(pkg), ver_w)), base.fg(Color::White)),
        Span::styled(format!(" {:<7}", pkg.kind.label()), base.fg(type_color)),
    ];
    if pkg.outdated {
        spans.push(Span::styled(" ⚠", base.fg(WARN)));
    } else {
        spans.push(Span::styled(" ✓", base.fg(OK)));
    }
    if pkg.pinned {
        spans.push(Span::styled(" ⚑", base.fg(DESC_DIM)));
    }
    if c.store.is_favorite(&pkg.name) {
        spans.push(Span::styled(" ★", base.fg(AMBER)));
    }
    Line::from(spans)
}

/// 可升级时显示 当前 → 最新
fn version_text(pkg: &Package) -> String {
    match &pkg.latest_version {
        Some(latest) if pkg.outdated => format!("{} → {}", pkg.version, latest),
        _ => pkg.version.clone(),
    }
}

// ===== 搜索 =====

fn render_search(f: &mut Frame, c: &Controller, layout: &DashboardLayout) {
    let area = layout.search;
    let focused = c.focus == PanelFocus::Search;
    let title = if c.results.is_empty() {
        " 🔍 Search ".to_string()
    } else {
        format!(" 🔍 Search ({} results) ", c.results.len())
    };
    f.render_widget(panel_block(title, focused), area);
    let inner = padded(area);

    let mut lines = vec![input_line(&c.query, "/", c.editing)];
    if c.results.is_empty() {
        lines.push(dim_line(match &c.last_query {
            Some(query) => format!("No results for \"{query}\""),
            None => "Type / then Enter to search Homebrew".to_string(),
        }));
    }

    let rows = layout.search_rows();
    let sel = c.results_sel;
    for (i, pkg) in c.results.iter().enumerate().skip(sel.offset).take(rows) {
        let selected = focused && i == sel.index;
        let base = if selected {
            Style::default().bg(SEL_BG)
        } else {
            Style::default()
        };
        let mut spans = vec![
            Span::styled(if selected { "► " } else { "  " }, base.fg(BRIGHT_WHITE)),
            Span::styled(
                pkg.name.clone(),
                if selected {
                    base.fg(BRIGHT_WHITE).add_modifier(Modifier::BOLD)
                } else {
                    base.fg(BLUE)
                },
            ),
        ];
        if pkg.kind.is_cask() {
            spans.push(Span::styled(" (cask)", base.fg(DIM)));
        }
        if pkg.installed {
            spans.push(Span::styled(" ✓ installed", base.fg(OK)));
        }
        if c.store.is_favorite(&pkg.name) {
            spans.push(Span::styled(" ★", base.fg(AMBER)));
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

// ===== 依赖 =====

fn render_dependencies(f: &mut Frame, c: &Controller, layout: &DashboardLayout) {
    if c.show_taps {
        render_taps(f, c, layout);
        return;
    }
    let area = layout.dependencies;
    let focused = c.focus == PanelFocus::Dependencies;
    let rows = layout.dependency_rows();

    let Some(detail) = c.shown_detail() else {
        f.render_widget(panel_block(" 🔗 Dependencies ".to_string(), focused), area);
        let lines = match (&c.detail_target, &c.detail_error) {
            (Some(target), Some(error)) => vec![
                Line::from(Span::styled(
                    format!("Failed to load {}", target.name),
                    Style::default().fg(ERR).add_modifier(Modifier::BOLD),
                )),
                dim_line(error.clone()),
            ],
            (Some(target), None) => vec![dim_line(format!("Loading {}...", target.name))],
            _ => vec![dim_line("Select a package to see its details".to_string())],
        };
        f.render_widget(Paragraph::new(lines), padded(area));
        return;
    };

    let all = detail_lines(detail);
    let block = with_more(
        panel_block(format!(" 🔗 Dependencies · {} ", detail.name), focused),
        all.len().saturating_sub(c.deps_scroll + rows),
    );
    f.render_widget(block, area);

    let lines: Vec<Line> = all
        .iter()
        .enumerate()
        .skip(c.deps_scroll)
        .take(rows)
        .map(|(i, text)| {
            let style = if i == 0 {
                Style::default().fg(BRIGHT_WHITE).add_modifier(Modifier::BOLD)
            } else if text.starts_with("├──") || text.starts_with("└──") {
                Style::default().fg(BLUE)
            } else if text.starts_with("Dependencies")
                || text.starts_with("Build dependencies")
                || text == "Caveats"
            {
                Style::default().fg(AMBER).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DESC_DIM)
            };
            Line::from(Span::styled(text.clone(), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), padded(area));
}

fn render_taps(f: &mut Frame, c: &Controller, layout: &DashboardLayout) {
    let area = layout.dependencies;
    let focused = c.focus == PanelFocus::Dependencies;
    let rows = layout.dependency_rows();
    let taps = c.store.taps();
    let sel = c.taps_sel;

    let mut block = panel_block(format!(" 🏷 Taps ({}) ", taps.len()), focused);
    block = match &c.tap_input {
        Some(input) => block.title_bottom(input_line(input, "+ tap", true)),
        None => with_more(block, taps.len().saturating_sub(sel.offset + rows)),
    };
    f.render_widget(block, area);

    let lines: Vec<Line> = tap_lines(&taps)
        .into_iter()
        .enumerate()
        .skip(sel.offset)
        .take(rows)
        .map(|(i, text)| {
            if taps.is_empty() {
                return dim_line(text);
            }
            let selected = focused && i == sel.index;
            let base = if selected {
                Style::default().bg(SEL_BG)
            } else {
                Style::default()
            };
            let color = if text.ends_with("✓ official") { OK } else { BLUE };
            Line::from(vec![
                Span::styled(if selected { "► " } else { "  " }, base.fg(BRIGHT_WHITE)),
                Span::styled(text, base.fg(color)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), padded(area));
}

/// 下方还有内容时在边框底部提示
fn with_more(block: Block<'static>, remaining: usize) -> Block<'static> {
    if remaining == 0 {
        return block;
    }
    block.title_bottom(Line::from(Span::styled(
        format!(" ↓ {remaining} more "),
        Style::default().fg(DIM),
    )))
}

// ===== 日志 =====

fn render_logs(f: &mut Frame, c: &Controller, layout: &DashboardLayout) {
    let area = layout.logs;
    let title = if c.log.is_following() {
        " 📜 Logs ".to_string()
    } else {
        " 📜 Logs (scrolled, L to follow) ".to_string()
    };
    f.render_widget(panel_block(title, false), area);

    let rows = layout.log_rows();
    let lines: Vec<Line> = c
        .log
        .visible(rows)
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.at.format("%H:%M:%S")),
                    Style::default().fg(DIM),
                ),
                Span::styled(entry.text.clone(), Style::default().fg(log_color(entry.level))),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), padded(area));
    layout::render_scrollbar(
        f,
        area,
        c.log.len(),
        rows,
        c.log.visible_range(rows).start,
    );
}

// ===== 状态栏 =====

fn render_status(f: &mut Frame, c: &Controller, spinner_frame: usize, area: Rect) {
    let line = match c.status() {
        OperationStatus::InProgress(message) => Line::from(vec![
            Span::styled(
                format!(" {} ", SPINNER[spinner_frame % SPINNER.len()]),
                Style::default().fg(AMBER),
            ),
            Span::styled(message, Style::default().fg(AMBER).add_modifier(Modifier::BOLD)),
        ]),
        OperationStatus::Idle => match &c.message {
            Some(message) => Line::from(Span::styled(
                format!(" {message}"),
                Style::default().fg(match LogLevel::classify(message) {
                    LogLevel::Info => Color::White,
                    level => log_color(level),
                }),
            )),
            None => Line::from(Span::styled(
                format!(" {}", hint(c)),
                Style::default().fg(Color::Green),
            )),
        },
    };
    layout::render_footer(f, line, area);
}

fn hint(c: &Controller) -> &'static str {
    if c.editing {
        return "Enter search │ Esc cancel │ ←→ move cursor │ Tab switch panel";
    }
    if c.tap_input.is_some() {
        return "Enter add tap │ Esc cancel │ ←→ move cursor";
    }
    if c.show_taps && c.focus == PanelFocus::Dependencies {
        return "↑↓ select │ + add tap │ x remove tap │ T dependencies │ Tab switch │ q quit";
    }
    match c.focus {
        PanelFocus::Installed => {
            "↑↓ select │ u upgrade │ x uninstall │ U upgrade all │ p pin │ f favorite │ t/o/P filter │ / search │ Tab switch │ q quit"
        }
        PanelFocus::Search => {
            "↑↓ select │ Enter install │ / edit query │ f favorite │ Tab switch │ q quit"
        }
        PanelFocus::Dependencies => {
            "↑↓ scroll │ T taps │ d doctor │ c cleanup │ a autoremove │ r refresh │ [ ] logs │ Tab switch │ q quit"
        }
    }
}
