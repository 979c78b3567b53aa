//! 会话控制器：纯状态机
//!
//! `handle` 每次消费一个事件，修改自身状态并返回需要执行的 `Effect`。
//! 控制器不做 I/O，也不持有跨异步边界的锁；渲染只读取它的状态。

use super::dashboard::detail_lines;
use super::debounce::DebounceGate;
use super::dialog::ConfirmDialog;
use super::input::InputBox;
use super::layout::DashboardLayout;
use super::oplog::OperationLog;
use super::state::{
    AppEvent, Effect, OperationClass, OperationOutput, OperationStatus, PanelFocus, PendingAction,
    SelectionState,
};
use crate::config::Config;
use crate::package_manager::{OutdatedPackage, Package, PackageDetail, PackageRef, Tap};
use crate::store::{Filters, Store};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::Duration;

/// 控制器可调参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub debounce: Duration,
    pub log_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            log_capacity: 1000,
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
            log_capacity: config.log_capacity(),
        }
    }
}

pub struct Controller {
    pub(super) store: Arc<Store>,
    pub(super) focus: PanelFocus,
    // 已安装面板：store 过滤结果的快照
    pub(super) installed: Vec<Package>,
    pub(super) installed_sel: SelectionState,
    // 搜索面板
    pub(super) query: InputBox,
    pub(super) editing: bool,
    pub(super) results: Vec<Package>,
    pub(super) results_sel: SelectionState,
    pub(super) last_query: Option<String>,
    // 依赖 / 详情面板
    pub(super) detail: Option<PackageDetail>,
    pub(super) detail_target: Option<PackageRef>,
    /// 当前目标的详情加载失败
    pub(super) detail_error: Option<String>,
    pub(super) deps_scroll: usize,
    /// 依赖面板改为显示 tap 列表
    pub(super) show_taps: bool,
    pub(super) taps_sel: SelectionState,
    /// 正在输入要添加的 tap 名
    pub(super) tap_input: Option<InputBox>,
    debounce: DebounceGate,
    // 确认门控
    pub(super) pending: Option<PendingAction>,
    pub(super) dialog: ConfirmDialog,
    /// 执行中的操作，最后一个决定状态栏文字
    running: Vec<(OperationClass, String)>,
    /// 尚未返回的已安装列表请求数
    installed_loads: usize,
    pub(super) log: OperationLog,
    /// 临时状态消息，下一次按键清除
    pub(super) message: Option<String>,
    viewport: Rect,
    should_quit: bool,
}

impl Controller {
    pub fn new(store: Arc<Store>, settings: Settings) -> Self {
        Self {
            store,
            focus: PanelFocus::Installed,
            installed: Vec::new(),
            installed_sel: SelectionState::default(),
            query: InputBox::new(),
            editing: false,
            results: Vec::new(),
            results_sel: SelectionState::default(),
            last_query: None,
            detail: None,
            detail_target: None,
            detail_error: None,
            deps_scroll: 0,
            show_taps: false,
            taps_sel: SelectionState::default(),
            tap_input: None,
            debounce: DebounceGate::new(settings.debounce),
            pending: None,
            dialog: ConfirmDialog::default(),
            running: Vec::new(),
            installed_loads: 0,
            log: OperationLog::new(settings.log_capacity),
            message: None,
            viewport: Rect::new(0, 0, 80, 24),
            should_quit: false,
        }
    }

    /// 会话开始：加载已安装 / 可升级 / tap
    pub fn init(&mut self) -> Vec<Effect> {
        self.running
            .push((OperationClass::Refresh, "Loading packages...".to_string()));
        self.log.push("→ Loading installed packages...");
        let mut effects = Vec::new();
        self.load_lists(true, &mut effects);
        effects
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn status(&self) -> OperationStatus {
        match self.running.last() {
            Some((_, message)) => OperationStatus::InProgress(message.clone()),
            None => OperationStatus::Idle,
        }
    }

    pub(super) fn layout(&self) -> DashboardLayout {
        DashboardLayout::new(self.viewport)
    }

    /// 唯一的状态转移入口
    pub fn handle(&mut self, event: AppEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            AppEvent::Key(key) => self.on_key(key, &mut effects),
            AppEvent::Resize(width, height) => self.on_resize(width, height),
            AppEvent::DebounceElapsed { token } => match self.debounce.fire(token) {
                Some(package) => effects.push(Effect::LoadDetail { token, package }),
                None => log::debug!("debounce token {} superseded", token),
            },
            AppEvent::DetailLoaded { token, result } => self.on_detail(token, result),
            AppEvent::InstalledLoaded(result) => self.on_installed(result, &mut effects),
            AppEvent::OutdatedLoaded(outdated) => self.on_outdated(outdated, &mut effects),
            AppEvent::TapsLoaded(result) => self.on_taps(result),
            AppEvent::SearchFinished { query, result } => {
                self.on_search(query, result, &mut effects)
            }
            AppEvent::OperationFinished { action, result } => {
                self.on_operation(action, result, &mut effects)
            }
        }
        effects
    }

    // ===== 按键 =====

    fn on_key(&mut self, key: KeyEvent, effects: &mut Vec<Effect>) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        // Ctrl+C 总是退出，对话框也拦不住
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit(effects);
            return;
        }
        self.message = None;

        if self.dialog.is_visible() {
            if let Some(confirmed) = self.dialog.handle_key(key) {
                self.resolve_dialog(confirmed, effects);
            }
            return;
        }
        if self.tap_input.is_some() {
            self.on_tap_input_key(key);
            return;
        }
        if self.editing {
            self.on_edit_key(key, effects);
            return;
        }
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return;
        }

        let on_installed = self.focus == PanelFocus::Installed;
        let on_taps = self.focus == PanelFocus::Dependencies && self.show_taps;
        match key.code {
            KeyCode::Char('q') => self.quit(effects),
            KeyCode::Tab => self.change_focus(self.focus.next(), effects),
            KeyCode::BackTab => self.change_focus(self.focus.prev(), effects),
            KeyCode::Char('/') => {
                self.change_focus(PanelFocus::Search, effects);
                self.editing = true;
            }
            KeyCode::Enter if self.focus == PanelFocus::Search => self.request_install(),
            KeyCode::Char('u') if on_installed => self.request_upgrade(),
            KeyCode::Char('x') if on_installed => self.request_uninstall(),
            KeyCode::Char('U') if on_installed => self.request_upgrade_all(),
            KeyCode::Char('p') if on_installed => self.request_pin_toggle(),
            KeyCode::Char('x') if on_taps => self.request_tap_remove(),
            KeyCode::Char('+') if on_taps => self.tap_input = Some(InputBox::new()),
            KeyCode::Char('d') => self.request(PendingAction::Doctor),
            KeyCode::Char('c') => self.request(PendingAction::Cleanup),
            KeyCode::Char('a') => self.request(PendingAction::Autoremove),
            KeyCode::Char('r') => self.refresh(effects),
            KeyCode::Char('f') => self.toggle_favorite(effects),
            KeyCode::Char('t') => self.change_filters(Filters::cycle_type, effects),
            KeyCode::Char('o') => self.change_filters(|f| f.only_outdated = !f.only_outdated, effects),
            KeyCode::Char('P') => self.change_filters(|f| f.only_pinned = !f.only_pinned, effects),
            KeyCode::Char('[') => {
                let rows = self.layout().log_rows();
                self.log.scroll_back(rows, rows);
            }
            KeyCode::Char(']') => {
                let rows = self.layout().log_rows();
                self.log.scroll_forward(rows, rows);
            }
            KeyCode::Char('L') => self.log.follow(),
            KeyCode::Char('T') => self.show_taps = !self.show_taps,
            code => self.navigate(code, effects),
        }
    }

    /// 搜索框文本输入
    fn on_edit_key(&mut self, key: KeyEvent, effects: &mut Vec<Effect>) {
        match key.code {
            KeyCode::Enter => {
                let query = self.query.content().trim().to_string();
                if query.is_empty() {
                    return;
                }
                self.editing = false;
                self.begin(OperationClass::Search, format!("Searching for {query}..."));
                effects.push(Effect::Search(query));
            }
            KeyCode::Esc => self.editing = false,
            KeyCode::Tab => self.change_focus(self.focus.next(), effects),
            KeyCode::BackTab => self.change_focus(self.focus.prev(), effects),
            KeyCode::Backspace => self.query.delete_back(),
            KeyCode::Delete => self.query.delete_forward(),
            KeyCode::Left => self.query.move_left(),
            KeyCode::Right => self.query.move_right(),
            KeyCode::Home => self.query.move_home(),
            KeyCode::End => self.query.move_end(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.query.insert(c)
            }
            _ => {}
        }
    }

    /// tap 名输入：Enter 提交为待确认的添加请求，Esc 放弃
    fn on_tap_input_key(&mut self, key: KeyEvent) {
        let Some(input) = self.tap_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                let name = input.content().trim().to_string();
                if name.is_empty() {
                    return;
                }
                self.tap_input = None;
                self.request(PendingAction::TapAdd(name));
            }
            KeyCode::Esc => self.tap_input = None,
            KeyCode::Backspace => input.delete_back(),
            KeyCode::Delete => input.delete_forward(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                input.insert(c)
            }
            _ => {}
        }
    }

    fn change_focus(&mut self, focus: PanelFocus, effects: &mut Vec<Effect>) {
        self.editing = false;
        if self.focus == focus {
            return;
        }
        self.focus = focus;
        self.arm_focused(effects);
    }

    /// 方向键：列表面板移动选中项，依赖面板独立滚动
    fn navigate(&mut self, code: KeyCode, effects: &mut Vec<Effect>) {
        let layout = self.layout();
        let (sel, len, rows) = match self.focus {
            PanelFocus::Installed => (
                &mut self.installed_sel,
                self.installed.len(),
                layout.installed_rows(),
            ),
            PanelFocus::Search => (
                &mut self.results_sel,
                self.results.len(),
                layout.search_rows(),
            ),
            PanelFocus::Dependencies if self.show_taps => (
                &mut self.taps_sel,
                self.store.tap_count(),
                layout.dependency_rows(),
            ),
            PanelFocus::Dependencies => {
                self.scroll_dependencies(code, layout.dependency_rows());
                return;
            }
        };
        let page = rows as isize;
        let changed = match code {
            KeyCode::Up | KeyCode::Char('k') => sel.move_by(-1, len, rows),
            KeyCode::Down | KeyCode::Char('j') => sel.move_by(1, len, rows),
            KeyCode::PageUp => sel.move_by(-page, len, rows),
            KeyCode::PageDown => sel.move_by(page, len, rows),
            KeyCode::Home | KeyCode::Char('g') => sel.move_to(0, len, rows),
            KeyCode::End | KeyCode::Char('G') => sel.move_to(usize::MAX, len, rows),
            _ => false,
        };
        if changed {
            self.arm_focused(effects);
        }
    }

    fn scroll_dependencies(&mut self, code: KeyCode, rows: usize) {
        let max = self.dependency_line_count().saturating_sub(rows);
        self.deps_scroll = match code {
            KeyCode::Up | KeyCode::Char('k') => self.deps_scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.deps_scroll + 1,
            KeyCode::PageUp => self.deps_scroll.saturating_sub(rows),
            KeyCode::PageDown => self.deps_scroll + rows,
            KeyCode::Home | KeyCode::Char('g') => 0,
            KeyCode::End | KeyCode::Char('G') => max,
            _ => self.deps_scroll,
        }
        .min(max);
    }

    fn dependency_line_count(&self) -> usize {
        self.shown_detail().map_or(0, |d| detail_lines(d).len())
    }

    fn on_resize(&mut self, width: u16, height: u16) {
        self.viewport = Rect::new(0, 0, width, height);
        let layout = self.layout();
        self.installed_sel
            .clamp(self.installed.len(), layout.installed_rows());
        self.results_sel.clamp(self.results.len(), layout.search_rows());
        self.taps_sel
            .clamp(self.store.tap_count(), layout.dependency_rows());
        let max = self
            .dependency_line_count()
            .saturating_sub(layout.dependency_rows());
        self.deps_scroll = self.deps_scroll.min(max);
    }

    fn quit(&mut self, effects: &mut Vec<Effect>) {
        self.should_quit = true;
        effects.push(Effect::SaveFavorites(self.store.favorites()));
    }

    // ===== 选中与详情 =====

    pub(super) fn selected_installed(&self) -> Option<&Package> {
        self.installed.get(self.installed_sel.index)
    }

    pub(super) fn selected_result(&self) -> Option<&Package> {
        self.results.get(self.results_sel.index)
    }

    fn focused_package(&self) -> Option<&Package> {
        match self.focus {
            PanelFocus::Installed => self.selected_installed(),
            PanelFocus::Search => self.selected_result(),
            PanelFocus::Dependencies => None,
        }
    }

    /// 已加载且属于当前目标的详情
    pub(super) fn shown_detail(&self) -> Option<&PackageDetail> {
        match (&self.detail, &self.detail_target) {
            (Some(detail), Some(target)) if detail.name == target.name => Some(detail),
            _ => None,
        }
    }

    fn select_for_detail(&mut self, package: PackageRef, effects: &mut Vec<Effect>) {
        self.detail_target = Some(package.clone());
        self.detail_error = None;
        effects.push(self.debounce.arm(package));
    }

    fn arm_focused(&mut self, effects: &mut Vec<Effect>) {
        if let Some(package) = self.focused_package().map(Package::to_ref) {
            self.select_for_detail(package, effects);
        }
    }

    fn on_detail(&mut self, token: u64, result: Result<PackageDetail, String>) {
        if !self.debounce.accepts(token) {
            log::debug!("discarding stale detail for token {}", token);
            return;
        }
        match result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.detail_error = None;
                self.deps_scroll = 0;
            }
            Err(e) => {
                self.detail = None;
                self.detail_error = Some(e.clone());
                self.fail(e);
            }
        }
    }

    // ===== 列表刷新 =====

    fn on_installed(&mut self, result: Result<Vec<Package>, String>, effects: &mut Vec<Effect>) {
        // 所有在途的列表请求都返回后才结束刷新状态
        self.installed_loads = self.installed_loads.saturating_sub(1);
        if self.installed_loads == 0 {
            self.finish(OperationClass::Refresh);
        }
        match result {
            Ok(packages) => {
                let count = packages.len();
                self.store.set_installed(packages);
                self.log.push(format!("✓ Loaded {count} packages"));
                self.reload_installed(true, effects);
            }
            Err(e) => self.fail(e),
        }
    }

    fn on_outdated(&mut self, outdated: Vec<OutdatedPackage>, effects: &mut Vec<Effect>) {
        let count = outdated.len();
        self.store.set_outdated(outdated);
        if count > 0 {
            self.log.push(format!("⚠ Found {count} outdated packages"));
        } else {
            self.log.push("✓ All packages are up to date");
        }
        self.reload_installed(false, effects);
    }

    fn on_taps(&mut self, result: Result<Vec<Tap>, String>) {
        match result {
            Ok(taps) => {
                let rows = self.layout().dependency_rows();
                self.taps_sel.clamp(taps.len(), rows);
                self.store.set_taps(taps);
            }
            Err(e) => self.fail(e),
        }
    }

    /// 从 store 重新读取过滤后的列表，尽量保持选中同一个包
    fn reload_installed(&mut self, always_arm: bool, effects: &mut Vec<Effect>) {
        let previous = self.selected_installed().map(|p| p.name.clone());
        self.installed = self.store.filtered_packages();
        if let Some(name) = &previous {
            if let Some(pos) = self.installed.iter().position(|p| &p.name == name) {
                self.installed_sel.index = pos;
            }
        }
        let rows = self.layout().installed_rows();
        self.installed_sel.clamp(self.installed.len(), rows);

        if self.focus != PanelFocus::Installed {
            return;
        }
        match self.selected_installed().map(Package::to_ref) {
            Some(current) if always_arm || previous.as_deref() != Some(current.name.as_str()) => {
                self.select_for_detail(current, effects)
            }
            Some(_) => {}
            None => {
                self.debounce.invalidate();
                self.detail = None;
                self.detail_target = None;
                self.detail_error = None;
            }
        }
    }

    fn refresh(&mut self, effects: &mut Vec<Effect>) {
        if self.is_running(OperationClass::Refresh) {
            self.message = Some("Refresh already in progress".to_string());
            return;
        }
        self.begin(OperationClass::Refresh, "Refreshing packages...".to_string());
        self.load_lists(true, effects);
    }

    fn load_lists(&mut self, with_taps: bool, effects: &mut Vec<Effect>) {
        self.installed_loads += 1;
        effects.extend([Effect::LoadInstalled, Effect::LoadOutdated]);
        if with_taps {
            effects.push(Effect::LoadTaps);
        }
    }

    // ===== 搜索 =====

    fn on_search(
        &mut self,
        query: String,
        result: Result<Vec<Package>, String>,
        effects: &mut Vec<Effect>,
    ) {
        self.finish(OperationClass::Search);
        match result {
            Ok(mut results) => {
                for pkg in &mut results {
                    pkg.installed |= self.store.is_installed(&pkg.name);
                }
                self.log
                    .push(format!("✓ Found {} results for \"{query}\"", results.len()));
                self.results = results;
                self.results_sel.reset();
                self.last_query = Some(query);
                if self.focus == PanelFocus::Search {
                    self.arm_focused(effects);
                }
            }
            Err(e) => self.fail(e),
        }
    }

    // ===== 收藏与过滤 =====

    fn toggle_favorite(&mut self, effects: &mut Vec<Effect>) {
        let Some(name) = self.focused_package().map(|p| p.name.clone()) else {
            return;
        };
        let text = if self.store.toggle_favorite(&name) {
            format!("★ Added {name} to favorites")
        } else {
            format!("☆ Removed {name} from favorites")
        };
        self.log.push(text.clone());
        self.message = Some(text);
        effects.push(Effect::SaveFavorites(self.store.favorites()));
    }

    fn change_filters(&mut self, change: impl FnOnce(&mut Filters), effects: &mut Vec<Effect>) {
        let filters = self.store.update_filters(change);
        self.message = Some(match filters.describe() {
            Some(desc) => format!("Filter: {desc}"),
            None => "Filter: all packages".to_string(),
        });
        self.reload_installed(false, effects);
    }

    // ===== 确认门控 =====

    fn request_install(&mut self) {
        let Some(pkg) = self.selected_result() else {
            return;
        };
        if pkg.installed {
            self.message = Some(format!("{} is already installed", pkg.name));
            return;
        }
        let action = PendingAction::Install(pkg.to_ref());
        self.request(action);
    }

    fn request_uninstall(&mut self) {
        if let Some(pkg) = self.selected_installed() {
            let action = PendingAction::Uninstall(pkg.to_ref());
            self.request(action);
        }
    }

    fn request_upgrade(&mut self) {
        let Some(pkg) = self.selected_installed() else {
            return;
        };
        if !pkg.outdated {
            self.message = Some(format!("{} is up to date", pkg.name));
            return;
        }
        let action = PendingAction::Upgrade(pkg.name.clone());
        self.request(action);
    }

    fn request_upgrade_all(&mut self) {
        let count = self.store.outdated_count();
        if count == 0 {
            self.message = Some("All packages are up to date".to_string());
            return;
        }
        self.request(PendingAction::UpgradeAll(count));
    }

    fn request_pin_toggle(&mut self) {
        let Some(pkg) = self.selected_installed() else {
            return;
        };
        let action = if pkg.pinned {
            PendingAction::Unpin(pkg.name.clone())
        } else {
            PendingAction::Pin(pkg.name.clone())
        };
        self.request(action);
    }

    fn request_tap_remove(&mut self) {
        let Some(tap) = self.store.taps().into_iter().nth(self.taps_sel.index) else {
            return;
        };
        self.request(PendingAction::TapRemove(tap.name));
    }

    /// 请求阶段：只弹出对话框，不发出任何调用
    fn request(&mut self, action: PendingAction) {
        if self.dialog.is_visible() {
            return;
        }
        if self.is_running(action.class()) {
            self.message = Some(format!("{} already in progress", action.class().label()));
            return;
        }
        self.dialog
            .show(action.title(), action.prompt(), action.default_confirm());
        self.pending = Some(action);
    }

    /// 结束阶段：无论结果如何都清除 pending
    fn resolve_dialog(&mut self, confirmed: bool, effects: &mut Vec<Effect>) {
        let Some(action) = self.pending.take() else {
            return;
        };
        if !confirmed {
            self.log.push(format!("Cancelled: {}", action.prompt()));
            return;
        }
        let class = action.class();
        if self.is_running(class) {
            self.message = Some(format!("{} already in progress", class.label()));
            return;
        }
        self.begin(class, action.progress_message());
        effects.push(Effect::Execute(action));
    }

    // ===== 异步操作 =====

    fn is_running(&self, class: OperationClass) -> bool {
        self.running.iter().any(|(c, _)| *c == class)
    }

    fn begin(&mut self, class: OperationClass, message: String) {
        self.log.push(format!("→ {message}"));
        self.running.push((class, message));
    }

    fn finish(&mut self, class: OperationClass) {
        if let Some(pos) = self.running.iter().position(|(c, _)| *c == class) {
            self.running.remove(pos);
        }
    }

    fn on_operation(
        &mut self,
        action: PendingAction,
        result: Result<OperationOutput, String>,
        effects: &mut Vec<Effect>,
    ) {
        self.finish(action.class());
        match result {
            Ok(output) => {
                if let OperationOutput::Report(report) = output {
                    for line in report.lines().filter(|l| !l.trim().is_empty()) {
                        self.log.push(line.trim_end());
                    }
                }
                let text = format!("✓ {}", action.success_message());
                self.log.push(text.clone());
                self.message = Some(text);
                if action.changes_system() {
                    self.load_lists(action.changes_taps(), effects);
                }
            }
            Err(e) => self.fail(e),
        }
    }

    /// 外部命令失败：一条错误日志 + 临时状态，不影响已显示的数据
    fn fail(&mut self, error: String) {
        log::warn!("{}", error);
        let text = format!("Error: {error}");
        self.log.push(text.clone());
        self.message = Some(text);
    }
}
