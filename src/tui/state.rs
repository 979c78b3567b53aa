use crate::package_manager::{OutdatedPackage, Package, PackageDetail, PackageRef, Tap};
use crossterm::event::KeyEvent;
use std::time::Duration;

// ========== 枚举 ==========

/// 当前持有焦点的面板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelFocus {
    #[default]
    Installed,
    Search,
    Dependencies,
}

impl PanelFocus {
    pub fn next(self) -> Self {
        match self {
            PanelFocus::Installed => PanelFocus::Search,
            PanelFocus::Search => PanelFocus::Dependencies,
            PanelFocus::Dependencies => PanelFocus::Installed,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Installed => PanelFocus::Dependencies,
            PanelFocus::Search => PanelFocus::Installed,
            PanelFocus::Dependencies => PanelFocus::Search,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
    #[default]
    Idle,
    InProgress(String),
}

/// 用于去重的操作类别：同一类别同时只允许一个在执行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    Refresh,
    Search,
    Install,
    Uninstall,
    Upgrade,
    UpgradeAll,
    Doctor,
    Cleanup,
    Autoremove,
    Tap,
    Pin,
}

impl OperationClass {
    pub fn label(self) -> &'static str {
        match self {
            OperationClass::Refresh => "Refresh",
            OperationClass::Search => "Search",
            OperationClass::Install => "Install",
            OperationClass::Uninstall => "Uninstall",
            OperationClass::Upgrade => "Upgrade",
            OperationClass::UpgradeAll => "Upgrade all",
            OperationClass::Doctor => "Doctor",
            OperationClass::Cleanup => "Cleanup",
            OperationClass::Autoremove => "Autoremove",
            OperationClass::Tap => "Tap",
            OperationClass::Pin => "Pin",
        }
    }
}

/// 需要确认的操作，在请求时刻捕获目标
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Install(PackageRef),
    Uninstall(PackageRef),
    Upgrade(String),
    /// 请求时的可升级数量，仅用于提示
    UpgradeAll(usize),
    Doctor,
    Cleanup,
    Autoremove,
    TapAdd(String),
    TapRemove(String),
    Pin(String),
    Unpin(String),
}

impl PendingAction {
    pub fn class(&self) -> OperationClass {
        match self {
            PendingAction::Install(_) => OperationClass::Install,
            PendingAction::Uninstall(_) => OperationClass::Uninstall,
            PendingAction::Upgrade(_) => OperationClass::Upgrade,
            PendingAction::UpgradeAll(_) => OperationClass::UpgradeAll,
            PendingAction::Doctor => OperationClass::Doctor,
            PendingAction::Cleanup => OperationClass::Cleanup,
            PendingAction::Autoremove => OperationClass::Autoremove,
            PendingAction::TapAdd(_) | PendingAction::TapRemove(_) => OperationClass::Tap,
            PendingAction::Pin(_) | PendingAction::Unpin(_) => OperationClass::Pin,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PendingAction::Install(_) => "Install Package",
            PendingAction::Uninstall(_) => "Uninstall Package",
            PendingAction::Upgrade(_) => "Upgrade Package",
            PendingAction::UpgradeAll(_) => "Upgrade All",
            PendingAction::Doctor => "Brew Doctor",
            PendingAction::Cleanup => "Brew Cleanup",
            PendingAction::Autoremove => "Brew Autoremove",
            PendingAction::TapAdd(_) => "Add Tap",
            PendingAction::TapRemove(_) => "Remove Tap",
            PendingAction::Pin(_) => "Pin Package",
            PendingAction::Unpin(_) => "Unpin Package",
        }
    }

    /// 对话框中的确认提示
    pub fn prompt(&self) -> String {
        match self {
            PendingAction::Install(pkg) => format!("Install {}?", pkg.name),
            PendingAction::Uninstall(pkg) => format!("Uninstall {}?", pkg.name),
            PendingAction::Upgrade(name) => format!("Upgrade {name}?"),
            PendingAction::UpgradeAll(n) => format!("Upgrade all {n} outdated packages?"),
            PendingAction::Doctor => "Run brew doctor to check for problems?".to_string(),
            PendingAction::Cleanup => "Run brew cleanup to remove old versions?".to_string(),
            PendingAction::Autoremove => {
                "Run brew autoremove to uninstall unused dependencies?".to_string()
            }
            PendingAction::TapAdd(name) => format!("Add tap {name}?"),
            PendingAction::TapRemove(name) => format!("Remove tap {name}?"),
            PendingAction::Pin(name) => format!("Pin {name} at its current version?"),
            PendingAction::Unpin(name) => format!("Unpin {name}?"),
        }
    }

    /// 破坏性操作默认高亮"取消"
    pub fn default_confirm(&self) -> bool {
        !matches!(
            self,
            PendingAction::Uninstall(_)
                | PendingAction::Cleanup
                | PendingAction::Autoremove
                | PendingAction::TapRemove(_)
        )
    }

    /// 执行中的状态栏文字
    pub fn progress_message(&self) -> String {
        match self {
            PendingAction::Install(pkg) => format!("Installing {}...", pkg.name),
            PendingAction::Uninstall(pkg) => format!("Uninstalling {}...", pkg.name),
            PendingAction::Upgrade(name) => format!("Upgrading {name}..."),
            PendingAction::UpgradeAll(_) => "Upgrading all packages...".to_string(),
            PendingAction::Doctor => "Running brew doctor...".to_string(),
            PendingAction::Cleanup => "Running brew cleanup...".to_string(),
            PendingAction::Autoremove => "Running brew autoremove...".to_string(),
            PendingAction::TapAdd(name) => format!("Tapping {name}..."),
            PendingAction::TapRemove(name) => format!("Untapping {name}..."),
            PendingAction::Pin(name) => format!("Pinning {name}..."),
            PendingAction::Unpin(name) => format!("Unpinning {name}..."),
        }
    }

    pub fn success_message(&self) -> String {
        match self {
            PendingAction::Install(pkg) => format!("Installed {}", pkg.name),
            PendingAction::Uninstall(pkg) => format!("Uninstalled {}", pkg.name),
            PendingAction::Upgrade(name) => format!("Upgraded {name}"),
            PendingAction::UpgradeAll(_) => "Upgraded all packages".to_string(),
            PendingAction::Doctor => "Doctor completed".to_string(),
            PendingAction::Cleanup => "Cleanup completed".to_string(),
            PendingAction::Autoremove => "Autoremove completed".to_string(),
            PendingAction::TapAdd(name) => format!("Added tap {name}"),
            PendingAction::TapRemove(name) => format!("Removed tap {name}"),
            PendingAction::Pin(name) => format!("Pinned {name}"),
            PendingAction::Unpin(name) => format!("Unpinned {name}"),
        }
    }

    /// 成功后是否需要刷新已安装 / 可升级列表
    pub fn changes_system(&self) -> bool {
        !matches!(self, PendingAction::Doctor)
    }

    /// 成功后是否需要重新读取 tap 列表
    pub fn changes_taps(&self) -> bool {
        matches!(self, PendingAction::TapAdd(_) | PendingAction::TapRemove(_))
    }
}

/// 操作成功时的结果
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    Done,
    /// 多行诊断报告，逐行写入日志
    Report(String),
}

// ========== 事件 ==========

/// 事件循环消费的离散事件：按键、定时器、异步完成
#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    DebounceElapsed {
        token: u64,
    },
    DetailLoaded {
        token: u64,
        result: Result<PackageDetail, String>,
    },
    InstalledLoaded(Result<Vec<Package>, String>),
    OutdatedLoaded(Vec<OutdatedPackage>),
    TapsLoaded(Result<Vec<Tap>, String>),
    SearchFinished {
        query: String,
        result: Result<Vec<Package>, String>,
    },
    OperationFinished {
        action: PendingAction,
        result: Result<OperationOutput, String>,
    },
}

/// 控制器要求外部执行的工作，每个异步工作恰好回送一个事件
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScheduleDebounce { token: u64, delay: Duration },
    LoadDetail { token: u64, package: PackageRef },
    LoadInstalled,
    LoadOutdated,
    LoadTaps,
    Search(String),
    Execute(PendingAction),
    SaveFavorites(Vec<String>),
}

// ========== 选择状态 ==========

/// 列表选中位置与滚动偏移
///
/// 不变量：列表非空时 `index < len`，且 `offset <= index < offset + visible`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub index: usize,
    pub offset: usize,
}

impl SelectionState {
    /// 相对移动，返回选中项是否变化
    pub fn move_by(&mut self, delta: isize, len: usize, visible: usize) -> bool {
        if len == 0 {
            self.reset();
            return false;
        }
        let target = if delta < 0 {
            self.index.saturating_sub(delta.unsigned_abs())
        } else {
            self.index.saturating_add(delta as usize)
        };
        self.move_to(target, len, visible)
    }

    /// 跳到指定位置（越界时钳制），返回选中项是否变化
    pub fn move_to(&mut self, index: usize, len: usize, visible: usize) -> bool {
        if len == 0 {
            self.reset();
            return false;
        }
        let before = self.index;
        self.index = index.min(len - 1);
        self.ensure_visible(visible);
        self.index != before
    }

    /// 列表长度或可见高度变化后重新满足不变量
    pub fn clamp(&mut self, len: usize, visible: usize) {
        if len == 0 {
            self.reset();
        } else {
            self.index = self.index.min(len - 1);
            self.ensure_visible(visible);
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.offset = 0;
    }

    fn ensure_visible(&mut self, visible: usize) {
        let visible = visible.max(1);
        if self.index < self.offset {
            self.offset = self.index;
        } else if self.index >= self.offset + visible {
            self.offset = self.index + 1 - visible;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holds(sel: &SelectionState, len: usize, visible: usize) -> bool {
        len == 0 || (sel.index < len && sel.offset <= sel.index && sel.index < sel.offset + visible)
    }

    #[test]
    fn test_focus_cycle() {
        let f = PanelFocus::Installed;
        assert_eq!(f.next(), PanelFocus::Search);
        assert_eq!(f.next().next(), PanelFocus::Dependencies);
        assert_eq!(f.next().next().next(), PanelFocus::Installed);
        assert_eq!(f.prev(), PanelFocus::Dependencies);
    }

    #[test]
    fn test_selection_scroll_follows() {
        let mut sel = SelectionState::default();
        for _ in 0..12 {
            sel.move_by(1, 20, 5);
            assert!(holds(&sel, 20, 5));
        }
        assert_eq!(sel.index, 12);
        assert_eq!(sel.offset, 8);

        assert!(sel.move_by(-100, 20, 5));
        assert_eq!((sel.index, sel.offset), (0, 0));
        assert!(!sel.move_by(-1, 20, 5));

        sel.move_to(usize::MAX, 20, 5);
        assert_eq!((sel.index, sel.offset), (19, 15));
    }

    #[test]
    fn test_selection_clamp_on_shrink() {
        let mut sel = SelectionState { index: 15, offset: 12 };
        sel.clamp(4, 5);
        assert_eq!((sel.index, sel.offset), (3, 3));
        assert!(holds(&sel, 4, 5));

        sel.clamp(0, 5);
        assert_eq!(sel, SelectionState::default());

        // 可见高度缩小时偏移跟上
        let mut sel = SelectionState { index: 9, offset: 0 };
        sel.clamp(20, 3);
        assert!(holds(&sel, 20, 3));
    }

    #[test]
    fn test_action_gating_defaults() {
        assert!(PendingAction::Upgrade("wget".into()).default_confirm());
        assert!(!PendingAction::Cleanup.default_confirm());
        assert_eq!(PendingAction::Upgrade("wget".into()).prompt(), "Upgrade wget?");
        assert_eq!(
            PendingAction::UpgradeAll(3).prompt(),
            "Upgrade all 3 outdated packages?"
        );
        assert!(!PendingAction::Doctor.changes_system());
        assert_eq!(
            PendingAction::Pin("a".into()).class(),
            PendingAction::Unpin("b".into()).class()
        );
        let untap = PendingAction::TapRemove("acme/tools".into());
        assert!(!untap.default_confirm());
        assert!(untap.changes_taps());
        assert!(PendingAction::TapAdd("acme/tools".into()).default_confirm());
        assert!(!PendingAction::Cleanup.changes_taps());
    }
}
