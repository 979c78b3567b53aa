//! 共享状态：已安装 / 可升级 / tap 列表、过滤条件与收藏
//!
//! 所有访问都只在一次读取或一次替换期间持有读写锁，返回的都是拷贝，
//! 外部无法直接改动内部集合。

use crate::package_manager::{OutdatedPackage, Package, PackageType, Tap};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 列表过滤条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    pub show_formulae: bool,
    pub show_casks: bool,
    pub only_outdated: bool,
    pub only_pinned: bool,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            show_formulae: true,
            show_casks: true,
            only_outdated: false,
            only_pinned: false,
        }
    }
}

impl Filters {
    fn accepts(&self, pkg: &Package) -> bool {
        let type_ok = match pkg.kind {
            PackageType::Formula => self.show_formulae,
            PackageType::Cask => self.show_casks,
        };
        type_ok && (!self.only_outdated || pkg.outdated) && (!self.only_pinned || pkg.pinned)
    }

    /// 全部 → 仅 formula → 仅 cask → 全部
    pub fn cycle_type(&mut self) {
        (self.show_formulae, self.show_casks) = match (self.show_formulae, self.show_casks) {
            (true, true) => (true, false),
            (true, false) => (false, true),
            _ => (true, true),
        };
    }

    /// 状态栏里显示的简短描述，无过滤时为 None
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        match (self.show_formulae, self.show_casks) {
            (true, false) => parts.push("formulae"),
            (false, true) => parts.push("casks"),
            (false, false) => parts.push("nothing"),
            (true, true) => {}
        }
        if self.only_outdated {
            parts.push("outdated");
        }
        if self.only_pinned {
            parts.push("pinned");
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" + "))
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    installed: Vec<Package>,
    outdated: Vec<OutdatedPackage>,
    taps: Vec<Tap>,
    filters: Filters,
    favorites: Vec<String>,
}

impl Inner {
    /// 把可升级信息标记到已安装列表上；两个刷新结果的到达顺序不固定
    fn apply_outdated_marks(&mut self) {
        let marks: HashMap<&str, &OutdatedPackage> = self
            .outdated
            .iter()
            .map(|o| (o.name.as_str(), o))
            .collect();
        for pkg in &mut self.installed {
            match marks.get(pkg.name.as_str()) {
                Some(o) => {
                    pkg.outdated = true;
                    pkg.pinned |= o.pinned;
                    pkg.latest_version =
                        Some(o.latest_version.clone()).filter(|v| !v.is_empty());
                }
                None => {
                    pkg.outdated = false;
                    pkg.latest_version = None;
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new(filters: Filters, favorites: Vec<String>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                filters,
                favorites,
                ..Inner::default()
            }),
        }
    }

    // 锁中毒时数据仍是完整的值，直接取回
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_installed(&self, packages: Vec<Package>) {
        let mut inner = self.write();
        inner.installed = packages;
        inner.apply_outdated_marks();
    }

    pub fn set_outdated(&self, packages: Vec<OutdatedPackage>) {
        let mut inner = self.write();
        inner.outdated = packages;
        inner.apply_outdated_marks();
    }

    pub fn set_taps(&self, taps: Vec<Tap>) {
        self.write().taps = taps;
    }

    /// 应用当前过滤条件后的已安装列表（保持原顺序）
    pub fn filtered_packages(&self) -> Vec<Package> {
        let inner = self.read();
        inner
            .installed
            .iter()
            .filter(|pkg| inner.filters.accepts(pkg))
            .cloned()
            .collect()
    }

    pub fn installed_count(&self) -> usize {
        self.read().installed.len()
    }

    pub fn outdated_count(&self) -> usize {
        self.read().outdated.len()
    }

    pub fn tap_count(&self) -> usize {
        self.read().taps.len()
    }

    pub fn taps(&self) -> Vec<Tap> {
        self.read().taps.clone()
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.read().installed.iter().any(|p| p.name == name)
    }

    pub fn filters(&self) -> Filters {
        self.read().filters
    }

    /// 原子地修改过滤条件，返回新值
    pub fn update_filters(&self, f: impl FnOnce(&mut Filters)) -> Filters {
        let mut inner = self.write();
        f(&mut inner.filters);
        inner.filters
    }

    // ===== 收藏 =====

    pub fn is_favorite(&self, name: &str) -> bool {
        self.read().favorites.iter().any(|f| f == name)
    }

    /// 切换收藏状态，返回切换后是否为收藏
    pub fn toggle_favorite(&self, name: &str) -> bool {
        let mut inner = self.write();
        if let Some(pos) = inner.favorites.iter().position(|f| f == name) {
            inner.favorites.remove(pos);
            false
        } else {
            inner.favorites.push(name.to_string());
            true
        }
    }

    pub fn favorites(&self) -> Vec<String> {
        self.read().favorites.clone()
    }
}
