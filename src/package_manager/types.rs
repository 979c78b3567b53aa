//! PackageManager 相关数据类型定义

/// 包类型：formula 或 cask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageType {
    Formula,
    Cask,
}

impl PackageType {
    pub fn label(&self) -> &'static str {
        match self {
            PackageType::Formula => "Formula",
            PackageType::Cask => "Cask",
        }
    }

    pub fn is_cask(&self) -> bool {
        matches!(self, PackageType::Cask)
    }
}

/// 列表 / 搜索结果条目
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub kind: PackageType,
    pub installed: bool,
    pub outdated: bool,
    /// 可升级时的目标版本
    pub latest_version: Option<String>,
    pub pinned: bool,
}

impl Package {
    pub fn new(name: impl Into<String>, kind: PackageType) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            kind,
            installed: false,
            outdated: false,
            latest_version: None,
            pinned: false,
        }
    }

    /// 选中时刻的身份快照
    pub fn to_ref(&self) -> PackageRef {
        PackageRef {
            name: self.name.clone(),
            kind: self.kind,
        }
    }
}

/// 包身份的不可变快照（名称 + 类型），用于请求详情
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub name: String,
    pub kind: PackageType,
}

/// 包详情，所有字段均可能缺失（解析尽力而为）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageDetail {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub dependencies: Vec<String>,
    pub build_dependencies: Vec<String>,
    pub caveats: Option<String>,
}

/// 可升级的包
#[derive(Debug, Clone, PartialEq)]
pub struct OutdatedPackage {
    pub name: String,
    pub current_version: String,
    pub latest_version: String,
    pub pinned: bool,
}

/// 第三方仓库 (tap)
#[derive(Debug, Clone, PartialEq)]
pub struct Tap {
    pub name: String,
    pub official: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    pub cask: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UninstallOptions {
    pub cask: bool,
}
