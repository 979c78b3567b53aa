//! 包管理器模块 — 对 brew 命令行的封装

pub mod executor;
pub mod parser;
pub mod types;

// 重新导出常用类型
pub use executor::BrewError;
pub use types::{
    InstallOptions, OutdatedPackage, Package, PackageDetail, PackageRef, PackageType, Tap,
    UninstallOptions,
};

use parser::{parse_list_versions, parse_outdated, parse_package_info, parse_search_results, parse_taps};

/// 包管理器客户端契约
///
/// 所有方法都是阻塞调用，由调度器放到 `spawn_blocking` 中执行，
/// 每次调用恰好产生一个完成事件。
pub trait PackageClient: Send + Sync {
    fn list_installed(&self) -> Result<Vec<Package>, BrewError>;
    fn search(&self, query: &str) -> Result<Vec<Package>, BrewError>;
    fn info(&self, name: &str, cask: bool) -> Result<PackageDetail, BrewError>;
    fn install(&self, name: &str, opts: InstallOptions) -> Result<(), BrewError>;
    fn uninstall(&self, name: &str, opts: UninstallOptions) -> Result<(), BrewError>;
    /// 空列表表示升级全部
    fn upgrade(&self, names: &[String]) -> Result<(), BrewError>;
    /// 失败时返回空列表，从不报错
    fn outdated(&self) -> Vec<OutdatedPackage>;
    fn doctor(&self) -> Result<String, BrewError>;
    fn cleanup(&self) -> Result<(), BrewError>;
    fn autoremove(&self) -> Result<(), BrewError>;
    fn list_taps(&self) -> Result<Vec<Tap>, BrewError>;
    fn tap_add(&self, name: &str) -> Result<(), BrewError>;
    fn tap_remove(&self, name: &str) -> Result<(), BrewError>;
    fn pin(&self, name: &str) -> Result<(), BrewError>;
    fn unpin(&self, name: &str) -> Result<(), BrewError>;
}

#[derive(Debug, Clone)]
pub struct BrewClient {
    pub command: String,
}

impl BrewClient {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, BrewError> {
        executor::run(&self.command, args)
    }
}

impl PackageClient for BrewClient {
    fn list_installed(&self) -> Result<Vec<Package>, BrewError> {
        let mut packages =
            parse_list_versions(&self.run(&["list", "--formula", "--versions"])?, PackageType::Formula);
        packages.extend(parse_list_versions(
            &self.run(&["list", "--cask", "--versions"])?,
            PackageType::Cask,
        ));
        // pinned 只影响显示，查询失败时忽略
        match self.run(&["list", "--pinned"]) {
            Ok(out) => {
                let pinned: Vec<&str> = out.lines().map(str::trim).collect();
                for pkg in &mut packages {
                    pkg.pinned = pinned.contains(&pkg.name.as_str());
                }
            }
            Err(e) => log::debug!("brew list --pinned: {}", e),
        }
        Ok(packages)
    }

    fn search(&self, query: &str) -> Result<Vec<Package>, BrewError> {
        Ok(parse_search_results(&self.run(&["search", query])?))
    }

    fn info(&self, name: &str, cask: bool) -> Result<PackageDetail, BrewError> {
        let mut args = vec!["info", name];
        if cask {
            args.push("--cask");
        }
        Ok(parse_package_info(&self.run(&args)?, name))
    }

    fn install(&self, name: &str, opts: InstallOptions) -> Result<(), BrewError> {
        let mut args = vec!["install", name];
        if opts.cask {
            args.push("--cask");
        }
        self.run(&args).map(|_| ())
    }

    fn uninstall(&self, name: &str, opts: UninstallOptions) -> Result<(), BrewError> {
        let mut args = vec!["uninstall", name];
        if opts.cask {
            args.push("--cask");
        }
        self.run(&args).map(|_| ())
    }

    fn upgrade(&self, names: &[String]) -> Result<(), BrewError> {
        let mut args = vec!["upgrade"];
        args.extend(names.iter().map(String::as_str));
        self.run(&args).map(|_| ())
    }

    fn outdated(&self) -> Vec<OutdatedPackage> {
        match self.run(&["outdated", "--verbose"]) {
            Ok(out) => parse_outdated(&out),
            Err(e) => {
                log::warn!("brew outdated: {}", e);
                Vec::new()
            }
        }
    }

    fn doctor(&self) -> Result<String, BrewError> {
        // 有警告时 brew doctor 以 1 退出，报告本身仍然有效
        let output = executor::run_unchecked(&self.command, &["doctor"])?;
        Ok(output.combined_output())
    }

    fn cleanup(&self) -> Result<(), BrewError> {
        self.run(&["cleanup"]).map(|_| ())
    }

    fn autoremove(&self) -> Result<(), BrewError> {
        self.run(&["autoremove"]).map(|_| ())
    }

    fn list_taps(&self) -> Result<Vec<Tap>, BrewError> {
        Ok(parse_taps(&self.run(&["tap"])?))
    }

    fn tap_add(&self, name: &str) -> Result<(), BrewError> {
        self.run(&["tap", name]).map(|_| ())
    }

    fn tap_remove(&self, name: &str) -> Result<(), BrewError> {
        self.run(&["untap", name]).map(|_| ())
    }

    fn pin(&self, name: &str) -> Result<(), BrewError> {
        self.run(&["pin", name]).map(|_| ())
    }

    fn unpin(&self, name: &str) -> Result<(), BrewError> {
        self.run(&["unpin", name]).map(|_| ())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// 写一个假的 brew 脚本，按子命令回放固定输出
    fn fake_brew(dir: &tempfile::TempDir, body: &str) -> BrewClient {
        let path = dir.path().join("brew");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        BrewClient::new(path.display().to_string())
    }

    #[test]
    fn test_list_installed_merges_formulae_and_casks() {
        let dir = tempfile::tempdir().unwrap();
        let client = fake_brew(
            &dir,
            r#"case "$2" in
  --formula) echo "wget 1.20" ;;
  --cask) echo "firefox 120.0" ;;
  --pinned) echo "wget" ;;
esac"#,
        );
        let pkgs = client.list_installed().unwrap();
        assert_eq!(pkgs.len(), 2);
        assert_eq!(pkgs[0].kind, PackageType::Formula);
        assert!(pkgs[0].pinned);
        assert_eq!(pkgs[1].name, "firefox");
        assert!(!pkgs[1].pinned);
        assert_eq!(pkgs[1].kind, PackageType::Cask);
    }

    #[test]
    fn test_outdated_failure_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let client = fake_brew(&dir, "echo boom >&2; exit 1");
        assert!(client.outdated().is_empty());
    }

    #[test]
    fn test_doctor_returns_report_on_warning_exit() {
        let dir = tempfile::tempdir().unwrap();
        let client = fake_brew(&dir, "echo 'Warning: Some installed formulae are deprecated.' >&2; exit 1");
        let report = client.doctor().unwrap();
        assert!(report.contains("deprecated"));
    }

    #[test]
    fn test_install_and_uninstall_pass_cask_flag() {
        let dir = tempfile::tempdir().unwrap();
        let client = fake_brew(
            &dir,
            r#"case "$*" in
  "install firefox --cask"|"uninstall wget") ;;
  *) echo "bad args: $*" >&2; exit 1 ;;
esac"#,
        );
        client.install("firefox", InstallOptions { cask: true }).unwrap();
        client.uninstall("wget", UninstallOptions::default()).unwrap();
        let err = client.install("wget", InstallOptions::default()).unwrap_err();
        assert!(err.to_string().contains("bad args: install wget"));
    }

    #[test]
    fn test_tap_add_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let client = fake_brew(
            &dir,
            r#"case "$*" in
  "tap acme/tools"|"untap acme/tools") ;;
  *) echo "bad args: $*" >&2; exit 1 ;;
esac"#,
        );
        client.tap_add("acme/tools").unwrap();
        client.tap_remove("acme/tools").unwrap();
        assert!(client.tap_remove("acme/other").is_err());
    }

    #[test]
    fn test_upgrade_passes_names() {
        let dir = tempfile::tempdir().unwrap();
        let client = fake_brew(&dir, r#"[ "$1 $2" = "upgrade wget" ] || { echo "bad args: $*" >&2; exit 1; }"#);
        client.upgrade(&["wget".to_string()]).unwrap();
        let err = client.upgrade(&[]).unwrap_err();
        assert!(err.to_string().contains("bad args: upgrade"));
    }
}
