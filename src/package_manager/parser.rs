//! 输出解析函数
//!
//! brew 的文本输出并不稳定，这里的解析全部尽力而为：
//! 缺失的字段保持为空，而不是让整个操作失败。

use super::types::{OutdatedPackage, Package, PackageDetail, PackageType, Tap};

/// 清理终端输出中的 ANSI 转义序列和特殊字符
pub fn clean_terminal_output(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\r' => {
                if chars.peek() != Some(&'\n') && !result.ends_with('\n') {
                    result.push('\n');
                }
            }
            c if c.is_control() && c != '\n' && c != '\t' => {}
            _ => result.push(c),
        }
    }

    let mut cleaned_lines = Vec::new();
    let mut prev_empty = false;

    for line in result.lines() {
        let is_empty = line.trim().is_empty();
        if is_empty && prev_empty {
            continue;
        }
        cleaned_lines.push(line);
        prev_empty = is_empty;
    }

    cleaned_lines.join("\n")
}

/// 解析 `brew list --formula|--cask --versions`
/// 格式: "name 1.2.3" 或 "name 1.2.3 1.2.4"（多个版本时取第一个）
pub fn parse_list_versions(output: &str, kind: PackageType) -> Vec<Package> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let mut pkg = Package::new(name, kind);
            pkg.version = fields.next().unwrap_or_default().to_string();
            pkg.installed = true;
            Some(pkg)
        })
        .collect()
}

/// 解析 `brew search` 的输出
///
/// 输出在终端下带 "==> Formulae" / "==> Casks" 分段标题，
/// 管道模式下可能没有标题，此时全部视为 formula。
pub fn parse_search_results(output: &str) -> Vec<Package> {
    let mut results = Vec::new();
    let mut current = PackageType::Formula;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.contains("Formulae") {
            current = PackageType::Formula;
            continue;
        }
        if trimmed.contains("Casks") {
            current = PackageType::Cask;
            continue;
        }
        if trimmed.starts_with('=') {
            continue;
        }
        // 某些版本会在已安装的条目后附加 ✔
        let installed = trimmed.ends_with('✔');
        let name = trimmed.trim_end_matches('✔').trim();
        if name.is_empty() {
            continue;
        }
        let mut pkg = Package::new(name, current);
        pkg.installed = installed;
        results.push(pkg);
    }

    results
}

/// 解析 `brew info [--cask] <name>` 的文本输出
pub fn parse_package_info(output: &str, name: &str) -> PackageDetail {
    let mut detail = PackageDetail {
        name: name.to_string(),
        ..PackageDetail::default()
    };

    let lines: Vec<&str> = output.lines().collect();

    // 首行: "==> wget: stable 1.21.4 (bottled), HEAD"
    if let Some(first) = lines.first() {
        if let Some((_, rest)) = first.split_once(':') {
            let mut words = rest.split_whitespace();
            let version = match words.next() {
                Some("stable") => words.next(),
                other => other,
            };
            if let Some(v) = version {
                let v = v.trim_end_matches(',');
                if !v.is_empty() {
                    detail.version = Some(v.to_string());
                }
            }
        }
    }

    let mut section = "";
    let mut caveats: Vec<&str> = Vec::new();

    for raw in lines.iter().skip(1) {
        let line = raw.trim();

        if let Some(title) = line.strip_prefix("==>") {
            section = title.trim();
            continue;
        }

        match section {
            "Dependencies" => {
                if let Some(deps) = line.strip_prefix("Required:") {
                    detail.dependencies.extend(split_dependency_list(deps));
                } else if let Some(deps) = line.strip_prefix("Build:") {
                    detail.build_dependencies.extend(split_dependency_list(deps));
                }
            }
            "Caveats" => caveats.push(line),
            "" => {
                if line.is_empty() {
                    continue;
                }
                if line.starts_with("http") {
                    if detail.homepage.is_none() && !line.contains("github.com/Homebrew") {
                        detail.homepage = Some(line.to_string());
                    }
                    continue;
                }
                if detail.description.is_none() && looks_like_description(raw) {
                    detail.description = Some(line.to_string());
                }
            }
            _ => {}
        }
    }

    let caveats = caveats.join("\n").trim().to_string();
    if !caveats.is_empty() {
        detail.caveats = Some(caveats);
    }

    detail
}

/// 描述行：非路径、非元数据、非缩进
fn looks_like_description(raw: &str) -> bool {
    const SKIP_PREFIXES: &[&str] = &[
        "/", "From:", "License:", "Installed", "Not installed", "Required:", "Build:",
    ];
    if raw.starts_with(' ') || raw.starts_with('\t') {
        return false;
    }
    let line = raw.trim();
    !SKIP_PREFIXES.iter().any(|p| line.starts_with(p)) && !line.contains("==")
}

/// "libidn2 ✔, openssl@3 ✘" → ["libidn2", "openssl@3"]
fn split_dependency_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|dep| {
            dep.trim()
                .trim_end_matches('✔')
                .trim_end_matches('✘')
                .trim()
                .to_string()
        })
        .filter(|dep| !dep.is_empty())
        .collect()
}

/// 解析 `brew outdated --verbose`
/// 格式: "git (2.39.0) < 2.39.1"，也容忍只有包名的行
pub fn parse_outdated(output: &str) -> Vec<OutdatedPackage> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let name = parts.first()?;
            let mut pkg = OutdatedPackage {
                name: name.to_string(),
                current_version: String::new(),
                latest_version: String::new(),
                pinned: line.contains("[pinned"),
            };
            if let Some(pos) = parts.iter().position(|p| *p == "<") {
                pkg.current_version = parts[1..pos]
                    .join(" ")
                    .trim_matches(|c| c == '(' || c == ')')
                    .to_string();
                if let Some(latest) = parts.get(pos + 1) {
                    pkg.latest_version = latest.to_string();
                }
            }
            Some(pkg)
        })
        .collect()
}

/// 解析 `brew tap`
pub fn parse_taps(output: &str) -> Vec<Tap> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Tap {
            name: line.to_string(),
            official: line.starts_with("homebrew/"),
        })
        .collect()
}
