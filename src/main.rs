mod config;
mod package_manager;
mod store;
mod tui;

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use store::{Filters, Store};

/// 日志写到文件，终端处于 raw 模式时不能往 stderr 打印
fn init_logging() -> Result<()> {
    let dir = config::config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("创建 {} 失败", dir.display()))?;
    let file = File::create(dir.join("brewdash.log"))?;

    let env = env_logger::Env::default()
        .filter_or("BREWDASH_LOG", "info")
        .write_style_or("BREWDASH_LOG_STYLE", "never");
    let mut builder = env_logger::Builder::from_env(env);
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }
    builder
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = init_logging() {
        eprintln!("日志初始化失败: {:#}", e);
    }

    // 加载配置
    let config = config::Config::load_or_default();
    let favorites_path = config::favorites_path();
    let favorites = config::load_favorites(&favorites_path).unwrap_or_else(|e| {
        log::warn!("读取收藏失败: {:#}", e);
        Vec::new()
    });

    let filters = Filters {
        show_formulae: config.show_formulae,
        show_casks: config.show_casks,
        ..Filters::default()
    };
    let store = Arc::new(Store::new(filters, favorites));

    let result = tui::run(config, Arc::clone(&store)).await;
    finish_session(result, &store, &favorites_path)
}

/// 退出时再保存一次收藏；事件循环出错也要先保存再返回错误
fn finish_session(result: Result<()>, store: &Store, favorites_path: &Path) -> Result<()> {
    let saved = config::save_favorites(favorites_path, &store.favorites());
    if let Err(e) = &saved {
        log::warn!("保存收藏失败: {:#}", e);
    }
    result.and(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorites_saved_when_event_loop_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        let store = Store::new(Filters::default(), vec!["wget".into()]);

        let err = finish_session(Err(anyhow::anyhow!("draw failed")), &store, &path).unwrap_err();
        assert_eq!(err.to_string(), "draw failed");
        assert_eq!(config::load_favorites(&path).unwrap(), vec!["wget"]);
    }

    #[test]
    fn test_clean_exit_saves_favorites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("favorites.json");
        let store = Store::new(Filters::default(), Vec::new());
        store.toggle_favorite("git");

        finish_session(Ok(()), &store, &path).unwrap();
        assert_eq!(config::load_favorites(&path).unwrap(), vec!["git"]);
    }
}
