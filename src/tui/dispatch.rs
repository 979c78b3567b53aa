//! 把控制器返回的 `Effect` 变成实际工作
//!
//! 定时器用 `tokio::time::sleep`，brew 调用放进 `spawn_blocking`；
//! 每个异步工作结束后恰好向事件循环发送一个 `AppEvent`。

use super::state::{AppEvent, Effect, OperationOutput, PendingAction};
use crate::config;
use crate::package_manager::{InstallOptions, PackageClient, UninstallOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Dispatcher {
    client: Arc<dyn PackageClient>,
    tx: mpsc::Sender<AppEvent>,
    favorites_path: PathBuf,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn PackageClient>,
        tx: mpsc::Sender<AppEvent>,
        favorites_path: PathBuf,
    ) -> Self {
        Self {
            client,
            tx,
            favorites_path,
        }
    }

    pub fn dispatch(&self, effect: Effect) {
        log::debug!("effect: {:?}", effect);
        match effect {
            Effect::ScheduleDebounce { token, delay } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(AppEvent::DebounceElapsed { token }).await;
                });
            }
            Effect::LoadDetail { token, package } => self.spawn_call(
                move |client| {
                    client
                        .info(&package.name, package.kind.is_cask())
                        .map_err(|e| e.to_string())
                },
                move |result| AppEvent::DetailLoaded { token, result },
            ),
            Effect::LoadInstalled => self.spawn_call(
                |client| client.list_installed().map_err(|e| e.to_string()),
                AppEvent::InstalledLoaded,
            ),
            Effect::LoadOutdated => self.spawn_call(
                |client| Ok(client.outdated()),
                |result| AppEvent::OutdatedLoaded(result.unwrap_or_default()),
            ),
            Effect::LoadTaps => self.spawn_call(
                |client| client.list_taps().map_err(|e| e.to_string()),
                AppEvent::TapsLoaded,
            ),
            Effect::Search(query) => {
                let q = query.clone();
                self.spawn_call(
                    move |client| client.search(&q).map_err(|e| e.to_string()),
                    move |result| AppEvent::SearchFinished { query, result },
                )
            }
            Effect::Execute(action) => {
                let work = action.clone();
                self.spawn_call(
                    move |client| execute(client, &work),
                    move |result| AppEvent::OperationFinished { action, result },
                )
            }
            Effect::SaveFavorites(favorites) => {
                if let Err(e) = config::save_favorites(&self.favorites_path, &favorites) {
                    log::warn!("保存收藏失败: {:#}", e);
                }
            }
        }
    }

    /// 在阻塞线程池里调用客户端，结果包装成事件送回
    fn spawn_call<T, W, E>(&self, work: W, into_event: E)
    where
        T: Send + 'static,
        W: FnOnce(&dyn PackageClient) -> Result<T, String> + Send + 'static,
        E: FnOnce(Result<T, String>) -> AppEvent + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || work(client.as_ref()))
                .await
                .unwrap_or_else(|e| Err(format!("task failed: {e}")));
            let _ = tx.send(into_event(result)).await;
        });
    }
}

/// 已确认的操作对应的客户端调用
fn execute(client: &dyn PackageClient, action: &PendingAction) -> Result<OperationOutput, String> {
    let result = match action {
        PendingAction::Install(pkg) => client.install(
            &pkg.name,
            InstallOptions {
                cask: pkg.kind.is_cask(),
            },
        ),
        PendingAction::Uninstall(pkg) => client.uninstall(
            &pkg.name,
            UninstallOptions {
                cask: pkg.kind.is_cask(),
            },
        ),
        PendingAction::Upgrade(name) => client.upgrade(std::slice::from_ref(name)),
        PendingAction::UpgradeAll(_) => client.upgrade(&[]),
        PendingAction::Doctor => {
            return client
                .doctor()
                .map(OperationOutput::Report)
                .map_err(|e| e.to_string())
        }
        PendingAction::Cleanup => client.cleanup(),
        PendingAction::Autoremove => client.autoremove(),
        PendingAction::TapAdd(name) => client.tap_add(name),
        PendingAction::TapRemove(name) => client.tap_remove(name),
        PendingAction::Pin(name) => client.pin(name),
        PendingAction::Unpin(name) => client.unpin(name),
    };
    result
        .map(|_| OperationOutput::Done)
        .map_err(|e| e.to_string())
}
