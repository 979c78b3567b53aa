mod controller;
mod dashboard;
mod debounce;
mod dialog;
mod dispatch;
mod input;
mod layout;
mod oplog;
pub mod state;
mod theme;

use crate::config::{self, Config};
use crate::package_manager::BrewClient;
use crate::store::Store;
use anyhow::Result;
use controller::{Controller, Settings};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dispatch::Dispatcher;
use ratatui::{backend::CrosstermBackend, Terminal};
use state::AppEvent;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// 旋转指示器每帧间隔
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

pub async fn run(config: Config, store: Arc<Store>) -> Result<()> {
    // 终端初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &config, store).await;

    // 恢复终端
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    store: Arc<Store>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(32);
    let client = Arc::new(BrewClient::new(config.brew_command.clone()));
    let dispatcher = Dispatcher::new(client, tx, config::favorites_path());
    let mut controller = Controller::new(store, Settings::from_config(config));
    let started = Instant::now();

    let size = terminal.size()?;
    let mut effects = controller.handle(AppEvent::Resize(size.width, size.height));
    effects.extend(controller.init());
    log::info!("session started, brew = {}", config.brew_command);

    // 主循环
    loop {
        for effect in effects.drain(..) {
            dispatcher.dispatch(effect);
        }
        if controller.should_quit() {
            break;
        }

        let frame = (started.elapsed().as_millis() / SPINNER_INTERVAL.as_millis()) as usize;
        terminal.draw(|f| dashboard::render_dashboard(f, &controller, frame))?;

        // 处理终端事件
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => effects.extend(controller.handle(AppEvent::Key(key))),
                Event::Resize(width, height) => {
                    effects.extend(controller.handle(AppEvent::Resize(width, height)))
                }
                _ => {}
            }
        }

        // 处理异步事件
        while let Ok(event) = rx.try_recv() {
            effects.extend(controller.handle(event));
        }
    }

    log::info!("session ended");
    Ok(())
}
