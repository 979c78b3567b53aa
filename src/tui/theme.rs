//! Homebrew 配色，全局统一使用

use super::oplog::LogLevel;
use ratatui::style::Color;

/// 琥珀色（Homebrew 啤酒）
pub const AMBER: Color = Color::Rgb(251, 176, 64);
/// 蓝色（版本号、formula）
pub const BLUE: Color = Color::Rgb(91, 206, 250);
/// 选中行背景色
pub const SEL_BG: Color = Color::Rgb(45, 35, 55);
/// 亮白色
pub const BRIGHT_WHITE: Color = Color::Rgb(255, 255, 255);
/// 暗灰色（次要信息）
pub const DIM: Color = Color::Rgb(130, 130, 140);
/// 描述文字灰色（选中行内）
pub const DESC_DIM: Color = Color::Rgb(180, 180, 190);
/// 可升级标记
pub const WARN: Color = Color::Rgb(255, 200, 87);
/// 成功 / 已安装标记
pub const OK: Color = Color::Rgb(126, 214, 126);
/// 错误
pub const ERR: Color = Color::Rgb(240, 98, 98);

pub fn log_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Info => DESC_DIM,
        LogLevel::Success => OK,
        LogLevel::Warning => WARN,
        LogLevel::Error => ERR,
    }
}
