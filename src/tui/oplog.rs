//! 操作日志：只追加、有上限的环形缓冲

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::ops::Range;

/// 日志级别，仅影响渲染颜色，不参与控制流
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    /// 按文本内容归类
    pub fn classify(text: &str) -> Self {
        if text.contains("Error") || text.contains("error") || text.contains('✗') {
            LogLevel::Error
        } else if text.contains("Success") || text.contains('✓') {
            LogLevel::Success
        } else if text.contains("Warning") || text.contains('⚠') {
            LogLevel::Warning
        } else {
            LogLevel::Info
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub text: String,
    pub level: LogLevel,
}

#[derive(Debug)]
pub struct OperationLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    /// None = 跟随最新；Some(n) = 第一条可见日志的下标
    scroll: Option<usize>,
}

impl OperationLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            scroll: None,
        }
    }

    /// 追加一条日志，超出上限时丢弃最旧的
    pub fn push(&mut self, text: impl Into<String>) {
        let text = text.into();
        let level = LogLevel::classify(&text);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            if let Some(offset) = self.scroll.as_mut() {
                *offset = offset.saturating_sub(1);
            }
        }
        self.entries.push_back(LogEntry {
            at: Local::now(),
            text,
            level,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn is_following(&self) -> bool {
        self.scroll.is_none()
    }

    /// 当前应显示的区间，偏移量钳制在 [0, len - visible]
    pub fn visible_range(&self, visible: usize) -> Range<usize> {
        let max_start = self.entries.len().saturating_sub(visible);
        let start = self.scroll.map_or(max_start, |s| s.min(max_start));
        start..(start + visible).min(self.entries.len())
    }

    pub fn visible(&self, visible: usize) -> impl Iterator<Item = &LogEntry> {
        let range = self.visible_range(visible);
        self.entries.range(range)
    }

    /// 向更早的日志滚动
    pub fn scroll_back(&mut self, lines: usize, visible: usize) {
        let start = self.visible_range(visible).start;
        self.scroll = Some(start.saturating_sub(lines));
    }

    /// 向更新的日志滚动，到底后恢复跟随
    pub fn scroll_forward(&mut self, lines: usize, visible: usize) {
        let max_start = self.entries.len().saturating_sub(visible);
        let start = self.visible_range(visible).start + lines;
        self.scroll = if start >= max_start { None } else { Some(start) };
    }

    pub fn follow(&mut self) {
        self.scroll = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(LogLevel::classify("Error: brew install failed"), LogLevel::Error);
        assert_eq!(LogLevel::classify("✓ Upgraded wget"), LogLevel::Success);
        assert_eq!(LogLevel::classify("⚠ Found 3 outdated packages"), LogLevel::Warning);
        assert_eq!(LogLevel::classify("Warning: unbrewed dylibs"), LogLevel::Warning);
        assert_eq!(LogLevel::classify("→ Upgrading wget..."), LogLevel::Info);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut log = OperationLog::new(1000);
        for i in 1..=1001 {
            log.push(format!("entry {i}"));
        }
        assert_eq!(log.len(), 1000);
        assert_eq!(log.entries().next().unwrap().text, "entry 2");
        assert!(log.entries().all(|e| e.text != "entry 1"));
        assert_eq!(log.last().unwrap().text, "entry 1001");
    }

    #[test]
    fn test_tail_follow() {
        let mut log = OperationLog::new(10);
        for i in 0..8 {
            log.push(format!("{i}"));
        }
        let shown: Vec<_> = log.visible(3).map(|e| e.text.clone()).collect();
        assert_eq!(shown, vec!["5", "6", "7"]);
        assert_eq!(log.visible_range(20), 0..8);
    }

    #[test]
    fn test_scroll_back_clamps() {
        let mut log = OperationLog::new(10);
        for i in 0..8 {
            log.push(format!("{i}"));
        }
        log.scroll_back(2, 3);
        assert_eq!(log.visible_range(3), 3..6);
        log.scroll_back(100, 3);
        assert_eq!(log.visible_range(3), 0..3);
        assert!(!log.is_following());

        // 新日志不会把视图拉回底部
        log.push("8");
        assert_eq!(log.visible_range(3), 0..3);

        log.scroll_forward(100, 3);
        assert!(log.is_following());
        assert_eq!(log.visible_range(3), 6..9);
    }
}
