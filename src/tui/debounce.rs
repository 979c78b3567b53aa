//! 详情加载的防抖与版本栅栏
//!
//! 每次选中变化都会递增令牌；延时触发和加载完成都只在令牌仍是最新时生效。

use super::state::Effect;
use crate::package_manager::PackageRef;
use std::time::Duration;

#[derive(Debug)]
pub struct DebounceGate {
    current: u64,
    pending: Option<PackageRef>,
    delay: Duration,
}

impl DebounceGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            current: 0,
            pending: None,
            delay,
        }
    }

    pub fn token(&self) -> u64 {
        self.current
    }

    /// 记录新的选中项，返回延时触发请求
    pub fn arm(&mut self, package: PackageRef) -> Effect {
        self.current += 1;
        self.pending = Some(package);
        Effect::ScheduleDebounce {
            token: self.current,
            delay: self.delay,
        }
    }

    /// 延时到期：令牌仍是最新时取出待加载的包
    pub fn fire(&mut self, token: u64) -> Option<PackageRef> {
        if token != self.current {
            return None;
        }
        self.pending.take()
    }

    /// 作废所有在途的触发与加载（例如列表变空）
    pub fn invalidate(&mut self) {
        self.current += 1;
        self.pending = None;
    }

    /// 加载完成的结果是否对应最近一次请求
    pub fn accepts(&self, token: u64) -> bool {
        token == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_manager::PackageType;

    fn pkg(name: &str) -> PackageRef {
        PackageRef {
            name: name.into(),
            kind: PackageType::Formula,
        }
    }

    fn token_of(effect: Effect) -> u64 {
        match effect {
            Effect::ScheduleDebounce { token, .. } => token,
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn test_only_last_arm_fires() {
        let mut gate = DebounceGate::new(Duration::from_millis(200));
        let t1 = token_of(gate.arm(pkg("git")));
        let t2 = token_of(gate.arm(pkg("hub")));
        assert!(t2 > t1);
        assert_eq!(gate.fire(t1), None);
        assert_eq!(gate.fire(t2), Some(pkg("hub")));
        // 同一令牌不会触发第二次
        assert_eq!(gate.fire(t2), None);
        assert!(gate.accepts(t2));
    }

    #[test]
    fn test_invalidate_rejects_in_flight() {
        let mut gate = DebounceGate::new(Duration::from_millis(200));
        let t = token_of(gate.arm(pkg("wget")));
        assert_eq!(gate.fire(t), Some(pkg("wget")));
        gate.invalidate();
        assert!(!gate.accepts(t));
    }
}
