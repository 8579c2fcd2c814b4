//! 데모 애플리케이션 설정
//!
//! 시계/알람 데모의 실행 시간을 환경 변수에서 읽어옵니다.

use std::env;
use std::time::Duration;

use log::warn;

/// 시작 후 알람이 울릴 때까지의 초
pub const ALARM_DELAY_KEY: &str = "DEMO_ALARM_DELAY_SECS";
/// 데모 전체 실행 시간 (초)
pub const RUN_SECS_KEY: &str = "DEMO_RUN_SECS";

const DEFAULT_ALARM_DELAY_SECS: u64 = 5;
const DEFAULT_RUN_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub alarm_delay: Duration,
    pub run_for: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            alarm_delay: Duration::from_secs(DEFAULT_ALARM_DELAY_SECS),
            run_for: Duration::from_secs(DEFAULT_RUN_SECS),
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            alarm_delay: Duration::from_secs(seconds(&lookup, ALARM_DELAY_KEY, DEFAULT_ALARM_DELAY_SECS)),
            run_for: Duration::from_secs(seconds(&lookup, RUN_SECS_KEY, DEFAULT_RUN_SECS)),
        }
    }
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return default;
    };

    value.trim().parse::<u64>().unwrap_or_else(|e| {
        warn!("{} 파싱 실패: {}. 기본값 {} 사용", key, e, default);
        default
    })
}
