//! 데모 이벤트와 시각 타입

use std::fmt;
use std::time::Duration;

use chrono::{Local, Timelike};

use crate::events::Event;

/// 초 단위 벽시계 시각
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self { hour, minute, second }
    }

    pub fn now() -> Self {
        Self::from_time(&Local::now())
    }

    /// 현재 시각에서 `delay`만큼 지난 시각
    pub fn after(delay: Duration) -> Self {
        let delay = chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        Self::from_time(&(Local::now() + delay))
    }

    pub fn from_time<T: Timelike>(time: &T) -> Self {
        Self::new(time.hour(), time.minute(), time.second())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// 시계가 매초 발행하는 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeChanged {
    pub time: ClockTime,
}

impl Event for TimeChanged {}

/// 알람 시각에 도달했을 때 발행되는 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRang {
    pub time: ClockTime,
}

impl Event for AlarmRang {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_display_pads_fields() {
        assert_eq!(ClockTime::new(7, 5, 9).to_string(), "07:05:09");
    }

    #[test]
    fn test_from_time_drops_subseconds() {
        let time = NaiveTime::from_hms_milli_opt(23, 59, 58, 750).unwrap();

        assert_eq!(ClockTime::from_time(&time), ClockTime::new(23, 59, 58));
    }
}
