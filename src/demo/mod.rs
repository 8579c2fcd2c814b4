//! # Clock / Alarm Demo
//!
//! 바이너리가 실행하는 예제 컴포넌트입니다. 모두 `submit_component!`로 제출되어
//! `ComponentTable::discover()`로 수집됩니다.
//!
//! ```text
//! Clock ──TimeChanged──▶ Alarm ──AlarmRang (async only)──▶ RegularClock
//!   (매초)                (시각 일치 시)                   └▶ CucoClock
//! ```

pub mod alarm;
pub mod clock;
pub mod ringers;
pub mod time;

pub use alarm::Alarm;
pub use clock::Clock;
pub use ringers::{CucoClock, RegularClock, Ringer};
pub use time::{AlarmRang, ClockTime, TimeChanged};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ComponentTable, Identity};

    #[test]
    fn test_discover_finds_demo_components() {
        let table = ComponentTable::discover();

        for identity in [
            Identity::of::<Alarm>(),
            Identity::of::<Clock>(),
            Identity::of::<RegularClock>(),
            Identity::of::<CucoClock>(),
            Identity::of::<dyn Ringer>(),
        ] {
            assert!(table.contains(&identity), "{} was not submitted", identity);
        }
    }
}
