//! 알람에 반응하는 시계들
//!
//! `Ringer`는 생성자가 없는 추상 타입으로 테이블에 올라가며, 발견 단계에서 제외됩니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::info;

use crate::core::errors::HandlerResult;
use crate::core::{Component, ComponentDescriptor};
use crate::demo::time::{AlarmRang, ClockTime};
use crate::events::AsyncListener;

const SNOOZE: Duration = Duration::from_secs(2);

pub trait Ringer: Send + Sync {
    fn sound(&self) -> &'static str;

    fn rings(&self) -> usize;
}

pub struct RegularClock {
    snooze: Duration,
    rings: AtomicUsize,
}

impl RegularClock {
    pub fn with_snooze(snooze: Duration) -> Self {
        Self {
            snooze,
            rings: AtomicUsize::new(0),
        }
    }
}

impl Default for RegularClock {
    fn default() -> Self {
        Self::with_snooze(SNOOZE)
    }
}

impl Ringer for RegularClock {
    fn sound(&self) -> &'static str {
        "Pi Pi Pi Pi"
    }

    fn rings(&self) -> usize {
        self.rings.load(Ordering::SeqCst)
    }
}

impl Component for RegularClock {}

#[async_trait]
impl AsyncListener<AlarmRang> for RegularClock {
    async fn on_event(&self, _event: &AlarmRang) -> HandlerResult {
        self.rings.fetch_add(1, Ordering::SeqCst);
        info!("[{}] {}!", ClockTime::now(), self.sound());
        info!("[{}] Snoring...", ClockTime::now());
        tokio::time::sleep(self.snooze).await;
        info!("[{}] {}!!!!", ClockTime::now(), self.sound());
        info!("[{}] Oh no, I'm late!", ClockTime::now());
        Ok(())
    }
}

#[derive(Default)]
pub struct CucoClock {
    rings: AtomicUsize,
}

impl Ringer for CucoClock {
    fn sound(&self) -> &'static str {
        "Cuco, Cuco"
    }

    fn rings(&self) -> usize {
        self.rings.load(Ordering::SeqCst)
    }
}

impl Component for CucoClock {}

#[async_trait]
impl AsyncListener<AlarmRang> for CucoClock {
    async fn on_event(&self, event: &AlarmRang) -> HandlerResult {
        self.rings.fetch_add(1, Ordering::SeqCst);
        info!("[{}] {}! It's {}!", ClockTime::now(), self.sound(), event.time);
        Ok(())
    }
}

pub fn ringer_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::abstract_type::<dyn Ringer>()
}

pub fn regular_clock_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::of::<RegularClock>()
        .listen_async::<AlarmRang>("on_alarm_rang")
        .build()
}

pub fn cuco_clock_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::of::<CucoClock>()
        .listen_async::<AlarmRang>("on_alarm_rang")
        .build()
}

crate::submit_component!(ringer_descriptor);
crate::submit_component!(regular_clock_descriptor);
crate::submit_component!(cuco_clock_descriptor);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ApplicationContext, ComponentTable, Identity};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_both_clocks_ring_concurrently() {
        let ctx = ApplicationContext::with_table(
            ComponentTable::new()
                .with(ringer_descriptor())
                .with(
                    ComponentDescriptor::from_factory(|| Ok(RegularClock::with_snooze(Duration::ZERO)))
                        .listen_async::<AlarmRang>("on_alarm_rang"),
                )
                .with(cuco_clock_descriptor()),
        );
        ctx.start().unwrap();

        ctx.notify_async(AlarmRang {
            time: ClockTime::new(9, 0, 0),
        })
        .await
        .unwrap();

        assert_eq!(ctx.get_component::<RegularClock>().unwrap().rings(), 1);
        assert_eq!(ctx.get_component::<CucoClock>().unwrap().rings(), 1);
        assert!(!ctx.registry().contains(&Identity::of::<dyn Ringer>()));
    }

    #[test]
    fn test_blocking_notify_outside_runtime_rings_regular_clock() {
        let ctx = ApplicationContext::with_table(ComponentTable::new().with(
            ComponentDescriptor::from_factory(|| Ok(RegularClock::with_snooze(Duration::from_millis(10))))
                .listen_async::<AlarmRang>("on_alarm_rang"),
        ));
        ctx.start().unwrap();

        ctx.notify(AlarmRang {
            time: ClockTime::new(9, 30, 0),
        })
        .unwrap();

        assert_eq!(ctx.get_component::<RegularClock>().unwrap().rings(), 1);
    }

    #[test]
    fn test_handler_names_follow_owner() {
        let ctx = ApplicationContext::with_table(ComponentTable::new().with(cuco_clock_descriptor()));
        ctx.start().unwrap();

        let handlers = ctx.events().handlers_for(&Identity::of::<AlarmRang>());

        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].name, "CucoClock.on_alarm_rang");
    }
}
