//! 지정된 시각에 `AlarmRang`을 발행하는 알람 컴포넌트

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info};
use once_cell::sync::OnceCell;

use crate::core::errors::HandlerResult;
use crate::core::{ApplicationContext, BoxError, Component, ComponentDescriptor, Inject};
use crate::demo::clock::Clock;
use crate::demo::time::{AlarmRang, ClockTime, TimeChanged};
use crate::events::EventBus;

#[derive(Default)]
pub struct Alarm {
    times: Mutex<HashSet<ClockTime>>,
    bus: OnceCell<EventBus>,
    clock: Inject<Clock>,
}

impl Alarm {
    pub fn add_alarm(&self, time: ClockTime) {
        self.times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(time);
        info!("⏰ Added a new alarm for {}", time);
    }

    /// 주입된 시계 기준으로 `delay` 뒤에 알람을 설정합니다.
    ///
    /// 시계가 주입되지 않았다면 `None`입니다.
    pub fn add_alarm_after(&self, delay: Duration) -> Option<ClockTime> {
        let time = self.clock.get()?.time_after(delay);
        self.add_alarm(time);
        Some(time)
    }

    /// 아직 울리지 않은 알람 (시각 순)
    pub fn pending(&self) -> Vec<ClockTime> {
        let mut pending: Vec<ClockTime> = self
            .times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect();
        pending.sort();
        pending
    }

    async fn on_time_changed(self: Arc<Self>, event: Arc<TimeChanged>) -> HandlerResult {
        let matched = self
            .times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event.time);
        if !matched {
            return Ok(());
        }

        let Some(bus) = self.bus.get() else {
            debug!("Alarm for {} matched before initialization", event.time);
            return Ok(());
        };

        bus.notify_async_ignoring_sync(AlarmRang { time: event.time })
            .await?;
        Ok(())
    }
}

impl Component for Alarm {
    fn initialize(&self, ctx: &ApplicationContext) -> Result<(), BoxError> {
        if self.bus.set(ctx.events().clone()).is_err() {
            debug!("Alarm is already wired to an event bus");
        }
        Ok(())
    }
}

pub fn alarm_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::of::<Alarm>()
        .inject("clock", |alarm: &Alarm| &alarm.clock)
        .on_async(
            "on_time_changed",
            |alarm: Arc<Alarm>, event: Arc<TimeChanged>| alarm.on_time_changed(event),
        )
        .build()
}

crate::submit_component!(alarm_descriptor);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ComponentTable, Identity};
    use crate::demo::clock::clock_descriptor;
    use crate::demo::ringers::{CucoClock, Ringer, cuco_clock_descriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn alarm_context() -> ApplicationContext {
        ApplicationContext::with_table(
            ComponentTable::new()
                .with(alarm_descriptor())
                .with(cuco_clock_descriptor()),
        )
    }

    #[test]
    fn test_add_alarm_after_requires_clock() {
        let ctx = alarm_context();
        ctx.start().unwrap();

        let alarm = ctx.get_component::<Alarm>().unwrap();

        assert!(alarm.add_alarm_after(Duration::from_secs(5)).is_none());
        assert!(alarm.pending().is_empty());
    }

    #[test]
    fn test_add_alarm_after_uses_injected_clock() {
        let ctx = ApplicationContext::with_table(
            ComponentTable::new()
                .with(alarm_descriptor())
                .with(clock_descriptor()),
        );
        ctx.start().unwrap();

        let alarm = ctx.get_component::<Alarm>().unwrap();
        let time = alarm.add_alarm_after(Duration::from_secs(5)).unwrap();

        assert_eq!(alarm.pending(), vec![time]);
    }

    #[test]
    fn test_second_initialize_keeps_first_bus() {
        let ctx = alarm_context();
        ctx.start().unwrap();
        let alarm = ctx.get_component::<Alarm>().unwrap();
        let other = ApplicationContext::with_table(ComponentTable::new());

        alarm.initialize(&other).unwrap();

        let bus = alarm.bus.get().unwrap();
        assert_eq!(
            bus.handler_count(&Identity::of::<AlarmRang>()),
            ctx.events().handler_count(&Identity::of::<AlarmRang>())
        );
        assert_eq!(bus.handler_count(&Identity::of::<AlarmRang>()), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_matching_time_rings_once() {
        let ctx = alarm_context();
        ctx.start().unwrap();
        let alarm = ctx.get_component::<Alarm>().unwrap();
        let time = ClockTime::new(6, 30, 0);
        alarm.add_alarm(time);

        ctx.notify_async(TimeChanged { time }).await.unwrap();
        ctx.notify_async(TimeChanged { time }).await.unwrap();

        let cuco = ctx.get_component::<CucoClock>().unwrap();
        assert_eq!(cuco.rings(), 1);
        assert!(alarm.pending().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_alarm_rang_skips_sync_listeners() {
        let ctx = alarm_context();
        ctx.start().unwrap();
        let sync_hits = Arc::new(AtomicUsize::new(0));
        {
            let sync_hits = sync_hits.clone();
            ctx.subscribe("sync_listener", move |_: &AlarmRang| {
                sync_hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        }
        let time = ClockTime::new(7, 0, 0);
        ctx.get_component::<Alarm>().unwrap().add_alarm(time);

        ctx.notify_async(TimeChanged { time }).await.unwrap();

        assert_eq!(sync_hits.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.get_component::<CucoClock>().unwrap().rings(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_other_times_are_ignored() {
        let ctx = alarm_context();
        ctx.start().unwrap();
        let alarm = ctx.get_component::<Alarm>().unwrap();
        alarm.add_alarm(ClockTime::new(8, 0, 0));

        ctx.notify_async(TimeChanged {
            time: ClockTime::new(8, 0, 1),
        })
        .await
        .unwrap();

        assert_eq!(alarm.pending().len(), 1);
        assert_eq!(ctx.get_component::<CucoClock>().unwrap().rings(), 0);
    }
}
