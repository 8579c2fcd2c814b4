//! 매초 `TimeChanged`를 발행하는 시계 컴포넌트

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use log::{error, info, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::core::{ApplicationContext, BoxError, Component, ComponentDescriptor};
use crate::demo::time::{ClockTime, TimeChanged};
use crate::events::EventBus;

const TICK: Duration = Duration::from_secs(1);

#[derive(Default)]
pub struct Clock {
    ticking: AtomicBool,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Clock {
    pub fn now(&self) -> ClockTime {
        ClockTime::now()
    }

    pub fn time_after(&self, delay: Duration) -> ClockTime {
        ClockTime::after(delay)
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }
}

impl Component for Clock {
    /// Tokio 런타임 안에서 시작된 경우에만 틱 태스크를 띄웁니다.
    fn initialize(&self, ctx: &ApplicationContext) -> Result<(), BoxError> {
        let Ok(handle) = Handle::try_current() else {
            warn!("⏰ No Tokio runtime available; the clock will not tick");
            return Ok(());
        };

        let task = handle.spawn(tick(ctx.events().clone()));
        *self.ticker.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        self.ticking.store(true, Ordering::Release);
        info!("⏰ Clock started");
        Ok(())
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        let ticker = self.ticker.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = ticker.take() {
            task.abort();
        }
    }
}

async fn tick(bus: EventBus) {
    let mut interval = tokio::time::interval(TICK);
    loop {
        interval.tick().await;
        let bus = bus.clone();
        let time = ClockTime::now();
        // 느린 핸들러가 다음 틱을 밀어내지 않도록 분리
        tokio::spawn(async move {
            if let Err(e) = bus.notify_async(TimeChanged { time }).await {
                error!("TimeChanged({}) handling failed: {}", time, e);
            }
        });
    }
}

pub fn clock_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::of::<Clock>().build()
}

crate::submit_component!(clock_descriptor);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ComponentTable;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_clock_without_runtime_does_not_tick() {
        let ctx = ApplicationContext::with_table(ComponentTable::new().with(clock_descriptor()));

        ctx.start().unwrap();

        assert!(!ctx.get_component::<Clock>().unwrap().is_ticking());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_clock_publishes_time_changed() {
        let ctx = ApplicationContext::with_table(ComponentTable::new().with(clock_descriptor()));
        let ticks = Arc::new(AtomicUsize::new(0));
        {
            let ticks = ticks.clone();
            ctx.subscribe("count", move |_: &TimeChanged| {
                ticks.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        }

        ctx.start().unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(ctx.get_component::<Clock>().unwrap().is_ticking());
        assert!(ticks.load(Ordering::SeqCst) >= 1);
    }
}
