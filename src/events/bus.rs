//! # Event Bus
//!
//! 이벤트 식별자별로 핸들러를 색인하고, 두 가지 방식으로 이벤트를 전달합니다.
//!
//! ## 전달 방식 비교
//!
//! | | [`EventBus::notify`] | [`EventBus::notify_async`] |
//! |---|---|---|
//! | 호출자 | 블로킹 | `await` 지점에서만 대기 |
//! | sync 핸들러 | 호출자 스레드, 등록 순서 | `spawn_blocking` 워커, 등록 순서 |
//! | async 핸들러 | 현재(또는 디스패치) 런타임에서 동시 실행 후 대기 | `tokio::spawn`으로 동시 실행 후 대기 |
//! | sync 실패 | **fail-fast**: 남은 핸들러 중단, 즉시 반환 | 남은 sync 핸들러 중단, 집계에 포함 |
//! | async 실패 | **fail-isolated**: 모두 끝난 뒤 집계 | **fail-isolated**: 모두 끝난 뒤 집계 |
//!
//! 실패가 하나면 [`EventError::Handler`], 둘 이상이면 [`EventError::Aggregate`]가 반환됩니다.
//! 핸들러가 하나도 없는 이벤트는 아무 일도 하지 않고 `Ok(())`를 반환합니다.
//!
//! ## 동시성
//!
//! 구독 인덱스는 `RwLock`으로 보호됩니다. 전달 시에는 핸들러 목록의 스냅샷을 복사한 뒤
//! 락을 해제하고 실행하므로, 핸들러 안에서 구독하거나 다른 이벤트를 발행해도 교착되지 않습니다.
//! [`EventBus::freeze`] 이후의 구독은 [`EventBus::reopen`] 전까지 거부됩니다.
//!
//! ## 블로킹 전달과 런타임
//!
//! | 호출 위치 | async 핸들러 구동 |
//! |-----------|-------------------|
//! | 멀티스레드 Tokio 런타임 | `block_in_place` + 현재 런타임의 `block_on` |
//! | 단일 스레드 Tokio 런타임 | 디스패치 런타임에 spawn 후 완료까지 대기 |
//! | 런타임 밖 | 디스패치 런타임에 spawn 후 완료까지 대기 |
//!
//! 디스패치 런타임은 처음 필요할 때 한 번 생성되는 프로세스 전역 멀티스레드 런타임입니다.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use futures::future::{BoxFuture, FutureExt, join_all};
use log::{debug, error, info};
use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

use crate::core::errors::{EventError, HandlerFault, HandlerResult};
use crate::core::identity::Identity;
use crate::events::handler::{
    Event, HandlerId, HandlerInfo, HandlerMode, HandlerRegistration, Invoker, panic_error,
};

type HandlerList = Vec<Arc<HandlerRegistration>>;

static DISPATCH_RUNTIME: OnceCell<Runtime> = OnceCell::new();

#[derive(Default)]
struct BusInner {
    index: RwLock<HashMap<Identity, HandlerList>>,
    frozen: AtomicBool,
    next_id: AtomicU64,
}

/// 이벤트 버스
///
/// 복제 비용이 낮은 핸들입니다. 복제본은 모두 같은 구독 인덱스를 공유하므로
/// 컴포넌트의 백그라운드 작업에 넘겨 이벤트를 발행할 수 있습니다.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 동기 클로저를 구독합니다.
    pub fn subscribe<E, F>(&self, name: &str, handler: F) -> Result<HandlerId, EventError>
    where
        E: Event,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert::<E>(name.to_string(), Invoker::sync(handler), true)
    }

    /// 비동기 클로저를 구독합니다.
    pub fn subscribe_async<E, F, Fut>(&self, name: &str, handler: F) -> Result<HandlerId, EventError>
    where
        E: Event,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert::<E>(name.to_string(), Invoker::async_fn(handler), true)
    }

    /// 수신자에 바인딩된 동기 핸들러를 구독합니다.
    ///
    /// 수신자가 이미 해제된 `Weak`이면 [`EventError::UnboundHandler`]로 거부됩니다.
    pub fn subscribe_bound<E, T, F>(
        &self,
        receiver: &Weak<T>,
        name: &str,
        handler: F,
    ) -> Result<HandlerId, EventError>
    where
        E: Event,
        T: Send + Sync + 'static,
        F: Fn(&T, &E) -> HandlerResult + Send + Sync + 'static,
    {
        let label = bound_label::<T>(receiver, name)?;
        self.insert::<E>(label, Invoker::bound_sync(receiver.clone(), handler), true)
    }

    /// 수신자에 바인딩된 비동기 핸들러를 구독합니다.
    pub fn subscribe_bound_async<E, T, F, Fut>(
        &self,
        receiver: &Weak<T>,
        name: &str,
        handler: F,
    ) -> Result<HandlerId, EventError>
    where
        E: Event,
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let label = bound_label::<T>(receiver, name)?;
        let invoker = Invoker::bound_async(receiver.clone(), move |receiver, event| {
            handler(receiver, event).boxed()
        });
        self.insert::<E>(label, invoker, true)
    }

    /// 디스크립터에 선언된 핸들러를 등록합니다. 부트스트랩 전용이므로 freeze를 무시합니다.
    pub(crate) fn insert_declared<E: Event>(
        &self,
        owner: Identity,
        name: &'static str,
        invoker: Invoker,
    ) -> Result<HandlerId, EventError> {
        self.insert::<E>(format!("{}.{}", owner, name), invoker, false)
    }

    fn insert<E: Event>(
        &self,
        label: String,
        invoker: Invoker,
        respect_freeze: bool,
    ) -> Result<HandlerId, EventError> {
        let event = Identity::of::<E>();
        if respect_freeze && self.is_frozen() {
            return Err(EventError::SubscriptionsFrozen { event });
        }

        let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let registration = HandlerRegistration {
            id,
            label,
            event,
            invoker,
        };
        debug!(
            "➕ Adding {:?} event listener for {} - {}",
            registration.mode(),
            event,
            registration.label
        );

        self.inner
            .index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event)
            .or_default()
            .push(Arc::new(registration));

        Ok(id)
    }

    /// 이후의 구독을 거부합니다. 이미 등록된 핸들러와 전달에는 영향이 없습니다.
    pub fn freeze(&self) {
        if !self.inner.frozen.swap(true, Ordering::AcqRel) {
            info!("🔒 Event subscriptions frozen");
        }
    }

    pub fn reopen(&self) {
        if self.inner.frozen.swap(false, Ordering::AcqRel) {
            info!("🔓 Event subscriptions reopened");
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::Acquire)
    }

    /// 이벤트에 등록된 핸들러 수
    pub fn handler_count(&self, event: &Identity) -> usize {
        self.inner
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }

    /// 이벤트에 등록된 핸들러 목록 (등록 순서)
    pub fn handlers_for(&self, event: &Identity) -> Vec<HandlerInfo> {
        self.snapshot(event).iter().map(|handler| handler.info()).collect()
    }

    /// 전체 구독 수
    pub fn subscription_count(&self) -> usize {
        self.inner
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    fn snapshot(&self, event: &Identity) -> HandlerList {
        self.inner
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    fn split(&self, event: &Identity) -> (HandlerList, HandlerList) {
        self.snapshot(event)
            .into_iter()
            .partition(|handler| handler.mode() == HandlerMode::Sync)
    }

    /// 이벤트를 전달하고 모든 핸들러가 끝날 때까지 블로킹합니다.
    ///
    /// 1. sync 핸들러를 호출자 스레드에서 등록 순서대로 실행합니다. 하나라도 실패하면
    ///    남은 핸들러(async 포함)를 실행하지 않고 즉시 그 실패를 반환합니다.
    /// 2. async 핸들러를 동시에 구동하고 전부 끝날 때까지 기다립니다.
    ///
    /// 런타임 밖이나 단일 스레드 런타임에서 호출해도 async 핸들러는 Tokio 타이머와 I/O를
    /// 사용할 수 있습니다. 이 경우 핸들러는 디스패치 런타임에서 실행됩니다.
    pub fn notify<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.dispatch_blocking(event, true)
    }

    /// sync 핸들러만 실행하는 [`notify`](Self::notify)
    pub fn notify_ignoring_async<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.dispatch_blocking(event, false)
    }

    fn dispatch_blocking<E: Event>(&self, event: E, include_async: bool) -> Result<(), EventError> {
        let identity = Identity::of::<E>();
        let (sync_handlers, async_handlers) = self.split(&identity);
        if sync_handlers.is_empty() && (async_handlers.is_empty() || !include_async) {
            return Ok(());
        }

        let event: Arc<dyn Any + Send + Sync> = Arc::new(event);

        if let Err(fault) = run_sync_chain(&sync_handlers, event.as_ref()) {
            error!("Event notification failed: {}", fault);
            return Err(EventError::Handler(fault));
        }

        if !include_async || async_handlers.is_empty() {
            return Ok(());
        }

        let outcomes = join_blocking(identity, async_handlers, event)?;
        aggregate(identity, outcomes)
    }

    /// 이벤트를 전달하고, 호출자는 `await` 지점에서만 대기합니다.
    ///
    /// async 핸들러는 각각 Tokio 태스크로 동시에 실행되고, sync 핸들러는 별도의
    /// 블로킹 워커에서 등록 순서대로 실행되어 async 팬아웃을 막지 않습니다.
    /// 한 핸들러의 실패가 다른 핸들러를 취소하지 않으며, 모두 끝난 뒤 실패를 집계합니다.
    ///
    /// Tokio 런타임 안에서 호출해야 합니다.
    pub async fn notify_async<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.dispatch_concurrent(event, true).await
    }

    /// async 핸들러만 실행하는 [`notify_async`](Self::notify_async)
    pub async fn notify_async_ignoring_sync<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.dispatch_concurrent(event, false).await
    }

    async fn dispatch_concurrent<E: Event>(
        &self,
        event: E,
        include_sync: bool,
    ) -> Result<(), EventError> {
        let identity = Identity::of::<E>();
        let (sync_handlers, async_handlers) = self.split(&identity);
        let run_sync = include_sync && !sync_handlers.is_empty();
        if !run_sync && async_handlers.is_empty() {
            return Ok(());
        }

        let event: Arc<dyn Any + Send + Sync> = Arc::new(event);

        let mut tasks: Vec<BoxFuture<'static, Result<(), HandlerFault>>> = async_handlers
            .into_iter()
            .map(|handler| {
                let label = handler.label.clone();
                let task = tokio::spawn(run_isolated(handler, event.clone()));
                async move {
                    task.await.unwrap_or_else(|join_error| {
                        Err(task_fault(label, identity, join_error))
                    })
                }
                .boxed()
            })
            .collect();

        if run_sync {
            let event = event.clone();
            let task = tokio::task::spawn_blocking(move || run_sync_chain(&sync_handlers, event.as_ref()));
            tasks.push(
                async move {
                    task.await.unwrap_or_else(|join_error| {
                        Err(task_fault("sync handlers".to_string(), identity, join_error))
                    })
                }
                .boxed(),
            );
        }

        let outcomes = join_all(tasks).await;
        aggregate(identity, outcomes)
    }
}

/// async 핸들러를 동시에 실행하고 호출자 스레드를 블로킹한 채 모두 끝나길 기다립니다.
///
/// 멀티스레드 런타임 안이면 그 런타임을 그대로 사용합니다. 단일 스레드 런타임의 워커를
/// 막으면 핸들러가 진행할 수 없으므로, 그 경우와 런타임 밖에서는 디스패치 런타임에 맡깁니다.
fn join_blocking(
    identity: Identity,
    handlers: HandlerList,
    event: Arc<dyn Any + Send + Sync>,
) -> Result<Vec<Result<(), HandlerFault>>, EventError> {
    let joined = join_all(
        handlers
            .into_iter()
            .map(|handler| run_isolated(handler, event.clone())),
    );

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(tokio::task::block_in_place(|| handle.block_on(joined)))
        }
        _ => {
            let task = dispatch_runtime()?.spawn(joined);
            Ok(futures::executor::block_on(task).unwrap_or_else(|join_error| {
                vec![Err(task_fault("async handlers".to_string(), identity, join_error))]
            }))
        }
    }
}

fn dispatch_runtime() -> Result<&'static Runtime, EventError> {
    DISPATCH_RUNTIME
        .get_or_try_init(|| {
            debug!("Starting event dispatch runtime");
            Builder::new_multi_thread()
                .thread_name("summer-dispatch")
                .enable_all()
                .build()
        })
        .map_err(EventError::DispatchRuntime)
}

fn bound_label<T: Send + Sync + 'static>(receiver: &Weak<T>, name: &str) -> Result<String, EventError> {
    let owner = Identity::of::<T>();
    if receiver.upgrade().is_none() {
        return Err(EventError::UnboundHandler {
            handler: format!("{}.{}", owner, name),
        });
    }

    Ok(format!("{}.{}", owner, name))
}

/// sync 핸들러를 순서대로 실행합니다. 첫 실패(또는 panic)에서 중단합니다.
fn run_sync_chain(
    handlers: &[Arc<HandlerRegistration>],
    event: &(dyn Any + Send + Sync),
) -> Result<(), HandlerFault> {
    for handler in handlers {
        let Invoker::Sync(call) = &handler.invoker else {
            continue;
        };

        match std::panic::catch_unwind(AssertUnwindSafe(|| call(event))) {
            Ok(Ok(())) => {}
            Ok(Err(source)) => return Err(handler.fault(source)),
            Err(payload) => return Err(handler.fault(panic_error(payload))),
        }
    }

    Ok(())
}

/// async 핸들러 하나를 실행합니다. 에러와 panic 모두 `HandlerFault`로 변환됩니다.
async fn run_isolated(
    handler: Arc<HandlerRegistration>,
    event: Arc<dyn Any + Send + Sync>,
) -> Result<(), HandlerFault> {
    let Invoker::Async(call) = &handler.invoker else {
        return Ok(());
    };

    match AssertUnwindSafe(async { call(event).await }).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(handler.fault(source)),
        Err(payload) => Err(handler.fault(panic_error(payload))),
    }
}

fn task_fault(handler: String, event: Identity, join_error: tokio::task::JoinError) -> HandlerFault {
    HandlerFault {
        handler,
        event,
        source: format!("task did not complete: {}", join_error).into(),
    }
}

fn aggregate(
    event: Identity,
    outcomes: Vec<Result<(), HandlerFault>>,
) -> Result<(), EventError> {
    let faults: Vec<HandlerFault> = outcomes.into_iter().filter_map(Result::err).collect();
    if !faults.is_empty() {
        error!("{} of {}'s handlers failed", faults.len(), event);
    }

    EventError::from_faults(faults)
}
