//! # Application Context
//!
//! 컴포넌트 테이블을 받아 레지스트리, 인젝터, 이벤트 버스를 순서대로 구동하는
//! 생명주기 조정자입니다. Spring의 `AbstractApplicationContext::refresh()`에 해당합니다.
//!
//! ## 부트스트랩 단계
//!
//! ```text
//! Uninitialized
//!   │  1. discover   테이블의 발견 대상 디스크립터를 순서대로 등록
//!   ▼
//! Discovered
//!   │  2. wire       모든 주입 지점 채우기 + 선언된 이벤트 핸들러 색인
//!   ▼
//! Injected
//!   │  3. initialize 등록 순서대로 Component::initialize() 한 번씩 호출
//!   ▼
//! Initialized       (설정에 따라 구독 동결)
//! ```
//!
//! 상태는 앞으로만 진행합니다. 실패한 `start()`는 멈춘 단계에 상태를 남기며,
//! 다시 호출하면 그 지점부터 이어서 진행합니다. 이미 초기화된 컴포넌트의 훅은
//! 다시 호출되지 않습니다.
//!
//! 여러 컨텍스트가 한 프로세스 안에 공존할 수 있습니다. 전역 상태는 없습니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! let table = ComponentTable::new()
//!     .with(ComponentDescriptor::of::<Clock>())
//!     .with(alarm_descriptor());
//!
//! let ctx = ApplicationContext::new(table, RuntimeConfig::from_env());
//! ctx.start()?;
//!
//! let alarm = ctx.get_component::<Alarm>().expect("alarm is registered");
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::core::component::{Component, ComponentDescriptor, ComponentTable};
use crate::core::errors::{ComponentError, EventError, HandlerResult, InvalidHandlerSignature};
use crate::core::identity::Identity;
use crate::core::inject::{InjectionReport, inject_all};
use crate::core::registry::{ComponentRegistry, Registration};
use crate::events::bus::EventBus;
use crate::events::handler::{Event, HandlerId};
use crate::utils::display_terminal::{boxed_title, final_summary, step_complete, step_start, sub_task};

/// 컨텍스트 생명주기 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Discovered,
    Injected,
    Initialized,
}

#[derive(Default)]
struct Progress {
    /// 테이블에서 등록을 마친 디스크립터 수
    discovered: usize,
    initialized: HashSet<Identity>,
}

/// 핸들러 색인 결과
#[derive(Debug, Default)]
struct HandlerIndex {
    bound: usize,
    invalid: Vec<InvalidHandlerSignature>,
}

/// 애플리케이션 컨텍스트
///
/// 레지스트리와 이벤트 버스를 소유하며, [`start`](Self::start)로 부트스트랩합니다.
pub struct ApplicationContext {
    table: ComponentTable,
    registry: ComponentRegistry,
    events: EventBus,
    config: RuntimeConfig,
    state: RwLock<LifecycleState>,
    bootstrapping: AtomicBool,
    progress: Mutex<Progress>,
}

/// 부트스트랩 진행 표시를 해제합니다. 초기화 훅이 panic 해도 해제됩니다.
struct BootstrapGuard<'a>(&'a AtomicBool);

impl Drop for BootstrapGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ApplicationContext {
    pub fn new(table: ComponentTable, config: RuntimeConfig) -> Self {
        Self {
            table,
            registry: ComponentRegistry::new(config.duplicate_policy),
            events: EventBus::new(),
            config,
            state: RwLock::new(LifecycleState::Uninitialized),
            bootstrapping: AtomicBool::new(false),
            progress: Mutex::new(Progress::default()),
        }
    }

    /// 기본 설정으로 컨텍스트를 생성합니다.
    pub fn with_table(table: ComponentTable) -> Self {
        Self::new(table, RuntimeConfig::default())
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn table(&self) -> &ComponentTable {
        &self.table
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// 등록된 싱글톤을 조회합니다. 절대 새로 생성하지 않습니다.
    pub fn get_component<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.registry.find::<T>()
    }

    /// 외부에서 만든 인스턴스를 등록합니다.
    ///
    /// `start()` 전에 등록하면 다른 컴포넌트에 주입되고 초기화 훅도 호출됩니다.
    pub fn register_instance<T: Component>(&self, instance: Arc<T>) -> Result<Registration, ComponentError> {
        self.registry.register_instance(instance)
    }

    /// 컨텍스트를 부트스트랩합니다.
    ///
    /// 이미 `Initialized` 상태라면 아무것도 하지 않습니다.
    ///
    /// # Errors
    ///
    /// * `BootstrapInProgress` - 다른 스레드 또는 초기화 훅 안에서 이미 진행 중
    /// * `InvalidComponent` / `DuplicateComponent` - 발견 단계의 등록 실패
    /// * `InitializationFailed` - 초기화 훅 실패
    pub fn start(&self) -> Result<(), ComponentError> {
        if self.state() == LifecycleState::Initialized {
            debug!("Application context already started");
            return Ok(());
        }

        if self
            .bootstrapping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ComponentError::BootstrapInProgress);
        }
        let _guard = BootstrapGuard(&self.bootstrapping);

        // 대기 중에 다른 호출이 끝냈을 수 있음
        if self.state() == LifecycleState::Initialized {
            return Ok(());
        }

        info!("{}", boxed_title("🚀 STARTING APPLICATION CONTEXT"));

        if self.state() < LifecycleState::Discovered {
            self.discover()?;
            self.advance(LifecycleState::Discovered);
        }

        let mut skipped = 0;
        if self.state() < LifecycleState::Injected {
            let report = self.wire();
            skipped = report.omitted.len();
            self.advance(LifecycleState::Injected);
        }

        self.initialize_all()?;
        self.advance(LifecycleState::Initialized);

        if self.config.freeze_subscriptions {
            self.events.freeze();
        }

        info!(
            "{}",
            final_summary(self.registry.len(), self.events.subscription_count(), skipped)
        );
        Ok(())
    }

    fn advance(&self, next: LifecycleState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if next > *state {
            debug!("Lifecycle: {:?} → {:?}", *state, next);
            *state = next;
        }
    }

    fn discover(&self) -> Result<(), ComponentError> {
        info!("{}", step_start(1, "Discovering components"));

        let start_at = self.lock_progress().discovered;
        let mut created = 0;

        for descriptor in self.table.iter().skip(start_at) {
            if descriptor.is_discoverable() {
                if self.registry.register(descriptor)? == Registration::Created {
                    created += 1;
                }
            } else {
                debug!(
                    "Skipping {} ({})",
                    descriptor.identity(),
                    if descriptor.is_abstract() { "abstract" } else { "ignored" }
                );
            }
            self.lock_progress().discovered += 1;
        }

        info!("{}", step_complete(1, "Components registered", created));
        Ok(())
    }

    fn wire(&self) -> InjectionReport {
        info!("{}", step_start(2, "Injecting dependencies"));

        let report = inject_all(&self.registry, self.table.iter());
        info!("{}", step_complete(2, "Dependencies injected", report.injected));

        let index = self.index_handlers();
        for invalid in &index.invalid {
            info!("{}", sub_task(invalid.component.name(), "invalid handler skipped"));
        }
        info!("{}", step_complete(2, "Event handlers indexed", index.bound));

        report
    }

    fn index_handlers(&self) -> HandlerIndex {
        let mut index = HandlerIndex::default();
        let mut visited = HashSet::new();

        for descriptor in self.table.iter() {
            let component = descriptor.identity();
            if !visited.insert(component) {
                continue;
            }
            let Some(instance) = self.registry.find_by_identity(&component) else {
                continue;
            };

            self.bind_handlers(descriptor, &instance, &mut index);
        }

        index
    }

    fn bind_handlers(
        &self,
        descriptor: &ComponentDescriptor,
        instance: &Arc<dyn Any + Send + Sync>,
        index: &mut HandlerIndex,
    ) {
        let component = descriptor.identity();

        for declaration in descriptor.handlers() {
            let mut seen = HashSet::new();
            for marker in &declaration.markers {
                if !seen.insert(*marker) {
                    continue;
                }

                if *marker != declaration.accepts {
                    let invalid = InvalidHandlerSignature {
                        component,
                        handler: declaration.name,
                        declared: *marker,
                        accepted: declaration.accepts,
                    };
                    warn!("Handler skipped: {}", invalid);
                    index.invalid.push(invalid);
                    continue;
                }

                match declaration.bind(instance, &self.events, component) {
                    Ok(id) => {
                        debug!(
                            "📣 {}.{} ({:?}) → {} {}",
                            component, declaration.name, declaration.mode, marker, id
                        );
                        index.bound += 1;
                    }
                    Err(e) => warn!("Handler {}.{} skipped: {}", component, declaration.name, e),
                }
            }
        }
    }

    fn initialize_all(&self) -> Result<(), ComponentError> {
        info!("{}", step_start(3, "Initializing components"));
        let mut count = 0;

        for entry in self.registry.entries() {
            if self.lock_progress().initialized.contains(&entry.identity) {
                continue;
            }

            // 훅이 컨텍스트를 다시 사용할 수 있으므로 락 없이 호출
            entry
                .component
                .initialize(self)
                .map_err(|source| ComponentError::InitializationFailed {
                    component: entry.identity,
                    source,
                })?;

            self.lock_progress().initialized.insert(entry.identity);
            info!("{}", sub_task(entry.identity.name(), "initialized"));
            count += 1;
        }

        info!("{}", step_complete(3, "Components initialized", count));
        Ok(())
    }

    fn lock_progress(&self) -> std::sync::MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<E, F>(&self, name: &str, handler: F) -> Result<HandlerId, EventError>
    where
        E: Event,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.events.subscribe(name, handler)
    }

    pub fn subscribe_async<E, F, Fut>(&self, name: &str, handler: F) -> Result<HandlerId, EventError>
    where
        E: Event,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.events.subscribe_async(name, handler)
    }

    /// [`EventBus::notify`] 참고
    pub fn notify<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.events.notify(event)
    }

    pub fn notify_ignoring_async<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.events.notify_ignoring_async(event)
    }

    /// [`EventBus::notify_async`] 참고
    pub async fn notify_async<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.events.notify_async(event).await
    }

    pub async fn notify_async_ignoring_sync<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.events.notify_async_ignoring_sync(event).await
    }
}
