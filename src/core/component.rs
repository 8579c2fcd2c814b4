//! # Component Declarations
//!
//! 런타임 리플렉션 대신, 각 컴포넌트는 [`ComponentDescriptor`]로 자신을 기술합니다.
//! 디스크립터는 Spring의 `BeanDefinition`에 해당하며 다음 정보를 담습니다.
//!
//! | 정보 | Spring 대응 | 빌더 메서드 |
//! |------|-------------|-------------|
//! | 식별자 + 생성자 | `@Component` | [`ComponentDescriptor::of`], [`ComponentDescriptor::from_factory`] |
//! | 스캔 제외 | `@Conditional` / 제외 필터 | [`DescriptorBuilder::ignored`] |
//! | 주입 지점 | `@Autowired` | [`DescriptorBuilder::inject`] |
//! | 이벤트 핸들러 | `@EventListener` | [`DescriptorBuilder::on`], [`DescriptorBuilder::on_async`] |
//!
//! 디스크립터 목록은 [`ComponentTable`]로 모읍니다. 애플리케이션이 직접 구성하거나,
//! [`submit_component!`](crate::submit_component) 매크로로 링크 타임에 `inventory`에
//! 제출한 디스크립터를 [`ComponentTable::discover`]로 수집할 수 있습니다.
//!
//! ```rust,ignore
//! fn alarm_descriptor() -> ComponentDescriptor {
//!     ComponentDescriptor::of::<Alarm>()
//!         .inject("clock", |alarm: &Alarm| &alarm.clock)
//!         .on_async("on_time_changed", |alarm: Arc<Alarm>, event: Arc<TimeChanged>| async move {
//!             alarm.check(&event).await
//!         })
//!         .build()
//! }
//!
//! submit_component!(alarm_descriptor);
//! ```

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use futures::future::FutureExt;

use crate::core::errors::{BoxError, EventError, HandlerResult};
use crate::core::identity::Identity;
use crate::core::inject::{Inject, InjectionStep};
use crate::core::lifecycle::ApplicationContext;
use crate::core::registry::ComponentRegistry;
use crate::events::bus::EventBus;
use crate::events::handler::{AsyncListener, Event, HandlerId, HandlerMode, Invoker};

/// 레지스트리가 관리하는 싱글톤 컴포넌트
///
/// 모든 의존성이 주입되고 이벤트 핸들러가 등록된 뒤 [`initialize`](Component::initialize)가
/// 컴포넌트마다 정확히 한 번 호출됩니다.
pub trait Component: Any + Send + Sync {
    /// 주입이 끝난 뒤의 초기화 작업
    ///
    /// 에러를 반환하면 `start()`가 `ComponentError::InitializationFailed`로 실패합니다.
    /// 이 훅 안에서 `ctx.start()`를 다시 호출하면 `BootstrapInProgress`가 반환됩니다.
    fn initialize(&self, _ctx: &ApplicationContext) -> Result<(), BoxError> {
        Ok(())
    }
}

/// 레지스트리에 저장되는 인스턴스
///
/// 같은 할당을 가리키는 두 개의 뷰를 보관합니다. `instance`는 타입 다운캐스트용,
/// `component`는 생명주기 훅 호출용입니다.
#[derive(Clone)]
pub(crate) struct ComponentEntry {
    pub identity: Identity,
    pub instance: Arc<dyn Any + Send + Sync>,
    pub component: Arc<dyn Component>,
}

impl ComponentEntry {
    pub(crate) fn new<T: Component>(instance: Arc<T>) -> Self {
        Self {
            identity: Identity::of::<T>(),
            instance: instance.clone(),
            component: instance,
        }
    }
}

type Constructor = Arc<dyn Fn() -> Result<ComponentEntry, BoxError> + Send + Sync>;

type InjectFn =
    Arc<dyn Fn(&Arc<dyn Any + Send + Sync>, &ComponentRegistry) -> InjectionStep + Send + Sync>;

type BindFn = Arc<
    dyn Fn(&Arc<dyn Any + Send + Sync>, &EventBus, Identity) -> Result<HandlerId, EventError>
        + Send
        + Sync,
>;

/// 디스크립터에 선언된 주입 지점
pub(crate) struct InjectionPoint {
    pub field: &'static str,
    pub dependency: Identity,
    apply: InjectFn,
}

impl InjectionPoint {
    pub(crate) fn apply(
        &self,
        instance: &Arc<dyn Any + Send + Sync>,
        registry: &ComponentRegistry,
    ) -> InjectionStep {
        (self.apply)(instance, registry)
    }
}

/// 디스크립터에 선언된 이벤트 핸들러
///
/// `accepts`는 핸들러가 실제로 받는 이벤트 타입이고, `markers`는 이 핸들러가
/// 처리한다고 선언한 이벤트 목록입니다. 둘이 다르면 잘못된 시그니처로 간주됩니다.
pub(crate) struct HandlerDeclaration {
    pub name: &'static str,
    pub accepts: Identity,
    pub markers: Vec<Identity>,
    pub mode: HandlerMode,
    bind: BindFn,
}

impl HandlerDeclaration {
    /// 인스턴스에 핸들러를 바인딩해 버스에 등록합니다.
    pub(crate) fn bind(
        &self,
        instance: &Arc<dyn Any + Send + Sync>,
        bus: &EventBus,
        owner: Identity,
    ) -> Result<HandlerId, EventError> {
        (self.bind)(instance, bus, owner)
    }
}

/// 컴포넌트 하나의 등록 정보
pub struct ComponentDescriptor {
    identity: Identity,
    constructor: Option<Constructor>,
    ignored: bool,
    injections: Vec<InjectionPoint>,
    handlers: Vec<HandlerDeclaration>,
}

impl ComponentDescriptor {
    /// 기본 생성자(`Default`)로 만들어지는 컴포넌트
    pub fn of<T: Component + Default>() -> DescriptorBuilder<T> {
        Self::from_factory(|| Ok(T::default()))
    }

    /// 실패할 수 있는 팩토리로 만들어지는 컴포넌트
    ///
    /// 팩토리가 에러를 반환하면 등록이 `ComponentError::InvalidComponent`로 실패합니다.
    pub fn from_factory<T, F>(factory: F) -> DescriptorBuilder<T>
    where
        T: Component,
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let constructor: Constructor =
            Arc::new(move || factory().map(|instance| ComponentEntry::new(Arc::new(instance))));

        DescriptorBuilder {
            descriptor: ComponentDescriptor {
                identity: Identity::of::<T>(),
                constructor: Some(constructor),
                ignored: false,
                injections: Vec::new(),
                handlers: Vec::new(),
            },
            _component: PhantomData,
        }
    }

    /// 생성자가 없는 추상 타입 (trait 객체 등)
    ///
    /// 발견 단계에서는 제외되며, 직접 등록하면 `InvalidComponent`가 반환됩니다.
    pub fn abstract_type<T: ?Sized + Any>() -> Self {
        Self {
            identity: Identity::of::<T>(),
            constructor: None,
            ignored: false,
            injections: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn is_abstract(&self) -> bool {
        self.constructor.is_none()
    }

    /// 발견 단계에서 자동 등록 대상인지 여부
    pub fn is_discoverable(&self) -> bool {
        !self.ignored && !self.is_abstract()
    }

    pub(crate) fn construct(&self) -> Option<Result<ComponentEntry, BoxError>> {
        self.constructor.as_ref().map(|constructor| constructor())
    }

    pub(crate) fn injections(&self) -> &[InjectionPoint] {
        &self.injections
    }

    pub(crate) fn handlers(&self) -> &[HandlerDeclaration] {
        &self.handlers
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("identity", &self.identity)
            .field("abstract", &self.is_abstract())
            .field("ignored", &self.ignored)
            .field("injections", &self.injections.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// 타입이 고정된 디스크립터 빌더
///
/// 주입 지점과 핸들러 클로저가 컴포넌트 타입 `T`를 직접 받을 수 있도록
/// 빌드가 끝날 때까지 타입 정보를 유지합니다.
pub struct DescriptorBuilder<T> {
    descriptor: ComponentDescriptor,
    _component: PhantomData<fn() -> T>,
}

impl<T: Component> DescriptorBuilder<T> {
    /// 발견 단계에서 이 컴포넌트를 제외합니다.
    pub fn ignored(mut self) -> Self {
        self.descriptor.ignored = true;
        self
    }

    /// `T`의 필드에 `D`를 주입하도록 선언합니다.
    pub fn inject<D>(mut self, field: &'static str, accessor: fn(&T) -> &Inject<D>) -> Self
    where
        D: Component,
    {
        let apply: InjectFn = Arc::new(
            move |instance: &Arc<dyn Any + Send + Sync>, registry: &ComponentRegistry| {
                let Some(owner) = instance.downcast_ref::<T>() else {
                    return InjectionStep::OwnerMismatch;
                };

                match registry.find::<D>() {
                    Some(dependency) => InjectionStep::Filled(accessor(owner).fill(&dependency)),
                    None => InjectionStep::Missing,
                }
            },
        );

        self.descriptor.injections.push(InjectionPoint {
            field,
            dependency: Identity::of::<D>(),
            apply,
        });
        self
    }

    /// 동기 이벤트 핸들러를 선언합니다.
    ///
    /// 핸들러는 `notify()` 호출자의 스레드에서 등록 순서대로 실행됩니다.
    pub fn on<E, F>(self, name: &'static str, handler: F) -> Self
    where
        E: Event,
        F: Fn(&T, &E) -> HandlerResult + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let bind: BindFn = Arc::new(
            move |instance: &Arc<dyn Any + Send + Sync>, bus: &EventBus, owner: Identity| {
                let receiver = downgrade::<T>(instance)?;
                let handler = handler.clone();
                bus.insert_declared::<E>(
                    owner,
                    name,
                    Invoker::bound_sync(receiver, move |receiver: &T, event: &E| {
                        handler(receiver, event)
                    }),
                )
            },
        );

        self.push_handler::<E>(name, HandlerMode::Sync, bind)
    }

    /// 비동기 이벤트 핸들러를 선언합니다.
    ///
    /// 핸들러는 수신자와 이벤트를 `Arc`로 받아 `'static` future를 반환해야 합니다.
    pub fn on_async<E, F, Fut>(self, name: &'static str, handler: F) -> Self
    where
        E: Event,
        F: Fn(Arc<T>, Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let bind: BindFn = Arc::new(
            move |instance: &Arc<dyn Any + Send + Sync>, bus: &EventBus, owner: Identity| {
                let receiver = downgrade::<T>(instance)?;
                let handler = handler.clone();
                bus.insert_declared::<E>(
                    owner,
                    name,
                    Invoker::bound_async(receiver, move |receiver: Arc<T>, event: Arc<E>| {
                        handler(receiver, event).boxed()
                    }),
                )
            },
        );

        self.push_handler::<E>(name, HandlerMode::Async, bind)
    }

    /// [`AsyncListener`] 구현을 이벤트 핸들러로 선언합니다.
    pub fn listen_async<E>(self, name: &'static str) -> Self
    where
        E: Event,
        T: AsyncListener<E>,
    {
        self.on_async(name, |receiver: Arc<T>, event: Arc<E>| async move {
            receiver.on_event(&event).await
        })
    }

    /// 마지막으로 선언한 핸들러에 처리 대상 이벤트를 추가합니다.
    ///
    /// 핸들러가 받는 타입과 다른 이벤트를 지정하면 인덱싱 단계에서
    /// `InvalidHandlerSignature`로 기록되고 해당 마커는 무시됩니다.
    pub fn also_handles<M: Event>(mut self) -> Self {
        if let Some(last) = self.descriptor.handlers.last_mut() {
            last.markers.push(Identity::of::<M>());
        }
        self
    }

    pub fn build(self) -> ComponentDescriptor {
        self.descriptor
    }

    fn push_handler<E: Event>(mut self, name: &'static str, mode: HandlerMode, bind: BindFn) -> Self {
        let accepts = Identity::of::<E>();
        self.descriptor.handlers.push(HandlerDeclaration {
            name,
            accepts,
            markers: vec![accepts],
            mode,
            bind,
        });
        self
    }
}

impl<T> From<DescriptorBuilder<T>> for ComponentDescriptor {
    fn from(builder: DescriptorBuilder<T>) -> Self {
        builder.descriptor
    }
}

fn downgrade<T: Component>(instance: &Arc<dyn Any + Send + Sync>) -> Result<Weak<T>, EventError> {
    instance
        .clone()
        .downcast::<T>()
        .map(|receiver| Arc::downgrade(&receiver))
        .map_err(|_| EventError::UnboundHandler {
            handler: Identity::of::<T>().name().to_string(),
        })
}

/// 부트스트랩 대상 디스크립터 목록
///
/// 테이블 순서가 곧 등록 순서이며, `initialize()` 호출 순서입니다.
#[derive(Debug, Default)]
pub struct ComponentTable {
    descriptors: Vec<ComponentDescriptor>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `inventory`에 제출된 모든 디스크립터로 테이블을 구성합니다.
    ///
    /// 링크 순서는 보장되지 않으므로 타입 이름 순으로 정렬합니다.
    pub fn discover() -> Self {
        let mut descriptors = Vec::new();
        for registration in inventory::iter::<ComponentRegistration> {
            descriptors.push((registration.describe)());
        }
        descriptors.sort_by_key(|descriptor| descriptor.identity().name());

        Self { descriptors }
    }

    pub fn with(mut self, descriptor: impl Into<ComponentDescriptor>) -> Self {
        self.push(descriptor);
        self
    }

    pub fn push(&mut self, descriptor: impl Into<ComponentDescriptor>) {
        self.descriptors.push(descriptor.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.descriptors.iter().any(|descriptor| descriptor.identity() == *identity)
    }
}

/// 링크 타임 컴포넌트 등록 정보
///
/// [`submit_component!`](crate::submit_component)가 생성하며 `inventory`로 수집됩니다.
pub struct ComponentRegistration {
    describe: fn() -> ComponentDescriptor,
}

impl ComponentRegistration {
    pub const fn new(describe: fn() -> ComponentDescriptor) -> Self {
        Self { describe }
    }
}

inventory::collect!(ComponentRegistration);

/// 디스크립터 함수를 링크 타임 인벤토리에 제출합니다.
///
/// ```rust,ignore
/// fn clock_descriptor() -> ComponentDescriptor {
///     ComponentDescriptor::of::<Clock>().build()
/// }
///
/// summer::submit_component!(clock_descriptor);
///
/// let table = ComponentTable::discover();
/// ```
#[macro_export]
macro_rules! submit_component {
    ($describe:path) => {
        $crate::inventory::submit! {
            $crate::core::ComponentRegistration::new($describe)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Gadget;
    impl Component for Gadget {}

    struct Tick;
    impl Event for Tick {}

    struct Tock;
    impl Event for Tock {}

    trait Shape: Send + Sync {}

    fn gadget_descriptor() -> ComponentDescriptor {
        ComponentDescriptor::of::<Gadget>().build()
    }

    crate::submit_component!(gadget_descriptor);

    #[test]
    fn test_abstract_type_is_not_discoverable() {
        let descriptor = ComponentDescriptor::abstract_type::<dyn Shape>();

        assert!(descriptor.is_abstract());
        assert!(!descriptor.is_discoverable());
        assert!(descriptor.construct().is_none());
    }

    #[test]
    fn test_ignored_component_is_not_discoverable() {
        let descriptor = ComponentDescriptor::of::<Gadget>().ignored().build();

        assert!(descriptor.is_ignored());
        assert!(!descriptor.is_discoverable());
    }

    #[test]
    fn test_factory_error_is_returned_on_construct() {
        let descriptor =
            ComponentDescriptor::from_factory::<Gadget, _>(|| Err("no gadget today".into())).build();

        let result = descriptor.construct().unwrap();

        assert_eq!(result.err().unwrap().to_string(), "no gadget today");
    }

    #[test]
    fn test_handler_markers_start_with_accepted_event() {
        let descriptor = ComponentDescriptor::of::<Gadget>()
            .on("on_tick", |_: &Gadget, _: &Tick| Ok(()))
            .also_handles::<Tock>()
            .build();

        let handler = &descriptor.handlers()[0];
        assert_eq!(handler.accepts, Identity::of::<Tick>());
        assert_eq!(
            handler.markers,
            vec![Identity::of::<Tick>(), Identity::of::<Tock>()]
        );
        assert_eq!(handler.mode, HandlerMode::Sync);
    }

    #[test]
    fn test_discover_collects_submitted_descriptors() {
        let table = ComponentTable::discover();

        assert!(table.contains(&Identity::of::<Gadget>()));
    }
}
