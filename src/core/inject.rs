//! # Dependency Injection
//!
//! 컴포넌트의 의존성 슬롯([`Inject`])과, 부트스트랩 중 모든 슬롯을 채우는
//! 인젝터([`inject_all`])를 제공합니다.
//!
//! ## 동작 방식
//!
//! ```text
//! for 등록된 컴포넌트 in 레지스트리:
//!     for 주입 지점 in 디스크립터.injections:
//!         1. 필요한 타입을 레지스트리에서 조회
//!         2. 없으면        → InjectionOmitted::MissingDependency (warn!, 건너뜀)
//!         3. 읽기 전용이면 → InjectionOmitted::NotWritable      (warn!, 건너뜀)
//!         4. 슬롯에 참조를 기록
//! ```
//!
//! 모든 의존성은 발견(discover) 단계에서 이미 생성되어 있으므로 컴포넌트 간
//! 주입 순서나 순환 참조 검사는 필요하지 않습니다.
//!
//! 슬롯은 `Weak<T>`를 보관합니다. 인스턴스의 강한 참조는 레지스트리만 가지며,
//! 서로를 주입하는 두 컴포넌트도 참조 순환을 만들지 않습니다.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use log::{debug, warn};
use once_cell::sync::OnceCell;

use crate::core::component::{ComponentDescriptor, InjectionPoint};
use crate::core::errors::InjectionOmitted;
use crate::core::registry::ComponentRegistry;

/// 한 번만 기록되는 의존성 슬롯
///
/// Spring의 `@Autowired` 필드에 해당합니다. 컴포넌트 구조체의 필드로 선언하고,
/// 디스크립터에 `.inject("field", |c| &c.field)`로 주입 지점을 알려줍니다.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Alarm {
///     clock: Inject<Clock>,
/// }
///
/// let clock: Option<Arc<Clock>> = alarm.clock.get();
/// ```
pub struct Inject<T> {
    slot: OnceCell<Weak<T>>,
    writable: bool,
}

/// 슬롯에 참조를 기록한 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fill {
    Injected,
    AlreadyWired,
    NotWritable,
}

impl<T> Inject<T> {
    /// 주입 가능한 빈 슬롯
    pub fn new() -> Self {
        Self {
            slot: OnceCell::new(),
            writable: true,
        }
    }

    /// 어떤 값도 받지 않는 읽기 전용 슬롯
    ///
    /// setter가 없는 프로퍼티에 해당합니다. 인젝터는 이 슬롯을 건너뛰고
    /// `InjectionOmitted::NotWritable`을 기록합니다.
    pub fn read_only() -> Self {
        Self {
            slot: OnceCell::new(),
            writable: false,
        }
    }

    /// 주입된 인스턴스를 반환합니다.
    ///
    /// 주입되지 않았거나 레지스트리가 이미 해제된 경우 `None`입니다.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.get().and_then(Weak::upgrade)
    }

    pub fn is_wired(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub(crate) fn fill(&self, instance: &Arc<T>) -> Fill {
        if !self.writable {
            return Fill::NotWritable;
        }

        match self.slot.set(Arc::downgrade(instance)) {
            Ok(()) => Fill::Injected,
            Err(_) => Fill::AlreadyWired,
        }
    }
}

impl<T> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("wired", &self.is_wired())
            .field("writable", &self.writable)
            .finish()
    }
}

/// 주입 지점 하나를 처리한 결과
#[derive(Debug)]
pub(crate) enum InjectionStep {
    Filled(Fill),
    Missing,
    /// 디스크립터와 인스턴스 타입이 다른 경우 (같은 타입의 인스턴스를 외부에서 등록한 경우 등)
    OwnerMismatch,
}

/// 주입 단계 요약
#[derive(Debug, Default)]
pub struct InjectionReport {
    /// 새로 기록된 슬롯 수
    pub injected: usize,
    /// 이미 채워져 있어 그대로 둔 슬롯 수
    pub already_wired: usize,
    /// 건너뛴 주입 지점
    pub omitted: Vec<InjectionOmitted>,
}

/// 레지스트리에 등록된 모든 컴포넌트의 주입 지점을 채웁니다.
///
/// 레지스트리에 인스턴스가 없는 디스크립터(ignore 표시, 추상 타입)는 건너뜁니다.
/// 이미 연결된 슬롯은 다시 쓰지 않으므로 여러 번 호출해도 안전합니다.
pub fn inject_all<'a, I>(registry: &ComponentRegistry, descriptors: I) -> InjectionReport
where
    I: IntoIterator<Item = &'a ComponentDescriptor>,
{
    let mut report = InjectionReport::default();

    for descriptor in descriptors {
        let Some(instance) = registry.find_by_identity(&descriptor.identity()) else {
            continue;
        };

        for point in descriptor.injections() {
            inject_point(registry, descriptor, point, &instance, &mut report);
        }
    }

    report
}

fn inject_point(
    registry: &ComponentRegistry,
    descriptor: &ComponentDescriptor,
    point: &InjectionPoint,
    instance: &Arc<dyn Any + Send + Sync>,
    report: &mut InjectionReport,
) {
    let component = descriptor.identity();

    match point.apply(instance, registry) {
        InjectionStep::Filled(Fill::Injected) => {
            debug!("🔗 {}.{} ← {}", component, point.field, point.dependency);
            report.injected += 1;
        }
        InjectionStep::Filled(Fill::AlreadyWired) => {
            report.already_wired += 1;
        }
        InjectionStep::Filled(Fill::NotWritable) => {
            let omitted = InjectionOmitted::NotWritable {
                component,
                field: point.field,
            };
            warn!("Injection skipped: {}", omitted);
            report.omitted.push(omitted);
        }
        InjectionStep::Missing => {
            let omitted = InjectionOmitted::MissingDependency {
                component,
                field: point.field,
                dependency: point.dependency,
            };
            warn!("Injection skipped: {}", omitted);
            report.omitted.push(omitted);
        }
        InjectionStep::OwnerMismatch => {
            warn!(
                "Injection skipped: registered instance for {} is not of the described type",
                component
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::{Component, ComponentDescriptor};
    use crate::core::registry::DuplicatePolicy;

    #[derive(Default)]
    struct Engine;
    impl Component for Engine {}

    #[derive(Default)]
    struct Car {
        engine: Inject<Engine>,
        spare: Inject<Engine>,
    }
    impl Component for Car {}

    #[derive(Default)]
    struct Wheel;
    impl Component for Wheel {}

    #[derive(Default)]
    struct Garage {
        wheel: Inject<Wheel>,
    }
    impl Component for Garage {}

    struct Sealed {
        engine: Inject<Engine>,
    }
    impl Default for Sealed {
        fn default() -> Self {
            Self {
                engine: Inject::read_only(),
            }
        }
    }
    impl Component for Sealed {}

    fn car_descriptor() -> ComponentDescriptor {
        ComponentDescriptor::of::<Car>()
            .inject("engine", |car: &Car| &car.engine)
            .inject("spare", |car: &Car| &car.spare)
            .build()
    }

    #[test]
    fn test_inject_slot_fill_once() {
        let slot = Inject::new();
        let first = Arc::new(Engine);
        let second = Arc::new(Engine);

        assert_eq!(slot.fill(&first), Fill::Injected);
        assert_eq!(slot.fill(&second), Fill::AlreadyWired);
        assert!(Arc::ptr_eq(&slot.get().unwrap(), &first));
    }

    #[test]
    fn test_read_only_slot_never_receives_value() {
        let slot = Inject::read_only();

        assert_eq!(slot.fill(&Arc::new(Engine)), Fill::NotWritable);
        assert!(slot.get().is_none());
        assert!(!slot.is_wired());
    }

    #[test]
    fn test_slot_does_not_keep_instance_alive() {
        let slot = Inject::new();
        let engine = Arc::new(Engine);
        slot.fill(&engine);

        drop(engine);

        assert!(slot.is_wired());
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_inject_all_wires_registered_dependency() {
        let registry = ComponentRegistry::new(DuplicatePolicy::Ignore);
        let engine_desc = ComponentDescriptor::of::<Engine>().build();
        let car_desc = car_descriptor();
        registry.register(&engine_desc).unwrap();
        registry.register(&car_desc).unwrap();

        let report = inject_all(&registry, [&engine_desc, &car_desc]);

        let car = registry.find::<Car>().unwrap();
        let engine = registry.find::<Engine>().unwrap();
        assert_eq!(report.injected, 2);
        assert!(report.omitted.is_empty());
        assert!(Arc::ptr_eq(&car.engine.get().unwrap(), &engine));
        assert!(Arc::ptr_eq(&car.spare.get().unwrap(), &engine));
    }

    #[test]
    fn test_inject_all_is_idempotent() {
        let registry = ComponentRegistry::new(DuplicatePolicy::Ignore);
        let engine_desc = ComponentDescriptor::of::<Engine>().build();
        let car_desc = car_descriptor();
        registry.register(&engine_desc).unwrap();
        registry.register(&car_desc).unwrap();

        inject_all(&registry, [&engine_desc, &car_desc]);
        let second = inject_all(&registry, [&engine_desc, &car_desc]);

        assert_eq!(second.injected, 0);
        assert_eq!(second.already_wired, 2);
    }

    #[test]
    fn test_missing_dependency_is_omitted_silently() {
        let registry = ComponentRegistry::new(DuplicatePolicy::Ignore);
        let garage_desc = ComponentDescriptor::of::<Garage>()
            .inject("wheel", |garage: &Garage| &garage.wheel)
            .build();
        registry.register(&garage_desc).unwrap();

        let report = inject_all(&registry, [&garage_desc]);

        assert_eq!(report.injected, 0);
        assert!(matches!(
            report.omitted.as_slice(),
            [InjectionOmitted::MissingDependency { field: "wheel", .. }]
        ));
        assert!(registry.find::<Garage>().unwrap().wheel.get().is_none());
    }

    #[test]
    fn test_read_only_member_is_omitted() {
        let registry = ComponentRegistry::new(DuplicatePolicy::Ignore);
        let engine_desc = ComponentDescriptor::of::<Engine>().build();
        let sealed_desc = ComponentDescriptor::of::<Sealed>()
            .inject("engine", |sealed: &Sealed| &sealed.engine)
            .build();
        registry.register(&engine_desc).unwrap();
        registry.register(&sealed_desc).unwrap();

        let report = inject_all(&registry, [&engine_desc, &sealed_desc]);

        assert!(matches!(
            report.omitted.as_slice(),
            [InjectionOmitted::NotWritable { field: "engine", .. }]
        ));
        assert!(registry.find::<Sealed>().unwrap().engine.get().is_none());
    }

    #[test]
    fn test_unregistered_descriptor_is_skipped() {
        let registry = ComponentRegistry::new(DuplicatePolicy::Ignore);
        let car_desc = car_descriptor();

        let report = inject_all(&registry, [&car_desc]);

        assert_eq!(report.injected, 0);
        assert!(report.omitted.is_empty());
    }
}
