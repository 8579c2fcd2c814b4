//! # Component Registry
//!
//! 타입별 싱글톤 인스턴스를 보관하는 레지스트리입니다.
//! Spring의 `DefaultListableBeanFactory`에서 싱글톤 캐시 부분만 떼어낸 형태입니다.
//!
//! ## 등록 절차
//!
//! ```text
//! register(descriptor)
//!   1. 읽기 락으로 중복 확인        → 있으면 정책에 따라 AlreadyPresent / DuplicateComponent
//!   2. 락 밖에서 인스턴스 생성      → 추상 타입이거나 팩토리 실패 시 InvalidComponent
//!   3. 쓰기 락에서 다시 확인 후 삽입 (double-checked locking)
//! ```
//!
//! 생성자는 락을 잡지 않은 상태에서 실행되므로, 생성자 안에서 레지스트리를
//! 조회해도 교착되지 않습니다. 동시에 같은 타입을 등록하면 먼저 삽입한 쪽이
//! 이기고 나머지 인스턴스는 버려집니다.
//!
//! ## 락 오염(poisoning)
//!
//! 보관된 데이터는 삽입 시점에 항상 완전한 상태이므로, 다른 스레드가 락을 잡은 채
//! panic 했더라도 내부 값을 그대로 사용합니다.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};

use crate::core::component::{Component, ComponentDescriptor, ComponentEntry};
use crate::core::errors::ComponentError;
use crate::core::identity::Identity;

/// 같은 타입을 두 번 등록할 때의 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// 기존 인스턴스를 유지하고 조용히 성공
    #[default]
    Ignore,
    /// `ComponentError::DuplicateComponent` 반환
    Reject,
}

impl DuplicatePolicy {
    /// `ignore` / `reject` (대소문자 무관)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "ignore" => Some(DuplicatePolicy::Ignore),
            "reject" => Some(DuplicatePolicy::Reject),
            _ => None,
        }
    }
}

/// 등록 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// 새 인스턴스가 생성되어 저장됨
    Created,
    /// 이미 등록된 인스턴스가 있어 아무것도 하지 않음
    AlreadyPresent,
}

#[derive(Default)]
struct Entries {
    by_identity: HashMap<Identity, ComponentEntry>,
    order: Vec<Identity>,
}

/// 싱글톤 컴포넌트 레지스트리
///
/// 타입당 최대 하나의 인스턴스를 보관하며, 등록 순서를 기억합니다.
/// 모든 메서드는 `&self`로 동작하며 여러 스레드에서 동시에 호출할 수 있습니다.
pub struct ComponentRegistry {
    entries: RwLock<Entries>,
    policy: DuplicatePolicy,
}

impl ComponentRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// 디스크립터로 인스턴스를 생성해 등록합니다.
    ///
    /// # Errors
    ///
    /// * `InvalidComponent` - 추상 타입이거나 팩토리가 실패한 경우 (레지스트리는 변경되지 않음)
    /// * `DuplicateComponent` - `Reject` 정책에서 이미 등록된 타입인 경우
    pub fn register(&self, descriptor: &ComponentDescriptor) -> Result<Registration, ComponentError> {
        let identity = descriptor.identity();

        if self.contains(&identity) {
            return self.duplicate(identity);
        }

        let entry = match descriptor.construct() {
            None => {
                return Err(ComponentError::InvalidComponent {
                    component: identity,
                    reason: "abstract type has no constructor".to_string(),
                });
            }
            Some(Err(source)) => {
                return Err(ComponentError::InvalidComponent {
                    component: identity,
                    reason: source.to_string(),
                });
            }
            Some(Ok(entry)) => entry,
        };

        self.insert(entry)
    }

    /// 외부에서 만든 인스턴스를 등록합니다.
    ///
    /// 설정 객체처럼 디스크립터 없이 직접 생성한 값을 다른 컴포넌트에 주입할 때 사용합니다.
    pub fn register_instance<T: Component>(&self, instance: Arc<T>) -> Result<Registration, ComponentError> {
        let identity = Identity::of::<T>();
        if self.contains(&identity) {
            return self.duplicate(identity);
        }

        self.insert(ComponentEntry::new(instance))
    }

    fn insert(&self, entry: ComponentEntry) -> Result<Registration, ComponentError> {
        let identity = entry.identity;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        // 생성 중에 다른 스레드가 먼저 삽입했을 수 있음
        if entries.by_identity.contains_key(&identity) {
            drop(entries);
            return self.duplicate(identity);
        }

        entries.by_identity.insert(identity, entry);
        entries.order.push(identity);
        info!("📦 Registered component: {}", identity);

        Ok(Registration::Created)
    }

    fn duplicate(&self, identity: Identity) -> Result<Registration, ComponentError> {
        match self.policy {
            DuplicatePolicy::Ignore => {
                debug!("Component {} already registered; keeping existing instance", identity);
                Ok(Registration::AlreadyPresent)
            }
            DuplicatePolicy::Reject => Err(ComponentError::DuplicateComponent { component: identity }),
        }
    }

    /// 타입으로 인스턴스를 조회합니다.
    pub fn find<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.find_by_identity(&Identity::of::<T>())
            .and_then(|instance| instance.downcast::<T>().ok())
    }

    /// 식별자로 타입이 지워진 인스턴스를 조회합니다.
    pub fn find_by_identity(&self, identity: &Identity) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_identity
            .get(identity)
            .map(|entry| entry.instance.clone())
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_identity
            .contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 등록 순서대로 정렬된 식별자 목록
    pub fn identities(&self) -> Vec<Identity> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).order.clone()
    }

    /// 등록 순서대로 정렬된 항목의 스냅샷
    pub(crate) fn entries(&self) -> Vec<ComponentEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .order
            .iter()
            .filter_map(|identity| entries.by_identity.get(identity).cloned())
            .collect()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Ledger;
    impl Component for Ledger {}

    #[derive(Default)]
    struct Mailer;
    impl Component for Mailer {}

    trait Notifier: Send + Sync {}

    #[test]
    fn test_register_then_find_returns_same_instance() {
        let registry = ComponentRegistry::default();
        let descriptor = ComponentDescriptor::of::<Ledger>().build();

        assert_eq!(registry.register(&descriptor).unwrap(), Registration::Created);

        let first = registry.find::<Ledger>().unwrap();
        let second = registry.find::<Ledger>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_duplicate_is_ignored_by_default() {
        let registry = ComponentRegistry::default();
        let descriptor = ComponentDescriptor::of::<Ledger>().build();
        registry.register(&descriptor).unwrap();
        let original = registry.find::<Ledger>().unwrap();

        assert_eq!(
            registry.register(&descriptor).unwrap(),
            Registration::AlreadyPresent
        );
        assert!(Arc::ptr_eq(&original, &registry.find::<Ledger>().unwrap()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_is_rejected_with_reject_policy() {
        let registry = ComponentRegistry::new(DuplicatePolicy::Reject);
        let descriptor = ComponentDescriptor::of::<Ledger>().build();
        registry.register(&descriptor).unwrap();

        let err = registry.register(&descriptor).unwrap_err();

        assert!(matches!(err, ComponentError::DuplicateComponent { .. }));
    }

    #[test]
    fn test_abstract_type_is_invalid() {
        let registry = ComponentRegistry::default();
        let descriptor = ComponentDescriptor::abstract_type::<dyn Notifier>();

        let err = registry.register(&descriptor).unwrap_err();

        assert!(matches!(err, ComponentError::InvalidComponent { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failed_factory_leaves_no_entry() {
        let registry = ComponentRegistry::default();
        let descriptor =
            ComponentDescriptor::from_factory::<Mailer, _>(|| Err("smtp host missing".into())).build();

        let err = registry.register(&descriptor).unwrap_err();

        assert!(err.to_string().contains("smtp host missing"));
        assert!(!registry.contains(&Identity::of::<Mailer>()));
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let registry = ComponentRegistry::default();
        registry.register(&ComponentDescriptor::of::<Mailer>().build()).unwrap();
        registry.register(&ComponentDescriptor::of::<Ledger>().build()).unwrap();

        assert_eq!(
            registry.identities(),
            vec![Identity::of::<Mailer>(), Identity::of::<Ledger>()]
        );
    }

    #[test]
    fn test_register_instance_is_findable() {
        let registry = ComponentRegistry::default();
        let ledger = Arc::new(Ledger);

        registry.register_instance(ledger.clone()).unwrap();

        assert!(Arc::ptr_eq(&registry.find::<Ledger>().unwrap(), &ledger));
    }

    #[test]
    fn test_concurrent_registration_yields_one_instance() {
        static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

        struct Counted;
        impl Component for Counted {}

        let registry = Arc::new(ComponentRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let descriptor = ComponentDescriptor::from_factory(|| {
                        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
                        Ok(Counted)
                    })
                    .build();
                    registry.register(&descriptor).unwrap();
                    registry.find::<Counted>().unwrap()
                })
            })
            .collect();

        let instances: Vec<Arc<Counted>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(instances.iter().all(|instance| Arc::ptr_eq(instance, &instances[0])));
        assert_eq!(registry.len(), 1);
        assert!(CONSTRUCTED.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_parse_duplicate_policy() {
        assert_eq!(DuplicatePolicy::parse("Reject"), Some(DuplicatePolicy::Reject));
        assert_eq!(DuplicatePolicy::parse(" ignore "), Some(DuplicatePolicy::Ignore));
        assert_eq!(DuplicatePolicy::parse("replace"), None);
    }
}
