//! 컴포넌트와 이벤트를 식별하는 타입 키
//!
//! 레지스트리와 구독 인덱스는 모두 `TypeId`를 키로 사용합니다.
//! 로그와 에러 메시지에는 사람이 읽을 수 있는 짧은 타입 이름을 함께 보관합니다.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// 타입 식별자
///
/// 동등성과 해시는 `TypeId`만으로 결정되며, `name`은 표시용입니다.
///
/// # Examples
///
/// ```rust
/// use summer::core::Identity;
///
/// struct Clock;
///
/// let id = Identity::of::<Clock>();
/// assert_eq!(id.name(), "Clock");
/// assert_eq!(id, Identity::of::<Clock>());
/// ```
#[derive(Clone, Copy)]
pub struct Identity {
    type_id: TypeId,
    name: &'static str,
}

impl Identity {
    /// 타입 `T`의 식별자를 생성합니다.
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// 모듈 경로를 제외한 타입 이름
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 타입 이름에서 모듈 경로를 제거합니다.
///
/// `std::any::type_name::<T>()`는 `summer::demo::alarm::Alarm`처럼 전체 경로를
/// 포함하므로 마지막 세그먼트만 남깁니다. 제네릭 인자가 있는 경우
/// (`Wrapper<summer::Foo>`) 바깥 타입의 경로만 잘라냅니다.
fn short_type_name(type_name: &'static str) -> &'static str {
    let outer = match type_name.find('<') {
        Some(pos) => &type_name[..pos],
        None => type_name,
    };

    match outer.rfind("::") {
        Some(pos) => &type_name[pos + 2..],
        None => type_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Sample;
    struct Other;

    #[test]
    fn test_identity_uses_short_name() {
        assert_eq!(Identity::of::<Sample>().name(), "Sample");
        assert_eq!(Identity::of::<u32>().name(), "u32");
    }

    #[test]
    fn test_short_type_name_keeps_generic_arguments() {
        assert_eq!(
            short_type_name("alloc::vec::Vec<summer::core::identity::Sample>"),
            "Vec<summer::core::identity::Sample>"
        );
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_identity_equality_follows_type_id() {
        let mut set = HashSet::new();
        set.insert(Identity::of::<Sample>());
        set.insert(Identity::of::<Sample>());
        set.insert(Identity::of::<Other>());

        assert_eq!(set.len(), 2);
        assert_ne!(Identity::of::<Sample>(), Identity::of::<Other>());
    }
}
