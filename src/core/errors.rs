//! # Runtime Error Types
//!
//! 컴포넌트 엔진과 이벤트 버스에서 발생하는 모든 에러를 정의합니다.
//! `thiserror`로 `Error` trait을 구현하며, 에러의 성격에 따라 두 갈래로 처리됩니다.
//!
//! ## 전파 정책
//!
//! | 에러 | 처리 방식 | 호출자에게 전달 |
//! |------|-----------|-----------------|
//! | [`ComponentError`] | 등록/부트스트랩 실패 | `start()` / `register()` 호출자 |
//! | [`InjectionOmitted`] | `warn!` 로그 후 건너뜀 | 전달되지 않음 |
//! | [`InvalidHandlerSignature`] | `warn!` 로그 후 건너뜀 | 전달되지 않음 |
//! | [`HandlerFault`] (sync) | 남은 sync 핸들러 중단 | `notify()` 호출자 |
//! | [`HandlerFault`] (async) | 모든 핸들러 완료 후 집계 | `notify*()` 호출자 |
//!
//! 재시도 로직은 어디에도 없습니다. 모든 실패는 로그로 기록되고 무시되거나,
//! 정확히 한 번 호출자에게 전달됩니다.

use thiserror::Error;

use crate::core::identity::Identity;

/// 핸들러와 초기화 훅이 반환하는 에러 타입
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 이벤트 핸들러의 반환 타입
pub type HandlerResult = Result<(), BoxError>;

/// 컴포넌트 등록과 부트스트랩 과정의 구조적 에러
///
/// 이 에러들은 로컬에서 복구되지 않고 `start()` 호출자에게 그대로 전달됩니다.
#[derive(Error, Debug)]
pub enum ComponentError {
    /// 컴포넌트 계약을 만족하지 않거나 기본 생성자가 없는 타입
    ///
    /// # 발생 시나리오
    /// - 생성자 없이 선언된 추상 타입을 직접 등록
    /// - 팩토리 함수가 에러를 반환
    ///
    /// 실패한 등록은 레지스트리에 아무 항목도 남기지 않습니다.
    #[error("Invalid component {component}: {reason}")]
    InvalidComponent {
        component: Identity,
        reason: String,
    },

    /// `DuplicatePolicy::Reject` 상태에서 같은 타입을 다시 등록
    #[error("Component {component} is already registered")]
    DuplicateComponent { component: Identity },

    /// `Component::initialize()` 훅이 실패
    #[error("Failed to initialize component {component}: {source}")]
    InitializationFailed {
        component: Identity,
        #[source]
        source: BoxError,
    },

    /// 다른 호출(또는 초기화 훅 내부의 재진입 호출)이 이미 부트스트랩을 진행 중
    #[error("Application context is already starting")]
    BootstrapInProgress,
}

/// 주입되지 않고 건너뛴 주입 지점
///
/// 치명적이지 않은 누락입니다. 인젝터는 이 값을 `warn!`으로 기록하고
/// 해당 슬롯을 비워 둔 채 다음 주입 지점으로 넘어갑니다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectionOmitted {
    #[error("{component}.{field}: dependency {dependency} is not registered")]
    MissingDependency {
        component: Identity,
        field: &'static str,
        dependency: Identity,
    },

    #[error("{component}.{field}: member is read-only")]
    NotWritable {
        component: Identity,
        field: &'static str,
    },
}

/// 선언된 이벤트와 핸들러가 받는 이벤트 타입이 일치하지 않음
///
/// 핸들러 인덱싱 단계에서 `warn!`으로 기록되고 해당 마커는 등록되지 않습니다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{component}.{handler} is declared for {declared} but accepts {accepted}")]
pub struct InvalidHandlerSignature {
    pub component: Identity,
    pub handler: &'static str,
    pub declared: Identity,
    pub accepted: Identity,
}

/// 단일 핸들러 실행 실패
///
/// 핸들러가 반환한 에러나 실행 중 발생한 panic을 핸들러 이름, 이벤트와 함께 보관합니다.
#[derive(Error, Debug)]
#[error("Handler {handler} failed on {event}: {source}")]
pub struct HandlerFault {
    pub handler: String,
    pub event: Identity,
    #[source]
    pub source: BoxError,
}

/// 이벤트 구독 및 전달 에러
#[derive(Error, Debug)]
pub enum EventError {
    /// 정확히 하나의 핸들러가 실패
    #[error(transparent)]
    Handler(#[from] HandlerFault),

    /// 둘 이상의 async 핸들러가 실패 (모든 핸들러가 끝난 뒤 집계)
    #[error("{} handlers failed: {}", .0.len(), join_faults(.0))]
    Aggregate(Vec<HandlerFault>),

    /// 수신자(receiver)가 살아있지 않은 핸들러 구독 시도
    #[error("Handler {handler} has no bound receiver")]
    UnboundHandler { handler: String },

    /// `freeze()` 이후의 구독 시도
    #[error("Subscriptions are frozen; cannot subscribe to {event}")]
    SubscriptionsFrozen { event: Identity },

    /// 런타임 밖에서 async 핸들러를 구동할 디스패치 런타임 생성 실패
    #[error("Failed to start the dispatch runtime: {0}")]
    DispatchRuntime(#[source] std::io::Error),
}

impl EventError {
    /// 집계된 모든 핸들러 실패를 반환합니다.
    ///
    /// `Handler`는 하나, `Aggregate`는 전체, 그 외 변형은 빈 슬라이스를 반환합니다.
    pub fn faults(&self) -> &[HandlerFault] {
        match self {
            EventError::Handler(fault) => std::slice::from_ref(fault),
            EventError::Aggregate(faults) => faults,
            _ => &[],
        }
    }

    /// 실패 목록을 단일/집계 에러로 변환합니다. 실패가 없으면 `Ok(())`.
    pub(crate) fn from_faults(mut faults: Vec<HandlerFault>) -> Result<(), EventError> {
        match faults.len() {
            0 => Ok(()),
            1 => Err(EventError::Handler(faults.remove(0))),
            _ => Err(EventError::Aggregate(faults)),
        }
    }
}

fn join_faults(faults: &[HandlerFault]) -> String {
    faults
        .iter()
        .map(|fault| fault.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tick;

    fn fault(name: &str) -> HandlerFault {
        HandlerFault {
            handler: name.to_string(),
            event: Identity::of::<Tick>(),
            source: format!("{} broke", name).into(),
        }
    }

    #[test]
    fn test_from_faults_without_faults_is_ok() {
        assert!(EventError::from_faults(Vec::new()).is_ok());
    }

    #[test]
    fn test_from_faults_single_fault_is_not_aggregated() {
        let err = EventError::from_faults(vec![fault("first")]).unwrap_err();

        assert!(matches!(err, EventError::Handler(_)));
        assert_eq!(err.faults().len(), 1);
        assert_eq!(err.to_string(), "Handler first failed on Tick: first broke");
    }

    #[test]
    fn test_from_faults_multiple_faults_are_aggregated() {
        let err = EventError::from_faults(vec![fault("a"), fault("b")]).unwrap_err();

        assert!(matches!(err, EventError::Aggregate(ref faults) if faults.len() == 2));
        assert!(err.to_string().starts_with("2 handlers failed"));
    }

    #[test]
    fn test_injection_omitted_message() {
        struct Owner;
        struct Missing;

        let omitted = InjectionOmitted::MissingDependency {
            component: Identity::of::<Owner>(),
            field: "missing",
            dependency: Identity::of::<Missing>(),
        };

        assert_eq!(
            omitted.to_string(),
            "Owner.missing: dependency Missing is not registered"
        );
    }
}
