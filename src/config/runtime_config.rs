//! 런타임 설정 관리 모듈
//!
//! 실행 환경, 중복 등록 정책, 구독 동결 여부를 환경 변수에서 읽어옵니다.

use std::env;

use log::warn;

use crate::core::registry::DuplicatePolicy;

/// 실행 환경 프로필
pub const ENVIRONMENT_KEY: &str = "SUMMER_ENVIRONMENT";
/// `ignore` | `reject`
pub const DUPLICATE_POLICY_KEY: &str = "SUMMER_DUPLICATE_POLICY";
/// `true` | `false`
pub const FREEZE_SUBSCRIPTIONS_KEY: &str = "SUMMER_FREEZE_SUBSCRIPTIONS";

/// 애플리케이션 실행 환경
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// 개발 환경 - 상세한 로그
    Development,
    /// 테스트 환경 - 경고 이상만 출력
    Test,
    /// 스테이징 환경 - 프로덕션 유사 환경
    Staging,
    /// 프로덕션 환경
    #[default]
    Production,
}

impl Environment {
    /// 문자열에서 Environment를 생성합니다. 알 수 없는 값은 `Production`입니다.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }

    /// `RUST_LOG`가 없을 때 사용할 `env_logger` 필터
    ///
    /// | 환경 | 필터 |
    /// |------|------|
    /// | Development | `debug` |
    /// | Test | `warn` |
    /// | Staging / Production | `info` |
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Development => "debug",
            Environment::Test => "warn",
            Environment::Staging | Environment::Production => "info",
        }
    }

    /// `SUMMER_ENVIRONMENT`만 읽습니다.
    ///
    /// 로거 초기화 전에 필터를 고를 때 사용합니다. 나머지 설정은 로거가 준비된 뒤
    /// [`RuntimeConfig::from_env`]로 읽어야 파싱 경고가 남습니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ENVIRONMENT_KEY)
            .map(|value| Environment::parse(&value))
            .unwrap_or_default()
    }
}

/// 애플리케이션 컨텍스트 설정
///
/// # Examples
///
/// ```rust
/// use summer::config::RuntimeConfig;
/// use summer::core::DuplicatePolicy;
///
/// let config = RuntimeConfig::from_lookup(|key| match key {
///     "SUMMER_DUPLICATE_POLICY" => Some("reject".to_string()),
///     _ => None,
/// });
///
/// assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
/// assert!(!config.freeze_subscriptions);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuntimeConfig {
    pub environment: Environment,
    pub duplicate_policy: DuplicatePolicy,
    /// `start()` 완료 후 이벤트 구독을 동결할지 여부
    pub freeze_subscriptions: bool,
}

impl RuntimeConfig {
    /// 프로세스 환경 변수에서 설정을 읽어옵니다.
    ///
    /// `SUMMER_ENVIRONMENT`가 없으면 `Production`을 기본값으로 사용합니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정을 구성합니다.
    ///
    /// 잘못된 값은 경고를 남기고 기본값으로 대체합니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_lookup(&lookup);

        let duplicate_policy = match lookup(DUPLICATE_POLICY_KEY) {
            None => DuplicatePolicy::default(),
            Some(value) => DuplicatePolicy::parse(&value).unwrap_or_else(|| {
                warn!("{} 파싱 실패: '{}'. 기본값 ignore 사용", DUPLICATE_POLICY_KEY, value);
                DuplicatePolicy::default()
            }),
        };

        let freeze_subscriptions = match lookup(FREEZE_SUBSCRIPTIONS_KEY) {
            None => false,
            Some(value) => parse_flag(&value).unwrap_or_else(|| {
                warn!("{} 파싱 실패: '{}'. 기본값 false 사용", FREEZE_SUBSCRIPTIONS_KEY, value);
                false
            }),
        };

        Self {
            environment,
            duplicate_policy,
            freeze_subscriptions,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
