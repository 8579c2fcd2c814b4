//! # Configuration Module
//!
//! 런타임과 데모 애플리케이션의 설정을 환경 변수에서 읽어오는 모듈입니다.
//! Spring의 `@ConfigurationProperties`와 유사하게 설정값을 타입이 있는 구조체로 모읍니다.
//!
//! ## 모듈 구성
//!
//! - [`runtime_config`] - 실행 환경, 중복 등록 정책, 구독 동결
//! - [`demo_config`] - 시계/알람 데모 실행 시간
//!
//! ## 환경 변수
//!
//! ```bash
//! export SUMMER_ENVIRONMENT="development"   # development, test, staging, production
//! export SUMMER_DUPLICATE_POLICY="reject"   # ignore (기본값), reject
//! export SUMMER_FREEZE_SUBSCRIPTIONS="true" # 기본값 false
//!
//! export DEMO_ALARM_DELAY_SECS="5"
//! export DEMO_RUN_SECS="15"
//! ```
//!
//! 바이너리는 `PROFILE` 값에 따라 `.env.dev` / `.env.prod` 파일을 먼저 로드합니다.
//!
//! ## Spring과의 비교
//!
//! | Spring | 이 프로젝트 |
//! |--------|-------------|
//! | `@Profile("dev")` | `Environment::Development` |
//! | `application.yml` | `.env` 파일 |
//! | `allow-bean-definition-overriding` | `SUMMER_DUPLICATE_POLICY` |
//! | `@ConfigurationProperties` | `RuntimeConfig`, `DemoConfig` |

pub mod demo_config;
pub mod runtime_config;

pub use demo_config::*;
pub use runtime_config::*;
