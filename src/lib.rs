//! Summer - 경량 컴포넌트 런타임
//!
//! 프로세스 내부에서 동작하는 작은 애플리케이션 프레임워크입니다.
//! 싱글톤 컴포넌트 레지스트리와 의존성 주입, 생명주기 조정,
//! 그리고 동기/비동기 전달을 지원하는 타입 기반 이벤트 버스를 제공합니다.
//!
//! # Features
//!
//! - **싱글톤 레지스트리**: 타입당 하나의 인스턴스, 중복 등록 정책 선택
//! - **의존성 주입**: `Inject<T>` 슬롯, 누락된 의존성은 경고 후 건너뜀
//! - **생명주기**: `start()` 한 번으로 발견, 주입, 초기화까지 진행 (재개 가능)
//! - **이벤트 버스**: sync 핸들러는 fail-fast, async 핸들러는 fail-isolated + 집계
//! - **링크 타임 발견**: `inventory` 기반 `submit_component!`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  ApplicationContext  │ ← start() / get_component() / notify*()
//! └──────────────────────┘
//!      │            │
//!      ▼            ▼
//! ┌──────────┐  ┌──────────┐
//! │ Registry │  │ EventBus │ ← 구독 인덱스 (RwLock + freeze)
//! └──────────┘  └──────────┘
//!      │            ▲
//!      ▼            │
//! ┌──────────┐  ┌──────────────┐
//! │ Injector │  │ Handler 색인 │ ← 디스크립터에 선언된 핸들러
//! └──────────┘  └──────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use summer::config::RuntimeConfig;
//! use summer::core::{ApplicationContext, ComponentTable};
//!
//! let ctx = ApplicationContext::new(ComponentTable::discover(), RuntimeConfig::from_env());
//! ctx.start()?;
//!
//! let alarm = ctx.get_component::<Alarm>().expect("alarm is registered");
//! ctx.notify(TimeChanged { time })?;
//! ```

pub mod config;
pub mod core;
pub mod demo;
pub mod events;
pub mod utils;

#[doc(hidden)]
pub use inventory;
