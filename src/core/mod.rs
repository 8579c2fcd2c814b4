//! # Core Framework Module
//!
//! 컴포넌트 레지스트리, 의존성 주입, 생명주기 조정을 제공하는 모듈입니다.
//! Spring Framework의 핵심 컨테이너 기능을 리플렉션 없이, 타입 키와 디스크립터로 구현합니다.
//!
//! ## 모듈 구성
//!
//! ### [`identity`] - 타입 식별자
//! - `TypeId` 기반 키 + 로그용 짧은 이름
//!
//! ### [`component`] - 컴포넌트 선언
//! - **ComponentDescriptor**: 생성자, 주입 지점, 이벤트 핸들러 선언
//! - **ComponentTable**: 부트스트랩 대상 목록 (`inventory` 링크 타임 수집 지원)
//!
//! ### [`registry`] - 싱글톤 레지스트리
//! - 타입당 하나의 인스턴스, 등록 순서 유지
//! - `DuplicatePolicy`로 중복 등록 처리 방식 선택
//!
//! ### [`inject`] - 의존성 주입
//! - `Inject<T>` 슬롯과 전체 주입 패스
//!
//! ### [`lifecycle`] - 애플리케이션 컨텍스트
//! - `Uninitialized → Discovered → Injected → Initialized`
//!
//! ### [`errors`] - 에러 타입
//! - `thiserror` 기반 구조적 에러와 핸들러 실패 집계
//!
//! ## Spring Framework와의 비교
//!
//! | Spring | 이 프레임워크 |
//! |--------|---------------|
//! | `@Component` | `ComponentDescriptor::of::<T>()` |
//! | 클래스패스 스캔 | `submit_component!` + `ComponentTable::discover()` |
//! | `ApplicationContext` | [`ApplicationContext`] |
//! | `@Autowired` | `Inject<T>` 필드 + `.inject(...)` |
//! | `@PostConstruct` | `Component::initialize()` |
//! | `@EventListener` | `.on(...)` / `.on_async(...)` |
//! | Bean 생명주기 | Singleton, `start()` 시점에 모두 생성 |
//!
//! ## 사용 패턴
//!
//! ```rust
//! use std::sync::Arc;
//! use summer::core::{ApplicationContext, Component, ComponentDescriptor, ComponentTable, Inject};
//!
//! #[derive(Default)]
//! struct Repository;
//! impl Component for Repository {}
//!
//! #[derive(Default)]
//! struct Service {
//!     repository: Inject<Repository>,
//! }
//! impl Component for Service {}
//!
//! let table = ComponentTable::new()
//!     .with(ComponentDescriptor::of::<Repository>())
//!     .with(ComponentDescriptor::of::<Service>().inject("repository", |s: &Service| &s.repository));
//!
//! let ctx = ApplicationContext::with_table(table);
//! ctx.start().unwrap();
//!
//! let service: Arc<Service> = ctx.get_component().unwrap();
//! assert!(service.repository.get().is_some());
//! ```
//!
//! ## 트러블슈팅
//!
//! ### 주입되지 않은 슬롯
//! ```text
//! WARN Injection skipped: Service.repository: dependency Repository is not registered
//! ```
//! **해결**: 의존 대상 디스크립터를 테이블에 추가하거나 `register_instance()`로 등록
//!
//! ### 무시된 핸들러
//! ```text
//! WARN Handler skipped: Alarm.on_time is declared for AlarmRang but accepts TimeChanged
//! ```
//! **해결**: `also_handles::<E>()`에는 핸들러가 받는 이벤트 타입만 지정

pub mod component;
pub mod errors;
pub mod identity;
pub mod inject;
pub mod lifecycle;
pub mod registry;

pub use component::{Component, ComponentDescriptor, ComponentRegistration, ComponentTable, DescriptorBuilder};
pub use errors::*;
pub use identity::Identity;
pub use inject::{Inject, InjectionReport, inject_all};
pub use lifecycle::{ApplicationContext, LifecycleState};
pub use registry::{ComponentRegistry, DuplicatePolicy, Registration};
