//! # Event Module
//!
//! 타입 기반 이벤트 버스와 핸들러 타입을 제공합니다.
//!
//! - [`bus`] - 구독 인덱스와 동기/비동기 전달
//! - [`handler`] - `Event`, `AsyncListener`, 핸들러 메타데이터
//!
//! ```rust
//! use summer::events::{Event, EventBus};
//!
//! struct Greeted(&'static str);
//! impl Event for Greeted {}
//!
//! let bus = EventBus::new();
//! bus.subscribe("print", |event: &Greeted| {
//!     println!("hello, {}", event.0);
//!     Ok(())
//! })
//! .unwrap();
//!
//! bus.notify(Greeted("summer")).unwrap();
//! ```

pub mod bus;
pub mod handler;

pub use bus::EventBus;
pub use handler::{AsyncListener, Event, HandlerId, HandlerInfo, HandlerMode};
