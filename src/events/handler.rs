//! 이벤트 핸들러 타입
//!
//! 핸들러는 등록 시점에 타입이 지워진 호출자([`Invoker`])로 변환됩니다.
//! 전달 시점에는 이벤트 식별자로 조회만 하면 되므로 리플렉션이 필요 없습니다.

use std::any::{Any, type_name};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use log::debug;

use crate::core::errors::{BoxError, HandlerFault, HandlerResult};
use crate::core::identity::Identity;

/// 버스로 전달되는 이벤트
///
/// 이벤트는 발행자가 생성한 불변 값입니다. 버스는 이벤트를 `Arc`로 감싸고
/// 핸들러에게는 공유 참조만 넘깁니다.
pub trait Event: Any + Send + Sync {}

/// 핸들러 실행 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerMode {
    /// 결과를 즉시 반환하는 핸들러
    Sync,
    /// 완료를 나타내는 future를 반환하는 핸들러
    Async,
}

/// 구독 시 발급되는 핸들러 번호 (버스 내에서 고유)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// `async fn`으로 이벤트를 처리하는 컴포넌트
///
/// 디스크립터에서 `.listen_async::<E>("name")`으로 등록합니다.
///
/// ```rust,ignore
/// #[async_trait]
/// impl AsyncListener<AlarmRang> for CucoClock {
///     async fn on_event(&self, event: &AlarmRang) -> HandlerResult {
///         info!("Cuco, Cuco! It's {}!", event.time);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncListener<E: Event>: Send + Sync + 'static {
    async fn on_event(&self, event: &E) -> HandlerResult;
}

type SyncCall = dyn Fn(&(dyn Any + Send + Sync)) -> HandlerResult + Send + Sync;
type AsyncCall =
    dyn Fn(Arc<dyn Any + Send + Sync>) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// 타입이 지워진 핸들러 호출자
pub(crate) enum Invoker {
    Sync(Box<SyncCall>),
    Async(Box<AsyncCall>),
}

impl Invoker {
    pub(crate) fn sync<E, F>(handler: F) -> Self
    where
        E: Event,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        Invoker::Sync(Box::new(move |event: &(dyn Any + Send + Sync)| {
            match event.downcast_ref::<E>() {
                Some(event) => handler(event),
                None => Err(mismatch::<E>()),
            }
        }))
    }

    pub(crate) fn async_fn<E, F, Fut>(handler: F) -> Self
    where
        E: Event,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Invoker::Async(Box::new(move |event: Arc<dyn Any + Send + Sync>| {
            match event.downcast::<E>() {
                Ok(event) => handler(event).boxed(),
                Err(_) => futures::future::ready(Err(mismatch::<E>())).boxed(),
            }
        }))
    }

    /// 수신자를 `Weak`로 보관하는 동기 호출자
    ///
    /// 전달 시점에 수신자가 이미 해제되었다면 호출하지 않고 성공으로 처리합니다.
    pub(crate) fn bound_sync<T, E, F>(receiver: Weak<T>, handler: F) -> Self
    where
        T: Send + Sync + 'static,
        E: Event,
        F: Fn(&T, &E) -> HandlerResult + Send + Sync + 'static,
    {
        Self::sync(move |event: &E| match receiver.upgrade() {
            Some(receiver) => handler(&receiver, event),
            None => {
                debug!("Receiver {} was dropped; skipping handler", type_name::<T>());
                Ok(())
            }
        })
    }

    pub(crate) fn bound_async<T, E, F>(receiver: Weak<T>, handler: F) -> Self
    where
        T: Send + Sync + 'static,
        E: Event,
        F: Fn(Arc<T>, Arc<E>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static,
    {
        Self::async_fn(move |event: Arc<E>| match receiver.upgrade() {
            Some(receiver) => handler(receiver, event),
            None => {
                debug!("Receiver {} was dropped; skipping handler", type_name::<T>());
                futures::future::ready(Ok(())).boxed()
            }
        })
    }

    pub(crate) fn mode(&self) -> HandlerMode {
        match self {
            Invoker::Sync(_) => HandlerMode::Sync,
            Invoker::Async(_) => HandlerMode::Async,
        }
    }
}

fn mismatch<E: Event>() -> BoxError {
    format!("handler expected event of type {}", type_name::<E>()).into()
}

/// 구독 인덱스의 항목
pub(crate) struct HandlerRegistration {
    pub id: HandlerId,
    pub label: String,
    pub event: Identity,
    pub invoker: Invoker,
}

impl HandlerRegistration {
    pub(crate) fn mode(&self) -> HandlerMode {
        self.invoker.mode()
    }

    pub(crate) fn fault(&self, source: BoxError) -> HandlerFault {
        HandlerFault {
            handler: self.label.clone(),
            event: self.event,
            source,
        }
    }

    pub(crate) fn info(&self) -> HandlerInfo {
        HandlerInfo {
            id: self.id,
            name: self.label.clone(),
            mode: self.mode(),
        }
    }
}

/// 등록된 핸들러의 공개 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    pub id: HandlerId,
    /// `Owner.handler` 형식의 이름 (수신자가 없는 클로저는 이름만)
    pub name: String,
    pub mode: HandlerMode,
}

/// panic payload를 핸들러 에러로 변환합니다.
pub(crate) fn panic_error(payload: Box<dyn Any + Send>) -> BoxError {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    };

    format!("panicked: {}", message).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping(u32);
    impl Event for Ping {}

    struct Pong;
    impl Event for Pong {}

    #[test]
    fn test_sync_invoker_rejects_other_event_type() {
        let invoker = Invoker::sync(|ping: &Ping| {
            assert_eq!(ping.0, 7);
            Ok(())
        });
        let Invoker::Sync(call) = invoker else {
            panic!("expected sync invoker");
        };

        assert!(call(&Ping(7)).is_ok());
        assert!(call(&Pong).is_err());
    }

    #[test]
    fn test_bound_sync_skips_dropped_receiver() {
        let receiver = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let invoker = Invoker::bound_sync(
            Arc::downgrade(&receiver),
            |counter: &std::sync::atomic::AtomicUsize, _: &Ping| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            },
        );
        let Invoker::Sync(call) = invoker else {
            panic!("expected sync invoker");
        };

        call(&Ping(1)).unwrap();
        assert_eq!(receiver.load(std::sync::atomic::Ordering::SeqCst), 1);

        drop(receiver);
        assert!(call(&Ping(2)).is_ok());
    }

    #[test]
    fn test_async_invoker_mode() {
        let invoker = Invoker::async_fn(|_: Arc<Ping>| async { Ok(()) });

        assert_eq!(invoker.mode(), HandlerMode::Async);
    }

    #[test]
    fn test_panic_error_keeps_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");

        assert_eq!(panic_error(payload).to_string(), "panicked: boom");
    }
}
