//! 터미널 출력 포맷팅 유틸리티
//!
//! 부트스트랩 과정의 진행 상황을 보기 좋게 만드는 문자열 포맷터입니다.
//! 출력은 호출자가 `log` 매크로로 내보내므로 `RUST_LOG` 필터를 그대로 따릅니다.

const CONTENT_WIDTH: usize = 50;

/// 박스 형태로 둘러싼 제목
///
/// ```rust
/// use summer::utils::display_terminal::boxed_title;
///
/// let title = boxed_title("Context Started");
/// assert_eq!(title.lines().count(), 3);
/// assert!(title.lines().nth(1).unwrap().contains("Context Started"));
/// ```
///
/// Output:
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║                 Context Started                  ║
/// ╚══════════════════════════════════════════════════╝
/// ```
pub fn boxed_title(title: &str) -> String {
    let border = "═".repeat(CONTENT_WIDTH);

    format!(
        "╔{border}╗\n║{title:^width$}║\n╚{border}╝",
        width = CONTENT_WIDTH
    )
}

/// 진행 단계 시작
///
/// ```text
/// → Step 1: Discovering components
/// ```
pub fn step_start(step: u8, description: &str) -> String {
    format!("→ Step {}: {}", step, description)
}

/// 진행 단계 완료와 처리된 항목 수
///
/// ```text
/// ✓ Step 1: Components registered (5 items)
/// ```
pub fn step_complete(step: u8, description: &str, count: usize) -> String {
    format!("✓ Step {}: {} ({} items)", step, description, count)
}

/// 들여쓰기된 하위 작업 상태
///
/// ```text
///    ├─ Alarm: initialized
/// ```
pub fn sub_task(name: &str, status: &str) -> String {
    format!("   ├─ {}: {}", name, status)
}

/// 부트스트랩 완료 요약
///
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║           🎉 APPLICATION CONTEXT STARTED         ║
/// ╚══════════════════════════════════════════════════╝
///    📦 Components: 4
///    📣 Event handlers: 3
///    ⚠️  Skipped injections: 0
/// ```
pub fn final_summary(components: usize, handlers: usize, skipped: usize) -> String {
    format!(
        "{}\n   📦 Components: {}\n   📣 Event handlers: {}\n   ⚠️  Skipped injections: {}",
        boxed_title("🎉 APPLICATION CONTEXT STARTED"),
        components,
        handlers,
        skipped
    )
}
