//! Summer 시계/알람 데모 애플리케이션
//!
//! 링크 타임에 제출된 컴포넌트로 컨텍스트를 구동하고, 몇 초 뒤에 울리는 알람을 설정합니다.
//! Ctrl+C를 누르거나 `DEMO_RUN_SECS`가 지나면 종료됩니다.

use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};
use summer::config::{DemoConfig, Environment, RuntimeConfig};
use summer::core::{ApplicationContext, ComponentTable};
use summer::demo::Alarm;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 환경 설정 및 로깅 초기화
    let env_file = load_env_file();
    init_logging(Environment::from_env());
    let config = RuntimeConfig::from_env();

    match env_file {
        Ok(file) => info!("{} 파일 로드 됨", file),
        Err(e) => warn!("{}", e),
    }

    info!("🚀 Summer 데모 시작중... ({:?})", config.environment);

    let demo = DemoConfig::from_env();
    let ctx = ApplicationContext::new(ComponentTable::discover(), config);
    ctx.start()?;

    info!("===============================================");
    info!("Hello, Summer!");
    info!("- Press Ctrl+C at any time to exit the program!");
    info!("===============================================");

    let alarm = ctx
        .get_component::<Alarm>()
        .ok_or("Couldn't find Alarm component!")?;

    if alarm.add_alarm_after(demo.alarm_delay).is_none() {
        warn!("Clock is not wired into Alarm; no alarm was set");
    }

    tokio::select! {
        _ = tokio::time::sleep(demo.run_for) => {
            info!("⏱️ {}초가 지나 데모를 종료합니다", demo.run_for.as_secs());
        }
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("👋 종료 신호 수신"),
                Err(e) => error!("종료 신호 대기 실패: {}", e),
            }
        }
    }

    Ok(())
}

/// 환경별 설정 파일을 로드합니다
///
/// # Environment Variables
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
///
/// 로거 초기화 전에 호출되므로 결과를 반환하고, 로그는 호출자가 남깁니다.
fn load_env_file() -> Result<&'static str, String> {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    let file = match profile.as_str() {
        "prod" => ".env.prod",
        "dev" => ".env.dev",
        _ => {
            return dotenv()
                .map(|_| ".env")
                .map_err(|e| format!("기본 .env 파일 로드 실패: {}", e));
        }
    };

    dotenv::from_filename(file)
        .map(|_| file)
        .map_err(|e| format!("{} 파일 로드 실패: {}", file, e))
}

/// 로깅 시스템을 초기화합니다
///
/// `RUST_LOG`가 없으면 실행 환경의 기본 필터를 사용합니다.
///
/// ```bash
/// RUST_LOG=summer::events=debug cargo run
/// ```
fn init_logging(environment: Environment) {
    env_logger::init_from_env(Env::default().default_filter_or(environment.default_log_filter()));
}
