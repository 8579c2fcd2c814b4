//! 공통 유틸리티 함수 모듈
//!
//! # Modules
//!
//! - [`display_terminal`] - 부트스트랩 진행 상황 포맷팅 함수들
//!
//! # Examples
//!
//! ```rust,ignore
//! use log::info;
//! use summer::utils::display_terminal::boxed_title;
//!
//! info!("{}", boxed_title("System Initialized"));
//! ```

pub mod display_terminal;
