//! leaf-doctor: 葉の写真のAI診断とPDFレポート生成
//!
//! 流れは1操作につき直列: 取り込み → Base64 → 解析API → レポート。

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
