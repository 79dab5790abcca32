//! Leaf Doctor Common Library
//!
//! CLIとライブラリ利用側で共有される型とユーティリティ

pub mod encoding;
pub mod error;
pub mod gemini;
pub mod layout;
pub mod parser;
pub mod prompts;
pub mod sections;
pub mod types;

pub use error::{Error, Result};
pub use gemini::{extract_text, GenerateRequest, GenerateResponse};
pub use layout::{Placement, ReportDocument, ReportLayout};
pub use parser::{extract_json, parse_diagnosis};
pub use prompts::{build_question_prompt, build_structured_instruction, Quiz, LEAF_ANALYSIS_INSTRUCTION, LEAF_QUIZ};
pub use sections::{ReportSection, StaticSection};
pub use types::{AnalysisRecord, Diagnosis};
