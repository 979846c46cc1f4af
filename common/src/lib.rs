//! Return Grader Common Library
//!
//! CLI本体と共有される型・プロンプト・応答パーサー・多数決集約

pub mod types;
pub mod error;
pub mod prompts;
pub mod parser;
pub mod consensus;

pub use types::{
    ConditionGrade, Consensus, FileGrade, GradingMode, GradingResult, ACTION_LABELS,
    CONDITION_LABELS, IMAGE_SOURCE_LABELS, NEXT_STEP_LABELS,
};
pub use error::{Error, Result};
pub use prompts::{build_task_prompt, SYSTEM_PROMPT};
pub use parser::{
    normalize_literal, parse_grading_response, strip_code_fences, try_parse_grading_response,
};
pub use consensus::{build_consensus, majority_vote, ReasonPolicy};
