//! プロンプト・固定文言モジュール
//!
//! - LEAF_ANALYSIS_INSTRUCTION: 画像解析の固定指示
//! - build_structured_instruction: JSONモード用の指示
//! - build_question_prompt: 質問応答用
//! - Quiz: 正解固定のクイズ

/// 葉の画像解析の固定指示
pub const LEAF_ANALYSIS_INSTRUCTION: &str =
    "Analyze this plant leaf image and identify any diseases, symptoms, and care suggestions.";

/// 質問応答の前置き
const CHAT_PREAMBLE: &str = "You are a friendly plant doctor. Answer the gardener's question \
concisely and practically. If the question is not about plants, say so briefly.";

/// JSONモード（構造化診断）用の指示
pub fn build_structured_instruction() -> String {
    format!(
        r#"{LEAF_ANALYSIS_INSTRUCTION}

## 出力形式（厳密にこのJSON形式で出力）
{{
  "analysis": "disease name, visible symptoms and care suggestions as plain text",
  "medicines": ["treatment product or home remedy", "..."],
  "confidence": 0.0
}}

## 注意
- "confidence" is your own certainty between 0.0 and 1.0, or null if you cannot judge
- "medicines" is an empty array when the leaf is healthy
- Output the JSON object only"#
    )
}

/// 質問応答プロンプト
pub fn build_question_prompt(question: &str) -> String {
    format!("{}\n\nQuestion: {}", CHAT_PREAMBLE, question.trim())
}

/// 正解固定の選択式クイズ
#[derive(Debug, Clone, Copy)]
pub struct Quiz {
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub answer: usize,
    pub explanation: &'static str,
}

/// 収録クイズ
pub const LEAF_QUIZ: Quiz = Quiz {
    question: "Which disease shows up as a white, powdery coating on leaves?",
    options: &["Leaf Spot", "Powdery Mildew", "Rust", "Blight"],
    answer: 1,
    explanation: "Powdery mildew is a fungal disease that leaves a white powder on the leaf surface.",
};

impl Quiz {
    pub fn check(&self, choice: usize) -> bool {
        choice == self.answer
    }

    pub fn correct_option(&self) -> &'static str {
        self.options[self.answer]
    }
}
