use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeafDoctorError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`leaf-doctor config --set-api-key YOUR_KEY` か環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("対応していない画像形式です（JPEG/PNGのみ）: {0}")]
    UnsupportedFormat(String),

    #[error("解析APIを利用できません{}: {body}", status_suffix(.status))]
    AnalysisUnavailable { status: Option<u16>, body: String },

    #[error("APIレスポンスの形式が不正です: {0}")]
    MalformedResponse(String),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("入力エラー: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(leaf_doctor_common::Error),
}

impl From<leaf_doctor_common::Error> for LeafDoctorError {
    fn from(err: leaf_doctor_common::Error) -> Self {
        match err {
            leaf_doctor_common::Error::MalformedResponse(msg) => LeafDoctorError::MalformedResponse(msg),
            other => LeafDoctorError::Common(other),
        }
    }
}

impl LeafDoctorError {
    /// 利用者に見せる一文
    pub fn user_message(&self) -> &'static str {
        match self {
            LeafDoctorError::UnsupportedFormat(_) => "❌ Could not read the image. Please upload a JPEG or PNG leaf photo.",
            LeafDoctorError::AnalysisUnavailable { .. } | LeafDoctorError::MalformedResponse(_) => {
                "❌ Failed to analyze the image. Please check your API key or try again."
            }
            LeafDoctorError::MissingApiKey => "❌ No API key configured.",
            _ => "❌ Something went wrong.",
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, LeafDoctorError>;
