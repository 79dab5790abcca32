use crate::error::{LeafDoctorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

const ENV_API_KEY: &str = "GEMINI_API_KEY";
const ENV_ENDPOINT: &str = "GEMINI_API_ENDPOINT";
const ENV_TIMEOUT: &str = "LEAF_DOCTOR_TIMEOUT";
const ENV_FONT: &str = "LEAF_DOCTOR_FONT";

/// 起動時に1度だけ作り、参照でクライアントへ渡す
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub endpoint: String,
    /// true: `?key=`、false: `Authorization: Bearer`
    pub key_in_query: bool,
    /// 応答待ちの上限（秒）。None なら無制限
    pub timeout_seconds: Option<u64>,
    /// PDFに埋め込むUnicodeフォント（TTF/TTC）。None なら既知のパスを探す
    pub font_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.into(),
            key_in_query: true,
            timeout_seconds: Some(30),
            font_path: None,
        }
    }
}

impl Config {
    /// 設定ファイル → 環境変数の順で読み込む
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let config = Self::load_from(&config_path)?;
        Ok(config.with_env(|name| std::env::var(name).ok()))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// 読めない設定ファイルは既定値に置き換え、そのエラーを返す
    ///
    /// `config --set-api-key` で壊れたファイルを上書きできるようにするため。
    pub fn load_or_default_from(config_path: &Path) -> (Self, Option<LeafDoctorError>) {
        match Self::load_from(config_path) {
            Ok(config) => (config, None),
            Err(e) => {
                tracing::debug!("設定ファイルを読み込めません: {}: {}", config_path.display(), e);
                (Self::default(), Some(e))
            }
        }
    }

    /// 環境変数で上書き（空文字は無視）
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(font) = get(ENV_FONT) {
            self.font_path = Some(PathBuf::from(font));
        }
        if let Some(timeout) = get(ENV_TIMEOUT) {
            match timeout.trim().parse::<u64>() {
                Ok(0) => self.timeout_seconds = None,
                Ok(secs) => self.timeout_seconds = Some(secs),
                Err(_) => tracing::warn!("{}={} は数値ではないため無視します", ENV_TIMEOUT, timeout),
            }
        }
        self
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| LeafDoctorError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("leaf-doctor").join("config.json"))
    }

    /// APIを叩くコマンドの起動時チェック
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LeafDoctorError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }
}
