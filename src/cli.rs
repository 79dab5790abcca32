use clap::{Parser, Subcommand, ValueEnum};
use leaf_doctor_common::StaticSection;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leaf-doctor")]
#[command(about = "葉の写真からAIで病害を診断し、PDFレポートを生成するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 葉の画像を解析して診断を表示
    Analyze {
        /// 画像ファイル（JPEG/PNG）
        #[arg(required = true)]
        image: PathBuf,

        /// PDFレポートを出力（パス省略時: ./plant_disease_report.pdf）
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        report: Option<Option<PathBuf>>,

        /// レポートに追加するセクション（指定順に並ぶ）
        #[arg(long = "section", value_enum)]
        sections: Vec<SectionArg>,

        /// JSONモードで薬剤・信頼度も受け取る
        #[arg(long)]
        structured: bool,

        /// 解析結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// レポートタイトル
        #[arg(short, long, default_value = "Plant Disease Report")]
        title: String,

        /// PDF画像品質 (high/medium/low)
        #[arg(long, default_value = "medium")]
        pdf_quality: PdfQuality,

        /// 長い行を指定文字数で折り返す
        #[arg(long, value_name = "COLUMNS")]
        wrap: Option<usize>,

        /// PDFに埋め込むフォント（TTF/TTC）。日本語などを出力する場合に指定
        #[arg(long, value_name = "FONT")]
        font: Option<PathBuf>,
    },

    /// 植物について質問（省略時は対話モード）
    Ask {
        /// 質問文
        question: Option<String>,
    },

    /// 病害クイズ
    Quiz,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// レポートの追加セクション
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SectionArg {
    Timeline,
    Medicines,
    Prevention,
    Care,
}

impl SectionArg {
    pub fn to_static(self) -> StaticSection {
        match self {
            SectionArg::Timeline => StaticSection::Timeline,
            SectionArg::Medicines => StaticSection::Medicines,
            SectionArg::Prevention => StaticSection::Prevention,
            SectionArg::Care => StaticSection::Care,
        }
    }
}

/// PDF画像品質設定
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PdfQuality {
    /// 高品質: 1400px, 85%
    High,
    /// 中品質: 800px, 75%（デフォルト）
    #[default]
    Medium,
    /// 低品質: 500px, 60%
    Low,
}

impl PdfQuality {
    /// 最大ピクセル幅
    pub fn max_width(&self) -> u32 {
        match self {
            PdfQuality::High => 1400,
            PdfQuality::Medium => 800,
            PdfQuality::Low => 500,
        }
    }

    /// JPEG品質 (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            PdfQuality::High => 85,
            PdfQuality::Medium => 75,
            PdfQuality::Low => 60,
        }
    }
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(PdfQuality::High),
            "medium" | "med" | "m" => Ok(PdfQuality::Medium),
            "low" | "l" => Ok(PdfQuality::Low),
            _ => Err(format!("Unknown quality: {}. Use high, medium, or low", s)),
        }
    }
}

impl std::fmt::Display for PdfQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfQuality::High => write!(f, "high"),
            PdfQuality::Medium => write!(f, "medium"),
            PdfQuality::Low => write!(f, "low"),
        }
    }
}
