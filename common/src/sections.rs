//! レポートに添える固定セクション
//!
//! 解析結果以外は静的な文言。呼び出し側が指定した順にレポートへ並べる。

use serde::{Deserialize, Serialize};

/// レポートの1セクション（見出し + 本文）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub header: String,
    pub body: String,
}

impl ReportSection {
    pub fn new(header: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            body: body.into(),
        }
    }

    /// 本文の行（1入力行 = 1描画行）
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.body.lines()
    }
}

/// 固定セクションの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticSection {
    Timeline,
    Medicines,
    Prevention,
    Care,
}

impl StaticSection {
    pub fn section(&self) -> ReportSection {
        match self {
            StaticSection::Timeline => treatment_timeline(),
            StaticSection::Medicines => common_medicines(),
            StaticSection::Prevention => prevention_tips(),
            StaticSection::Care => plant_care_guide(),
        }
    }
}

/// 治療タイムライン
pub fn treatment_timeline() -> ReportSection {
    ReportSection::new(
        "Treatment Timeline",
        "Day 1: Remove and bin visibly infected leaves.\n\
         Day 2: Apply the first fungicide or neem oil spray.\n\
         Day 7: Inspect new growth and repeat the spray if spots persist.\n\
         Day 14: Second inspection; improve airflow around the plant.\n\
         Day 21: Final check; resume normal care if no new symptoms.",
    )
}

/// 一般的な薬剤・対処
pub fn common_medicines() -> ReportSection {
    ReportSection::new(
        "Common Medicines",
        "Neem oil: broad organic fungicide and insect repellent.\n\
         Copper fungicide: leaf spot, blight and bacterial infections.\n\
         Sulfur spray: powdery mildew and rust.\n\
         Baking soda spray (1 tbsp per gallon): mild mildew control.\n\
         Potassium bicarbonate: contact fungicide for mildew.",
    )
}

/// 予防のヒント
pub fn prevention_tips() -> ReportSection {
    ReportSection::new(
        "Prevention Tips",
        "Sterilize gardening tools regularly.\n\
         Avoid overcrowding plants.\n\
         Rotate crops every season.\n\
         Use well-draining soil and raised beds.",
    )
}

/// 栽培ガイド
pub fn plant_care_guide() -> ReportSection {
    ReportSection::new(
        "Plant Care Guide",
        "Sunlight: 6-8 hours per day.\n\
         Water: keep soil moist, not soggy.\n\
         Temperature: match the plant hardiness zone.\n\
         Fertilizer: use organic compost monthly.",
    )
}
