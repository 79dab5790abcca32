//! レポートのレイアウト計算モジュール
//!
//! mm基準、原点はページ左下（PDFと同じ）。
//! 上から下へカーソルを進めながら配置を決め、下余白を割り込む前に改ページする。
//! 描画（printpdf）はCLI側が `ReportDocument` を受け取って行う。

use crate::sections::ReportSection;

// ============================================
// mm基準レイアウト
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 余白（mm）
pub const MARGIN_MM: f32 = 20.0;

/// タイトルのページ上端からの位置（mm）
pub const TITLE_OFFSET_MM: f32 = 25.0;

/// 画像を収める枠（mm）
pub const IMAGE_BOX_WIDTH_MM: f32 = 90.0;
pub const IMAGE_BOX_HEIGHT_MM: f32 = 90.0;

/// 行送り・セクション間隔（mm）
pub const LINE_HEIGHT_MM: f32 = 6.0;
pub const SECTION_GAP_MM: f32 = 6.0;

/// フォントサイズ（pt）
pub const TITLE_FONT_PT: f32 = 18.0;
pub const HEADER_FONT_PT: f32 = 13.0;
pub const BODY_FONT_PT: f32 = 10.0;

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// px → mm変換 (96dpi基準)
pub const PX_TO_MM: f32 = 25.4 / 96.0;

#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

// ============================================
// 配置
// ============================================

/// ページ上の1要素。`y_mm` はテキストならベースライン、画像なら下端。
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Title { text: String, x_mm: f32, y_mm: f32 },
    Subtitle { text: String, x_mm: f32, y_mm: f32 },
    Image { x_mm: f32, y_mm: f32, width_mm: f32, height_mm: f32 },
    Header { text: String, x_mm: f32, y_mm: f32 },
    Line { text: String, x_mm: f32, y_mm: f32 },
}

impl Placement {
    pub fn y_mm(&self) -> f32 {
        match self {
            Placement::Title { y_mm, .. }
            | Placement::Subtitle { y_mm, .. }
            | Placement::Image { y_mm, .. }
            | Placement::Header { y_mm, .. }
            | Placement::Line { y_mm, .. } => *y_mm,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Placement::Title { text, .. }
            | Placement::Subtitle { text, .. }
            | Placement::Header { text, .. }
            | Placement::Line { text, .. } => Some(text.as_str()),
            Placement::Image { .. } => None,
        }
    }
}

/// レイアウト済みのレポート（ページごとの配置列）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub pages: Vec<Vec<Placement>>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 描画されるテキストを上から順に連結
    pub fn text_stream(&self) -> String {
        self.pages
            .iter()
            .flatten()
            .filter_map(Placement::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 各ページでyが単調減少し、下余白を割っていないか
    pub fn is_well_formed(&self, bottom_margin_mm: f32) -> bool {
        self.pages.iter().all(|page| {
            page.windows(2).all(|w| w[0].y_mm() > w[1].y_mm())
                && page.iter().all(|p| p.y_mm() >= bottom_margin_mm)
        })
    }
}

// ============================================
// レイアウト設定
// ============================================

/// レポートレイアウト設定
#[derive(Debug, Clone)]
pub struct ReportLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub title_offset_mm: f32,
    pub image_box_width_mm: f32,
    pub image_box_height_mm: f32,
    pub line_height_mm: f32,
    pub section_gap_mm: f32,
    /// 指定時のみ長い行を折り返す（文字数）
    pub wrap_columns: Option<usize>,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::a4()
    }
}

impl ReportLayout {
    pub fn a4() -> Self {
        Self {
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            margin_mm: MARGIN_MM,
            title_offset_mm: TITLE_OFFSET_MM,
            image_box_width_mm: IMAGE_BOX_WIDTH_MM,
            image_box_height_mm: IMAGE_BOX_HEIGHT_MM,
            line_height_mm: LINE_HEIGHT_MM,
            section_gap_mm: SECTION_GAP_MM,
            wrap_columns: None,
        }
    }

    pub fn with_wrap(mut self, columns: Option<usize>) -> Self {
        self.wrap_columns = columns.filter(|&c| c > 0);
        self
    }

    /// 2ページ目以降の書き出し位置（mm）
    pub fn content_start_y_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm
    }

    /// 画像の表示サイズ（mm）。縦横比を保ち、枠を超える場合のみ縮小。
    pub fn fit_image(&self, width_px: u32, height_px: u32) -> (f32, f32) {
        if width_px == 0 || height_px == 0 {
            return (0.0, 0.0);
        }
        let natural_w = width_px as f32 * PX_TO_MM;
        let natural_h = height_px as f32 * PX_TO_MM;
        let scale = (self.image_box_width_mm / natural_w)
            .min(self.image_box_height_mm / natural_h)
            .min(1.0);
        (natural_w * scale, natural_h * scale)
    }

    /// 配置を計算
    ///
    /// 並び: タイトル → サブタイトル → 画像 → 各セクション（見出し + 本文行）
    pub fn plan(
        &self,
        title: &str,
        subtitle: Option<&str>,
        image_px: Option<(u32, u32)>,
        sections: &[ReportSection],
    ) -> ReportDocument {
        let mut cursor = PageCursor::new(self);
        let x = self.margin_mm;

        cursor.place(Placement::Title {
            text: title.to_string(),
            x_mm: x,
            y_mm: self.page_height_mm - self.title_offset_mm,
        });
        cursor.y = self.page_height_mm - self.title_offset_mm - self.line_height_mm;

        if let Some(subtitle) = subtitle {
            cursor.place(Placement::Subtitle {
                text: subtitle.to_string(),
                x_mm: x,
                y_mm: cursor.y,
            });
            cursor.y -= self.line_height_mm;
        }

        if let Some((w, h)) = image_px {
            let (width_mm, height_mm) = self.fit_image(w, h);
            if height_mm > 0.0 {
                // 行送り分はベースラインより下にあるので、画像上端はカーソル位置に揃える
                let bottom = cursor.y - height_mm;
                cursor.ensure_room(bottom);
                let bottom = cursor.y - height_mm;
                cursor.place(Placement::Image {
                    x_mm: x,
                    y_mm: bottom,
                    width_mm,
                    height_mm,
                });
                cursor.y = bottom - self.section_gap_mm - self.line_height_mm;
            }
        }

        for section in sections {
            // 見出しだけがページ末尾に残らないよう、本文1行分の余裕を見る
            cursor.ensure_room(cursor.y - self.line_height_mm);
            cursor.place(Placement::Header {
                text: section.header.clone(),
                x_mm: x,
                y_mm: cursor.y,
            });
            cursor.y -= self.line_height_mm;

            for line in section.lines() {
                for piece in wrap_line(line, self.wrap_columns) {
                    // 空行は行送りだけ。改ページは次に描く行に任せる
                    if !piece.is_empty() {
                        cursor.ensure_room(cursor.y);
                        cursor.place(Placement::Line {
                            text: piece,
                            x_mm: x,
                            y_mm: cursor.y,
                        });
                    }
                    cursor.y -= self.line_height_mm;
                }
            }
            cursor.y -= self.section_gap_mm;
        }

        ReportDocument {
            title: title.to_string(),
            page_width_mm: self.page_width_mm,
            page_height_mm: self.page_height_mm,
            pages: cursor.finish(),
        }
    }
}

/// ページとy位置の管理
struct PageCursor<'a> {
    layout: &'a ReportLayout,
    pages: Vec<Vec<Placement>>,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(layout: &'a ReportLayout) -> Self {
        Self {
            layout,
            pages: vec![Vec::new()],
            y: layout.content_start_y_mm(),
        }
    }

    /// `lowest_y` が下余白を割るなら改ページ
    fn ensure_room(&mut self, lowest_y: f32) {
        let page_is_empty = self.pages.last().map_or(true, |p| p.is_empty());
        if lowest_y < self.layout.margin_mm && !page_is_empty {
            self.pages.push(Vec::new());
            self.y = self.layout.content_start_y_mm();
        }
    }

    fn place(&mut self, placement: Placement) {
        if let Some(page) = self.pages.last_mut() {
            page.push(placement);
        }
    }

    fn finish(self) -> Vec<Vec<Placement>> {
        self.pages
    }
}

/// 1行を指定文字数で折り返す（None なら折り返さない）
pub fn wrap_line(line: &str, columns: Option<usize>) -> Vec<String> {
    let Some(columns) = columns else {
        return vec![line.to_string()];
    };
    if line.chars().count() <= columns {
        return vec![line.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        // 1語が長すぎる場合は文字単位で切る
        while word.len() > columns {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(columns);
            out.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > columns && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}
