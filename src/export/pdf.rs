//! PDFレポート生成
//!
//! レイアウト計算（`ReportLayout::plan`）の結果をそのまま printpdf の Op 列に写す。
//! Unicodeフォント（TTF/TTC）があれば埋め込んで使い、無ければ標準14フォント（Helvetica）で描く。
//! どちらの場合も、描けない文字で本文が消えるときはエラーにする。

use crate::cli::PdfQuality;
use crate::error::{LeafDoctorError, Result};
use crate::ingest::DecodedImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use leaf_doctor_common::layout::{mm_to_pt, BODY_FONT_PT, HEADER_FONT_PT, TITLE_FONT_PT};
use leaf_doctor_common::{Placement, ReportDocument, ReportLayout, ReportSection};
use printpdf::{
    BuiltinFont, FontId, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, RawImage,
    TextItem, XObjectId, XObjectTransform,
};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_TITLE: &str = "Plant Disease Report";
pub const ANALYSIS_HEADER: &str = "Disease Analysis Result";

/// `--font` も設定も無いときに探すフォント（日本語対応を優先）
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/opentype/ipafont-gothic/ipag.ttf",
    "/usr/share/fonts/truetype/fonts-japanese-gothic.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\msgothic.ttc",
    "C:\\Windows\\Fonts\\YuGothR.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

/// PDFに埋め込むUnicodeフォント
#[derive(Clone)]
pub struct ReportFont {
    name: String,
    parsed: ParsedFont,
}

impl fmt::Debug for ReportFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportFont").field("name", &self.name).finish()
    }
}

impl ReportFont {
    /// TTF/TTC のバイト列から読み込む（TTCは先頭のフォント）
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let mut warnings = Vec::new();
        let parsed = ParsedFont::from_bytes(bytes, 0, &mut warnings)
            .ok_or_else(|| LeafDoctorError::PdfGeneration(format!("フォントを解析できません: {}", name)))?;
        Ok(Self { name, parsed })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            LeafDoctorError::PdfGeneration(format!("フォントを読み込めません: {}: {}", path.display(), e))
        })?;
        Self::from_bytes(path.display().to_string(), &bytes)
    }

    /// 指定パス → 既知のシステムフォントの順に探す
    ///
    /// 指定パスが読めなければエラー。候補が1つも無ければ None（標準フォントで描く）。
    pub fn discover(explicit: Option<&Path>) -> Result<Option<Self>> {
        if let Some(path) = explicit {
            return Self::load(path).map(Some);
        }
        for candidate in FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            match Self::load(path) {
                Ok(font) => {
                    debug!("埋め込みフォント: {}", candidate);
                    return Ok(Some(font));
                }
                Err(e) => warn!("{}", e),
            }
        }
        Ok(None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// この文字の字形を持っているか
    pub fn covers(&self, c: char) -> bool {
        self.parsed.lookup_glyph_index(c as u32).is_some()
    }
}

/// レポート生成オプション
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    /// タイトル下の1行（生成日時など）
    pub subtitle: Option<String>,
    pub quality: PdfQuality,
    pub wrap_columns: Option<usize>,
    /// None なら標準フォント（WinAnsiの範囲のみ）
    pub font: Option<ReportFont>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            subtitle: None,
            quality: PdfQuality::default(),
            wrap_columns: None,
            font: None,
        }
    }
}

/// 生成結果（レイアウトとPDFバイト列）
#[derive(Debug, Clone)]
pub struct ComposedReport {
    pub document: ReportDocument,
    pub bytes: Vec<u8>,
}

/// PDFに埋め込む画像（縮小・JPEG再エンコード済み）
#[derive(Debug, Clone)]
pub struct ReportImage {
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// 画像を品質設定に合わせて縮小し、JPEGにする（拡大はしない）
pub fn prepare_image(decoded: &DecodedImage, quality: PdfQuality) -> Result<ReportImage> {
    let max = quality.max_width();
    let image = if decoded.width > max || decoded.height > max {
        decoded.image.resize(max, max, FilterType::Triangle)
    } else {
        decoded.image.clone()
    };

    let rgb = image.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.jpeg_quality())
        .encode_image(&rgb)
        .map_err(|e| LeafDoctorError::PdfGeneration(format!("JPEGエンコードエラー: {}", e)))?;

    Ok(ReportImage {
        jpeg,
        width_px: rgb.width(),
        height_px: rgb.height(),
    })
}

/// 画像 + 解析結果 + 追加セクションからレポートを作る
///
/// セクション順: 解析結果 → `optional_sections`（呼び出し側の順）。
/// フォントに無い文字（かな漢字など）が本文から消える場合は `PdfGeneration`。
pub fn compose(
    image: &DecodedImage,
    analysis_text: &str,
    optional_sections: &[ReportSection],
    options: &ReportOptions,
) -> Result<ComposedReport> {
    let glyphs = options.font.as_ref().map_or(Glyphs::Builtin, Glyphs::Embedded);
    let mut cleaner = TextCleaner::new(glyphs);

    let mut sections = Vec::with_capacity(optional_sections.len() + 1);
    sections.push(ReportSection::new(ANALYSIS_HEADER, analysis_text));
    sections.extend(optional_sections.iter().cloned());
    let sections: Vec<ReportSection> = sections
        .iter()
        .map(|s| ReportSection::new(cleaner.text(&s.header), cleaner.body(&s.body)))
        .collect();
    let title = cleaner.text(&options.title);
    let subtitle = options.subtitle.as_deref().map(|s| cleaner.text(s));
    cleaner.finish()?;

    let report_image = prepare_image(image, options.quality)?;

    let layout = ReportLayout::a4().with_wrap(options.wrap_columns);
    let document = layout.plan(
        &title,
        subtitle.as_deref(),
        Some((report_image.width_px, report_image.height_px)),
        &sections,
    );

    let bytes = render(&document, Some(&report_image), options.font.as_ref())?;
    Ok(ComposedReport { document, bytes })
}

/// レイアウト済みドキュメントをPDFバイト列にする
pub fn render(document: &ReportDocument, image: Option<&ReportImage>, font: Option<&ReportFont>) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::new(&document.title);

    let xobject = match image {
        Some(img) => {
            let mut warnings = Vec::new();
            let raw = RawImage::decode_from_bytes(&img.jpeg, &mut warnings)
                .map_err(|e| LeafDoctorError::PdfGeneration(format!("画像埋め込みエラー: {:?}", e)))?;
            Some((doc.add_image(&raw), img))
        }
        None => None,
    };

    let text_font = match font {
        Some(font) => TextFont::Embedded(doc.add_font(&font.parsed)),
        None => TextFont::Builtin,
    };

    let pages: Vec<PdfPage> = document
        .pages
        .iter()
        .map(|placements| {
            let ops = page_ops(placements, &text_font, xobject.as_ref());
            PdfPage::new(Mm(document.page_width_mm), Mm(document.page_height_mm), ops)
        })
        .collect();

    let mut warnings = Vec::new();
    let bytes = doc.with_pages(pages).save(&PdfSaveOptions::default(), &mut warnings);
    if bytes.is_empty() {
        return Err(LeafDoctorError::PdfGeneration("PDFが空です".into()));
    }
    Ok(bytes)
}

/// 文字の描画に使うフォント
enum TextFont {
    Builtin,
    Embedded(FontId),
}

fn page_ops(placements: &[Placement], font: &TextFont, xobject: Option<&(XObjectId, &ReportImage)>) -> Vec<Op> {
    let mut ops = Vec::new();
    for placement in placements {
        push_placement(&mut ops, placement, font, xobject);
    }
    ops
}

fn push_placement(
    ops: &mut Vec<Op>,
    placement: &Placement,
    font: &TextFont,
    xobject: Option<&(XObjectId, &ReportImage)>,
) {
    match placement {
        Placement::Title { text, x_mm, y_mm } => {
            push_text(ops, font, BuiltinFont::HelveticaBold, text, TITLE_FONT_PT, *x_mm, *y_mm)
        }
        Placement::Subtitle { text, x_mm, y_mm } => {
            push_text(ops, font, BuiltinFont::HelveticaOblique, text, BODY_FONT_PT, *x_mm, *y_mm)
        }
        Placement::Header { text, x_mm, y_mm } => {
            push_text(ops, font, BuiltinFont::HelveticaBold, text, HEADER_FONT_PT, *x_mm, *y_mm)
        }
        Placement::Line { text, x_mm, y_mm } => {
            push_text(ops, font, BuiltinFont::Helvetica, text, BODY_FONT_PT, *x_mm, *y_mm)
        }
        Placement::Image { x_mm, y_mm, width_mm, height_mm } => {
            let Some((id, img)) = xobject else { return };
            // dpi=72 で 1px = 1pt、あとはscaleで枠サイズに合わせる
            ops.push(Op::UseXobject {
                id: id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Mm(*x_mm).into()),
                    translate_y: Some(Mm(*y_mm).into()),
                    scale_x: Some(mm_to_pt(*width_mm) / img.width_px as f32),
                    scale_y: Some(mm_to_pt(*height_mm) / img.height_px as f32),
                    dpi: Some(72.0),
                    ..Default::default()
                },
            });
        }
    }
}

/// 埋め込みフォントは1書体なので、`builtin` の太字・斜体は標準フォント時のみ
fn push_text(
    ops: &mut Vec<Op>,
    font: &TextFont,
    builtin: BuiltinFont,
    text: &str,
    size_pt: f32,
    x_mm: f32,
    y_mm: f32,
) {
    let items = vec![TextItem::Text(text.to_string())];
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point::new(Mm(x_mm), Mm(y_mm)),
    });
    match font {
        TextFont::Builtin => {
            ops.push(Op::SetFontSizeBuiltinFont { size: Pt(size_pt), font: builtin });
            ops.push(Op::WriteTextBuiltinFont { items, font: builtin });
        }
        TextFont::Embedded(id) => {
            ops.push(Op::SetFontSize { size: Pt(size_pt), font: id.clone() });
            ops.push(Op::WriteText { items, font: id.clone() });
        }
    }
    ops.push(Op::EndTextSection);
}

/// 描ける文字の範囲
#[derive(Clone, Copy)]
enum Glyphs<'a> {
    /// 標準14フォント（WinAnsi）
    Builtin,
    Embedded(&'a ReportFont),
}

impl Glyphs<'_> {
    fn covers(self, c: char) -> bool {
        match self {
            Glyphs::Builtin => {
                (c.is_ascii() && !c.is_ascii_control()) || ('\u{00A1}'..='\u{00FF}').contains(&c)
            }
            Glyphs::Embedded(font) => font.covers(c),
        }
    }
}

/// 描ける文字へ寄せ、落とした文字を覚えておく
struct TextCleaner<'a> {
    glyphs: Glyphs<'a>,
    dropped: Vec<char>,
}

impl<'a> TextCleaner<'a> {
    fn new(glyphs: Glyphs<'a>) -> Self {
        Self { glyphs, dropped: Vec::new() }
    }

    /// 本文をMarkdown記号抜きの平文へ（行単位）
    fn body(&mut self, body: &str) -> String {
        body.lines()
            .map(|line| self.text(&plain_markdown(line)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn text(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c != '\t' && c != '\u{00A0}' && self.glyphs.covers(c) {
                out.push(c);
            } else if let Some(replacement) = typographic_fallback(c) {
                out.push(replacement);
            } else {
                self.dropped.push(c);
            }
        }
        out
    }

    /// 文字（英数・かな漢字など）が落ちていればエラー。記号や絵文字だけなら警告で済ます
    fn finish(self) -> Result<()> {
        if self.dropped.is_empty() {
            return Ok(());
        }
        let letters: String = self.dropped.iter().filter(|c| c.is_alphanumeric()).take(8).collect();
        if !letters.is_empty() {
            return Err(LeafDoctorError::PdfGeneration(format!(
                "フォントに無い文字があるためレポートに出力できません（例: {}）。\
                 --font か LEAF_DOCTOR_FONT で対応するフォントを指定してください",
                letters
            )));
        }
        warn!("描画できない記号を {} 文字省きました", self.dropped.len());
        Ok(())
    }
}

/// 見出し記号・強調記号を外し、箇条書きは "- " に揃える
fn plain_markdown(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    let content = trimmed.trim_start_matches('#');
    let content = if content.len() != trimmed.len() { content.trim_start() } else { content };
    let content = match content.strip_prefix("* ").or_else(|| content.strip_prefix("• ")) {
        Some(rest) => format!("- {}", rest),
        None => content.to_string(),
    };

    format!("{}{}", indent, content.replace("**", "").replace("__", ""))
}

/// フォントに無い約物をASCIIへ
fn typographic_fallback(c: char) -> Option<char> {
    match c {
        '\u{2018}' | '\u{2019}' => Some('\''),
        '\u{201C}' | '\u{201D}' => Some('"'),
        '\u{2013}' | '\u{2014}' => Some('-'),
        '\u{2022}' => Some('-'),
        c if c.is_whitespace() => Some(' '),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    fn decoded(w: u32, h: u32) -> DecodedImage {
        DecodedImage {
            width: w,
            height: h,
            format: ImageFormat::Png,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([20, 140, 60]))),
        }
    }

    fn builtin_text(text: &str) -> String {
        TextCleaner::new(Glyphs::Builtin).text(text)
    }

    #[test]
    fn test_prepare_image_downscales_preserving_aspect() {
        let img = prepare_image(&decoded(1000, 500), PdfQuality::Low).unwrap();
        assert_eq!(img.width_px, 500);
        assert_eq!(img.height_px, 250);
        assert!(img.jpeg.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_prepare_image_never_upscales() {
        let img = prepare_image(&decoded(40, 30), PdfQuality::High).unwrap();
        assert_eq!((img.width_px, img.height_px), (40, 30));
    }

    #[test]
    fn test_compose_produces_pdf() {
        let report = compose(
            &decoded(64, 48),
            "Leaf shows powdery mildew.",
            &[],
            &ReportOptions::default(),
        )
        .unwrap();
        assert!(!report.bytes.is_empty());
        assert!(report.bytes.starts_with(b"%PDF"));
        assert!(report.document.text_stream().contains(DEFAULT_TITLE));
        assert!(report.document.text_stream().contains("Leaf shows powdery mildew."));
    }

    #[test]
    fn test_render_without_image() {
        let doc = ReportLayout::a4().plan("Only text", None, None, &[ReportSection::new("H", "body")]);
        let bytes = render(&doc, None, None).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    fn written_text(ops: &[Op]) -> Vec<String> {
        ops.iter()
            .filter_map(|op| match op {
                Op::WriteTextBuiltinFont { items, .. } | Op::WriteText { items, .. } => Some(
                    items
                        .iter()
                        .filter_map(|item| match item {
                            TextItem::Text(t) => Some(t.as_str()),
                            _ => None,
                        })
                        .collect::<String>(),
                ),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_page_ops_write_every_placement() {
        let doc = ReportLayout::a4().plan("Title", Some("Sub"), None, &[ReportSection::new("Header", "first\n\nsecond")]);
        let expected = vec!["Title", "Sub", "Header", "first", "second"];

        let ops = page_ops(&doc.pages[0], &TextFont::Builtin, None);
        assert_eq!(written_text(&ops), expected);
        assert!(!ops.iter().any(|op| matches!(op, Op::WriteText { .. })));

        let ops = page_ops(&doc.pages[0], &TextFont::Embedded(FontId("F1".to_string())), None);
        assert_eq!(written_text(&ops), expected);
        assert!(!ops.iter().any(|op| matches!(op, Op::WriteTextBuiltinFont { .. })));
    }

    #[test]
    fn test_plain_markdown() {
        assert_eq!(plain_markdown("### Diagnosis"), "Diagnosis");
        assert_eq!(plain_markdown("**Disease:** Leaf spot"), "Disease: Leaf spot");
        assert_eq!(plain_markdown("* Remove leaves"), "- Remove leaves");
        assert_eq!(plain_markdown("  * nested"), "  - nested");
        assert_eq!(plain_markdown("#hashtag"), "hashtag");
        assert_eq!(plain_markdown("## **うどんこ病**"), "うどんこ病");
    }

    #[test]
    fn test_builtin_text_replaces_typography() {
        assert_eq!(builtin_text("It\u{2019}s \u{201C}rust\u{201D} \u{2014} fungal"), "It's \"rust\" - fungal");
        assert_eq!(builtin_text("tab\there"), "tab here");
        assert_eq!(builtin_text("café"), "café");
    }

    #[test]
    fn test_builtin_drops_symbols_with_warning_only() {
        let mut cleaner = TextCleaner::new(Glyphs::Builtin);
        assert_eq!(cleaner.text("Sunny \u{1F31E} day"), "Sunny  day");
        assert_eq!(cleaner.dropped, vec!['\u{1F31E}']);
        assert!(cleaner.finish().is_ok());
    }

    #[test]
    fn test_builtin_refuses_to_drop_letters() {
        let mut cleaner = TextCleaner::new(Glyphs::Builtin);
        assert_eq!(cleaner.body("Powdery mildew\n葉に白い粉"), "Powdery mildew\n");
        match cleaner.finish() {
            Err(LeafDoctorError::PdfGeneration(msg)) => {
                assert!(msg.contains('葉'));
                assert!(msg.contains("--font"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_compose_non_latin_without_font_is_an_error() {
        let result = compose(
            &decoded(32, 32),
            "葉にうどんこ病の症状があります。\nपत्ती पर फफूंदी है।",
            &[],
            &ReportOptions::default(),
        );
        assert!(matches!(result, Err(LeafDoctorError::PdfGeneration(_))));
    }

    #[test]
    fn test_font_loading_errors() {
        let missing = ReportFont::load(Path::new("/nonexistent/leaf-doctor-font.ttf"));
        assert!(matches!(missing, Err(LeafDoctorError::PdfGeneration(_))));

        let garbage = ReportFont::from_bytes("garbage.ttf", b"definitely not a font");
        assert!(matches!(garbage, Err(LeafDoctorError::PdfGeneration(_))));

        let explicit = ReportFont::discover(Some(Path::new("/nonexistent/leaf-doctor-font.ttf")));
        assert!(explicit.is_err());
    }
}
