//! PDF export of the display buffer.
//!
//! Lines are laid out verbatim with a fixed font and margin; anything wider
//! than the page wraps onto the next line and pages break before the bottom
//! margin. Text is set in embedded DejaVu Sans. The header pictographs it has
//! no glyphs for come from a small bundled symbol font, switched per run
//! within the line.

use crate::config::ExportConfig;
use owned_ttf_parser::{Face, FaceParsingError};
use printpdf::lopdf;
use printpdf::{Mm, PdfDocument};
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
const PT_TO_MM: f32 = 0.3528;
/// Average DejaVu Sans glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.55;

const TEXT_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const SYMBOL_FONT: &[u8] = include_bytes!("../assets/fonts/WikinotesSymbols.ttf");

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("There is no content to save!")]
    EmptyContent,
    #[error("failed to write PDF: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build PDF: {0}")]
    Pdf(#[from] printpdf::Error),
    #[error("embedded font is unreadable: {0}")]
    Font(#[from] FaceParsingError),
    #[error("failed to finish PDF: {0}")]
    Document(#[from] lopdf::Error),
}

/// Page geometry derived from the export settings
#[derive(Debug, Clone)]
pub struct PageLayout {
    font_size: f32,
    margin_mm: f32,
    line_height_mm: f32,
    break_margin_mm: f32,
}

impl PageLayout {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            font_size: config.font_size,
            margin_mm: config.margin_mm,
            line_height_mm: config.line_height_mm,
            break_margin_mm: config.break_margin_mm,
        }
    }

    /// Characters that fit between the side margins
    pub fn chars_per_line(&self) -> usize {
        let usable = A4_WIDTH_MM - 2.0 * self.margin_mm;
        let glyph = self.font_size * PT_TO_MM * AVG_GLYPH_WIDTH;
        ((usable / glyph).floor() as usize).max(1)
    }

    /// Lines that fit between the top margin and the auto-break margin
    pub fn lines_per_page(&self) -> usize {
        let usable = A4_HEIGHT_MM - self.margin_mm - self.break_margin_mm;
        ((usable / self.line_height_mm).floor() as usize).max(1)
    }

    /// Wrap every source line and split the result into pages.
    pub fn paginate(&self, content: &str) -> Vec<Vec<String>> {
        let width = self.chars_per_line();
        let lines: Vec<String> = content
            .lines()
            .flat_map(|line| wrap_line(line, width))
            .collect();
        lines
            .chunks(self.lines_per_page())
            .map(<[String]>::to_vec)
            .collect()
    }
}

/// Break one line into pieces of at most `width` characters.
///
/// Pieces end after the last whitespace that is followed by text, or are cut
/// hard when there is none. Every character is kept, so the pieces concatenate
/// back to the input line.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut wrapped = Vec::new();
    let mut rest = line;

    while rest.chars().count() > width {
        let limit = rest
            .char_indices()
            .nth(width)
            .map_or(rest.len(), |(index, _)| index);
        let head = &rest[..limit];
        let cut = head
            .char_indices()
            .filter(|&(index, c)| {
                c.is_whitespace() && !rest[index + c.len_utf8()..].starts_with(char::is_whitespace)
            })
            .map(|(index, c)| index + c.len_utf8())
            .filter(|&end| head[..end].chars().any(|c| !c.is_whitespace()))
            .last()
            .unwrap_or(limit);
        wrapped.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    wrapped.push(rest.to_string());
    wrapped
}

/// Which embedded font draws a run of characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FontSlot {
    Text,
    Symbols,
}

/// Glyph coverage of the embedded fonts
struct Typefaces {
    text: Face<'static>,
    symbols: Face<'static>,
}

impl Typefaces {
    fn load() -> Result<Self, ExportError> {
        Ok(Self {
            text: Face::parse(TEXT_FONT, 0)?,
            symbols: Face::parse(SYMBOL_FONT, 0)?,
        })
    }

    fn slot(&self, c: char) -> FontSlot {
        if self.text.glyph_index(c).is_none() && self.symbols.glyph_index(c).is_some() {
            FontSlot::Symbols
        } else {
            FontSlot::Text
        }
    }

    /// Split a line into maximal runs drawn by the same font.
    fn runs<'l>(&self, line: &'l str) -> Vec<(FontSlot, &'l str)> {
        let mut runs = Vec::new();
        let mut open: Option<(FontSlot, usize)> = None;
        for (index, c) in line.char_indices() {
            let slot = self.slot(c);
            match open {
                Some((current, _)) if current == slot => {}
                Some((current, start)) => {
                    runs.push((current, &line[start..index]));
                    open = Some((slot, index));
                }
                None => open = Some((slot, index)),
            }
        }
        if let Some((slot, start)) = open {
            runs.push((slot, &line[start..]));
        }
        runs
    }
}

/// Write the trimmed content to a PDF at `path`.
///
/// Empty content is rejected before anything touches the filesystem.
pub fn export(content: &str, path: &Path, config: &ExportConfig) -> Result<(), ExportError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ExportError::EmptyContent);
    }

    let layout = PageLayout::new(config);
    let pages = layout.paginate(content);
    let faces = Typefaces::load()?;

    let title = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Notes");
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Page 1");
    let text_font = doc.add_external_font(TEXT_FONT)?;
    let symbol_font = doc.add_external_font(SYMBOL_FONT)?;

    for (index, page_lines) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(
                Mm(A4_WIDTH_MM),
                Mm(A4_HEIGHT_MM),
                format!("Page {}", index + 1),
            )
        };
        let canvas = doc.get_page(page).get_layer(layer);

        for (row, line) in page_lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = A4_HEIGHT_MM - layout.margin_mm - layout.line_height_mm * (row + 1) as f32;
            canvas.begin_text_section();
            canvas.set_text_cursor(Mm(layout.margin_mm), Mm(y));
            for (slot, run) in faces.runs(line) {
                let font = match slot {
                    FontSlot::Text => &text_font,
                    FontSlot::Symbols => &symbol_font,
                };
                canvas.set_font(font, layout.font_size);
                canvas.write_text(run, font);
            }
            canvas.end_text_section();
        }
    }

    let bytes = repair_to_unicode(&doc.save_to_bytes()?)?;
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), pages = pages.len(), "exported PDF");
    Ok(())
}

/// Rewrite each font's ToUnicode map so that code points above U+FFFF are
/// UTF-16 surrogate pairs, which is what readers decode.
fn repair_to_unicode(pdf: &[u8]) -> Result<Vec<u8>, ExportError> {
    let mut doc = lopdf::Document::load_mem(pdf)?;
    let maps: Vec<lopdf::ObjectId> = doc
        .objects
        .values()
        .filter_map(|object| object.as_dict().ok())
        .filter_map(|font| font.get(b"ToUnicode").and_then(lopdf::Object::as_reference).ok())
        .collect();

    for id in maps {
        let stream = doc.get_object_mut(id)?.as_stream_mut()?;
        let cmap = if stream.dict.has(b"Filter") {
            stream.decompressed_content()?
        } else {
            stream.content.clone()
        };
        let cmap = surrogate_destinations(&String::from_utf8_lossy(&cmap));
        stream.set_plain_content(cmap.into_bytes());
        debug!(object = id.0, "rewrote ToUnicode map");
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// `<0005> <1f4cc>` becomes `<0005> <d83ddccc>`; other lines pass through.
fn surrogate_destinations(cmap: &str) -> String {
    cmap.split_inclusive('\n')
        .map(|line| -> Cow<'_, str> {
            let Some((source, rest)) = line.split_once("> <") else {
                return Cow::Borrowed(line);
            };
            let Some((target, tail)) = rest.split_once('>') else {
                return Cow::Borrowed(line);
            };
            let Some(c) = (target.len() > 4)
                .then(|| u32::from_str_radix(target, 16).ok())
                .flatten()
                .and_then(char::from_u32)
            else {
                return Cow::Borrowed(line);
            };
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{:04x}", unit))
                .collect();
            Cow::Owned(format!("{}> <{}>{}", source, hex, tail))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PageLayout {
        PageLayout::new(&ExportConfig::default())
    }

    #[test]
    fn test_default_geometry() {
        let layout = layout();
        assert_eq!(layout.chars_per_line(), 81);
        assert_eq!(layout.lines_per_page(), 38);
    }

    #[test]
    fn test_short_lines_laid_out_verbatim() {
        let content = "📌 Notes (Auto-generated from Wikipedia)\n-----\n• First\n\n• Second";
        let pages = layout().paginate(content);
        assert_eq!(pages.len(), 1);
        let expected: Vec<&str> = content.lines().collect();
        assert_eq!(pages[0], expected);
    }

    #[test]
    fn test_long_line_wraps_after_whitespace() {
        assert_eq!(
            wrap_line("alpha beta gamma delta", 11),
            vec!["alpha beta ", "gamma delta"]
        );
        assert_eq!(wrap_line("abcdefghij xy", 4), vec!["abcd", "efgh", "ij ", "xy"]);
    }

    #[test]
    fn test_wrapping_keeps_every_character() {
        let lines = [
            "    indented words keep their indentation",
            "one  two   three    four",
            "• trailing spaces stay put      ",
            "          ",
            "ünïcödé wörds àcross the brëak",
        ];
        for line in lines {
            let wrapped = wrap_line(line, 7);
            assert_eq!(wrapped.concat(), line);
            assert!(
                wrapped.iter().all(|piece| piece.chars().count() <= 7),
                "over-wide piece in {:?}",
                wrapped
            );
        }
        assert_eq!(wrap_line("          ", 4), vec!["    ", "    ", "  "]);
        assert_eq!(wrap_line("    indented", 6), vec!["    in", "dented"]);
    }

    #[test]
    fn test_overflow_starts_new_page() {
        let layout = layout();
        let per_page = layout.lines_per_page();
        let content = (0..per_page + 3)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let pages = layout.paginate(&content);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), per_page);
        assert_eq!(pages[1], vec![
            format!("line {}", per_page),
            format!("line {}", per_page + 1),
            format!("line {}", per_page + 2),
        ]);
    }

    #[test]
    fn test_header_symbols_use_symbol_font() {
        let faces = Typefaces::load().unwrap();
        assert_eq!(
            faces.runs("📌 Notes"),
            vec![(FontSlot::Symbols, "📌"), (FontSlot::Text, " Notes")]
        );
        assert_eq!(faces.runs("• Mars"), vec![(FontSlot::Text, "• Mars")]);
        for symbol in ['📌', '📝', '❓', '💡'] {
            assert_eq!(faces.slot(symbol), FontSlot::Symbols, "{}", symbol);
        }
        assert!(faces.runs("").is_empty());
    }

    #[test]
    fn test_astral_destinations_become_surrogate_pairs() {
        let cmap = "1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
                    2 beginbfchar\r\n<0001> <1f4cc>\n<0024> <0041>\nendbfchar\r\n";
        let fixed = surrogate_destinations(cmap);
        assert!(fixed.contains("<0001> <d83ddccc>\n"));
        assert!(fixed.contains("<0024> <0041>\n"));
        assert!(fixed.contains("<0000> <FFFF>\n"));
        assert!(fixed.ends_with("endbfchar\r\n"));
    }

    #[test]
    fn test_empty_content_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        let err = export("  \n\t ", &path, &ExportConfig::default()).unwrap_err();
        assert!(matches!(err, ExportError::EmptyContent));
        assert!(!path.exists());
    }

    #[test]
    fn test_exported_text_reads_back_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BharatGPT_Notes.pdf");
        let rule = "-".repeat(50);
        let mut lines = vec![
            "📌 Notes (Auto-generated from Wikipedia)",
            rule.as_str(),
            "• Mars is a planet",
            "• It is red",
            "",
            "📝 Summary of Mars",
            "❓ Quiz Questions",
            "1. Explain the term 'Mars' in detail.",
            "💡 Pro Tips:",
        ];
        let facts: Vec<String> = (0..50).map(|i| format!("• Fact number {}", i)).collect();
        lines.extend(facts.iter().map(String::as_str));
        let content = lines.join("\n");

        export(&content, &path, &ExportConfig::default()).unwrap();

        let text = pdf_extract::extract_text(&path).unwrap();
        let read_back: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let expected: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(read_back, expected);
    }
}
