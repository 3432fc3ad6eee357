use untriseptium_types::{BOUNDARY_CONFIDENCE, Rect, WordPosition, WordRecord};

use crate::error::OcrError;

/// Header emitted by tesseract's `tsv` output, which engines are expected to follow.
pub const TABLE_HEADER: &str =
    "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Column {
    Level,
    Page,
    Block,
    Paragraph,
    Line,
    Word,
    Left,
    Top,
    Width,
    Height,
    Confidence,
    Text,
    Ignored,
}

impl Column {
    fn from_header(name: &str) -> Self {
        match name.trim() {
            "level" => Column::Level,
            "page_num" => Column::Page,
            "block_num" => Column::Block,
            "par_num" => Column::Paragraph,
            "line_num" => Column::Line,
            "word_num" => Column::Word,
            "left" => Column::Left,
            "top" => Column::Top,
            "width" => Column::Width,
            "height" => Column::Height,
            "conf" => Column::Confidence,
            "text" => Column::Text,
            _ => Column::Ignored,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Column::Level => "level",
            Column::Page => "page_num",
            Column::Block => "block_num",
            Column::Paragraph => "par_num",
            Column::Line => "line_num",
            Column::Word => "word_num",
            Column::Left => "left",
            Column::Top => "top",
            Column::Width => "width",
            Column::Height => "height",
            Column::Confidence => "conf",
            Column::Text => "text",
            Column::Ignored => "",
        }
    }
}

#[derive(Default)]
struct RawRow<'a> {
    position: WordPosition,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    confidence: f32,
    text: &'a str,
}

/// Parse a raw OCR word table into records in full-image coordinates.
///
/// `origin` is the top-left corner of the recognized sub-region; it is added to
/// every box. Confidences are rescaled from `[0, 100]` to `[0, 1]`, and negative
/// confidences become boundary records. Rows with fewer cells than the header
/// are skipped. When two consecutive words sit on different lines without a
/// boundary row between them, a boundary record is inserted.
pub fn parse_table(raw: &str, origin: (u32, u32)) -> Result<Vec<WordRecord>, OcrError> {
    let mut lines = raw.lines();
    let Some(header) = lines.find(|line| !line.trim().is_empty()) else {
        return Ok(Vec::new());
    };
    let columns: Vec<Column> = header.split('\t').map(Column::from_header).collect();

    let mut records = Vec::new();
    let mut last_line: Option<(u32, u32, u32, u32)> = None;
    let mut after_boundary = true;

    for (idx, line) in lines.enumerate() {
        let cells: Vec<&str> = line.split('\t').collect();
        if cells.len() < columns.len() {
            continue;
        }
        let row = parse_row(&columns, &cells, idx + 1, line)?;
        let rect = Rect::from_xywh(
            row.left + origin.0 as f32,
            row.top + origin.1 as f32,
            row.width,
            row.height,
        );

        if row.confidence < 0.0 {
            records.push(
                WordRecord::new(row.text, BOUNDARY_CONFIDENCE, rect).with_position(row.position),
            );
            after_boundary = true;
            continue;
        }

        let key = row.position.line_key();
        if !after_boundary && last_line.is_some_and(|previous| previous != key) {
            let position = WordPosition {
                level: row.position.level.saturating_sub(1),
                word: 0,
                ..row.position
            };
            records.push(WordRecord::boundary(rect).with_position(position));
        }
        last_line = Some(key);
        after_boundary = false;

        let confidence = (row.confidence / 100.0).clamp(0.0, 1.0);
        records.push(WordRecord::new(row.text, confidence, rect).with_position(row.position));
    }

    Ok(records)
}

fn parse_row<'a>(
    columns: &[Column],
    cells: &[&'a str],
    row_number: usize,
    line: &str,
) -> Result<RawRow<'a>, OcrError> {
    let mut row = RawRow::default();
    for (column, cell) in columns.iter().zip(cells.iter().copied()) {
        let invalid = || OcrError::Parse {
            row: row_number,
            column: column.name(),
            value: cell.to_string(),
            line: line.to_string(),
        };
        let integer = || cell.trim().parse::<u32>().map_err(|_| invalid());
        let coordinate = || {
            cell.trim()
                .parse::<i32>()
                .map(|value| value as f32)
                .map_err(|_| invalid())
        };
        let float = || {
            cell.trim()
                .parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(invalid)
        };
        match column {
            Column::Level => row.position.level = integer()?,
            Column::Page => row.position.page = integer()?,
            Column::Block => row.position.block = integer()?,
            Column::Paragraph => row.position.paragraph = integer()?,
            Column::Line => row.position.line = integer()?,
            Column::Word => row.position.word = integer()?,
            Column::Left => row.left = coordinate()?,
            Column::Top => row.top = coordinate()?,
            Column::Width => row.width = coordinate()?,
            Column::Height => row.height = coordinate()?,
            Column::Confidence => row.confidence = float()?,
            Column::Text => row.text = cell.trim(),
            Column::Ignored => {}
        }
    }
    Ok(row)
}
