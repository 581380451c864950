//! Page geometry for the prescription and registration documents.
//!
//! All positions are millimetres measured from the top-left corner of an A4
//! page; the drawers flip to PDF's bottom-left origin. Constants below are
//! shared with previously stored documents and must not drift.

use super::wrap_text;
use crate::models::{Medicine, Prescription};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 14.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
pub const HEADER_HEIGHT: f32 = 26.0;
pub const FOOTER_Y: f32 = 272.0;

/// Medicine / Dosage / Duration share of the content width.
pub const COLUMN_RATIOS: [f32; 3] = [0.50, 0.28, 0.22];

pub const LINE_HEIGHT: f32 = 5.0;
pub const SECTION_MARGIN: f32 = 4.0;
pub const LABEL_HEIGHT: f32 = 6.0;
pub const BODY_FONT: f32 = 10.0;
pub const TABLE_FONT: f32 = 9.5;
pub const TABLE_HEADER_HEIGHT: f32 = 8.0;
pub const ROW_PADDING: f32 = 4.0;
pub const CELL_INSET: f32 = 2.0;
pub const NOTES_PADDING: f32 = 6.0;

pub const CARD_TOP: f32 = HEADER_HEIGHT + 6.0;
pub const CARD_HEIGHT: f32 = 36.0;
pub const CARD_GAP: f32 = 6.0;
pub const CARD_WIDTH: f32 = (CONTENT_WIDTH - CARD_GAP) / 2.0;

/// Body content must end above this line so it never runs into the footer.
pub const CONTENT_BOTTOM: f32 = FOOTER_Y - 8.0;
/// Where body content resumes on continuation pages.
pub const CONTINUATION_TOP: f32 = MARGIN + 6.0;

/// Column widths in millimetres, left to right.
pub fn column_widths() -> [f32; 3] {
    COLUMN_RATIOS.map(|r| r * CONTENT_WIDTH)
}

/// Left edge of each column.
pub fn column_offsets() -> [f32; 3] {
    let [w0, w1, _] = column_widths();
    [MARGIN, MARGIN + w0, MARGIN + w0 + w1]
}

/// A run of text lines placed on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub page: usize,
    pub top: f32,
    pub height: f32,
    pub lines: Vec<String>,
}

/// A labelled section: the label position plus its text segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub label_page: usize,
    pub label_top: f32,
    pub segments: Vec<TextSegment>,
}

/// One medicine row, already wrapped per column. A medicine taller than a
/// page body is split into several rows sharing the same `medicine` index.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Position of the medicine in the prescription.
    pub medicine: usize,
    pub page: usize,
    pub top: f32,
    pub height: f32,
    pub cells: [Vec<String>; 3],
}

impl TableRow {
    /// Lines in the tallest column.
    pub fn line_count(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(1)
    }

    /// Height needed to hold the tallest column without clipping.
    pub fn min_height(&self) -> f32 {
        self.line_count() as f32 * LINE_HEIGHT + ROW_PADDING
    }
}

/// Table header placement; repeated at the top of each continuation page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableHeader {
    pub page: usize,
    pub top: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrescriptionLayout {
    pub page_count: usize,
    pub diagnosis: Section,
    pub table_headers: Vec<TableHeader>,
    pub rows: Vec<TableRow>,
    /// `None` when the prescription carries no notes.
    pub notes: Option<Section>,
    pub inventory: Option<Section>,
    pub tests: Option<Section>,
}

/// Vertical cursor that breaks to a new page before crossing the footer zone.
struct Cursor {
    page: usize,
    y: f32,
}

impl Cursor {
    fn at_page_top(&self) -> bool {
        self.y <= CONTINUATION_TOP
    }

    /// Moves to a fresh page if `height` does not fit below the cursor.
    /// Returns true when a break happened.
    fn reserve(&mut self, height: f32) -> bool {
        if self.y + height > CONTENT_BOTTOM && !self.at_page_top() {
            self.page += 1;
            self.y = CONTINUATION_TOP;
            return true;
        }
        false
    }

    fn table_header(&mut self) -> TableHeader {
        let header = TableHeader {
            page: self.page,
            top: self.y,
        };
        self.y += TABLE_HEADER_HEIGHT;
        header
    }

    /// Places `lines` starting at the cursor, spilling onto following
    /// pages. `padding` is added to each segment's height (box insets).
    fn place_lines(&mut self, lines: Vec<String>, padding: f32) -> Vec<TextSegment> {
        let mut segments = Vec::new();
        let mut pending = lines.into_iter().peekable();
        while pending.peek().is_some() {
            self.reserve(LINE_HEIGHT + padding);
            let room = ((CONTENT_BOTTOM - self.y - padding) / LINE_HEIGHT).floor().max(1.0) as usize;
            let chunk: Vec<String> = pending.by_ref().take(room).collect();
            let height = chunk.len() as f32 * LINE_HEIGHT + padding;
            segments.push(TextSegment {
                page: self.page,
                top: self.y,
                height,
                lines: chunk,
            });
            self.y += height;
        }
        segments
    }

    fn section(&mut self, lines: Vec<String>, padding: f32) -> Section {
        self.reserve(LABEL_HEIGHT + LINE_HEIGHT + padding);
        let label_page = self.page;
        let label_top = self.y;
        self.y += LABEL_HEIGHT;
        let segments = self.place_lines(lines, padding);
        self.y += SECTION_MARGIN;
        Section {
            label_page,
            label_top,
            segments,
        }
    }
}

/// Wraps one medicine into per-column lines.
pub fn wrap_row(medicine: &Medicine) -> [Vec<String>; 3] {
    let widths = column_widths();
    let cell = |text: &str, width: f32| wrap_text(text, width - 2.0 * CELL_INSET, TABLE_FONT);
    [
        cell(&medicine.name, widths[0]),
        cell(&medicine.dosage, widths[1]),
        cell(&medicine.duration, widths[2]),
    ]
}

/// Formats one attached inventory item for the reference list.
pub fn inventory_line(item: &crate::models::InventoryItem) -> String {
    format!("{} ({}) - {}: {}", item.name, item.code, item.dosage, item.usage)
}

/// Computes where every prescription section lands.
pub fn layout_prescription(prescription: &Prescription) -> PrescriptionLayout {
    let mut cursor = Cursor {
        page: 0,
        y: CARD_TOP + CARD_HEIGHT + 8.0,
    };

    let diagnosis_lines = wrap_text(&prescription.diagnosis, CONTENT_WIDTH, BODY_FONT);
    let diagnosis = cursor.section(diagnosis_lines, 0.0);

    // Medicine table
    cursor.reserve(TABLE_HEADER_HEIGHT + LINE_HEIGHT + ROW_PADDING);
    let mut table_headers = vec![cursor.table_header()];

    let page_capacity = CONTENT_BOTTOM - CONTINUATION_TOP - TABLE_HEADER_HEIGHT;
    let mut rows = Vec::with_capacity(prescription.medicines.len());
    for (index, medicine) in prescription.medicines.iter().enumerate() {
        let cells = wrap_row(medicine);
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        let height = lines as f32 * LINE_HEIGHT + ROW_PADDING;
        if height <= page_capacity {
            if cursor.reserve(height) {
                table_headers.push(cursor.table_header());
            }
            rows.push(TableRow {
                medicine: index,
                page: cursor.page,
                top: cursor.y,
                height,
                cells,
            });
            cursor.y += height;
            continue;
        }

        let mut columns = cells.map(Vec::into_iter);
        let mut remaining = lines;
        while remaining > 0 {
            if cursor.reserve(LINE_HEIGHT + ROW_PADDING) {
                table_headers.push(cursor.table_header());
            }
            let room = ((CONTENT_BOTTOM - cursor.y - ROW_PADDING) / LINE_HEIGHT)
                .floor()
                .max(1.0) as usize;
            let take = room.min(remaining);
            let part: [Vec<String>; 3] =
                std::array::from_fn(|col| columns[col].by_ref().take(take).collect());
            let height = take as f32 * LINE_HEIGHT + ROW_PADDING;
            rows.push(TableRow {
                medicine: index,
                page: cursor.page,
                top: cursor.y,
                height,
                cells: part,
            });
            cursor.y += height;
            remaining -= take;
            if remaining > 0 {
                cursor.page += 1;
                cursor.y = CONTINUATION_TOP;
                table_headers.push(cursor.table_header());
            }
        }
        tracing::debug!(medicine = index, lines, "Medicine row split across pages");
    }
    cursor.y += SECTION_MARGIN * 2.0;

    let notes = prescription.has_notes().then(|| {
        let lines = wrap_text(prescription.notes.trim(), CONTENT_WIDTH - 2.0 * CELL_INSET, BODY_FONT);
        cursor.section(lines, NOTES_PADDING)
    });

    let inventory = (!prescription.inventory_items.is_empty()).then(|| {
        let lines = prescription
            .inventory_items
            .iter()
            .flat_map(|item| wrap_text(&format!("- {}", inventory_line(item)), CONTENT_WIDTH, BODY_FONT))
            .collect();
        cursor.section(lines, 0.0)
    });

    let tests = (!prescription.recommended_tests.is_empty()).then(|| {
        let joined = prescription.recommended_tests.join(", ");
        cursor.section(wrap_text(&joined, CONTENT_WIDTH, BODY_FONT), 0.0)
    });

    PrescriptionLayout {
        page_count: cursor.page + 1,
        diagnosis,
        table_headers,
        rows,
        notes,
        inventory,
        tests,
    }
}

/// Fixed-height blocks of the registration slip, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationBlock {
    TokenBanner,
    PatientInfo,
    DoctorInfo,
    VisitDetails,
    Vitals,
    Payment,
}

impl RegistrationBlock {
    pub const ORDER: [RegistrationBlock; 6] = [
        Self::TokenBanner,
        Self::PatientInfo,
        Self::DoctorInfo,
        Self::VisitDetails,
        Self::Vitals,
        Self::Payment,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::TokenBanner => "Token",
            Self::PatientInfo => "Patient Information",
            Self::DoctorInfo => "Doctor Information",
            Self::VisitDetails => "Visit Details",
            Self::Vitals => "Vitals",
            Self::Payment => "Payment Information",
        }
    }

    pub fn height(&self) -> f32 {
        match self {
            Self::TokenBanner => 18.0,
            Self::PatientInfo => 40.0,
            Self::DoctorInfo => 27.0,
            Self::VisitDetails => 27.0,
            Self::Vitals => 30.0,
            Self::Payment => 27.0,
        }
    }
}

pub const BLOCK_GAP: f32 = 6.0;

/// Top offset of every registration block. Content-independent.
pub fn registration_blocks() -> Vec<(RegistrationBlock, f32)> {
    let mut top = HEADER_HEIGHT + 6.0;
    RegistrationBlock::ORDER
        .iter()
        .map(|block| {
            let placed = (*block, top);
            top += block.height() + BLOCK_GAP;
            placed
        })
        .collect()
}
