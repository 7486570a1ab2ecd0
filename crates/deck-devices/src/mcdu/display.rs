//! MCDU display page model.
//!
//! The unit shows 14 lines of 24 character cells. Each cell carries a
//! color, a small-font flag, and an ASCII character; the wire encoding is
//! two style bytes (little-endian color mask, small font adds an offset)
//! followed by the character byte.

use super::protocol::chunk_display_payload;

pub const PAGE_LINES: usize = 14;
pub const PAGE_COLUMNS: usize = 24;

/// Small-font style offset added to a color mask.
const SMALL_FONT_OFFSET: u16 = 0x016B;

/// Character colors supported by the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    White,
    Amber,
    Cyan,
    Green,
    Magenta,
    Red,
    Yellow,
}

impl Color {
    /// Base style mask for the color.
    fn mask(self) -> u16 {
        match self {
            Color::White => 0x0042,
            Color::Amber => 0x0442,
            Color::Cyan => 0x0842,
            Color::Green => 0x0C42,
            Color::Magenta => 0x1042,
            Color::Red => 0x1442,
            Color::Yellow => 0x1842,
        }
    }
}

/// One display cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub color: Color,
    pub small_font: bool,
    pub ch: char,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            color: Color::White,
            small_font: false,
            ch: ' ',
        }
    }
}

/// A full display page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    cells: [[Cell; PAGE_COLUMNS]; PAGE_LINES],
}

impl Default for Page {
    fn default() -> Self {
        Self::blank()
    }
}

impl Page {
    /// An all-spaces page.
    pub fn blank() -> Self {
        Self {
            cells: [[Cell::default(); PAGE_COLUMNS]; PAGE_LINES],
        }
    }

    /// Write `text` starting at `(line, column)`, truncating at the right
    /// edge. Out-of-range lines are ignored.
    pub fn write(&mut self, line: usize, column: usize, text: &str, color: Color, small_font: bool) {
        let Some(row) = self.cells.get_mut(line) else {
            return;
        };
        for (offset, ch) in text.chars().enumerate() {
            let Some(cell) = row.get_mut(column + offset) else {
                break;
            };
            *cell = Cell {
                color,
                small_font,
                ch,
            };
        }
    }

    /// Write `text` centered on `line`.
    pub fn write_centered(&mut self, line: usize, text: &str, color: Color, small_font: bool) {
        let text: String = text.chars().take(PAGE_COLUMNS).collect();
        let start = (PAGE_COLUMNS - text.chars().count()) / 2;
        self.write(line, start, &text, color, small_font);
    }

    pub fn cell(&self, line: usize, column: usize) -> Option<&Cell> {
        self.cells.get(line)?.get(column)
    }

    /// Line content as a plain string, for logs and tests.
    pub fn line_text(&self, line: usize) -> String {
        self.cells
            .get(line)
            .map(|row| row.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Encode the page into chunked display frames ready to write to the
    /// unit. Non-ASCII characters are replaced with spaces; the display
    /// font is ASCII plus a handful of special glyphs we do not use in
    /// status pages.
    pub fn to_frames(&self) -> Vec<[u8; 64]> {
        let mut payload = Vec::with_capacity(PAGE_LINES * PAGE_COLUMNS * 3);
        for row in &self.cells {
            for cell in row {
                let mask = if cell.small_font {
                    cell.color.mask() + SMALL_FONT_OFFSET
                } else {
                    cell.color.mask()
                };
                payload.push((mask & 0xFF) as u8);
                payload.push((mask >> 8) as u8);
                payload.push(if cell.ch.is_ascii() { cell.ch as u8 } else { b' ' });
            }
        }
        chunk_display_payload(&payload)
    }

    /// The standard status screen: product banner on top, `message`
    /// centered mid-page in amber.
    pub fn status_screen(message: &str) -> Self {
        let mut page = Self::blank();
        page.write_centered(0, "OPENFLIGHTDECK", Color::White, false);
        page.write_centered(1, concat!("VERSION ", env!("CARGO_PKG_VERSION")), Color::Cyan, true);
        page.write_centered(8, message, Color::Amber, false);
        page
    }
}
