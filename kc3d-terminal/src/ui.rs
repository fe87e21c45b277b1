/// Swatch tray presentation and mouse hit-testing
///
/// Each tray occupies one terminal row below the viewport: a fixed-width
/// label followed by one cell per swatch. Cell layout is the single source
/// of truth for both drawing and click resolution.
use std::io::Write;

use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};

use kc3d_core::{Catalog, Rgb, Tray};

/// Columns reserved for the tray label.
pub const LABEL_WIDTH: u16 = 9;

/// Columns per swatch cell: two block characters and a gap.
pub const SWATCH_WIDTH: u16 = 3;

/// Terminal rows the tray bar occupies.
pub fn tray_rows(trays: &[Tray]) -> u16 {
    trays.len() as u16
}

fn swatch_color(catalog: &Catalog, key: usize) -> Color {
    let rgb = catalog
        .get(key)
        .and_then(|def| def.color)
        .unwrap_or(Rgb::WHITE);
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// Draw all trays starting at `origin_row`.
pub fn draw_trays<W: Write>(
    writer: &mut W,
    trays: &[Tray],
    catalog: &Catalog,
    origin_row: u16,
) -> std::io::Result<()> {
    for (row_offset, tray) in trays.iter().enumerate() {
        writer.queue(MoveTo(0, origin_row + row_offset as u16))?;
        writer.queue(ResetColor)?;
        writer.queue(Print(format!(
            "{:<width$}",
            tray.label,
            width = LABEL_WIDTH as usize
        )))?;

        for swatch in &tray.swatches {
            writer.queue(SetForegroundColor(swatch_color(catalog, swatch.key)))?;
            let textured = catalog
                .get(swatch.key)
                .is_some_and(|def| def.texture.is_some());
            let applied = tray.applied == Some(swatch.key);
            // Applied swatches render solid, others hollow; textured ones
            // always show the woven glyph.
            let cell = match (textured, applied) {
                (true, _) => "▒▒",
                (false, true) => "██",
                (false, false) => "▄▄",
            };
            writer.queue(Print(cell))?;
            writer.queue(Print(' '))?;
        }
        writer.queue(ResetColor)?;
    }
    Ok(())
}

/// Resolve a mouse position to `(tray index, catalog key)`.
///
/// Returns `None` for clicks on labels, gaps between cells, or anywhere
/// outside the tray bar.
pub fn hit_test(trays: &[Tray], column: u16, row: u16, origin_row: u16) -> Option<(usize, usize)> {
    if row < origin_row {
        return None;
    }
    let tray_index = (row - origin_row) as usize;
    let tray = trays.get(tray_index)?;

    if column < LABEL_WIDTH {
        return None;
    }
    let cell = column - LABEL_WIDTH;
    if cell % SWATCH_WIDTH == SWATCH_WIDTH - 1 {
        return None; // the gap column
    }
    let swatch_index = (cell / SWATCH_WIDTH) as usize;
    let swatch = tray.swatches.get(swatch_index)?;
    Some((tray_index, swatch.key))
}
