//! DXF R12 line-stream output.
//!
//! Accumulates the segments the engine emits, then writes a minimal DXF
//! document: header, empty tables, and one `LINE` entity per segment.
//! Cut-order colors map onto ACI 1-6, which stay visually distinct in
//! CAD/CAM software; coordinates convert from the engine's centimeters to
//! millimeters.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flatnest::LayoutWriter;
use flatnest_math::Point2;

/// Centimeters to millimeters.
const MM_PER_CM: f64 = 10.0;

/// A buffered segment, still in engine coordinates.
#[derive(Debug, Clone, Copy)]
struct DxfLine {
    start: Point2,
    end: Point2,
    color: u32,
}

/// DXF document builder.
///
/// Implements [`LayoutWriter`]; group calls are accepted and ignored since
/// the flat entity list carries no group structure.
#[derive(Debug, Default)]
pub struct DxfWriter {
    lines: Vec<DxfLine>,
}

impl DxfWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered segments.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Has nothing been drawn yet?
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Write the document to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Write the document to any sink.
    pub fn write_to(&self, mut writer: impl Write) -> std::io::Result<()> {
        // Header: DXF R12, millimeter units.
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "HEADER")?;
        writeln!(writer, "9")?;
        writeln!(writer, "$ACADVER")?;
        writeln!(writer, "1")?;
        writeln!(writer, "AC1009")?;
        writeln!(writer, "9")?;
        writeln!(writer, "$INSUNITS")?;
        writeln!(writer, "70")?;
        writeln!(writer, "4")?;
        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;

        // Tables section (minimal).
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "TABLES")?;
        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;

        // Entities.
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "ENTITIES")?;
        for line in &self.lines {
            writeln!(writer, "0")?;
            writeln!(writer, "LINE")?;
            writeln!(writer, "8")?;
            writeln!(writer, "0")?;
            writeln!(writer, "62")?;
            writeln!(writer, "{}", aci_color(line.color))?;
            writeln!(writer, "10")?;
            writeln!(writer, "{:.6}", line.start.x * MM_PER_CM)?;
            writeln!(writer, "20")?;
            writeln!(writer, "{:.6}", line.start.y * MM_PER_CM)?;
            writeln!(writer, "11")?;
            writeln!(writer, "{:.6}", line.end.x * MM_PER_CM)?;
            writeln!(writer, "21")?;
            writeln!(writer, "{:.6}", line.end.y * MM_PER_CM)?;
        }
        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;

        writeln!(writer, "0")?;
        writeln!(writer, "EOF")?;
        Ok(())
    }
}

/// Map a 1-based cut-order color onto ACI 1-6, cycling.
fn aci_color(color: u32) -> u32 {
    (color.max(1) - 1) % 6 + 1
}

impl LayoutWriter for DxfWriter {
    fn begin_group(&mut self, _id: &str) {}

    fn line(&mut self, p1: Point2, p2: Point2, color: u32) {
        self.lines.push(DxfLine {
            start: p1,
            end: p2,
            color,
        });
    }

    fn end_group(&mut self) {}
}
