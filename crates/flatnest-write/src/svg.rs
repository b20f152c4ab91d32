//! SVG output with a computed view box.
//!
//! Two writers share one body format: [`SvgStringWriter`] renders to an
//! in-memory string (preview rendering), [`SvgFileWriter`] renders to disk.
//! The document root is produced last, once the drawn bounding box is
//! known, with a small padding margin around the geometry. Coordinates are
//! raw numbers, one unit per centimeter.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flatnest::LayoutWriter;
use flatnest_math::{BoundingBox, Point2};

/// Cut-order palette, cycled. Darker names keep every level readable on a
/// white background.
const NAMED_COLORS: [&str; 12] = [
    "black",
    "red",
    "blue",
    "green",
    "purple",
    "orange",
    "brown",
    "teal",
    "maroon",
    "darkviolet",
    "darkorange",
    "darkgreen",
];

/// Name for a 1-based cut-order color.
fn color_name(color: u32) -> &'static str {
    NAMED_COLORS[((color.max(1) - 1) % NAMED_COLORS.len() as u32) as usize]
}

/// One buffered drawing event.
#[derive(Debug, Clone)]
enum SvgEvent {
    BeginGroup(String),
    Line {
        start: Point2,
        end: Point2,
        color: u32,
    },
    EndGroup,
}

/// Shared event buffer with running bounds.
#[derive(Debug, Default)]
struct SvgBody {
    events: Vec<SvgEvent>,
    bounds: BoundingBox,
}

impl SvgBody {
    fn begin_group(&mut self, id: &str) {
        self.events.push(SvgEvent::BeginGroup(id.to_string()));
    }

    fn line(&mut self, p1: Point2, p2: Point2, color: u32) {
        self.bounds.include_point(&p1);
        self.bounds.include_point(&p2);
        self.events.push(SvgEvent::Line {
            start: p1,
            end: p2,
            color,
        });
    }

    fn end_group(&mut self) {
        self.events.push(SvgEvent::EndGroup);
    }

    /// Render the complete document.
    ///
    /// The view box covers the drawn bounds padded by
    /// `(width + height) × pad_frac + 0.5`. With no geometry drawn the
    /// result is a minimal valid document.
    fn render(&self, pad_frac: f64, stroke_width: f64) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        if !self.bounds.is_valid() {
            out.push_str(
                "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
                 width=\"1cm\" height=\"1cm\" viewBox=\"0 0 1 1\"/>\n",
            );
            return out;
        }

        let pad = (self.bounds.width() + self.bounds.height()) * pad_frac + 0.5;
        let min_x = self.bounds.min_x - pad;
        let min_y = self.bounds.min_y - pad;
        let width = self.bounds.width() + 2.0 * pad;
        let height = self.bounds.height() + 2.0 * pad;
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
             width=\"{width:.3}cm\" height=\"{height:.3}cm\" \
             viewBox=\"{min_x:.3} {min_y:.3} {width:.3} {height:.3}\">\n"
        ));

        for event in &self.events {
            match event {
                SvgEvent::BeginGroup(id) => {
                    out.push_str(&format!("<g id=\"{id}\">\n"));
                }
                SvgEvent::Line { start, end, color } => {
                    out.push_str(&format!(
                        "<line x1=\"{:.3}\" y1=\"{:.3}\" x2=\"{:.3}\" y2=\"{:.3}\" \
                         stroke=\"{}\" stroke-width=\"{}\"/>\n",
                        start.x,
                        start.y,
                        end.x,
                        end.y,
                        color_name(*color),
                        stroke_width
                    ));
                }
                SvgEvent::EndGroup => out.push_str("</g>\n"),
            }
        }
        out.push_str("</svg>\n");
        out
    }
}

/// Renders the layout into an in-memory SVG string.
#[derive(Debug, Default)]
pub struct SvgStringWriter {
    body: SvgBody,
}

impl SvgStringWriter {
    /// Padding factor applied to the drawn bounds.
    const PAD_FRAC: f64 = 0.03;
    /// Stroke width for preview rendering.
    const STROKE_WIDTH: f64 = 0.05;

    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The complete SVG document drawn so far.
    pub fn to_svg(&self) -> String {
        self.body.render(Self::PAD_FRAC, Self::STROKE_WIDTH)
    }
}

impl LayoutWriter for SvgStringWriter {
    fn begin_group(&mut self, id: &str) {
        self.body.begin_group(id);
    }

    fn line(&mut self, p1: Point2, p2: Point2, color: u32) {
        self.body.line(p1, p2, color);
    }

    fn end_group(&mut self) {
        self.body.end_group();
    }
}

/// Renders the layout into an SVG file.
#[derive(Debug)]
pub struct SvgFileWriter {
    path: PathBuf,
    body: SvgBody,
}

impl SvgFileWriter {
    /// Padding factor applied to the drawn bounds.
    const PAD_FRAC: f64 = 0.02;
    /// Stroke width for cut files.
    const STROKE_WIDTH: f64 = 0.02;

    /// Create a writer targeting `path`. Nothing is written until
    /// [`save`](SvgFileWriter::save).
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            body: SvgBody::default(),
        }
    }

    /// Render and write the document to the target path.
    pub fn save(&self) -> std::io::Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(
            self.body
                .render(Self::PAD_FRAC, Self::STROKE_WIDTH)
                .as_bytes(),
        )?;
        writer.flush()
    }
}

impl LayoutWriter for SvgFileWriter {
    fn begin_group(&mut self, id: &str) {
        self.body.begin_group(id);
    }

    fn line(&mut self, p1: Point2, p2: Point2, color: u32) {
        self.body.line(p1, p2, color);
    }

    fn end_group(&mut self) {
        self.body.end_group();
    }
}
