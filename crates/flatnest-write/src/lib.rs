#![warn(missing_docs)]

//! DXF and SVG emitters for flatnest layouts.
//!
//! Both formats implement the engine's [`LayoutWriter`](flatnest::LayoutWriter)
//! protocol, buffer everything the engine emits, and produce their document
//! on demand: DXF as an R12 line stream in millimeters, SVG with a view
//! box computed from the drawn geometry.
//!
//! # Example
//!
//! ```no_run
//! use flatnest::Nester;
//! use flatnest_write::{DxfWriter, SvgFileWriter};
//!
//! let mut nester = Nester::new();
//! // ... add parts, set kerf ...
//! nester.run();
//!
//! let mut dxf = DxfWriter::new();
//! nester.write(&mut dxf);
//! dxf.save("layout.dxf")?;
//!
//! let mut svg = SvgFileWriter::create("layout.svg");
//! nester.write(&mut svg);
//! svg.save()?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod dxf;
pub mod svg;

pub use dxf::DxfWriter;
pub use svg::{SvgFileWriter, SvgStringWriter};

#[cfg(test)]
mod tests {
    use super::*;
    use flatnest::{Nester, Part, Ring};
    use flatnest_math::Point2;

    fn rect_part(w: f64, h: f64) -> Part {
        Part::new(Ring::from_points(&[
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]))
    }

    fn nested_rings_nester() -> Nester {
        let mut host = rect_part(10.0, 10.0);
        host.add_hole(Ring::from_points(&[
            Point2::new(1.5, 1.5),
            Point2::new(8.5, 1.5),
            Point2::new(8.5, 8.5),
            Point2::new(1.5, 8.5),
        ]));
        let mut nester = Nester::new();
        nester.add_part(host);
        nester.add_part(rect_part(2.0, 2.0));
        nester
    }

    #[test]
    fn test_dxf_end_to_end() {
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 2.0));
        nester.add_part(rect_part(3.0, 1.0));
        nester.run();

        let mut dxf = DxfWriter::new();
        nester.write(&mut dxf);
        assert_eq!(dxf.len(), 8);

        let mut out = Vec::new();
        dxf.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("LINE").count(), 8);
    }

    #[test]
    fn test_svg_end_to_end() {
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 2.0));
        nester.add_part(rect_part(3.0, 1.0));
        nester.run();

        let mut svg = SvgStringWriter::new();
        nester.write(&mut svg);
        let doc = svg.to_svg();
        assert_eq!(doc.matches("<line").count(), 8);
        assert!(doc.contains("<g id=\"part_0\">"));
        assert!(doc.contains("<g id=\"part_1\">"));
    }

    #[test]
    fn test_nested_layout_uses_cut_order_palette() {
        let mut nester = nested_rings_nester();
        nester.set_kerf(0.0);
        nester.run();

        // The tenant's outline cuts before the host: depth 1 gets colors
        // (1, 2), the host (3, 4) -> black/red then blue/green.
        let mut svg = SvgStringWriter::new();
        nester.write(&mut svg);
        let doc = svg.to_svg();
        assert!(doc.contains("stroke=\"red\""));
        assert!(doc.contains("stroke=\"blue\""));
        assert!(doc.contains("stroke=\"green\""));
    }
}
