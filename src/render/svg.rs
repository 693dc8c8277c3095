//! SVG output for accumulated regions.
//!
//! The document declares its size in centimetres with a `viewBox` of the same
//! numbers, so one viewport unit is one user unit. Projected points map to
//! `(sx + W/2, H/2 - sy)`.

use std::fmt::{self, Write};

use super::region::{ObjectFills, RegionAccumulator, RegionOps};
use crate::colour::{ColourTable, Rgb};
use crate::math::Vec2;
use crate::projection::ProjectedPrimitive;

const PREAMBLE: &str = "<?xml version=\"1.0\" standalone=\"no\"?>\n\
<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\"\n  \
\"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";

/// Document size and background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgOptions {
    pub width: f64,
    pub height: f64,
    pub background: Option<Rgb>,
}

impl SvgOptions {
    /// Maps a projected point into document coordinates.
    pub fn to_document(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x + self.width / 2.0, self.height / 2.0 - p.y)
    }
}

/// Writes SVG documents from projected primitives.
pub struct SvgWriter<'a, O> {
    ops: O,
    colours: &'a ColourTable,
    options: SvgOptions,
}

impl<'a, O: RegionOps> SvgWriter<'a, O> {
    pub fn new(ops: O, colours: &'a ColourTable, options: SvgOptions) -> Self {
        Self {
            ops,
            colours,
            options,
        }
    }

    /// Maps a projected point into document coordinates.
    pub fn to_document(&self, p: Vec2) -> Vec2 {
        self.options.to_document(p)
    }

    /// Resolves occlusion between `primitives` and writes the document.
    /// Lines are not drawn.
    pub fn render(self, primitives: &[ProjectedPrimitive]) -> Result<String, fmt::Error>
    where
        O: Clone,
    {
        let mut accumulator = RegionAccumulator::new(self.ops.clone());
        accumulator.add_all(primitives, |p| self.to_document(p));
        let objects = accumulator.finish();
        log::debug!("svg: {} visible objects", objects.len());

        let mut out = String::new();
        self.write(&objects, &mut out)?;
        Ok(out)
    }

    /// Writes already accumulated fills.
    pub fn write<W: Write>(&self, objects: &[ObjectFills<O::Region>], out: &mut W) -> fmt::Result {
        let SvgOptions {
            width,
            height,
            background,
        } = self.options;

        out.write_str(PREAMBLE)?;
        writeln!(
            out,
            "<svg width=\"{width:.6}cm\" height=\"{height:.6}cm\" \
             viewBox=\"{:.6} {:.6} {width:.6} {height:.6}\" \
             xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">",
            0.0, 0.0
        )?;
        if let Some(rgb) = background {
            writeln!(
                out,
                "<rect x=\"0\" y=\"0\" width=\"{width:.6}\" height=\"{height:.6}\" fill=\"{rgb}\" />"
            )?;
        }

        for object in objects {
            out.write_str("<g>\n")?;
            for (colour, region) in &object.fills {
                let outlines = self.ops.outlines(region);
                if outlines.is_empty() {
                    continue;
                }
                write!(
                    out,
                    "<path style=\"fill:{}; opacity:{:.6}\" d=\"",
                    self.colours.rgb(*colour),
                    self.colours.alpha(*colour) as f64 / 255.0
                )?;
                write_path_data(&outlines, out)?;
                out.write_str("\" />\n")?;
            }
            out.write_str("</g>\n")?;
        }
        out.write_str("</svg>\n")
    }
}

/// `M x y L x y ... Z` for every outline, separated by spaces.
fn write_path_data<W: Write>(outlines: &[Vec<Vec2>], out: &mut W) -> fmt::Result {
    for (i, outline) in outlines.iter().enumerate() {
        let points = match outline.split_last() {
            Some((last, rest)) if !rest.is_empty() && *last == outline[0] => rest,
            _ => outline.as_slice(),
        };
        if i > 0 {
            out.write_char(' ')?;
        }
        for (j, p) in points.iter().enumerate() {
            let command = if j == 0 { 'M' } else { 'L' };
            write!(out, "{command} {:.6} {:.6} ", p.x, p.y)?;
        }
        out.write_char('Z')?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::ColourCode;
    use crate::math::Vec3;
    use crate::render::region::tests::GridOps;
    use crate::traversal::PrimitiveKind;

    fn options(background: Option<Rgb>) -> SvgOptions {
        SvgOptions {
            width: 10.0,
            height: 10.0,
            background,
        }
    }

    fn quad(owner: usize, colour: u32, x0: f64, x1: f64, min_z: f64) -> ProjectedPrimitive {
        ProjectedPrimitive {
            owner,
            colour: ColourCode(colour),
            kind: PrimitiveKind::Quadrilateral,
            points: vec![
                Vec3::new(x0, -1.0, -min_z),
                Vec3::new(x1, -1.0, -min_z),
                Vec3::new(x1, 1.0, -min_z),
                Vec3::new(x0, 1.0, -min_z),
            ],
            min_z,
        }
    }

    #[test]
    fn writes_header_and_background() {
        let colours = ColourTable::default();
        let svg = SvgWriter::new(GridOps, &colours, options(Some(Rgb::new(255, 255, 255))))
            .render(&[])
            .unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" standalone=\"no\"?>"));
        assert!(svg.contains(
            "<svg width=\"10.000000cm\" height=\"10.000000cm\" viewBox=\"0.000000 0.000000 10.000000 10.000000\""
        ));
        assert!(svg.contains("fill=\"#ffffff\" />"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn one_group_per_object_with_colour_paths() {
        let colours = ColourTable::default();
        let primitives = [quad(0, 4, -3.0, -1.0, -10.0), quad(1, 1, 1.0, 3.0, -10.0)];
        let svg = SvgWriter::new(GridOps, &colours, options(None))
            .render(&primitives)
            .unwrap();
        assert_eq!(svg.matches("<g>").count(), 2);
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("fill:#b40000; opacity:1.000000"));
        assert!(svg.contains("fill:#1e5aa8; opacity:1.000000"));
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn hidden_object_gets_no_group() {
        let colours = ColourTable::default();
        let near = quad(0, 4, -3.0, 3.0, -10.0);
        let far = quad(1, 1, -1.0, 1.0, -50.0);
        let svg = SvgWriter::new(GridOps, &colours, options(None))
            .render(&[far, near])
            .unwrap();
        assert_eq!(svg.matches("<g>").count(), 1);
        assert!(svg.contains("fill:#b40000"));
        assert!(!svg.contains("fill:#1e5aa8"));
    }

    #[test]
    fn path_data_drops_repeated_start_point() {
        let outline = vec![vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
        ]];
        let mut out = String::new();
        write_path_data(&outline, &mut out).unwrap();
        assert_eq!(
            out,
            "M 0.000000 0.000000 L 1.000000 0.000000 L 1.000000 1.000000 Z"
        );
    }
}
