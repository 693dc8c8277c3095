//! POV-Ray scene output with one definition per part.
//!
//! Each distinct part code is declared once as a `union` of its triangles and
//! of instances of the parts it references, children before parents. The
//! model itself becomes a top-level `union` of instances, loose triangles
//! and lights, wrapped in a single transform that flips LDraw's `-Y` up onto
//! POV-Ray's `+Y` up.
//!
//! # Reference validation
//!
//! Every reference (nested or top-level) is checked before it is written:
//!
//! - unknown, cyclic or empty parts are dropped
//! - a zero on the matrix diagonal is nudged with [`Mat3::fix_diagonal`]
//! - a matrix that is still singular is dropped
//!
//! Each case records a [`Warning`].

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};

use crate::bounds::BoundsCache;
use crate::camera::Camera;
use crate::colour::{ColourAttributes, ColourCode, ColourTable, Rgb};
use crate::error::{PartError, RenderError, Warning, Warnings};
use crate::library::PartResolver;
use crate::math::{Mat3, Vec3};
use crate::part::{Part, Primitive};
use crate::piece::Piece;
use crate::traversal::Current;

/// Prefix of every declared object name.
const NAME_PREFIX: &str = "LDRAW_";

/// Maps LDraw's coordinate system onto POV-Ray's.
const GLOBAL_CORRECTION: &str = "matrix <1, 0, 0, 0, -1, 0, 0, 0, 1, 0, 0, 0>";

/// Offsets of the default lights from the model bounds.
const LIGHT_MARGIN: f64 = 50.0;
const LIGHT_HEIGHT: f64 = 100.0;

/// Extra statements after the model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneOptions {
    pub camera: Option<Camera>,
    pub sky: Option<Rgb>,
}

/// One constituent of a union.
#[derive(Debug, Clone, PartialEq)]
enum Item {
    Triangle {
        points: [Vec3; 3],
        colour: ColourCode,
    },
    Instance {
        name: String,
        matrix: Mat3,
        position: Vec3,
        colour: ColourCode,
    },
}

#[derive(Debug, Clone)]
struct Definition {
    name: String,
    items: Vec<Item>,
}

/// Writes POV-Ray scenes.
pub struct SceneWriter<'a, R: ?Sized> {
    resolver: &'a R,
    colours: &'a ColourTable,
    options: SceneOptions,
}

impl<'a, R: PartResolver + ?Sized> SceneWriter<'a, R> {
    pub fn new(resolver: &'a R, colours: &'a ColourTable, options: SceneOptions) -> Self {
        Self {
            resolver,
            colours,
            options,
        }
    }

    /// Builds the scene text for `model`.
    pub fn render(&self, model: &Part) -> Result<(String, Warnings), RenderError> {
        let mut builder = SceneBuilder::new(self.resolver);
        let top = builder.top_level(model)?;
        let mut lights = Vec::new();
        builder.collect_lights(model, &Current::root(), &mut lights)?;
        log::debug!(
            "scene: {} definitions, {} top-level items, {} lights",
            builder.definitions.len(),
            top.len(),
            lights.len()
        );

        let mut out = String::new();
        out.push_str("#include \"colors.inc\"\n\n");
        for definition in &builder.definitions {
            writeln!(out, "#declare {} = union {{", definition.name)?;
            for item in &definition.items {
                self.write_item(item, &mut out)?;
            }
            out.push_str("}\n\n");
        }

        out.push_str("union {\n");
        for item in &top {
            self.write_item(item, &mut out)?;
        }
        if lights.is_empty() {
            let bounds = BoundsCache::new().model_bounds(model, self.resolver)?;
            let (min, max) = bounds
                .map(|b| (b.min, b.max))
                .unwrap_or((Vec3::ZERO, Vec3::ZERO));
            let y = min.y - LIGHT_HEIGHT;
            for (x, z) in [
                (min.x - LIGHT_MARGIN, min.z - LIGHT_MARGIN),
                (max.x + LIGHT_MARGIN, min.z - LIGHT_MARGIN),
                (min.x - LIGHT_MARGIN, max.z + LIGHT_MARGIN),
                (max.x + LIGHT_MARGIN, max.z + LIGHT_MARGIN),
            ] {
                write_light(Vec3::new(x, y, z), Rgb::WHITE, &mut out)?;
            }
        } else {
            for (position, colour) in &lights {
                write_light(*position, self.colours.rgb(*colour), &mut out)?;
            }
        }
        writeln!(out, "  {GLOBAL_CORRECTION}")?;
        out.push_str("}\n");

        if let Some(camera) = &self.options.camera {
            let flip = |v: Vec3| Vec3::new(v.x, -v.y, v.z);
            writeln!(
                out,
                "\ncamera {{\n  location {}\n  look_at {}\n}}",
                vector(flip(camera.position())),
                vector(flip(camera.look_at()))
            )?;
        }
        if let Some(sky) = self.options.sky {
            let (r, g, b) = sky.to_unit();
            writeln!(
                out,
                "\nsky_sphere {{\n  pigment {{ rgb <{r}, {g}, {b}> }}\n}}"
            )?;
        }

        Ok((out, builder.warnings))
    }

    fn write_item(&self, item: &Item, out: &mut String) -> fmt::Result {
        match item {
            Item::Triangle { points, colour } => {
                write!(
                    out,
                    "  triangle {{ {}, {}, {}",
                    vector(points[0]),
                    vector(points[1]),
                    vector(points[2])
                )?;
                self.write_texture(*colour, out)?;
                out.write_str(" }\n")
            }
            Item::Instance {
                name,
                matrix,
                position,
                colour,
            } => {
                write!(out, "  object {{ {name} {}", pov_matrix(matrix, *position))?;
                self.write_texture(*colour, out)?;
                out.write_str(" }\n")
            }
        }
    }

    /// Nothing for the inherit colour; the enclosing object's texture applies.
    fn write_texture(&self, colour: ColourCode, out: &mut String) -> fmt::Result {
        if colour.is_inherit() {
            return Ok(());
        }
        let (r, g, b) = self.colours.rgb(colour).to_unit();
        let alpha = self.colours.alpha(colour);
        out.write_str(" texture { pigment { color ")?;
        if alpha < 255 {
            let transmit = 1.0 - alpha as f64 / 255.0;
            write!(out, "rgbt <{r}, {g}, {b}, {transmit}>")?;
        } else {
            write!(out, "rgb <{r}, {g}, {b}>")?;
        }
        out.write_str(" }")?;
        if let Some(finish) = finish(self.colours.attributes(colour)) {
            write!(out, " finish {{ {finish} }}")?;
        }
        out.write_str(" }")
    }
}

/// POV-Ray finish for the first attribute a colour carries.
fn finish(attributes: ColourAttributes) -> Option<&'static str> {
    [
        (
            ColourAttributes::CHROME,
            "metallic 1.0 specular 0.8 brilliance 3 diffuse 0.6",
        ),
        (ColourAttributes::PEARLESCENT, "diffuse 0.7 specular 0.8"),
        (ColourAttributes::RUBBER, "diffuse 1.0"),
        (ColourAttributes::MATTE_METALLIC, "metallic 0.5 roughness 0.2"),
        (
            ColourAttributes::METAL,
            "metallic 0.8 specular 0.8 reflection 0.5",
        ),
    ]
    .into_iter()
    .find(|(flag, _)| attributes.contains(*flag))
    .map(|(_, finish)| finish)
}

/// `-0` prints as `0`.
fn num(v: f64) -> f64 {
    v + 0.0
}

fn vector(v: Vec3) -> String {
    format!("<{}, {}, {}>", num(v.x), num(v.y), num(v.z))
}

/// POV-Ray multiplies row vectors, so the column-vector matrix is transposed.
fn pov_matrix(matrix: &Mat3, position: Vec3) -> String {
    let values: Vec<String> = matrix
        .transpose()
        .flatten()
        .iter()
        .chain([position.x, position.y, position.z].iter())
        .map(|v| num(*v).to_string())
        .collect();
    format!("matrix <{}>", values.join(", "))
}

fn write_light(position: Vec3, rgb: Rgb, out: &mut String) -> fmt::Result {
    let (r, g, b) = rgb.to_unit();
    writeln!(
        out,
        "  light_source {{ {}, color rgb <{r}, {g}, {b}> }}",
        vector(position)
    )
}

fn sanitize(code: &str) -> String {
    code.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn is_flat(points: &[Vec3; 3]) -> bool {
    (points[2] - points[0])
        .cross(points[1] - points[0])
        .magnitude()
        == 0.0
}

/// Collects definitions in post-order along with the warnings they raise.
struct SceneBuilder<'a, R: ?Sized> {
    resolver: &'a R,
    /// Code to declared name; `None` for codes that cannot be instanced.
    names: HashMap<String, Option<String>>,
    used_names: HashSet<String>,
    definitions: Vec<Definition>,
    visiting: Vec<String>,
    warnings: Warnings,
}

impl<'a, R: PartResolver + ?Sized> SceneBuilder<'a, R> {
    fn new(resolver: &'a R) -> Self {
        Self {
            resolver,
            names: HashMap::new(),
            used_names: HashSet::new(),
            definitions: Vec::new(),
            visiting: Vec::new(),
            warnings: Warnings::new(),
        }
    }

    /// Instances and loose triangles of the model itself.
    fn top_level(&mut self, model: &Part) -> Result<Vec<Item>, PartError> {
        let root = Current::root();
        let mut items = Vec::new();
        for record in model.records() {
            match record {
                Primitive::Subpart(piece) if piece.is_light() => {}
                Primitive::Subpart(piece) => {
                    if let Some(item) = self.instance(piece, piece.colour.resolve(root.colour))? {
                        items.push(item);
                    }
                }
                _ => self.push_faces(record, root.colour, &mut items),
            }
        }
        Ok(items)
    }

    /// Declares `code` (and everything below it) unless already known.
    fn define(&mut self, code: &str) -> Result<Option<String>, PartError> {
        if let Some(name) = self.names.get(code) {
            return Ok(name.clone());
        }
        if self.visiting.iter().any(|c| c == code) {
            self.warnings.push(Warning::CyclicReference {
                code: code.to_string(),
            });
            return Ok(None);
        }
        let Some(part) = self.resolver.resolve(code)? else {
            self.warnings.push(Warning::UnresolvedReference {
                code: code.to_string(),
            });
            self.names.insert(code.to_string(), None);
            return Ok(None);
        };

        self.visiting.push(code.to_string());
        let items = self.items(&part);
        self.visiting.pop();
        let items = items?;

        if items.is_empty() {
            self.warnings.push(Warning::EmptyObject {
                code: code.to_string(),
            });
            self.names.insert(code.to_string(), None);
            return Ok(None);
        }

        let name = self.unique_name(code);
        self.names.insert(code.to_string(), Some(name.clone()));
        self.definitions.push(Definition {
            name: name.clone(),
            items,
        });
        Ok(Some(name))
    }

    fn items(&mut self, part: &Part) -> Result<Vec<Item>, PartError> {
        let mut items = Vec::new();
        for record in part.records() {
            match record {
                Primitive::Subpart(piece) if piece.is_light() => {}
                Primitive::Subpart(piece) => {
                    if let Some(item) = self.instance(piece, piece.colour)? {
                        items.push(item);
                    }
                }
                _ => self.push_faces(record, ColourCode::INHERIT, &mut items),
            }
        }
        Ok(items)
    }

    /// Validated instance of `piece`, or `None` if the reference is dropped.
    fn instance(&mut self, piece: &Piece, colour: ColourCode) -> Result<Option<Item>, PartError> {
        let code = piece.code();
        let Some(name) = self.define(code)? else {
            self.warnings.push(Warning::DroppedReference {
                code: code.to_string(),
            });
            return Ok(None);
        };

        let mut matrix = piece.matrix;
        if matrix.has_zero_diagonal() {
            matrix = matrix.fix_diagonal();
            self.warnings.push(Warning::FixedDiagonal {
                code: code.to_string(),
            });
        }
        if matrix.determinant() == 0.0 {
            self.warnings.push(Warning::SingularTransform {
                code: code.to_string(),
            });
            return Ok(None);
        }

        Ok(Some(Item::Instance {
            name,
            matrix,
            position: piece.position,
            colour,
        }))
    }

    /// Triangles of a face record; quads split into `(p1, p2, p3)` and `(p3, p4, p1)`.
    fn push_faces(&self, record: &Primitive, active: ColourCode, items: &mut Vec<Item>) {
        let (colour, triangles) = match record {
            Primitive::Triangle { colour, points } => (*colour, vec![*points]),
            Primitive::Quadrilateral { colour, points: [p1, p2, p3, p4] } => {
                (*colour, vec![[*p1, *p2, *p3], [*p3, *p4, *p1]])
            }
            _ => return,
        };
        let colour = colour.resolve(active);
        items.extend(
            triangles
                .into_iter()
                .filter(|t| !is_flat(t))
                .map(|points| Item::Triangle { points, colour }),
        );
    }

    fn unique_name(&mut self, code: &str) -> String {
        let base = format!("{NAME_PREFIX}{}", sanitize(code));
        let mut name = base.clone();
        let mut n = 2;
        while !self.used_names.insert(name.clone()) {
            name = format!("{base}_{n}");
            n += 1;
        }
        name
    }

    /// LIGHT pieces anywhere in the model, at world positions.
    fn collect_lights(
        &mut self,
        part: &Part,
        current: &Current,
        lights: &mut Vec<(Vec3, ColourCode)>,
    ) -> Result<(), PartError> {
        for record in part.records() {
            let Primitive::Subpart(piece) = record else {
                continue;
            };
            if piece.is_light() {
                lights.push((current.place(piece.position), piece.colour.resolve(current.colour)));
                continue;
            }
            let code = piece.code();
            if self.visiting.iter().any(|c| c == code) {
                continue;
            }
            if let Some(child) = self.resolver.resolve(code)? {
                self.visiting.push(code.to_string());
                let result = self.collect_lights(&child, &current.enter(piece), lights);
                self.visiting.pop();
                result?;
            }
        }
        Ok(())
    }
}
