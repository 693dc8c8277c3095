//! Colours, colour codes and the colour table.
//!
//! Every geometric record refers to a colour by [`ColourCode`]. Code 16 is the
//! inherit sentinel: it means "whatever colour the nearest enclosing piece
//! chose" and is only resolved while walking the model. Codes carrying the
//! `0x2000000` prefix encode an RGB value directly.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::part::{Part, Primitive};

/// An 8-bit-per-channel RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to the 0.0..=1.0 range.
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColour(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        rgb.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

bitflags! {
    /// Physical finish tags. Only used as shading hints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColourAttributes: u8 {
        const CHROME = 1 << 0;
        const PEARLESCENT = 1 << 1;
        const RUBBER = 1 << 2;
        const MATTE_METALLIC = 1 << 3;
        const METAL = 1 << 4;
    }
}

impl ColourAttributes {
    /// Parses a single `!COLOUR` finish keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "CHROME" => Some(Self::CHROME),
            "PEARLESCENT" => Some(Self::PEARLESCENT),
            "RUBBER" => Some(Self::RUBBER),
            "MATTE_METALLIC" => Some(Self::MATTE_METALLIC),
            "METAL" => Some(Self::METAL),
            _ => None,
        }
    }
}

/// Reference to a colour as stored on records and pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColourCode(pub u32);

impl ColourCode {
    /// "Use the active colour of the nearest enclosing piece."
    pub const INHERIT: ColourCode = ColourCode(16);
    /// Colour active at the root of a model.
    pub const WHITE: ColourCode = ColourCode(15);

    const DIRECT_PREFIX: u32 = 0x0200_0000;

    /// A code that carries its RGB value inline.
    pub const fn direct(rgb: Rgb) -> ColourCode {
        ColourCode(
            Self::DIRECT_PREFIX | ((rgb.r as u32) << 16) | ((rgb.g as u32) << 8) | rgb.b as u32,
        )
    }

    pub fn is_inherit(self) -> bool {
        self == Self::INHERIT
    }

    pub fn direct_rgb(self) -> Option<Rgb> {
        if self.0 & 0xFF00_0000 == Self::DIRECT_PREFIX {
            Some(Rgb::new(
                (self.0 >> 16) as u8,
                (self.0 >> 8) as u8,
                self.0 as u8,
            ))
        } else {
            None
        }
    }

    /// Substitutes `active` for the inherit sentinel.
    pub fn resolve(self, active: ColourCode) -> ColourCode {
        if self.is_inherit() {
            active
        } else {
            self
        }
    }
}

impl fmt::Display for ColourCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direct_rgb().is_some() {
            write!(f, "0x{:07X}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A fully described colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Colour {
    pub code: ColourCode,
    pub name: String,
    pub rgb: Rgb,
    pub alpha: u8,
    pub attributes: ColourAttributes,
}

impl Colour {
    pub fn new(code: u32, name: impl Into<String>, rgb: Rgb) -> Self {
        Self {
            code: ColourCode(code),
            name: name.into(),
            rgb,
            alpha: 255,
            attributes: ColourAttributes::empty(),
        }
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_attributes(mut self, attributes: ColourAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Opacity in the 0.0..=1.0 range.
    pub fn opacity(&self) -> f32 {
        self.alpha as f32 / 255.0
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha == 255
    }

    /// Parses the body of a `!COLOUR` meta command, e.g.
    /// `Trans_Clear CODE 47 VALUE #FCFCFC EDGE #C3C3C3 ALPHA 128`.
    pub fn from_meta(text: &str) -> Option<Colour> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let name = *words.first()?;
        let value_after = |key: &str| {
            words
                .iter()
                .position(|w| *w == key)
                .and_then(|i| words.get(i + 1))
                .copied()
        };

        let code = value_after("CODE")?.parse::<u32>().ok()?;
        let rgb = value_after("VALUE")?.parse::<Rgb>().ok()?;
        let alpha = match value_after("ALPHA") {
            Some(alpha) => alpha.parse::<u8>().ok()?,
            None => 255,
        };
        let attributes = words
            .iter()
            .filter_map(|w| ColourAttributes::from_keyword(w))
            .fold(ColourAttributes::empty(), |acc, a| acc | a);

        Some(
            Colour::new(code, name, rgb)
                .with_alpha(alpha)
                .with_attributes(attributes),
        )
    }
}

/// Lookup table from colour code to colour.
#[derive(Debug, Clone)]
pub struct ColourTable {
    colours: HashMap<ColourCode, Colour>,
}

impl Default for ColourTable {
    /// The sixteen classic colours.
    fn default() -> Self {
        let classic = [
            (0, "Black", Rgb::new(0x1B, 0x2A, 0x34)),
            (1, "Blue", Rgb::new(0x1E, 0x5A, 0xA8)),
            (2, "Green", Rgb::new(0x00, 0x85, 0x2B)),
            (3, "Dark_Turquoise", Rgb::new(0x06, 0x9D, 0x9F)),
            (4, "Red", Rgb::new(0xB4, 0x00, 0x00)),
            (5, "Dark_Pink", Rgb::new(0xD3, 0x35, 0x9D)),
            (6, "Brown", Rgb::new(0x54, 0x33, 0x24)),
            (7, "Light_Grey", Rgb::new(0x8A, 0x92, 0x8D)),
            (8, "Dark_Grey", Rgb::new(0x54, 0x59, 0x55)),
            (9, "Light_Blue", Rgb::new(0x97, 0xCB, 0xD9)),
            (10, "Bright_Green", Rgb::new(0x58, 0xAB, 0x41)),
            (11, "Light_Turquoise", Rgb::new(0x00, 0xAA, 0xA4)),
            (12, "Salmon", Rgb::new(0xF0, 0x6D, 0x61)),
            (13, "Pink", Rgb::new(0xF6, 0xA9, 0xBB)),
            (14, "Yellow", Rgb::new(0xFA, 0xC8, 0x0A)),
            (15, "White", Rgb::new(0xF4, 0xF4, 0xF4)),
        ];
        let mut table = ColourTable::empty();
        for (code, name, rgb) in classic {
            table.insert(Colour::new(code, name, rgb));
        }
        table
    }
}

impl ColourTable {
    pub fn empty() -> Self {
        Self {
            colours: HashMap::new(),
        }
    }

    /// Builds a table from the `!COLOUR` meta commands of a colour-definition
    /// part. Malformed entries are skipped.
    pub fn from_part(part: &Part) -> Self {
        let mut table = ColourTable::empty();
        for record in part.records() {
            if let Primitive::Meta { kind, text } = record {
                if kind == "COLOUR" {
                    match Colour::from_meta(text) {
                        Some(colour) => table.insert(colour),
                        None => log::debug!("skipping malformed colour definition: {text}"),
                    }
                }
            }
        }
        table
    }

    pub fn insert(&mut self, colour: Colour) {
        self.colours.insert(colour.code, colour);
    }

    pub fn get(&self, code: ColourCode) -> Option<&Colour> {
        self.colours.get(&code)
    }

    pub fn by_name(&self, name: &str) -> Option<&Colour> {
        self.colours.values().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    /// Fill colour of a code; direct colours decode inline, unknown codes are white.
    pub fn rgb(&self, code: ColourCode) -> Rgb {
        if let Some(rgb) = code.direct_rgb() {
            return rgb;
        }
        self.get(code).map(|c| c.rgb).unwrap_or(Rgb::WHITE)
    }

    /// Alpha of a code; anything not in the table is opaque.
    pub fn alpha(&self, code: ColourCode) -> u8 {
        self.get(code).map(|c| c.alpha).unwrap_or(255)
    }

    pub fn attributes(&self, code: ColourCode) -> ColourAttributes {
        self.get(code)
            .map(|c| c.attributes)
            .unwrap_or_else(ColourAttributes::empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("#FF8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert!("ff8000".parse::<Rgb>().is_err());
        assert!("#ff80".parse::<Rgb>().is_err());
        assert!("#gg8000".parse::<Rgb>().is_err());
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn inherit_sentinel_resolves_to_active() {
        let red = ColourCode(4);
        assert_eq!(ColourCode::INHERIT.resolve(red), red);
        assert_eq!(ColourCode(1).resolve(red), ColourCode(1));
    }

    #[test]
    fn direct_colours_round_trip() {
        let code = ColourCode::direct(Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(code.0, 0x0212_3456);
        assert_eq!(code.direct_rgb(), Some(Rgb::new(0x12, 0x34, 0x56)));
        assert_eq!(ColourCode(4).direct_rgb(), None);
        assert_eq!(ColourTable::empty().rgb(code), Rgb::new(0x12, 0x34, 0x56));
    }

    #[test]
    fn parses_colour_meta_with_alpha_and_finish() {
        let colour = Colour::from_meta(
            "Trans_Clear CODE 47 VALUE #FCFCFC EDGE #C3C3C3 ALPHA 128 PEARLESCENT",
        )
        .unwrap();
        assert_eq!(colour.code, ColourCode(47));
        assert_eq!(colour.name, "Trans_Clear");
        assert_eq!(colour.rgb, Rgb::new(0xFC, 0xFC, 0xFC));
        assert_eq!(colour.alpha, 128);
        assert!(!colour.is_opaque());
        assert_eq!(colour.attributes, ColourAttributes::PEARLESCENT);
    }

    #[test]
    fn rejects_colour_meta_without_code() {
        assert!(Colour::from_meta("Black VALUE #000000").is_none());
        assert!(Colour::from_meta("Black CODE x VALUE #000000").is_none());
    }

    #[test]
    fn table_from_part_reads_colour_meta_commands() {
        let part = Part::new(vec![
            Primitive::Comment("LDraw colour definitions".into()),
            Primitive::Meta {
                kind: "COLOUR".into(),
                text: "Black CODE 0 VALUE #1B2A34 EDGE #2B4354".into(),
            },
            Primitive::Meta {
                kind: "COLOUR".into(),
                text: "Chrome_Gold CODE 334 VALUE #BBA53D EDGE #BBB23D CHROME".into(),
            },
            Primitive::Meta {
                kind: "COLOUR".into(),
                text: "Broken CODE".into(),
            },
        ]);
        let table = ColourTable::from_part(&part);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rgb(ColourCode(0)), Rgb::new(0x1B, 0x2A, 0x34));
        assert_eq!(table.attributes(ColourCode(334)), ColourAttributes::CHROME);
        assert_eq!(table.by_name("Black").map(|c| c.code), Some(ColourCode(0)));
    }

    #[test]
    fn unknown_codes_fall_back_to_opaque_white() {
        let table = ColourTable::default();
        assert_eq!(table.rgb(ColourCode(9999)), Rgb::WHITE);
        assert_eq!(table.alpha(ColourCode(9999)), 255);
        assert_eq!(table.rgb(ColourCode(4)), Rgb::new(0xB4, 0x00, 0x00));
    }
}
