//! Pieces and groups: the caller-built scene model.

use std::fmt;

use crate::colour::ColourCode;
use crate::math::{Mat3, Vec3};
use crate::part::{Part, Primitive};

/// Part code reserved for light sources.
pub const LIGHT: &str = "LIGHT";

/// Upper-cases a part code and strips a trailing `.DAT`.
pub fn normalize_code(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    match upper.strip_suffix(".DAT") {
        Some(stem) => stem.to_string(),
        None => upper,
    }
}

/// One placed instance of a part.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub colour: ColourCode,
    pub position: Vec3,
    pub matrix: Mat3,
    code: String,
}

impl Piece {
    pub fn new(colour: ColourCode, position: Vec3, matrix: Mat3, code: &str) -> Self {
        Self {
            colour,
            position,
            matrix,
            code: normalize_code(code),
        }
    }

    /// A light source at `position`.
    pub fn light(colour: ColourCode, position: Vec3) -> Self {
        Self::new(colour, position, Mat3::identity(), LIGHT)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_light(&self) -> bool {
        self.code == LIGHT
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1 {} {} {} {}",
            self.colour, self.position.x, self.position.y, self.position.z
        )?;
        for value in self.matrix.flatten() {
            write!(f, " {value}")?;
        }
        write!(f, " {}.DAT", self.code)
    }
}

/// An ordered set of pieces sharing one transform.
///
/// Pieces are held by value: adding a piece moves it in, removing it hands it
/// back, so a piece is never in two groups at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub position: Vec3,
    pub matrix: Mat3,
    pieces: Vec<Piece>,
}

impl Group {
    pub fn new(position: Vec3, matrix: Mat3) -> Self {
        Self {
            position,
            matrix,
            pieces: Vec::new(),
        }
    }

    /// Takes ownership of `piece` and returns its index in this group.
    pub fn add_piece(&mut self, piece: Piece) -> usize {
        self.pieces.push(piece);
        self.pieces.len() - 1
    }

    /// Removes and returns the piece at `index`, if any.
    pub fn remove_piece(&mut self, index: usize) -> Option<Piece> {
        if index < self.pieces.len() {
            Some(self.pieces.remove(index))
        } else {
            None
        }
    }

    /// Moves the piece at `index` to the end of `other`.
    ///
    /// Returns the piece's new index in `other`, or `None` if `index` is out
    /// of range (in which case neither group changes).
    pub fn move_piece_to(&mut self, index: usize, other: &mut Group) -> Option<usize> {
        let piece = self.remove_piece(index)?;
        Some(other.add_piece(piece))
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Member pieces with the group transform folded in.
    pub fn world_pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.pieces.iter().map(move |piece| Piece {
            colour: piece.colour,
            position: self.position + self.matrix * piece.position,
            matrix: self.matrix * piece.matrix,
            code: piece.code.clone(),
        })
    }

    /// A model whose records are this group's pieces in world space.
    pub fn to_part(&self) -> Part {
        Part::new(self.world_pieces().map(Primitive::Subpart).collect())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for piece in self.world_pieces() {
            writeln!(f, "{piece}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{AngleUnits, Axis};
    use approx::assert_relative_eq;

    fn brick(code: &str) -> Piece {
        Piece::new(ColourCode(4), Vec3::new(10.0, 0.0, 0.0), Mat3::identity(), code)
    }

    #[test]
    fn codes_are_normalized() {
        assert_eq!(brick("3001.dat").code(), "3001");
        assert_eq!(brick("s/3001s01.DAT").code(), "S/3001S01");
        assert_eq!(brick("light").code(), LIGHT);
        assert!(brick("Light.dat").is_light());
    }

    #[test]
    fn displays_as_reference_line() {
        let piece = Piece::new(
            ColourCode(1),
            Vec3::new(0.0, -24.0, 1.5),
            Mat3::identity(),
            "3001",
        );
        assert_eq!(piece.to_string(), "1 1 0 -24 1.5 1 0 0 0 1 0 0 0 1 3001.DAT");
    }

    #[test]
    fn piece_has_one_owner() {
        let mut a = Group::default();
        let mut b = Group::default();
        a.add_piece(brick("3001"));
        a.add_piece(brick("3002"));

        assert_eq!(a.move_piece_to(0, &mut b), Some(0));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(b.pieces()[0].code(), "3001");
        assert_eq!(a.pieces()[0].code(), "3002");

        assert_eq!(a.move_piece_to(5, &mut b), None);
        assert_eq!(b.len(), 1);

        let taken = b.remove_piece(0).unwrap();
        assert!(b.is_empty());
        assert_eq!(taken.code(), "3001");
    }

    #[test]
    fn world_pieces_fold_in_group_transform() {
        let turn = Mat3::rotation(90.0, Axis::Y, AngleUnits::Degrees);
        let mut group = Group::new(Vec3::new(0.0, 0.0, 100.0), turn);
        group.add_piece(brick("3001"));

        let world: Vec<Piece> = group.world_pieces().collect();
        let expected = Vec3::new(0.0, 0.0, 100.0) + turn * Vec3::new(10.0, 0.0, 0.0);
        assert_relative_eq!(world[0].position.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(world[0].position.z, expected.z, epsilon = 1e-9);
        assert_eq!(world[0].matrix, turn * Mat3::identity());

        let part = group.to_part();
        assert_eq!(part.records().len(), 1);
        assert!(matches!(&part.records()[0], Primitive::Subpart(p) if p.code() == "3001"));
    }
}
