//! Shape atlas: named shape masks with a colour per occupied cell.
//!
//! Built-in shapes cover pieces, attractors and the emitter. A shapes file can
//! add or override entries:
//!
//! ```text
//! # comment
//! [square]
//! rr
//! rr
//! ```
//!
//! Each row character is a colour letter (`g y r b m c`) or `.`/space for an
//! empty cell.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Shape mask; `None` cells are empty, `Some(i)` carries a colour index (0..6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    width: usize,
    height: usize,
    cells: Vec<Option<u8>>,
}

impl Shape {
    /// Build from rows of colour-or-empty cells. Rows shorter than the widest
    /// one are padded with empty cells.
    pub fn from_rows(rows: &[Vec<Option<u8>>]) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let height = rows.len();
        let mut cells = vec![None; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.iter().enumerate() {
                cells[y * width + x] = *c;
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Solid `width × height` block in one colour.
    #[cfg(test)]
    pub fn solid(width: usize, height: usize, color: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![Some(color); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[cfg(test)]
    pub fn get(&self, dx: usize, dy: usize) -> Option<u8> {
        if dx >= self.width || dy >= self.height {
            return None;
        }
        self.cells[dy * self.width + dx]
    }

    /// Occupied cells as `(dx, dy, colour)`.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.map(|color| (i % self.width, i / self.width, color))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: shape row outside of a [name] section")]
    RowOutsideSection { line: usize },
    #[error("line {line}: unknown colour letter {letter:?}")]
    UnknownColour { line: usize, letter: char },
    #[error("shape {0:?} has no occupied cells")]
    EmptyShape(String),
    #[error("unknown shape {0:?}")]
    UnknownShape(String),
}

/// Shape names used for pieces unless a shapes file says otherwise.
pub const DEFAULT_PIECES: [&str; 5] = ["square", "bar", "tee", "ell", "ess"];
pub const ATTRACTOR: &str = "attractor";
pub const EMITTER: &str = "emitter";

/// Named shapes.
#[derive(Debug, Clone)]
pub struct Atlas {
    shapes: BTreeMap<String, Shape>,
}

impl Atlas {
    pub fn builtin() -> Self {
        let mut atlas = Self {
            shapes: BTreeMap::new(),
        };
        // The built-in text never fails to parse.
        let _ = atlas.merge_str(BUILTIN);
        atlas
    }

    /// Built-in shapes overlaid with the shapes file at `path`, if any.
    pub fn load(path: Option<&Path>) -> Result<Self, AtlasError> {
        let mut atlas = Self::builtin();
        if let Some(path) = path {
            let s = std::fs::read_to_string(path)?;
            atlas.merge_str(&s)?;
        }
        Ok(atlas)
    }

    pub fn get(&self, name: &str) -> Result<&Shape, AtlasError> {
        self.shapes
            .get(name)
            .ok_or_else(|| AtlasError::UnknownShape(name.to_string()))
    }

    /// Parse shapes text and insert/replace every section found.
    pub fn merge_str(&mut self, s: &str) -> Result<(), AtlasError> {
        for (name, shape) in parse_shapes(s)? {
            self.shapes.insert(name, shape);
        }
        Ok(())
    }
}

const BUILTIN: &str = "\
[square]
rr
rr
[bar]
bbbb
[tee]
mmm
.m.
[ell]
y.
y.
yy
[ess]
.gg
gg.
[attractor]
ccc
ccc
ccc
[emitter]
y
";

fn colour_index(letter: char) -> Option<u8> {
    match letter {
        'g' => Some(0),
        'y' => Some(1),
        'r' => Some(2),
        'b' => Some(3),
        'm' => Some(4),
        'c' => Some(5),
        _ => None,
    }
}

type Section = (String, Vec<Vec<Option<u8>>>);

fn finish_section((name, rows): Section, out: &mut Vec<(String, Shape)>) -> Result<(), AtlasError> {
    let shape = Shape::from_rows(&rows);
    if shape.is_empty() {
        return Err(AtlasError::EmptyShape(name));
    }
    out.push((name, shape));
    Ok(())
}

fn parse_shapes(s: &str) -> Result<Vec<(String, Shape)>, AtlasError> {
    let mut out = Vec::new();
    let mut current: Option<Section> = None;
    for (i, raw) in s.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim_end();
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        if let Some(rest) = line.trim().strip_prefix('[') {
            if let Some(name) = rest.strip_suffix(']') {
                if let Some(entry) = current.take() {
                    finish_section(entry, &mut out)?;
                }
                current = Some((name.trim().to_string(), Vec::new()));
                continue;
            }
        }
        let Some((_, rows)) = current.as_mut() else {
            return Err(AtlasError::RowOutsideSection { line: line_no });
        };
        let mut row = Vec::with_capacity(line.len());
        for letter in line.chars() {
            if letter == '.' || letter == ' ' {
                row.push(None);
            } else {
                let c = colour_index(letter).ok_or(AtlasError::UnknownColour {
                    line: line_no,
                    letter,
                })?;
                row.push(Some(c));
            }
        }
        rows.push(row);
    }
    if let Some(entry) = current.take() {
        finish_section(entry, &mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_defaults() {
        let atlas = Atlas::builtin();
        for name in DEFAULT_PIECES.iter().chain([ATTRACTOR, EMITTER].iter()) {
            assert!(atlas.get(name).is_ok(), "missing {name}");
        }
        let tee = atlas.get("tee").unwrap();
        assert_eq!((tee.width(), tee.height()), (3, 2));
        assert_eq!(tee.get(0, 1), None);
        assert_eq!(tee.get(1, 1), Some(4));
        assert_eq!(tee.occupied().count(), 4);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let shape = Shape::from_rows(&[vec![Some(1)], vec![Some(1), Some(2)]]);
        assert_eq!(shape.width(), 2);
        assert_eq!(shape.get(1, 0), None);
        assert_eq!(shape.get(1, 1), Some(2));
    }

    #[test]
    fn test_merge_overrides_and_adds() {
        let mut atlas = Atlas::builtin();
        atlas.merge_str("# custom\n[square]\ngg\ngg\n\n[dot]\nc\n").unwrap();
        assert_eq!(atlas.get("square").unwrap(), &Shape::solid(2, 2, 0));
        assert_eq!(atlas.get("dot").unwrap(), &Shape::solid(1, 1, 5));
    }

    #[test]
    fn test_parse_errors() {
        let mut atlas = Atlas::builtin();
        assert!(matches!(
            atlas.merge_str("rr\n"),
            Err(AtlasError::RowOutsideSection { line: 1 })
        ));
        assert!(matches!(
            atlas.merge_str("[x]\nrz\n"),
            Err(AtlasError::UnknownColour { line: 2, letter: 'z' })
        ));
        assert!(matches!(
            atlas.merge_str("[hollow]\n..\n"),
            Err(AtlasError::EmptyShape(_))
        ));
        assert!(matches!(
            atlas.get("nope"),
            Err(AtlasError::UnknownShape(_))
        ));
    }
}
