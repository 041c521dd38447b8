//! Reading and writing the on-disk level format.
//!
//! A level file holds either a single level object or a one-element
//! array of one; `levels.json` holds the whole sequence. Unknown
//! fields are ignored, missing optional fields take documented
//! defaults, and the shape tag is re-derived from the spans on the way
//! out, so a parse/emit round trip is identity up to field ordering.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{
    board::Level,
    tile::{Direction, Tile, TileShape, UnitType},
};

#[derive(Debug, Serialize, Deserialize)]
struct TileRecord {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    shape: Option<TileShape>,
    #[serde(rename = "unitType", default = "default_unit")]
    unit_type: UnitType,
    #[serde(rename = "gridCol")]
    grid_col: i32,
    #[serde(rename = "gridRow")]
    grid_row: i32,
    #[serde(rename = "gridColSpan", default = "one")]
    grid_col_span: i32,
    #[serde(rename = "gridRowSpan", default = "one")]
    grid_row_span: i32,
    #[serde(default = "default_direction")]
    direction: Direction,
}

#[derive(Debug, Serialize, Deserialize)]
struct LevelRecord {
    #[serde(default)]
    id: i32,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    unlocked: bool,
    #[serde(rename = "timeLimit", default)]
    time_limit: i32,
    #[serde(default)]
    stars: i32,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    tiles: Vec<TileRecord>,
}

/// Both accepted spellings of a level file.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelFile {
    Many(Vec<LevelRecord>),
    One(LevelRecord),
}

fn one() -> i32 {
    1
}

fn default_unit() -> UnitType {
    UnitType::Wolf
}

fn default_direction() -> Direction {
    Direction::UpRight
}

fn default_kind() -> String {
    "normal".to_owned()
}

impl From<&Tile> for TileRecord {
    fn from(tile: &Tile) -> Self {
        TileRecord {
            id: tile.id.clone(),
            shape: Some(tile.shape()),
            unit_type: tile.unit,
            grid_col: tile.col,
            grid_row: tile.row,
            grid_col_span: tile.col_span,
            grid_row_span: tile.row_span,
            direction: tile.direction,
        }
    }
}

impl From<TileRecord> for Tile {
    fn from(record: TileRecord) -> Self {
        // The shape tag is derivable from the spans; whatever the file
        // claims is dropped here.
        Tile {
            id: record.id,
            col: record.grid_col,
            row: record.grid_row,
            col_span: record.grid_col_span,
            row_span: record.grid_row_span,
            unit: record.unit_type,
            direction: record.direction,
        }
    }
}

impl From<&Level> for LevelRecord {
    fn from(level: &Level) -> Self {
        LevelRecord {
            id: level.id,
            name: level.name.clone(),
            kind: level.kind.clone(),
            unlocked: level.unlocked,
            time_limit: level.time_limit,
            stars: level.stars,
            score: level.score,
            tiles: level.tiles.iter().map(TileRecord::from).collect(),
        }
    }
}

impl From<LevelRecord> for Level {
    fn from(record: LevelRecord) -> Self {
        Level {
            id: record.id,
            name: record.name,
            kind: record.kind,
            time_limit: record.time_limit,
            unlocked: record.unlocked,
            stars: record.stars,
            score: record.score,
            tiles: record.tiles.into_iter().map(Tile::from).collect(),
        }
    }
}

/// Parses the textual form of a single-level file.
pub fn parse_level(text: &str) -> Result<Level> {
    let parsed: LevelFile = serde_json::from_str(text).context("malformed level file")?;
    let record = match parsed {
        LevelFile::One(record) => record,
        LevelFile::Many(records) => match records.into_iter().next() {
            Some(record) => record,
            None => bail!("level file holds an empty array"),
        },
    };
    Ok(record.into())
}

/// Parses a combined file into every level it holds.
pub fn parse_levels(text: &str) -> Result<Vec<Level>> {
    let parsed: LevelFile = serde_json::from_str(text).context("malformed levels file")?;
    Ok(match parsed {
        LevelFile::One(record) => vec![record.into()],
        LevelFile::Many(records) => records.into_iter().map(Level::from).collect(),
    })
}

/// Reads one level from `path` (single object or one-element array).
pub fn read_level(path: &Path) -> Result<Level> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_level(&text).with_context(|| format!("in {}", path.display()))
}

/// One level in the single-element-array spelling, pretty-printed.
pub fn level_json(level: &Level) -> Result<String> {
    serde_json::to_string_pretty(&[LevelRecord::from(level)]).context("failed to serialise level")
}

/// The combined sequence form, pretty-printed.
pub fn levels_json(levels: &[Level]) -> Result<String> {
    let records: Vec<LevelRecord> = levels.iter().map(LevelRecord::from).collect();
    serde_json::to_string_pretty(&records).context("failed to serialise levels")
}

/// Writes the combined file plus a `level_<id>.json` per level.
pub fn save_levels(dir: &Path, combined_name: &str, levels: &[Level]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let combined = dir.join(combined_name);
    fs::write(&combined, levels_json(levels)?)
        .with_context(|| format!("failed to write {}", combined.display()))?;

    for level in levels {
        let path = dir.join(format!("level_{}.json", level.id));
        fs::write(&path, level_json(level)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// `level_*.json` files under `dir`, sorted by the numeric id embedded
/// in the file name.
pub fn scan_levels_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut files: Vec<(i32, PathBuf)> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "json")
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("level_") && name != "levels.json")
        })
        .map(|path| (file_number(&path), path))
        .collect();

    files.sort_by_key(|(number, _)| *number);
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn file_number(path: &Path) -> i32 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('_').next())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}
