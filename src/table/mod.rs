// src/table/mod.rs
use chrono::NaiveDate;
use std::borrow::Cow;

pub mod csv_io;

pub use csv_io::{read_table, write_table};

/// Text cell; `None` is a missing value.
pub type Text = Option<String>;

/// Tokens that read back as a missing value, whatever column they appear in.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na(raw: &str) -> bool {
    raw.is_empty() || NA_TOKENS.contains(&raw)
}

/// Known columns of a chart metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaColumn {
    Date,
    Position,
    Song,
    Artist,
    TrackId,
    Popularity,
    DurationMs,
    IsExplicit,
    AlbumId,
    ReleaseDate,
    Genres,
    MainGenre,
}

impl MetaColumn {
    /// Columns retained by projection, in output order.
    pub const ALLOW_LIST: [MetaColumn; 11] = [
        MetaColumn::Date,
        MetaColumn::Position,
        MetaColumn::Song,
        MetaColumn::Artist,
        MetaColumn::TrackId,
        MetaColumn::Popularity,
        MetaColumn::DurationMs,
        MetaColumn::IsExplicit,
        MetaColumn::AlbumId,
        MetaColumn::ReleaseDate,
        MetaColumn::Genres,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetaColumn::Date => "date",
            MetaColumn::Position => "position",
            MetaColumn::Song => "song",
            MetaColumn::Artist => "artist",
            MetaColumn::TrackId => "track_id",
            MetaColumn::Popularity => "popularity",
            MetaColumn::DurationMs => "duration_ms",
            MetaColumn::IsExplicit => "is_explicit",
            MetaColumn::AlbumId => "album_id",
            MetaColumn::ReleaseDate => "release_date",
            MetaColumn::Genres => "genres",
            MetaColumn::MainGenre => "main_genre",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALLOW_LIST
            .iter()
            .chain(std::iter::once(&MetaColumn::MainGenre))
            .copied()
            .find(|c| c.name() == name)
    }
}

/// A date-like value as it moves through the cleaning stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCell {
    Missing,
    /// Unparsed text, as read from disk or derived by null resolution.
    Text(String),
    Date(NaiveDate),
}

impl DateCell {
    pub fn from_raw(raw: Text) -> Self {
        match raw {
            Some(s) => DateCell::Text(s),
            None => DateCell::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DateCell::Missing)
    }

    pub fn render(&self) -> Option<Cow<'_, str>> {
        match self {
            DateCell::Missing => None,
            DateCell::Text(s) => Some(Cow::Borrowed(s)),
            DateCell::Date(d) => Some(Cow::Owned(d.format("%Y-%m-%d").to_string())),
        }
    }
}

/// The `is_explicit` flag, raw until standardized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Explicit {
    Raw(Text),
    Flag(bool),
}

impl Explicit {
    pub fn render(&self) -> Option<Cow<'_, str>> {
        match self {
            Explicit::Raw(raw) => raw.as_deref().map(Cow::Borrowed),
            Explicit::Flag(true) => Some(Cow::Borrowed("1")),
            Explicit::Flag(false) => Some(Cow::Borrowed("0")),
        }
    }
}

/// A column outside the known set, carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraColumn {
    pub name: String,
    pub values: Vec<Text>,
}

/// One country's chart metadata table. Every known column is optional;
/// `None` means the column is absent from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaTable {
    /// Number of data rows; every present column holds exactly this many cells.
    pub len: usize,
    pub date: Option<Vec<DateCell>>,
    pub position: Option<Vec<Text>>,
    pub song: Option<Vec<Text>>,
    pub artist: Option<Vec<Text>>,
    pub track_id: Option<Vec<Text>>,
    pub popularity: Option<Vec<Text>>,
    pub duration_ms: Option<Vec<Text>>,
    pub is_explicit: Option<Vec<Explicit>>,
    pub album_id: Option<Vec<Text>>,
    pub release_date: Option<Vec<DateCell>>,
    pub genres: Option<Vec<Text>>,
    pub main_genre: Option<Vec<Text>>,
    pub extra: Vec<ExtraColumn>,
}

/// Borrowed view over one column, whatever its cell type.
#[derive(Debug, Clone, Copy)]
pub enum ColumnRef<'a> {
    Text(&'a [Text]),
    Date(&'a [DateCell]),
    Explicit(&'a [Explicit]),
}

impl<'a> ColumnRef<'a> {
    pub fn cell(&self, row: usize) -> Option<Cow<'a, str>> {
        match *self {
            ColumnRef::Text(v) => v[row].as_deref().map(Cow::Borrowed),
            ColumnRef::Date(v) => v[row].render(),
            ColumnRef::Explicit(v) => v[row].render(),
        }
    }

    pub fn missing_count(&self) -> usize {
        match *self {
            ColumnRef::Text(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnRef::Date(v) => v.iter().filter(|c| c.is_missing()).count(),
            ColumnRef::Explicit(v) => v
                .iter()
                .filter(|c| matches!(c, Explicit::Raw(None)))
                .count(),
        }
    }
}

impl MetaTable {
    pub fn text_column(&self, col: MetaColumn) -> Option<&Vec<Text>> {
        match col {
            MetaColumn::Position => self.position.as_ref(),
            MetaColumn::Song => self.song.as_ref(),
            MetaColumn::Artist => self.artist.as_ref(),
            MetaColumn::TrackId => self.track_id.as_ref(),
            MetaColumn::Popularity => self.popularity.as_ref(),
            MetaColumn::DurationMs => self.duration_ms.as_ref(),
            MetaColumn::AlbumId => self.album_id.as_ref(),
            MetaColumn::Genres => self.genres.as_ref(),
            MetaColumn::MainGenre => self.main_genre.as_ref(),
            MetaColumn::Date | MetaColumn::IsExplicit | MetaColumn::ReleaseDate => None,
        }
    }

    fn text_column_mut(&mut self, col: MetaColumn) -> Option<&mut Option<Vec<Text>>> {
        match col {
            MetaColumn::Position => Some(&mut self.position),
            MetaColumn::Song => Some(&mut self.song),
            MetaColumn::Artist => Some(&mut self.artist),
            MetaColumn::TrackId => Some(&mut self.track_id),
            MetaColumn::Popularity => Some(&mut self.popularity),
            MetaColumn::DurationMs => Some(&mut self.duration_ms),
            MetaColumn::AlbumId => Some(&mut self.album_id),
            MetaColumn::Genres => Some(&mut self.genres),
            MetaColumn::MainGenre => Some(&mut self.main_genre),
            MetaColumn::Date | MetaColumn::IsExplicit | MetaColumn::ReleaseDate => None,
        }
    }

    /// Install a column read from disk under its known slot.
    /// Returns the values back if the slot is already taken.
    pub(crate) fn set_column(&mut self, col: MetaColumn, values: Vec<Text>) -> Option<Vec<Text>> {
        match col {
            MetaColumn::Date if self.date.is_none() => {
                self.date = Some(values.into_iter().map(DateCell::from_raw).collect());
                None
            }
            MetaColumn::ReleaseDate if self.release_date.is_none() => {
                self.release_date = Some(values.into_iter().map(DateCell::from_raw).collect());
                None
            }
            MetaColumn::IsExplicit if self.is_explicit.is_none() => {
                self.is_explicit = Some(values.into_iter().map(Explicit::Raw).collect());
                None
            }
            MetaColumn::Date | MetaColumn::ReleaseDate | MetaColumn::IsExplicit => Some(values),
            other => match self.text_column_mut(other) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(values);
                    None
                }
                _ => Some(values),
            },
        }
    }

    /// Present columns in output order: allow-list, `main_genre`, then extras.
    pub fn columns(&self) -> Vec<(&str, ColumnRef<'_>)> {
        let mut out = Vec::new();
        for col in MetaColumn::ALLOW_LIST
            .iter()
            .chain(std::iter::once(&MetaColumn::MainGenre))
        {
            let view = match col {
                MetaColumn::Date => self.date.as_deref().map(ColumnRef::Date),
                MetaColumn::ReleaseDate => self.release_date.as_deref().map(ColumnRef::Date),
                MetaColumn::IsExplicit => self.is_explicit.as_deref().map(ColumnRef::Explicit),
                other => self.text_column(*other).map(|v| ColumnRef::Text(v.as_slice())),
            };
            if let Some(view) = view {
                out.push((col.name(), view));
            }
        }
        for extra in &self.extra {
            out.push((extra.name.as_str(), ColumnRef::Text(&extra.values)));
        }
        out
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns().into_iter().map(|(name, _)| name).collect()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.len, self.columns().len())
    }
}
