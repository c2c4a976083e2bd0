//! File classification for filedepot.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classified file type, derived from the filename extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FileKind {
    /// PDF document (.pdf).
    Pdf,
    /// Excel spreadsheet (.xlsx, .xls).
    Excel,
    /// Plain text (.txt).
    Txt,
    /// Word document (.doc, .docx).
    Word,
}

/// All file kinds, in a stable order.
pub(crate) const ALL_KINDS: [FileKind; 4] =
    [FileKind::Pdf, FileKind::Excel, FileKind::Txt, FileKind::Word];

impl FileKind {
    /// Classify a filename by its extension (case-insensitive).
    ///
    /// Returns None for unrecognized or missing extensions.
    pub fn from_filename(filename: &str) -> Option<FileKind> {
        let ext = Path::new(filename).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "xlsx" | "xls" => Some(FileKind::Excel),
            "txt" => Some(FileKind::Txt),
            "doc" | "docx" => Some(FileKind::Word),
            _ => None,
        }
    }

    /// Convert to the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Excel => "excel",
            FileKind::Txt => "txt",
            FileKind::Word => "word",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "excel" => Ok(FileKind::Excel),
            "txt" => Ok(FileKind::Txt),
            "word" => Ok(FileKind::Word),
            _ => Err(format!("unknown file kind: {s}")),
        }
    }
}
