use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use serde_json::from_str;
use thiserror::Error;

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/bank");

/// Passage difficulty level
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Next level, wrapping from hard back to easy
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

#[derive(Debug, Error)]
pub enum TextBankError {
    #[error("built-in passage file `{0}` not found")]
    MissingBuiltin(String),
    #[error("built-in passage file `{file}` declares difficulty `{found}`")]
    MislabeledBuiltin { file: String, found: Difficulty },
    #[error("unable to read passage bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse passage bank: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no passages for difficulty `{0}`")]
    Empty(Difficulty),
    #[error("empty passage in difficulty `{0}`")]
    EmptyPassage(Difficulty),
    #[error("passage in difficulty `{0}` contains a control character")]
    ControlCharacter(Difficulty),
}

/// One embedded passage file
#[derive(Deserialize, Debug)]
struct PassageFile {
    difficulty: Difficulty,
    passages: Vec<String>,
}

/// Passages grouped by difficulty. Every level holds at least one non-empty
/// passage, and passages never contain control characters (tabs, newlines)
/// since those cannot be typed into the input field.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct TextBank {
    easy: Vec<String>,
    medium: Vec<String>,
    hard: Vec<String>,
}

impl TextBank {
    /// Bank compiled into the binary from `src/bank`
    pub fn builtin() -> Result<Self, TextBankError> {
        Self {
            easy: read_builtin(Difficulty::Easy)?,
            medium: read_builtin(Difficulty::Medium)?,
            hard: read_builtin(Difficulty::Hard)?,
        }
        .validated()
    }

    /// Parse a bank of the form `{"easy": [..], "medium": [..], "hard": [..]}`
    pub fn from_json(json: &str) -> Result<Self, TextBankError> {
        from_str::<TextBank>(json)?.validated()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextBankError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| TextBankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// A bank that serves the same passage at every level
    pub fn single(passage: impl Into<String>) -> Result<Self, TextBankError> {
        let passage = passage.into();
        Self {
            easy: vec![passage.clone()],
            medium: vec![passage.clone()],
            hard: vec![passage],
        }
        .validated()
    }

    pub fn passages(&self, difficulty: Difficulty) -> &[String] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    /// First passage of a level, used for the very first session
    pub fn first(&self, difficulty: Difficulty) -> &str {
        self.passages(difficulty)
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Uniform random pick among the passages of a level
    pub fn choose<R: Rng + ?Sized>(&self, difficulty: Difficulty, rng: &mut R) -> &str {
        self.passages(difficulty)
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn validated(self) -> Result<Self, TextBankError> {
        for difficulty in Difficulty::ALL {
            let passages = self.passages(difficulty);
            if passages.is_empty() {
                return Err(TextBankError::Empty(difficulty));
            }
            if passages.iter().any(|p| p.is_empty()) {
                return Err(TextBankError::EmptyPassage(difficulty));
            }
            if passages.iter().any(|p| p.chars().any(char::is_control)) {
                return Err(TextBankError::ControlCharacter(difficulty));
            }
        }
        Ok(self)
    }
}

fn read_builtin(difficulty: Difficulty) -> Result<Vec<String>, TextBankError> {
    let file_name = format!("{difficulty}.json");
    let contents = BANK_DIR
        .get_file(&file_name)
        .and_then(|f| f.contents_utf8())
        .ok_or_else(|| TextBankError::MissingBuiltin(file_name.clone()))?;

    let file: PassageFile = from_str(contents)?;
    if file.difficulty != difficulty {
        return Err(TextBankError::MislabeledBuiltin {
            file: file_name,
            found: file.difficulty,
        });
    }
    Ok(file.passages)
}
