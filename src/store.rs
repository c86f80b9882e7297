//! Macro Store
//!
//! Owns the bank → macro collection parsed from the macro file, plus the
//! two-axis cursor (current bank, current macro within that bank).
//!
//! File format, one entry per line:
//! - blank lines and lines starting with `#` are ignored
//! - a line starting with a tab is a macro of the most recent bank
//! - any other line starts a new bank named by the line

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::text::{ltrim, rtrim};

/// Errors raised while loading a macro file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read macro file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: macro {text:?} appears before any bank header")]
    Format { line: usize, text: String },
}

/// A single snippet of text that can be typed on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro(String);

impl Macro {
    pub fn text(&self) -> &str {
        &self.0
    }
}

/// A named, ordered group of macros with its own cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    name: String,
    macros: Vec<Macro>,
    current_macro_index: usize,
}

impl Bank {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            macros: Vec::new(),
            current_macro_index: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn macros(&self) -> &[Macro] {
        &self.macros
    }

    /// Index of the selected macro. Meaningless when the bank is empty.
    pub fn current_macro_index(&self) -> usize {
        self.current_macro_index
    }

    pub fn current_text(&self) -> Option<&str> {
        self.macros.get(self.current_macro_index).map(Macro::text)
    }
}

/// Nested bank/macro collection plus the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroStore {
    banks: Vec<Bank>,
    current_bank_index: usize,
}

impl MacroStore {
    /// Parse macro file contents.
    ///
    /// Bank and macro order follow file order exactly; duplicate bank names
    /// are kept as distinct banks. A macro line before the first bank header
    /// is rejected with [`ParseError::Format`].
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut banks: Vec<Bank> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = rtrim(raw);

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('\t') {
                let body = ltrim(line);
                let bank = banks.last_mut().ok_or_else(|| ParseError::Format {
                    line: idx + 1,
                    text: body.to_string(),
                })?;
                bank.macros.push(Macro(body.to_string()));
            } else {
                banks.push(Bank::new(line));
            }
        }

        debug!("[Store] Parsed {} banks", banks.len());

        Ok(Self {
            banks,
            current_bank_index: 0,
        })
    }

    /// Read and parse a macro file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::parse(&contents)?;
        info!(
            "[Store] Loaded {} banks ({} macros) from {}",
            store.len(),
            store.macro_count(),
            path.display()
        );
        Ok(store)
    }

    /// Replace the whole store with a fresh parse of `path`.
    ///
    /// The current contents are left untouched if loading fails.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<(), ParseError> {
        *self = Self::load(path)?;
        Ok(())
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Total number of macros across all banks.
    pub fn macro_count(&self) -> usize {
        self.banks.iter().map(|b| b.macros.len()).sum()
    }

    pub fn current_bank_index(&self) -> usize {
        self.current_bank_index
    }

    pub fn current_bank(&self) -> Option<&Bank> {
        self.banks.get(self.current_bank_index)
    }

    /// Move the bank cursor by `delta`, wrapping at both ends.
    ///
    /// Returns the new index. No-op on an empty store.
    pub fn shift_bank(&mut self, delta: i32) -> usize {
        if !self.banks.is_empty() {
            self.current_bank_index = wrap(self.current_bank_index, delta, self.banks.len());
        }
        self.current_bank_index
    }

    /// Move the macro cursor of the current bank by `delta`, wrapping at both ends.
    ///
    /// Returns the new index, or `None` when there is no bank or it has no macros.
    pub fn shift_macro(&mut self, delta: i32) -> Option<usize> {
        let bank = self.banks.get_mut(self.current_bank_index)?;
        if bank.macros.is_empty() {
            return None;
        }
        bank.current_macro_index = wrap(bank.current_macro_index, delta, bank.macros.len());
        Some(bank.current_macro_index)
    }

    /// Text of the selected macro, if any.
    pub fn current_text(&self) -> Option<&str> {
        self.current_bank()?.current_text()
    }

    /// Human-readable summary of the cursor, used in log lines.
    pub fn position(&self) -> Position<'_> {
        Position(self)
    }
}

/// Two-branch wraparound: below zero goes to the last slot, past the end goes to zero.
fn wrap(index: usize, delta: i32, len: usize) -> usize {
    let next = index as i64 + i64::from(delta);
    if next < 0 {
        len - 1
    } else if next >= len as i64 {
        0
    } else {
        next as usize
    }
}

pub struct Position<'a>(&'a MacroStore);

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.0;
        match store.current_bank() {
            None => write!(f, "no banks loaded"),
            Some(bank) if bank.macros.is_empty() => write!(
                f,
                "bank {}/{} '{}', empty",
                store.current_bank_index + 1,
                store.len(),
                bank.name
            ),
            Some(bank) => write!(
                f,
                "bank {}/{} '{}', macro {}/{}",
                store.current_bank_index + 1,
                store.len(),
                bank.name,
                bank.current_macro_index + 1,
                bank.macros.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Greet\n\thi\n\tbye\nFarewell\n\tsee ya\n";

    fn names(store: &MacroStore) -> Vec<&str> {
        store.banks().iter().map(Bank::name).collect()
    }

    fn texts(bank: &Bank) -> Vec<&str> {
        bank.macros().iter().map(Macro::text).collect()
    }

    #[test]
    fn parses_banks_and_macros_in_file_order() {
        let store = MacroStore::parse(SAMPLE).unwrap();
        assert_eq!(names(&store), vec!["Greet", "Farewell"]);
        assert_eq!(texts(&store.banks()[0]), vec!["hi", "bye"]);
        assert_eq!(texts(&store.banks()[1]), vec!["see ya"]);
        assert_eq!(store.current_bank_index(), 0);
        assert!(store.banks().iter().all(|b| b.current_macro_index() == 0));
    }

    #[test]
    fn reparsing_is_idempotent() {
        let a = MacroStore::parse(SAMPLE).unwrap();
        let b = MacroStore::parse(SAMPLE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "# header\n\nTeam\n# inside\n\tgo go go\n   \n\tfall back\r\n";
        let store = MacroStore::parse(text).unwrap();
        assert_eq!(names(&store), vec!["Team"]);
        assert_eq!(texts(&store.banks()[0]), vec!["go go go", "fall back"]);
    }

    #[test]
    fn keeps_internal_spaces_and_trims_leading_tabs() {
        let store = MacroStore::parse("B\n\t\t  two  words here \n").unwrap();
        assert_eq!(store.current_text(), Some("two  words here"));
    }

    #[test]
    fn duplicate_bank_names_stay_distinct() {
        let store = MacroStore::parse("Same\n\ta\nSame\n\tb\n").unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(texts(&store.banks()[1]), vec!["b"]);
    }

    #[test]
    fn rejects_macro_before_bank() {
        let err = MacroStore::parse("# comment\n\torphan\nBank\n").unwrap_err();
        match err {
            ParseError::Format { line, text } => {
                assert_eq!(line, 2);
                assert_eq!(text, "orphan");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = MacroStore::load("/definitely/not/here/macros.txt").unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("chatmacro-load-{}.txt", std::process::id()));
        std::fs::write(&path, SAMPLE).unwrap();
        let store = MacroStore::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(store.len(), 2);
        assert_eq!(store.macro_count(), 3);
    }

    #[test]
    fn failed_reload_keeps_previous_store() {
        let mut store = MacroStore::parse(SAMPLE).unwrap();
        store.shift_bank(1);
        assert!(store.reload("/definitely/not/here/macros.txt").is_err());
        assert_eq!(store.len(), 2);
        assert_eq!(store.current_bank_index(), 1);
    }

    #[test]
    fn shift_bank_wraps_forward() {
        let mut store = MacroStore::parse(SAMPLE).unwrap();
        assert_eq!(store.shift_bank(1), 1);
        assert_eq!(store.shift_bank(1), 0);
    }

    #[test]
    fn shift_bank_wraps_backward_from_zero() {
        let mut store = MacroStore::parse("A\nB\nC\n").unwrap();
        assert_eq!(store.shift_bank(-1), 2);
    }

    #[test]
    fn full_cycle_returns_to_start() {
        let mut store = MacroStore::parse("A\nB\nC\nD\n").unwrap();
        store.shift_bank(1);
        let start = store.current_bank_index();
        for _ in 0..store.len() {
            store.shift_bank(1);
        }
        assert_eq!(store.current_bank_index(), start);
    }

    #[test]
    fn shift_macro_wraps_within_current_bank() {
        let mut store = MacroStore::parse(SAMPLE).unwrap();
        assert_eq!(store.shift_macro(-1), Some(1));
        assert_eq!(store.current_text(), Some("bye"));
        assert_eq!(store.shift_macro(1), Some(0));
        assert_eq!(store.current_text(), Some("hi"));

        store.shift_bank(1);
        assert_eq!(store.shift_macro(1), Some(0));
        assert_eq!(store.current_text(), Some("see ya"));
    }

    #[test]
    fn macro_full_cycle_returns_to_start() {
        let mut store = MacroStore::parse("Other\n\tx\nFour\n\ta\n\tb\n\tc\n\td\n").unwrap();
        store.shift_bank(1);
        store.shift_macro(1);
        assert_eq!(store.current_text(), Some("b"));

        for delta in [1, -1] {
            for _ in 0..4 {
                assert!(store.shift_macro(delta).is_some());
            }
            assert_eq!(store.current_text(), Some("b"));
        }

        assert_eq!(store.shift_macro(-1), Some(0));
        assert_eq!(store.shift_macro(-1), Some(3));
        store.shift_bank(1);
        assert_eq!(store.current_text(), Some("x"));
    }

    #[test]
    fn macro_cursor_is_kept_per_bank() {
        let mut store = MacroStore::parse(SAMPLE).unwrap();
        store.shift_macro(1);
        store.shift_bank(1);
        store.shift_bank(1);
        assert_eq!(store.current_text(), Some("bye"));
    }

    #[test]
    fn empty_bank_is_safe() {
        let mut store = MacroStore::parse("Empty\nFull\n\tx\n").unwrap();
        assert_eq!(store.current_text(), None);
        assert_eq!(store.shift_macro(1), None);
        assert_eq!(store.banks()[0].current_macro_index(), 0);
        assert_eq!(store.position().to_string(), "bank 1/2 'Empty', empty");
    }

    #[test]
    fn empty_store_is_safe() {
        let mut store = MacroStore::parse("# nothing\n").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.shift_bank(1), 0);
        assert_eq!(store.shift_macro(-1), None);
        assert_eq!(store.current_text(), None);
        assert_eq!(store.position().to_string(), "no banks loaded");
    }

    #[test]
    fn position_describes_cursor() {
        let mut store = MacroStore::parse(SAMPLE).unwrap();
        store.shift_macro(1);
        assert_eq!(store.position().to_string(), "bank 1/2 'Greet', macro 2/2");
    }
}
