//! Rendering configuration errors against their source.
use codespan_reporting::{
    diagnostic::{Diagnostic, Severity},
    files, term,
};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

pub type FileId = usize;
/// A byte offset range in a source file.
pub type Span = std::ops::Range<usize>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to lookup file")]
    FileLookup(#[from] codespan_reporting::files::Error),
    #[error("failed to print diagnostics")]
    Io(#[from] std::io::Error),
}

/// Convert an item into diagnostics for the source file `file_id`.
pub trait ToDiagnostics {
    fn to_diagnostics<F: Copy + PartialEq>(&self, file_id: F) -> Vec<Diagnostic<F>>;
}

pub trait DiagnosticExt {
    /// Is the severity an error or a bug?
    fn is_error(&self) -> bool;
}

impl<F> DiagnosticExt for Diagnostic<F> {
    fn is_error(&self) -> bool {
        match self.severity {
            Severity::Bug | Severity::Error => true,
            Severity::Warning | Severity::Note | Severity::Help => false,
        }
    }
}

pub type BufferedPrinter = Printer<term::termcolor::Buffer>;
pub type StderrPrinter = Printer<term::termcolor::StandardStream>;

/// Keeps track of source files and emits diagnostics for them.
pub struct Printer<W> {
    writer: Mutex<W>,
    diagnostic_config: term::Config,
    files: RwLock<files::SimpleFiles<String, String>>,
}

impl<W> std::fmt::Debug for Printer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Printer").finish_non_exhaustive()
    }
}

pub trait ToSourceName {
    fn to_source_name(self) -> String;
}

impl ToSourceName for String {
    fn to_source_name(self) -> String {
        self
    }
}

impl ToSourceName for &str {
    fn to_source_name(self) -> String {
        self.to_string()
    }
}

impl ToSourceName for &Path {
    fn to_source_name(self) -> String {
        self.to_string_lossy().to_string()
    }
}

impl ToSourceName for &PathBuf {
    fn to_source_name(self) -> String {
        self.to_string_lossy().to_string()
    }
}

fn diagnostic_config() -> term::Config {
    term::Config {
        styles: term::Styles::with_blue(term::termcolor::Color::Blue),
        ..term::Config::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for Printer<term::termcolor::StandardStream> {
    fn default() -> Self {
        Self::stderr(None)
    }
}

impl Default for Printer<term::termcolor::Buffer> {
    fn default() -> Self {
        Self::buffered()
    }
}

impl Printer<term::termcolor::Buffer> {
    /// A printer collecting colorless output in memory.
    #[must_use]
    pub fn buffered() -> Self {
        Self {
            writer: Mutex::new(term::termcolor::Buffer::no_color()),
            diagnostic_config: diagnostic_config(),
            files: RwLock::new(files::SimpleFiles::new()),
        }
    }

    /// Everything emitted so far.
    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(lock(&self.writer).as_slice()).to_string()
    }
}

impl Printer<term::termcolor::StandardStream> {
    #[must_use]
    pub fn stderr(color_choice: Option<term::termcolor::ColorChoice>) -> Self {
        let color_choice = color_choice.unwrap_or(term::termcolor::ColorChoice::Auto);
        Self {
            writer: Mutex::new(term::termcolor::StandardStream::stderr(color_choice)),
            diagnostic_config: diagnostic_config(),
            files: RwLock::new(files::SimpleFiles::new()),
        }
    }
}

impl<W> Printer<W> {
    /// Zero based line indices of the labels of `diagnostic`.
    pub fn lines(
        &self,
        diagnostic: &Diagnostic<FileId>,
    ) -> Result<Vec<usize>, codespan_reporting::files::Error> {
        use codespan_reporting::files::Files;
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        diagnostic
            .labels
            .iter()
            .map(|label| files.line_index(label.file_id, label.range.start))
            .collect()
    }

    pub fn add_source_file(&self, name: impl ToSourceName, source: String) -> FileId {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.add(name.to_source_name(), source)
    }
}

impl<W> Printer<W>
where
    W: term::termcolor::WriteColor,
{
    /// # Errors
    /// When the source file of a label is unknown or writing fails.
    pub fn emit(&self, diagnostic: &Diagnostic<FileId>) -> Result<(), Error> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        term::emit(
            &mut *lock(&self.writer),
            &self.diagnostic_config,
            &*files,
            diagnostic,
        )?;
        Ok(())
    }
}
