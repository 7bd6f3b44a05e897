//! Parsing of the `pyproject.toml` and `bumpcalver.toml` config files.
//!
//! Values are read from a [`toml_span`] document so that every error points at its source.
use crate::{
    config::{Config, NEW_VERSION},
    diagnostics::{FileId, Span},
    f_string::PythonFormatString,
    files::FileTarget,
    handlers::{FileType, Locator},
    token::{TemplateError, VersionFormatTemplate},
};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use toml_span as toml;

const GLOBAL_KEYS: [&str; 7] = [
    "version_format",
    "timezone",
    "git_tag",
    "auto_commit",
    "tag_name",
    "commit_message",
    "file",
];

const FILE_KEYS: [&str; 5] = ["path", "file_type", "variable", "section", "pattern"];

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("{message}")]
    InvalidConfiguration { message: String, span: Span },
    #[error("{message}")]
    MissingKey {
        key: String,
        message: String,
        span: Span,
    },
    #[error("{message}")]
    UnexpectedType {
        message: String,
        expected: ValueKind,
        found: ValueKind,
        span: Span,
    },
    #[error("{message}")]
    InvalidFormatString {
        #[source]
        source: crate::f_string::Error,
        message: String,
        span: Span,
    },
    #[error("invalid version format")]
    InvalidVersionFormat {
        #[source]
        source: TemplateError,
        span: Span,
    },
    #[error("{message}")]
    InvalidRegex {
        #[source]
        source: regex::Error,
        message: String,
        span: Span,
    },
    #[error("{source}")]
    Toml {
        #[source]
        source: toml_span::Error,
    },
}

mod diagnostics {
    use crate::diagnostics::ToDiagnostics;
    use codespan_reporting::diagnostic::{Diagnostic, Label};

    impl ToDiagnostics for super::ParseError {
        fn to_diagnostics<F: Copy + PartialEq>(&self, file_id: F) -> Vec<Diagnostic<F>> {
            match self {
                Self::InvalidConfiguration { message, span } => vec![
                    Diagnostic::error()
                        .with_message("invalid configuration".to_string())
                        .with_labels(vec![
                            Label::primary(file_id, span.clone()).with_message(message),
                        ]),
                ],
                Self::MissingKey { key, message, span } => vec![
                    Diagnostic::error()
                        .with_message(format!("missing required key `{key}`"))
                        .with_labels(vec![
                            Label::secondary(file_id, span.clone()).with_message(message),
                        ]),
                ],
                Self::UnexpectedType {
                    message,
                    expected,
                    found,
                    span,
                } => vec![
                    Diagnostic::error()
                        .with_message(message)
                        .with_labels(vec![
                            Label::primary(file_id, span.clone())
                                .with_message(format!("expected {expected}")),
                        ])
                        .with_notes(vec![unindent::unindent(&format!(
                            "
                            expected type {expected}
                               found type {found}
                            "
                        ))]),
                ],
                Self::InvalidFormatString {
                    source,
                    message,
                    span,
                } => vec![
                    Diagnostic::error()
                        .with_message("invalid format string".to_string())
                        .with_labels(vec![
                            Label::primary(file_id, span.clone()).with_message(source.to_string()),
                            Label::secondary(file_id, span.clone()).with_message(message),
                        ]),
                ],
                Self::InvalidVersionFormat { source, span } => vec![
                    Diagnostic::error()
                        .with_message(self.to_string())
                        .with_labels(vec![
                            Label::primary(file_id, span.clone()).with_message(source.to_string()),
                        ])
                        .with_notes(vec![
                            "the default version format is `{current_date}-{build_count:03}`"
                                .to_string(),
                        ]),
                ],
                Self::InvalidRegex {
                    source,
                    message,
                    span,
                } => vec![
                    Diagnostic::error()
                        .with_message("invalid regular expression".to_string())
                        .with_labels(vec![
                            Label::primary(file_id, span.clone()).with_message(source.to_string()),
                            Label::secondary(file_id, span.clone()).with_message(message),
                        ]),
                ],
                Self::Toml { source } => vec![
                    Diagnostic::error()
                        .with_message(source.to_string())
                        .with_labels(vec![Label::primary(
                            file_id,
                            source.span.start..source.span.end,
                        )]),
                ],
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Table,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Table => "table",
        };
        write!(f, "`{name}`")
    }
}

impl<'de> From<&toml::Value<'de>> for ValueKind {
    fn from(value: &toml::Value<'de>) -> Self {
        use toml::value::ValueInner;
        match value.as_ref() {
            ValueInner::String(..) => ValueKind::String,
            ValueInner::Integer(..) => ValueKind::Integer,
            ValueInner::Float(..) => ValueKind::Float,
            ValueInner::Boolean(..) => ValueKind::Boolean,
            ValueInner::Array(..) => ValueKind::Array,
            ValueInner::Table(..) => ValueKind::Table,
        }
    }
}

fn span_of(value: &toml::Value<'_>) -> Span {
    value.span.start..value.span.end
}

fn unexpected_type(value: &toml::Value<'_>, expected: ValueKind, message: &str) -> ParseError {
    ParseError::UnexpectedType {
        message: message.to_string(),
        expected,
        found: value.into(),
        span: span_of(value),
    }
}

#[inline]
pub fn as_str<'de>(value: &'de toml::Value<'de>) -> Result<&'de str, ParseError> {
    value
        .as_str()
        .ok_or_else(|| unexpected_type(value, ValueKind::String, "expected a string"))
}

#[inline]
pub fn as_string<'de>(value: &'de toml::Value<'de>) -> Result<String, ParseError> {
    as_str(value).map(ToString::to_string)
}

#[inline]
pub fn as_bool<'de>(value: &'de toml::Value<'de>) -> Result<bool, ParseError> {
    value
        .as_bool()
        .ok_or_else(|| unexpected_type(value, ValueKind::Boolean, "expected a boolean"))
}

#[inline]
pub fn as_table<'de>(
    value: &'de toml::Value<'de>,
    message: &str,
) -> Result<&'de toml::value::Table<'de>, ParseError> {
    value
        .as_table()
        .ok_or_else(|| unexpected_type(value, ValueKind::Table, message))
}

#[inline]
pub fn as_regex<'de>(value: &'de toml::Value<'de>) -> Result<regex::Regex, ParseError> {
    as_str(value).and_then(|s| {
        regex::Regex::new(s).map_err(|source| ParseError::InvalidRegex {
            source,
            message: format!("invalid regular expression: {s:?}"),
            span: span_of(value),
        })
    })
}

#[inline]
pub fn as_version_format<'de>(
    value: &'de toml::Value<'de>,
) -> Result<VersionFormatTemplate, ParseError> {
    as_str(value).and_then(|s| {
        s.parse()
            .map_err(|source| ParseError::InvalidVersionFormat {
                source,
                span: span_of(value),
            })
    })
}

/// A format string whose only placeholder is `{new_version}`.
#[inline]
pub fn as_new_version_template<'de>(
    value: &'de toml::Value<'de>,
) -> Result<PythonFormatString, ParseError> {
    let s = as_str(value)?;
    let format_string =
        PythonFormatString::parse(s).map_err(|source| ParseError::InvalidFormatString {
            source,
            message: format!("invalid format string: {s:?}"),
            span: span_of(value),
        })?;
    if let Some(name) = format_string
        .named_arguments()
        .find(|name| *name != NEW_VERSION)
    {
        return Err(ParseError::InvalidConfiguration {
            message: format!("unknown placeholder `{{{name}}}`, only `{{{NEW_VERSION}}}` is available"),
            span: span_of(value),
        });
    }
    Ok(format_string)
}

fn warn_unknown_keys<'de>(
    table: &'de toml::value::Table<'de>,
    known: &[&str],
    file_id: FileId,
    diagnostics: &mut Vec<Diagnostic<FileId>>,
) {
    for key in table.keys() {
        if !known.contains(&&*key.name) {
            diagnostics.push(
                Diagnostic::warning()
                    .with_message(format!("unknown key `{}`", key.name))
                    .with_labels(vec![Label::primary(file_id, key.span.start..key.span.end)]),
            );
        }
    }
}

pub(crate) fn parse_file<'de>(
    value: &'de toml::Value<'de>,
    file_id: FileId,
    diagnostics: &mut Vec<Diagnostic<FileId>>,
) -> Result<FileTarget, ParseError> {
    let table = as_table(value, "file config must be a table")?;
    warn_unknown_keys(table, &FILE_KEYS, file_id, diagnostics);

    let path = table
        .get("path")
        .map(as_string)
        .transpose()?
        .ok_or_else(|| ParseError::MissingKey {
            key: "path".to_string(),
            message: "file config must specify a `path`".to_string(),
            span: span_of(value),
        })?;
    let file_type_value = table.get("file_type").ok_or_else(|| ParseError::MissingKey {
        key: "file_type".to_string(),
        message: "file config must specify a `file_type`".to_string(),
        span: span_of(value),
    })?;
    let file_type = as_string(file_type_value)?;
    if let Err(err) = file_type.parse::<FileType>() {
        let supported = FileType::ALL
            .iter()
            .map(|file_type| format!("`{file_type}`"))
            .collect::<Vec<_>>()
            .join(", ");
        diagnostics.push(
            Diagnostic::warning()
                .with_message(err.to_string())
                .with_labels(vec![
                    Label::primary(file_id, span_of(file_type_value))
                        .with_message("this file will be skipped"),
                ])
                .with_notes(vec![format!("supported file types are {supported}")]),
        );
    }

    let variable = table.get("variable").map(as_string).transpose()?;
    let section = table.get("section").map(as_string).transpose()?;
    let pattern = table.get("pattern").map(as_regex).transpose()?;
    let locator = Locator::from_parts(variable, section, pattern);
    if locator.is_none() {
        diagnostics.push(
            Diagnostic::warning()
                .with_message("missing one of `variable` or `pattern`")
                .with_labels(vec![
                    Label::primary(file_id, span_of(value))
                        .with_message("this file will be skipped"),
                ]),
        );
    }

    Ok(FileTarget {
        path: path.into(),
        file_type,
        locator,
    })
}

pub(crate) fn parse_config<'de>(
    table: &'de toml::value::Table<'de>,
    file_id: FileId,
    diagnostics: &mut Vec<Diagnostic<FileId>>,
) -> Result<Config, ParseError> {
    warn_unknown_keys(table, &GLOBAL_KEYS, file_id, diagnostics);

    let version_format = table
        .get("version_format")
        .map(as_version_format)
        .transpose()?;
    let timezone = table.get("timezone").map(as_string).transpose()?;
    if let Some(value) = table.get("timezone") {
        let name = as_str(value)?;
        if name.parse::<chrono_tz::Tz>().is_err() {
            diagnostics.push(
                Diagnostic::warning()
                    .with_message(format!("unknown timezone {name:?}"))
                    .with_labels(vec![
                        Label::primary(file_id, span_of(value))
                            .with_message(format!("falls back to {}", crate::date::DEFAULT_TIMEZONE)),
                    ]),
            );
        }
    }
    let git_tag = table.get("git_tag").map(as_bool).transpose()?;
    let auto_commit = table.get("auto_commit").map(as_bool).transpose()?;
    let tag_name = table
        .get("tag_name")
        .map(as_new_version_template)
        .transpose()?;
    let commit_message = table
        .get("commit_message")
        .map(as_new_version_template)
        .transpose()?;

    let files = match table.get("file") {
        None => vec![],
        Some(value) => match value.as_ref() {
            toml::value::ValueInner::Array(array) => array
                .iter()
                .map(|value| parse_file(value, file_id, diagnostics))
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(unexpected_type(
                    value,
                    ValueKind::Array,
                    "`file` must be an array of tables",
                ));
            }
        },
    };

    Ok(Config {
        version_format,
        timezone,
        git_tag,
        auto_commit,
        tag_name,
        commit_message,
        files,
    })
}

impl Config {
    /// Parse the `[tool.bumpcalver]` table of a `pyproject.toml`.
    ///
    /// Returns `None` if there is no such table.
    ///
    /// # Errors
    /// When the document or the configuration is invalid.
    pub fn from_pyproject_toml(
        config: &str,
        file_id: FileId,
        diagnostics: &mut Vec<Diagnostic<FileId>>,
    ) -> Result<Option<Self>, ParseError> {
        let document = toml_span::parse(config).map_err(|source| ParseError::Toml { source })?;
        let Some(value) = document
            .as_table()
            .and_then(|table| table.get("tool"))
            .and_then(|tool| tool.as_table())
            .and_then(|tool| tool.get("bumpcalver"))
        else {
            return Ok(None);
        };
        let table = as_table(value, "bumpcalver config must be a table")?;
        parse_config(table, file_id, diagnostics).map(Some)
    }

    /// Parse a `bumpcalver.toml`, where the configuration is at the top level.
    ///
    /// Returns `None` for an empty document.
    ///
    /// # Errors
    /// When the document or the configuration is invalid.
    pub fn from_bumpcalver_toml(
        config: &str,
        file_id: FileId,
        diagnostics: &mut Vec<Diagnostic<FileId>>,
    ) -> Result<Option<Self>, ParseError> {
        let document = toml_span::parse(config).map_err(|source| ParseError::Toml { source })?;
        let table = as_table(&document, "bumpcalver config must be a table")?;
        if table.is_empty() {
            return Ok(None);
        }
        parse_config(table, file_id, diagnostics).map(Some)
    }
}
