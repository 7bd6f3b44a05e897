//! Python-style format strings used for version, tag and commit message templates.
//!
//! A format string is split into literal text and `{name}` or `{name:spec}` placeholders.
//! Doubled braces (`{{`, `}}`) are literal braces.
pub use parser::ParseError;
use std::collections::HashMap;

/// Alignment of a padded argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Align {
    Left,
    Right,
    Center,
}

/// The subset of the python format spec mini-language supported in templates.
///
/// `[[fill]align][0][width]`, e.g. `03`, `>5`, `*^9`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub zero_pad: bool,
    pub width: usize,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[error("unsupported format spec {spec:?}")]
pub struct InvalidFormatSpecError {
    pub spec: String,
}

fn parse_align(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        _ => None,
    }
}

impl std::str::FromStr for FormatSpec {
    type Err = InvalidFormatSpecError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidFormatSpecError {
            spec: spec.to_string(),
        };
        let chars: Vec<char> = spec.chars().collect();
        let mut out = Self::default();
        let mut rest = chars.as_slice();

        match rest {
            [fill, align, ..] if parse_align(*align).is_some() => {
                out.fill = Some(*fill);
                out.align = parse_align(*align);
                rest = &rest[2..];
            }
            [align, ..] if parse_align(*align).is_some() => {
                out.align = parse_align(*align);
                rest = &rest[1..];
            }
            _ => {}
        }
        if let ['0', ..] = rest {
            out.zero_pad = true;
            rest = &rest[1..];
        }
        if !rest.is_empty() {
            let width: String = rest.iter().collect();
            out.width = width.parse().map_err(|_| invalid())?;
        }
        Ok(out)
    }
}

impl std::fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fill) = self.fill {
            write!(f, "{fill}")?;
        }
        match self.align {
            Some(Align::Left) => write!(f, "<")?,
            Some(Align::Right) => write!(f, ">")?,
            Some(Align::Center) => write!(f, "^")?,
            None => {}
        }
        if self.zero_pad {
            write!(f, "0")?;
        }
        if self.width > 0 {
            write!(f, "{}", self.width)?;
        }
        Ok(())
    }
}

impl FormatSpec {
    /// Pad `value` to the configured width.
    ///
    /// Like python, numbers are right aligned and everything else left aligned unless
    /// an explicit alignment is given. Zero padding goes after a leading sign.
    #[must_use]
    pub fn apply(&self, value: &str) -> String {
        let len = value.chars().count();
        if len >= self.width {
            return value.to_string();
        }
        let padding = self.width - len;
        let is_number = value.parse::<i64>().is_ok();

        if self.zero_pad && self.align.is_none() && self.fill.is_none() {
            let (sign, digits) = match value.strip_prefix('-') {
                Some(digits) if is_number => ("-", digits),
                _ => ("", value),
            };
            return format!("{sign}{}{digits}", "0".repeat(padding));
        }

        let fill = self
            .fill
            .unwrap_or(if self.zero_pad { '0' } else { ' ' })
            .to_string();
        let align = self.align.unwrap_or(if is_number {
            Align::Right
        } else {
            Align::Left
        });
        match align {
            Align::Left => format!("{value}{}", fill.repeat(padding)),
            Align::Right => format!("{}{value}", fill.repeat(padding)),
            Align::Center => {
                let left = padding / 2;
                format!(
                    "{}{value}{}",
                    fill.repeat(left),
                    fill.repeat(padding - left)
                )
            }
        }
    }
}

/// A segment of a format string: either literal text or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    String(String),
    Argument {
        name: String,
        spec: Option<FormatSpec>,
    },
}

impl Value {
    #[must_use]
    pub fn argument(name: impl Into<String>) -> Self {
        Self::Argument {
            name: name.into(),
            spec: None,
        }
    }

    /// If this is an argument placeholder, return its name, otherwise `None`.
    ///
    /// # Examples
    /// ```
    /// use bumpcalver::f_string::Value;
    /// assert_eq!(Value::argument("x").as_argument(), Some("x"));
    /// assert_eq!(Value::String("x".to_string()).as_argument(), None);
    /// ```
    #[must_use]
    pub fn as_argument(&self) -> Option<&str> {
        match self {
            Self::Argument { name, .. } => Some(name),
            Self::String(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s.replace('{', "{{").replace('}', "}}")),
            Self::Argument { name, spec: None } => write!(f, "{{{name}}}"),
            Self::Argument {
                name,
                spec: Some(spec),
            } => write!(f, "{{{name}:{spec}}}"),
        }
    }
}

pub mod parser {
    //! `winnow` parser splitting a format string into text and placeholders.
    use winnow::combinator::{alt, delimited, repeat};
    use winnow::error::InputError;
    use winnow::prelude::*;
    use winnow::token::take_while;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum Segment<'a> {
        Text(String),
        Argument(&'a str),
    }

    fn any_except_curly_bracket1<'a>(s: &mut &'a str) -> ModalResult<&'a str, InputError<&'a str>> {
        take_while(1.., |c| c != '{' && c != '}').parse_next(s)
    }

    fn text_including_escaped_brackets<'a>(
        s: &mut &'a str,
    ) -> ModalResult<String, InputError<&'a str>> {
        repeat(
            1..,
            alt((any_except_curly_bracket1, "{{".value("{"), "}}".value("}"))),
        )
        .fold(String::new, |mut string, c| {
            string.push_str(c);
            string
        })
        .parse_next(s)
    }

    fn argument<'a>(s: &mut &'a str) -> ModalResult<&'a str, InputError<&'a str>> {
        delimited("{", take_while(0.., |c| c != '{' && c != '}'), "}").parse_next(s)
    }

    fn text_or_argument<'a>(s: &mut &'a str) -> ModalResult<Segment<'a>, InputError<&'a str>> {
        alt((
            text_including_escaped_brackets.map(Segment::Text),
            argument.map(Segment::Argument),
        ))
        .parse_next(s)
    }

    #[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
    #[error("invalid format string: {format_string:?}")]
    pub struct ParseError {
        pub format_string: String,
    }

    /// Parse a format string into a sequence of segments.
    ///
    /// # Errors
    /// When the string contains an unbalanced curly brace.
    pub fn parse_segments(value: &str) -> Result<Vec<Segment<'_>>, ParseError> {
        let segments: Vec<Segment<'_>> =
            repeat(0.., text_or_argument)
                .parse(value)
                .map_err(|_| ParseError {
                    format_string: value.to_string(),
                })?;
        Ok(segments)
    }

}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid placeholder {argument:?}")]
    InvalidFormatSpec {
        argument: String,
        #[source]
        source: InvalidFormatSpecError,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[error("missing argument {0:?}")]
pub struct MissingArgumentError(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonFormatString(pub Vec<Value>);

impl std::fmt::Display for PythonFormatString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for value in &self.0 {
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromIterator<Value> for PythonFormatString {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl AsRef<[Value]> for PythonFormatString {
    fn as_ref(&self) -> &[Value] {
        &self.0
    }
}

impl std::str::FromStr for PythonFormatString {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl PythonFormatString {
    /// Parse a format string.
    ///
    /// # Errors
    /// When braces are unbalanced or a placeholder carries an unsupported format spec.
    pub fn parse(value: &str) -> Result<Self, Error> {
        parser::parse_segments(value)?
            .into_iter()
            .map(|segment| match segment {
                parser::Segment::Text(text) => Ok(Value::String(text)),
                parser::Segment::Argument(argument) => match argument.split_once(':') {
                    None => Ok(Value::argument(argument)),
                    Some((name, spec)) => {
                        let spec = spec.parse::<FormatSpec>().map_err(|source| {
                            Error::InvalidFormatSpec {
                                argument: argument.to_string(),
                                source,
                            }
                        })?;
                        Ok(Value::Argument {
                            name: name.to_string(),
                            spec: Some(spec),
                        })
                    }
                },
            })
            .collect()
    }

    /// Substitute the placeholders with `values`.
    ///
    /// In `strict` mode a placeholder without a value is an error, otherwise it renders empty.
    ///
    /// # Errors
    /// When `strict` and a placeholder has no value.
    pub fn format<K, V>(
        &self,
        values: &HashMap<K, V>,
        strict: bool,
    ) -> Result<String, MissingArgumentError>
    where
        K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
        V: AsRef<str>,
    {
        self.0.iter().try_fold(String::new(), |mut acc, value| {
            match value {
                Value::String(s) => acc.push_str(s),
                Value::Argument { name, spec } => match (values.get(name.as_str()), spec) {
                    (Some(value), Some(spec)) => acc.push_str(&spec.apply(value.as_ref())),
                    (Some(value), None) => acc.push_str(value.as_ref()),
                    (None, _) if strict => return Err(MissingArgumentError(name.clone())),
                    (None, _) => {}
                },
            }
            Ok(acc)
        })
    }

    pub fn named_arguments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(Value::as_argument)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Align, FormatSpec, MissingArgumentError, PythonFormatString, Value};
    use color_eyre::eyre;
    use similar_asserts::assert_eq as sim_assert_eq;
    use std::collections::HashMap;

    #[test]
    fn parse_version_format() -> eyre::Result<()> {
        crate::tests::init();
        let fstring = PythonFormatString::parse("{current_date}-{build_count:03}")?;
        sim_assert_eq!(
            fstring.as_ref(),
            [
                Value::argument("current_date"),
                Value::String("-".to_string()),
                Value::Argument {
                    name: "build_count".to_string(),
                    spec: Some(FormatSpec {
                        zero_pad: true,
                        width: 3,
                        ..FormatSpec::default()
                    }),
                },
            ]
        );
        sim_assert_eq!(
            fstring.named_arguments().collect::<Vec<_>>(),
            vec!["current_date", "build_count"]
        );
        Ok(())
    }

    #[test]
    fn format_zero_padded() -> eyre::Result<()> {
        crate::tests::init();
        let fstring = PythonFormatString::parse("{current_date}-{build_count:03}")?;
        let values: HashMap<&str, &str> = [("current_date", "2024-01-01"), ("build_count", "7")]
            .into_iter()
            .collect();
        sim_assert_eq!(fstring.format(&values, true)?, "2024-01-01-007");

        let values: HashMap<&str, &str> = [("current_date", "2024-01-01"), ("build_count", "1234")]
            .into_iter()
            .collect();
        sim_assert_eq!(fstring.format(&values, true)?, "2024-01-01-1234");
        Ok(())
    }

    #[test]
    fn format_missing_argument() -> eyre::Result<()> {
        crate::tests::init();
        let fstring = PythonFormatString::parse("Bump version to {new_version}")?;
        let empty: HashMap<&str, &str> = HashMap::new();
        sim_assert_eq!(
            fstring.format(&empty, true),
            Err(MissingArgumentError("new_version".to_string()))
        );
        sim_assert_eq!(fstring.format(&empty, false)?, "Bump version to ");
        Ok(())
    }

    #[test]
    fn format_spec_alignment() -> eyre::Result<()> {
        crate::tests::init();
        let spec: FormatSpec = "*^7".parse()?;
        sim_assert_eq!(spec.fill, Some('*'));
        sim_assert_eq!(spec.align, Some(Align::Center));
        sim_assert_eq!(spec.apply("abc"), "**abc**");
        sim_assert_eq!("5".parse::<FormatSpec>()?.apply("ab"), "ab   ");
        sim_assert_eq!("5".parse::<FormatSpec>()?.apply("12"), "   12");
        sim_assert_eq!("04".parse::<FormatSpec>()?.apply("-7"), "-007");
        assert!("03x".parse::<FormatSpec>().is_err());
        Ok(())
    }

    #[test]
    fn invalid_format_spec() {
        crate::tests::init();
        assert!(PythonFormatString::parse("{build_count:zz}").is_err());
    }

    #[test]
    fn f_string_display() -> eyre::Result<()> {
        crate::tests::init();
        let raw_fstring = "{current_date}-{build_count:03} {{literal}}";
        let fstring = PythonFormatString::parse(raw_fstring)?;
        sim_assert_eq!(&fstring.to_string(), raw_fstring);
        Ok(())
    }
}
