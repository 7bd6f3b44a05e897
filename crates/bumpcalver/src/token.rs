//! The `<date>[-<build count>]` version convention.
//!
//! A [`VersionToken`] is parsed transiently from whatever a format handler found in a file.
//! New versions are produced by rendering a [`VersionFormatTemplate`].
use crate::f_string::{self, PythonFormatString};
use std::collections::HashMap;

pub const DEFAULT_VERSION_FORMAT: &str = "{current_date}-{build_count:03}";

pub const CURRENT_DATE: &str = "current_date";
pub const BUILD_COUNT: &str = "build_count";

static VERSION_TOKEN_REGEX: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| {
        regex::RegexBuilder::new(
            r"^(?:(?P<prefix>[A-Za-z]+)-)?(?P<date>\d{4}-\d{2}-\d{2})(?:[-.](?P<build>.*))?$",
        )
        .build()
        .unwrap()
    });

/// A parsed calendar version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionToken {
    /// Pre-release marker such as `beta`, without the trailing dash.
    pub prefix: Option<String>,
    /// Date in `YYYY-MM-DD` form.
    pub date: String,
    /// Builds produced on `date`. Zero if absent or not a number.
    pub build_count: u32,
}

impl VersionToken {
    /// Parse a raw version string.
    ///
    /// Returns `None` if there is no `NNNN-NN-NN` date to be found.
    /// A trailing build segment that is not a valid integer is logged and counted as `0`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let captures = VERSION_TOKEN_REGEX.captures(raw)?;
        let prefix = captures.name("prefix").map(|m| m.as_str().to_string());
        let date = captures.name("date")?.as_str().to_string();
        let build_count = match captures.name("build").map(|m| m.as_str()) {
            None | Some("") => 0,
            Some(build) => match build.parse::<u32>() {
                Ok(count) => count,
                Err(err) => {
                    tracing::warn!(
                        version = raw,
                        build,
                        "invalid build count ({err}), resetting to 1"
                    );
                    0
                }
            },
        };
        Some(Self {
            prefix,
            date,
            build_count,
        })
    }

    /// Is this version from `current_date`?
    #[must_use]
    pub fn is_from(&self, current_date: &str) -> bool {
        self.date == current_date
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error(transparent)]
    Format(#[from] f_string::Error),
    #[error("unknown placeholder {name:?} in version format (expected `{{current_date}}` or `{{build_count}}`)")]
    UnknownArgument { name: String },
}

/// Template for new versions, e.g. `{current_date}-{build_count:03}`.
///
/// Only `current_date` and `build_count` may be referenced, which makes rendering infallible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionFormatTemplate(PythonFormatString);

impl Default for VersionFormatTemplate {
    fn default() -> Self {
        DEFAULT_VERSION_FORMAT
            .parse()
            .unwrap_or_else(|_| unreachable!("default version format is valid"))
    }
}

impl std::fmt::Display for VersionFormatTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for VersionFormatTemplate {
    type Err = TemplateError;

    fn from_str(template: &str) -> Result<Self, Self::Err> {
        let format_string = PythonFormatString::parse(template)?;
        if let Some(name) = format_string
            .named_arguments()
            .find(|name| ![CURRENT_DATE, BUILD_COUNT].contains(name))
        {
            return Err(TemplateError::UnknownArgument {
                name: name.to_string(),
            });
        }
        Ok(Self(format_string))
    }
}

impl VersionFormatTemplate {
    /// Render the version for `current_date` and `build_count`.
    #[must_use]
    pub fn render(&self, current_date: &str, build_count: u32) -> String {
        let build_count = build_count.to_string();
        let values: HashMap<&str, &str> = [
            (CURRENT_DATE, current_date),
            (BUILD_COUNT, build_count.as_str()),
        ]
        .into_iter()
        .collect();
        // every argument was checked to be one of the two values above
        self.0.format(&values, false).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{TemplateError, VersionFormatTemplate, VersionToken};
    use color_eyre::eyre;
    use similar_asserts::assert_eq as sim_assert_eq;

    #[test]
    fn parse_date_and_build_count() {
        crate::tests::init();
        sim_assert_eq!(
            VersionToken::parse("2023-09-30-001"),
            Some(VersionToken {
                prefix: None,
                date: "2023-09-30".to_string(),
                build_count: 1,
            })
        );
        sim_assert_eq!(
            VersionToken::parse("beta-2024-10-11-042"),
            Some(VersionToken {
                prefix: Some("beta".to_string()),
                date: "2024-10-11".to_string(),
                build_count: 42,
            })
        );
    }

    #[test]
    fn parse_missing_or_invalid_build_count() {
        crate::tests::init();
        let token = VersionToken::parse("2023-09-30").unwrap();
        sim_assert_eq!(token.build_count, 0);

        let token = VersionToken::parse("2023-09-30-abc").unwrap();
        sim_assert_eq!(token.date, "2023-09-30");
        sim_assert_eq!(token.build_count, 0);

        let token = VersionToken::parse("2023-09-30-99999999999999").unwrap();
        sim_assert_eq!(token.build_count, 0);
    }

    #[test]
    fn parse_without_date() {
        crate::tests::init();
        for raw in ["v0.1.0", "", "2023-9-30-001", "release-candidate", "20230930"] {
            sim_assert_eq!(VersionToken::parse(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn parse_datetime_version() {
        crate::tests::init();
        let token = VersionToken::parse("2024-01-01-1530").unwrap();
        sim_assert_eq!(token.date, "2024-01-01");
        sim_assert_eq!(token.build_count, 1530);
    }

    #[test]
    fn render_default_template() {
        crate::tests::init();
        let template = VersionFormatTemplate::default();
        sim_assert_eq!(template.render("2023-09-30", 2), "2023-09-30-002");
        sim_assert_eq!(template.render("2023-09-30", 0), "2023-09-30-000");
        sim_assert_eq!(template.render("2023-09-30", 1000), "2023-09-30-1000");
        sim_assert_eq!(template.render("2023-09-30", u32::MAX), "2023-09-30-4294967295");
    }

    #[test]
    fn render_parse_render_is_stable() {
        crate::tests::init();
        let template = VersionFormatTemplate::default();
        let cases = [
            ("2023-09-30", 0),
            ("2024-02-29", 1),
            ("1999-12-31", 999),
            ("2024-01-01", 12345),
        ];
        for (date, count) in cases {
            let rendered = template.render(date, count);
            let token = VersionToken::parse(&rendered).unwrap();
            sim_assert_eq!(template.render(&token.date, token.build_count), rendered);
        }
    }

    #[test]
    fn custom_template() -> eyre::Result<()> {
        crate::tests::init();
        let template: VersionFormatTemplate = "{current_date}.{build_count}".parse()?;
        sim_assert_eq!(template.render("2024-05-06", 3), "2024-05-06.3");
        sim_assert_eq!(template.to_string(), "{current_date}.{build_count}");
        Ok(())
    }

    #[test]
    fn template_with_unknown_argument() {
        crate::tests::init();
        sim_assert_eq!(
            "{current_date}-{build}".parse::<VersionFormatTemplate>(),
            Err(TemplateError::UnknownArgument {
                name: "build".to_string()
            })
        );
        assert!("{current_date".parse::<VersionFormatTemplate>().is_err());
    }
}
