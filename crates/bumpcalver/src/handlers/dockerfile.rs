use super::{Error, FileType, Locator, VersionHandler, splice};

/// `LABEL`, `ARG` and `ENV` instructions of a container descriptor.
///
/// Two declaration styles are recognized:
///
/// - key=value: `ARG VERSION=2024-01-01-001`, `LABEL version="2024-01-01-001"`
/// - key-space-value: `ENV VERSION 2024-01-01-001`
///
/// An update rewrites the first declaration of every style that is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerfileHandler;

const VALUE: &str =
    r#"(?:"(?P<double>[^"\r\n]*)"|'(?P<single>[^'\r\n]*)'|(?P<bare>[^\s"'=][^\s"']*))"#;

/// Other `key=value` pairs preceding the one we look for on the same instruction.
const OTHER_PAIRS: &str = r#"(?:[^\s=]+[ \t]*=[ \t]*(?:"[^"\r\n]*"|'[^'\r\n]*'|[^\s"']\S*)?[ \t]+)*?"#;

fn declaration_regexes(name: &str) -> Result<[regex::Regex; 2], Error> {
    let name = regex::escape(name.trim());
    let key_value =
        format!(r"^[ \t]*(?i:LABEL|ARG|ENV)[ \t]+{OTHER_PAIRS}{name}[ \t]*=[ \t]*{VALUE}");
    let key_space_value = format!(r"^[ \t]*(?i:ENV)[ \t]+{name}[ \t]+{VALUE}");
    let build = |pattern: &str| {
        regex::RegexBuilder::new(pattern)
            .multi_line(true)
            .build()
            .map_err(|err| Error::parse(FileType::Dockerfile, err))
    };
    Ok([build(&key_value)?, build(&key_space_value)?])
}

fn value_span(regex: &regex::Regex, contents: &str) -> Option<std::ops::Range<usize>> {
    let captures = regex.captures(contents)?;
    captures
        .name("double")
        .or_else(|| captures.name("single"))
        .or_else(|| captures.name("bare"))
        .map(|m| m.range())
}

fn variable(locator: &Locator) -> Result<&str, Error> {
    match locator {
        Locator::Variable(variable) => Ok(variable),
        Locator::Section { .. } | Locator::Pattern(_) => {
            Err(Error::unsupported_locator(FileType::Dockerfile, locator))
        }
    }
}

impl VersionHandler for DockerfileHandler {
    fn file_type(&self) -> FileType {
        FileType::Dockerfile
    }

    fn supports(&self, locator: &Locator) -> bool {
        matches!(locator, Locator::Variable(_))
    }

    fn find_version(&self, contents: &str, locator: &Locator) -> Result<Option<String>, Error> {
        let regexes = declaration_regexes(variable(locator)?)?;
        Ok(regexes
            .iter()
            .find_map(|regex| value_span(regex, contents))
            .map(|span| contents[span].to_string()))
    }

    fn replace_version(
        &self,
        contents: &str,
        locator: &Locator,
        new_version: &str,
    ) -> Result<Option<String>, Error> {
        let regexes = declaration_regexes(variable(locator)?)?;
        let mut updated: Option<String> = None;
        for regex in &regexes {
            let current = updated.as_deref().unwrap_or(contents);
            if let Some(span) = value_span(regex, current) {
                updated = Some(splice(current, span, new_version));
            }
        }
        Ok(updated)
    }
}
