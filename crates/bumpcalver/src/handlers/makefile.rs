use super::{Error, FileType, Locator, VersionHandler, find_pattern, replace_pattern, splice};

/// `NAME = value` and `NAME := value` variables of a makefile.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakefileHandler;

fn assignment_regex(name: &str) -> Result<regex::Regex, Error> {
    regex::RegexBuilder::new(&format!(
        r"^[ \t]*{}[ \t]*:?=[ \t]*(?P<value>[^ \t\r\n](?:[^\r\n]*[^ \t\r\n])?)[ \t]*\r?$",
        regex::escape(name.trim())
    ))
    .multi_line(true)
    .build()
    .map_err(|err| Error::parse(FileType::Makefile, err))
}

fn value_span(contents: &str, name: &str) -> Result<Option<std::ops::Range<usize>>, Error> {
    Ok(assignment_regex(name)?
        .captures(contents)
        .and_then(|captures| captures.name("value"))
        .map(|m| m.range()))
}

impl VersionHandler for MakefileHandler {
    fn file_type(&self) -> FileType {
        FileType::Makefile
    }

    fn supports(&self, locator: &Locator) -> bool {
        matches!(locator, Locator::Variable(_) | Locator::Pattern(_))
    }

    fn find_version(&self, contents: &str, locator: &Locator) -> Result<Option<String>, Error> {
        match locator {
            Locator::Variable(variable) => {
                Ok(value_span(contents, variable)?.map(|span| contents[span].to_string()))
            }
            Locator::Pattern(pattern) => Ok(find_pattern(contents, pattern)),
            Locator::Section { .. } => Err(Error::unsupported_locator(FileType::Makefile, locator)),
        }
    }

    fn replace_version(
        &self,
        contents: &str,
        locator: &Locator,
        new_version: &str,
    ) -> Result<Option<String>, Error> {
        match locator {
            Locator::Variable(variable) => Ok(
                value_span(contents, variable)?.map(|span| splice(contents, span, new_version)),
            ),
            Locator::Pattern(pattern) => Ok(replace_pattern(contents, pattern, new_version)),
            Locator::Section { .. } => Err(Error::unsupported_locator(FileType::Makefile, locator)),
        }
    }
}
