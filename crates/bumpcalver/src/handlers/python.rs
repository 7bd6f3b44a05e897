use super::{Error, FileType, Locator, VersionHandler, find_pattern, replace_pattern, splice};

/// `NAME = "value"` assignments, e.g. `__version__ = "2024-01-01-001"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonHandler;

fn assignment_regex(name: &str) -> Result<regex::Regex, regex::Error> {
    regex::RegexBuilder::new(&format!(
        r#"^[ \t]*{}[ \t]*=[ \t]*(?:"(?P<double>[^"\r\n]*)"|'(?P<single>[^'\r\n]*)')[ \t]*(?:#[^\r\n]*)?\r?$"#,
        regex::escape(name.trim())
    ))
    .multi_line(true)
    .build()
}

/// The byte range of the quoted value assigned to `name`.
fn value_span(contents: &str, name: &str) -> Result<Option<std::ops::Range<usize>>, Error> {
    let regex = assignment_regex(name).map_err(|err| Error::parse(FileType::Python, err))?;
    Ok(regex.captures(contents).and_then(|captures| {
        captures
            .name("double")
            .or_else(|| captures.name("single"))
            .map(|m| m.range())
    }))
}

impl VersionHandler for PythonHandler {
    fn file_type(&self) -> FileType {
        FileType::Python
    }

    fn supports(&self, _locator: &Locator) -> bool {
        true
    }

    fn find_version(&self, contents: &str, locator: &Locator) -> Result<Option<String>, Error> {
        match locator {
            Locator::Variable(variable) | Locator::Section { variable, .. } => {
                Ok(value_span(contents, variable)?.map(|span| contents[span].to_string()))
            }
            Locator::Pattern(pattern) => Ok(find_pattern(contents, pattern)),
        }
    }

    fn replace_version(
        &self,
        contents: &str,
        locator: &Locator,
        new_version: &str,
    ) -> Result<Option<String>, Error> {
        match locator {
            Locator::Variable(variable) | Locator::Section { variable, .. } => Ok(
                value_span(contents, variable)?.map(|span| splice(contents, span, new_version)),
            ),
            Locator::Pattern(pattern) => Ok(replace_pattern(contents, pattern, new_version)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PythonHandler;
    use crate::handlers::{Locator, VersionHandler};
    use color_eyre::eyre;
    use similar_asserts::assert_eq as sim_assert_eq;

    fn variable(name: &str) -> Locator {
        Locator::Variable(name.to_string())
    }

    #[test]
    fn find_double_and_single_quoted() -> eyre::Result<()> {
        crate::tests::init();
        let contents = indoc::indoc! {r#"
            """Package metadata."""
            __version__ = "2023-09-30-001"
            __author__ = 'someone'
        "#};
        sim_assert_eq!(
            PythonHandler.find_version(contents, &variable("__version__"))?,
            Some("2023-09-30-001".to_string())
        );
        sim_assert_eq!(
            PythonHandler.find_version(contents, &variable("__author__"))?,
            Some("someone".to_string())
        );
        sim_assert_eq!(PythonHandler.find_version(contents, &variable("missing"))?, None);
        Ok(())
    }

    #[test]
    fn does_not_match_partial_identifiers() -> eyre::Result<()> {
        crate::tests::init();
        let contents = indoc::indoc! {r#"
            my__version__ = "1999-01-01-001"
            __version__x = "1999-01-01-002"
            x = __version__ = "1999-01-01-003"
            __version__ = "2023-09-30-004"
        "#};
        sim_assert_eq!(
            PythonHandler.find_version(contents, &variable("__version__"))?,
            Some("2023-09-30-004".to_string())
        );
        let updated = PythonHandler
            .replace_version(contents, &variable("__version__"), "2023-09-30-005")?
            .unwrap();
        sim_assert_eq!(
            updated,
            contents.replace("2023-09-30-004", "2023-09-30-005")
        );
        Ok(())
    }

    #[test]
    fn trailing_comment() -> eyre::Result<()> {
        crate::tests::init();
        let contents = "__version__ = \"2023-09-30-001\"  # managed by bumpcalver\r\n";
        sim_assert_eq!(
            PythonHandler.replace_version(contents, &variable("__version__"), "2023-09-30-002")?,
            Some("__version__ = \"2023-09-30-002\"  # managed by bumpcalver\r\n".to_string())
        );
        sim_assert_eq!(
            PythonHandler.find_version("__version__ = \"1\" + suffix\n", &variable("__version__"))?,
            None
        );
        Ok(())
    }

    #[test]
    fn variable_name_is_escaped() -> eyre::Result<()> {
        crate::tests::init();
        let contents = "a.b = \"x\"\naxb = \"y\"\n";
        sim_assert_eq!(
            PythonHandler.find_version(contents, &variable("a.b"))?,
            Some("x".to_string())
        );
        sim_assert_eq!(PythonHandler.find_version("axb = \"y\"\n", &variable("a.b"))?, None);
        Ok(())
    }

    #[test]
    fn replace_first_occurrence_only() -> eyre::Result<()> {
        crate::tests::init();
        let contents = indoc::indoc! {r#"
            VERSION = '2023-09-30-001'
            if True:
                VERSION = '2023-09-30-001'
        "#};
        let updated = PythonHandler
            .replace_version(contents, &variable("VERSION"), "2023-10-01-001")?
            .unwrap();
        sim_assert_eq!(
            updated,
            indoc::indoc! {r#"
                VERSION = '2023-10-01-001'
                if True:
                    VERSION = '2023-09-30-001'
            "#}
        );
        Ok(())
    }

    #[test]
    fn preserves_crlf_line_endings() -> eyre::Result<()> {
        crate::tests::init();
        let contents = "# header\r\n__version__ = \"2023-09-30-001\"\r\nx = 1\r\n";
        let updated = PythonHandler
            .replace_version(contents, &variable("__version__"), "2023-09-30-002")?
            .unwrap();
        sim_assert_eq!(
            updated,
            "# header\r\n__version__ = \"2023-09-30-002\"\r\nx = 1\r\n"
        );
        Ok(())
    }

    #[test]
    fn pattern_fallback() -> eyre::Result<()> {
        crate::tests::init();
        let contents = "setup(name=\"demo\", version=\"2023-09-30-001\")\n";
        let locator = Locator::Pattern(regex::Regex::new(r#"version="([^"]*)""#)?);
        sim_assert_eq!(
            PythonHandler.find_version(contents, &locator)?,
            Some("2023-09-30-001".to_string())
        );
        sim_assert_eq!(
            PythonHandler.replace_version(contents, &locator, "2023-09-30-002")?,
            Some("setup(name=\"demo\", version=\"2023-09-30-002\")\n".to_string())
        );
        Ok(())
    }

    #[test]
    fn update_file_twice_is_idempotent() -> eyre::Result<()> {
        crate::tests::init();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("version.py");
        std::fs::write(&path, "__version__ = \"2023-09-30-001\"\n")?;

        let locator = variable("__version__");
        assert!(PythonHandler.update_version(&path, &locator, "2023-09-30-002"));
        let first = std::fs::read(&path)?;
        assert!(!PythonHandler.update_version(&path, &locator, "2023-09-30-002"));
        sim_assert_eq!(std::fs::read(&path)?, first);
        sim_assert_eq!(
            PythonHandler.read_version(&path, &locator),
            Some("2023-09-30-002".to_string())
        );
        Ok(())
    }

    #[test]
    fn missing_file() -> eyre::Result<()> {
        crate::tests::init();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing.py");
        let locator = variable("__version__");
        sim_assert_eq!(PythonHandler.read_version(&path, &locator), None);
        assert!(!PythonHandler.update_version(&path, &locator, "2023-09-30-002"));
        assert!(!path.exists());
        Ok(())
    }
}
