use super::{Error, FileType, Locator, VersionHandler};

/// Tables such as `pyproject.toml` or `Cargo.toml`.
///
/// Edits go through a [`toml_edit::DocumentMut`], so formatting and comments of the
/// document survive a rewrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlHandler;

fn parse(contents: &str) -> Result<toml_edit::DocumentMut, Error> {
    contents
        .parse::<toml_edit::DocumentMut>()
        .map_err(|err| Error::parse(FileType::Toml, err))
}

fn key_path(locator: &Locator) -> Result<(Vec<&str>, &str), Error> {
    locator
        .key_path()
        .ok_or_else(|| Error::unsupported_locator(FileType::Toml, locator))
}

fn get<'a>(
    table: &'a dyn toml_edit::TableLike,
    section: &[&str],
    key: &str,
) -> Option<&'a toml_edit::Value> {
    let mut table = table;
    for name in section {
        table = table.get(name)?.as_table_like()?;
    }
    table.get(key)?.as_value()
}

fn get_mut<'a>(
    table: &'a mut dyn toml_edit::TableLike,
    section: &[&str],
    key: &str,
) -> Option<&'a mut toml_edit::Value> {
    let mut table = table;
    for name in section {
        table = table.get_mut(name)?.as_table_like_mut()?;
    }
    table.get_mut(key)?.as_value_mut()
}

/// The value as it would be written, without surrounding whitespace or comments.
fn value_to_string(value: &toml_edit::Value) -> String {
    match value.as_str() {
        Some(value) => value.to_string(),
        None => {
            let mut value = value.clone();
            value.decor_mut().clear();
            value.to_string()
        }
    }
}

impl VersionHandler for TomlHandler {
    fn file_type(&self) -> FileType {
        FileType::Toml
    }

    fn supports(&self, locator: &Locator) -> bool {
        locator.key_path().is_some()
    }

    fn find_version(&self, contents: &str, locator: &Locator) -> Result<Option<String>, Error> {
        let (section, key) = key_path(locator)?;
        let document = parse(contents)?;
        Ok(get(document.as_table(), &section, key).map(value_to_string))
    }

    fn replace_version(
        &self,
        contents: &str,
        locator: &Locator,
        new_version: &str,
    ) -> Result<Option<String>, Error> {
        let (section, key) = key_path(locator)?;
        let mut document = parse(contents)?;
        let Some(value) = get_mut(document.as_table_mut(), &section, key) else {
            return Ok(None);
        };
        let decor = value.decor().clone();
        let mut new_value = toml_edit::Value::from(new_version);
        *new_value.decor_mut() = decor;
        *value = new_value;
        Ok(Some(document.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::TomlHandler;
    use crate::handlers::{Locator, VersionHandler};
    use color_eyre::eyre;
    use similar_asserts::assert_eq as sim_assert_eq;

    fn section(section: &str, variable: &str) -> Locator {
        Locator::Section {
            section: section.to_string(),
            variable: variable.to_string(),
        }
    }

    static PYPROJECT: &str = indoc::indoc! {r#"
        [project]
        name = "demo" # the name
        version = "2023-09-30-001"   # managed by bumpcalver

        [tool.poetry]
        version = "2023-09-30-001"
        inline = { version = "2023-09-30-001" }
    "#};

    #[test]
    fn find_in_sections() -> eyre::Result<()> {
        crate::tests::init();
        sim_assert_eq!(
            TomlHandler.find_version(PYPROJECT, &section("project", "version"))?,
            Some("2023-09-30-001".to_string())
        );
        sim_assert_eq!(
            TomlHandler.find_version(PYPROJECT, &section("tool.poetry.inline", "version"))?,
            Some("2023-09-30-001".to_string())
        );
        sim_assert_eq!(
            TomlHandler.find_version(PYPROJECT, &section("tool.missing", "version"))?,
            None
        );
        sim_assert_eq!(
            TomlHandler.find_version(PYPROJECT, &Locator::Variable("version".into()))?,
            None
        );
        Ok(())
    }

    #[test]
    fn replace_preserves_formatting() -> eyre::Result<()> {
        crate::tests::init();
        let updated = TomlHandler
            .replace_version(PYPROJECT, &section("project", "version"), "2024-01-01-001")?
            .unwrap();
        sim_assert_eq!(
            updated,
            PYPROJECT.replacen(
                "version = \"2023-09-30-001\"   # managed",
                "version = \"2024-01-01-001\"   # managed",
                1
            )
        );
        Ok(())
    }

    #[test]
    fn replace_top_level_key() -> eyre::Result<()> {
        crate::tests::init();
        let contents = "version = \"2023-09-30-001\"\nname = \"demo\"\n";
        sim_assert_eq!(
            TomlHandler.replace_version(
                contents,
                &Locator::Variable("version".into()),
                "2023-09-30-002"
            )?,
            Some("version = \"2023-09-30-002\"\nname = \"demo\"\n".to_string())
        );
        Ok(())
    }

    #[test]
    fn never_inserts_missing_keys() -> eyre::Result<()> {
        crate::tests::init();
        sim_assert_eq!(
            TomlHandler.replace_version(
                PYPROJECT,
                &section("project", "release"),
                "2024-01-01-001"
            )?,
            None
        );
        sim_assert_eq!(
            TomlHandler.replace_version(
                PYPROJECT,
                &section("package", "version"),
                "2024-01-01-001"
            )?,
            None
        );
        Ok(())
    }

    #[test]
    fn invalid_toml_and_pattern_locator() -> eyre::Result<()> {
        crate::tests::init();
        assert!(
            TomlHandler
                .find_version("[project\nversion = 1", &section("project", "version"))
                .is_err()
        );
        let pattern = Locator::Pattern(regex::Regex::new("(.*)")?);
        assert!(!TomlHandler.supports(&pattern));
        assert!(TomlHandler.find_version(PYPROJECT, &pattern).is_err());
        Ok(())
    }

    #[test]
    fn update_missing_section_leaves_file_unchanged() -> eyre::Result<()> {
        crate::tests::init();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pyproject.toml");
        std::fs::write(&path, PYPROJECT)?;
        assert!(!TomlHandler.update_version(&path, &section("package", "version"), "2024-01-01-001"));
        sim_assert_eq!(std::fs::read_to_string(&path)?, PYPROJECT);
        Ok(())
    }
}
