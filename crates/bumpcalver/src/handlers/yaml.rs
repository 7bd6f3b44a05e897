use super::{Error, FileType, Locator, VersionHandler};
use serde_yaml::Value;

/// Nested mappings, e.g. a `version` key in a helm chart.
///
/// The document is re-serialized on update, so comments are not preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlHandler;

fn parse(contents: &str) -> Result<Value, Error> {
    serde_yaml::from_str(contents).map_err(|err| Error::parse(FileType::Yaml, err))
}

fn key_path(locator: &Locator) -> Result<(Vec<&str>, &str), Error> {
    locator
        .key_path()
        .ok_or_else(|| Error::unsupported_locator(FileType::Yaml, locator))
}

fn get<'a>(value: &'a Value, section: &[&str], key: &str) -> Option<&'a Value> {
    let mut value = value;
    for name in section {
        value = value.as_mapping()?.get(*name)?;
    }
    value.as_mapping()?.get(key)
}

fn get_mut<'a>(value: &'a mut Value, section: &[&str], key: &str) -> Option<&'a mut Value> {
    let mut value = value;
    for name in section {
        value = value.as_mapping_mut()?.get_mut(*name)?;
    }
    value.as_mapping_mut()?.get_mut(key)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

impl VersionHandler for YamlHandler {
    fn file_type(&self) -> FileType {
        FileType::Yaml
    }

    fn supports(&self, locator: &Locator) -> bool {
        locator.key_path().is_some()
    }

    fn find_version(&self, contents: &str, locator: &Locator) -> Result<Option<String>, Error> {
        let (section, key) = key_path(locator)?;
        let document = parse(contents)?;
        Ok(get(&document, &section, key).and_then(scalar_to_string))
    }

    fn replace_version(
        &self,
        contents: &str,
        locator: &Locator,
        new_version: &str,
    ) -> Result<Option<String>, Error> {
        let (section, key) = key_path(locator)?;
        let mut document = parse(contents)?;
        let Some(value) = get_mut(&mut document, &section, key) else {
            return Ok(None);
        };
        *value = Value::String(new_version.to_string());
        let serialized =
            serde_yaml::to_string(&document).map_err(|err| Error::serialize(FileType::Yaml, err))?;
        Ok(Some(serialized))
    }
}

#[cfg(test)]
mod tests {
    use super::YamlHandler;
    use crate::handlers::{Locator, VersionHandler};
    use color_eyre::eyre;
    use similar_asserts::assert_eq as sim_assert_eq;

    static CHART: &str = indoc::indoc! {r#"
        name: demo
        version: "2023-09-30-001"
        app:
          image: demo
          release:
            version: "2023-09-30-001"
    "#};

    fn section(section: &str, variable: &str) -> Locator {
        Locator::Section {
            section: section.to_string(),
            variable: variable.to_string(),
        }
    }

    #[test]
    fn find_top_level_and_nested() -> eyre::Result<()> {
        crate::tests::init();
        sim_assert_eq!(
            YamlHandler.find_version(CHART, &Locator::Variable("version".into()))?,
            Some("2023-09-30-001".to_string())
        );
        sim_assert_eq!(
            YamlHandler.find_version(CHART, &section("app.release", "version"))?,
            Some("2023-09-30-001".to_string())
        );
        sim_assert_eq!(YamlHandler.find_version(CHART, &section("app", "version"))?, None);
        sim_assert_eq!(YamlHandler.find_version(CHART, &section("name", "version"))?, None);
        Ok(())
    }

    #[test]
    fn replace_nested_keeps_other_keys() -> eyre::Result<()> {
        crate::tests::init();
        let updated = YamlHandler
            .replace_version(CHART, &section("app.release", "version"), "2024-01-01-001")?
            .unwrap();
        sim_assert_eq!(
            YamlHandler.find_version(&updated, &section("app.release", "version"))?,
            Some("2024-01-01-001".to_string())
        );
        sim_assert_eq!(
            YamlHandler.find_version(&updated, &Locator::Variable("version".into()))?,
            Some("2023-09-30-001".to_string())
        );
        sim_assert_eq!(
            YamlHandler.find_version(&updated, &section("app", "image"))?,
            Some("demo".to_string())
        );
        Ok(())
    }

    #[test]
    fn never_inserts_missing_keys() -> eyre::Result<()> {
        crate::tests::init();
        sim_assert_eq!(
            YamlHandler.replace_version(CHART, &section("chart", "version"), "2024-01-01-001")?,
            None
        );
        Ok(())
    }

    #[test]
    fn invalid_yaml() {
        crate::tests::init();
        assert!(
            YamlHandler
                .find_version("a: [1, 2", &Locator::Variable("a".into()))
                .is_err()
        );
    }
}
