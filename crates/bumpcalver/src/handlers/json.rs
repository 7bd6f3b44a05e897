use super::{Error, FileType, Locator, VersionHandler};
use serde_json::Value;

/// Nested objects, e.g. the `version` of a `package.json`.
///
/// The document is re-serialized with two space indentation on update.
/// Key order is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHandler;

fn parse(contents: &str) -> Result<Value, Error> {
    serde_json::from_str(contents).map_err(|err| Error::parse(FileType::Json, err))
}

fn key_path(locator: &Locator) -> Result<(Vec<&str>, &str), Error> {
    locator
        .key_path()
        .ok_or_else(|| Error::unsupported_locator(FileType::Json, locator))
}

fn get<'a>(value: &'a Value, section: &[&str], key: &str) -> Option<&'a Value> {
    let mut value = value;
    for name in section {
        value = value.as_object()?.get(*name)?;
    }
    value.as_object()?.get(key)
}

fn get_mut<'a>(value: &'a mut Value, section: &[&str], key: &str) -> Option<&'a mut Value> {
    let mut value = value;
    for name in section {
        value = value.as_object_mut()?.get_mut(*name)?;
    }
    value.as_object_mut()?.get_mut(key)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl VersionHandler for JsonHandler {
    fn file_type(&self) -> FileType {
        FileType::Json
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
        let mut serialized = serde_json::to_string_pretty(&document)
            .map_err(|err| Error::serialize(FileType::Json, err))?;
        if contents.ends_with('\n') {
            serialized.push('\n');
        }
        Ok(Some(serialized))
    }
}
