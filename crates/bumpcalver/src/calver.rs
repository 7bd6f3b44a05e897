//! Computes the next calendar version from the version currently found in a file.
use crate::{
    files::FileTarget,
    handlers::Registry,
    token::{VersionFormatTemplate, VersionToken},
};

/// The build count following `previous` on `current_date`.
///
/// Counting restarts at `1` on a new date or when there is no previous version.
#[must_use]
pub fn next_build_count(previous: Option<&VersionToken>, current_date: &str) -> u32 {
    match previous {
        Some(token) if token.is_from(current_date) => token.build_count.saturating_add(1),
        Some(_) | None => 1,
    }
}

/// Read the version currently stored in `target`.
///
/// Failures are logged and reported as `None`.
#[must_use]
pub fn read_current_version(registry: &Registry, target: &FileTarget) -> Option<String> {
    let handler = match registry.resolve(&target.file_type) {
        Ok(handler) => handler,
        Err(err) => {
            tracing::warn!(path = ?target.path, "{err}");
            return None;
        }
    };
    let Some(locator) = target.locator.as_ref() else {
        tracing::warn!(path = ?target.path, "no variable or pattern configured");
        return None;
    };
    handler.read_version(&target.path, locator)
}

/// Compute the next version for `target`.
///
/// If the version found in the file is from `current_date`, its build count is incremented.
/// Otherwise, or if no version can be read, counting starts at `1`.
#[must_use]
pub fn build_version(
    registry: &Registry,
    target: &FileTarget,
    template: &VersionFormatTemplate,
    current_date: &str,
) -> String {
    let previous = match read_current_version(registry, target) {
        Some(raw) => {
            let token = VersionToken::parse(&raw);
            if token.is_none() {
                tracing::warn!(
                    path = ?target.path,
                    version = raw,
                    "version does not start with a date, starting a new build count"
                );
            }
            token
        }
        None => {
            tracing::warn!(
                path = ?target.path,
                "could not read version from {}, starting a new build count",
                target.path.display()
            );
            None
        }
    };
    let build_count = next_build_count(previous.as_ref(), current_date);
    let version = template.render(current_date, build_count);
    tracing::debug!(?previous, build_count, version, "computed build version");
    version
}

#[cfg(test)]
mod tests {
    use super::{build_version, next_build_count};
    use crate::{
        files::FileTarget,
        handlers::{Locator, Registry},
        token::{VersionFormatTemplate, VersionToken},
    };
    use color_eyre::eyre;
    use similar_asserts::assert_eq as sim_assert_eq;

    fn python_target(path: std::path::PathBuf) -> FileTarget {
        FileTarget {
            path,
            file_type: "python".to_string(),
            locator: Some(Locator::Variable("__version__".to_string())),
        }
    }

    #[test]
    fn next_build_count_same_and_different_date() {
        crate::tests::init();
        let token = VersionToken::parse("2023-09-30-041").unwrap();
        sim_assert_eq!(next_build_count(Some(&token), "2023-09-30"), 42);
        sim_assert_eq!(next_build_count(Some(&token), "2023-10-01"), 1);
        sim_assert_eq!(next_build_count(None, "2023-10-01"), 1);

        let token = VersionToken {
            prefix: None,
            date: "2023-09-30".to_string(),
            build_count: u32::MAX,
        };
        sim_assert_eq!(next_build_count(Some(&token), "2023-09-30"), u32::MAX);
    }

    #[test]
    fn build_version_increments_todays_build() -> eyre::Result<()> {
        crate::tests::init();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("version.py");
        std::fs::write(&path, "__version__ = \"beta-2023-09-30-009\"\n")?;
        let version = build_version(
            &Registry::default(),
            &python_target(path),
            &VersionFormatTemplate::default(),
            "2023-09-30",
        );
        sim_assert_eq!(version, "2023-09-30-010");
        Ok(())
    }

    #[test]
    fn build_version_unsupported_format_or_missing_locator() -> eyre::Result<()> {
        crate::tests::init();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("version.py");
        std::fs::write(&path, "__version__ = \"2023-09-30-009\"\n")?;
        let registry = Registry::default();
        let template = VersionFormatTemplate::default();

        let mut target = python_target(path);
        target.file_type = "ini".to_string();
        sim_assert_eq!(
            build_version(&registry, &target, &template, "2023-09-30"),
            "2023-09-30-001"
        );

        target.file_type = "python".to_string();
        target.locator = None;
        sim_assert_eq!(
            build_version(&registry, &target, &template, "2023-09-30"),
            "2023-09-30-001"
        );
        Ok(())
    }

    #[test]
    fn build_version_without_date() -> eyre::Result<()> {
        crate::tests::init();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("version.py");
        std::fs::write(&path, "__version__ = \"0.1.0\"\n")?;
        let version = build_version(
            &Registry::default(),
            &python_target(path),
            &VersionFormatTemplate::default(),
            "2023-09-30",
        );
        sim_assert_eq!(version, "2023-09-30-001");
        Ok(())
    }
}
