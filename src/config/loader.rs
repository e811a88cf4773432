//! Configuration loading from disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::files::{shared_library_files, ConfigFileSet};
use crate::config::template::{PlaceholderPattern, TemplateValues};
use crate::config::tree::ConfigTree;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed configuration file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration file {} must contain a JSON object", .path.display())]
    NotAnObject { path: PathBuf },

    #[error("invalid placeholder pattern `{pattern}`: {reason}")]
    Placeholder { pattern: String, reason: String },

    #[error("configuration section `{section}` does not match the requested shape")]
    Bind {
        section: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a JSON file into a tree. A missing file yields `None`.
pub fn read_json_file(path: &Path) -> Result<Option<ConfigTree>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let value: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    ConfigTree::from_value(value)
        .map(Some)
        .ok_or_else(|| ConfigError::NotAnObject {
            path: path.to_path_buf(),
        })
}

/// Builds the effective configuration tree for one environment.
#[derive(Debug, Clone)]
pub struct ConfigAssembler {
    defaults: ConfigTree,
    placeholder: PlaceholderPattern,
}

impl ConfigAssembler {
    /// `defaults` is the host configuration (host settings file plus
    /// environment variables); every file layer is merged over it.
    pub fn new(defaults: ConfigTree, placeholder: PlaceholderPattern) -> Self {
        Self { defaults, placeholder }
    }

    /// Assemble the tree for `environment` from the files under `base_path`
    /// and the shared-library search paths. Stops at the first bad file.
    pub fn assemble(
        &self,
        environment: Option<&str>,
        base_path: &Path,
        shared_library_paths: &[PathBuf],
    ) -> Result<ConfigTree, ConfigError> {
        let files = ConfigFileSet::new(environment, base_path);
        let values = TemplateValues::load(&files.template_values_file())?;
        tracing::debug!(
            environment = files.environment().unwrap_or(""),
            values = values.len(),
            pattern = %self.placeholder.as_str(),
            "Assembling configuration"
        );

        let mut tree = self.defaults.clone();

        for library in shared_library_files(shared_library_paths)? {
            if let Some(mut layer) = read_json_file(&library.path)? {
                self.placeholder.apply(&mut layer, &values);
                let mut scoped = ConfigTree::new();
                scoped.set(&format!("shared-libraries:{}", library.library), layer.to_value());
                tree.merge(scoped);
                tracing::debug!(
                    library = %library.library,
                    path = %library.path.display(),
                    "Shared library configuration file loaded"
                );
            }
        }

        self.merge_file(&mut tree, &files.base_file(), &values)?;

        for path in files.environment_files() {
            self.merge_file(&mut tree, &path, &values)?;
        }

        Ok(tree)
    }

    fn merge_file(&self, tree: &mut ConfigTree, path: &Path, values: &TemplateValues) -> Result<(), ConfigError> {
        match read_json_file(path)? {
            Some(mut layer) => {
                self.placeholder.apply(&mut layer, values);
                tree.merge(layer);
                tracing::trace!(path = %path.display(), "Configuration file loaded");
            }
            None => {
                tracing::trace!(path = %path.display(), "Optional configuration file not present");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_environment_files_override_base_with_substitution() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", r#"{"x":1}"#);
        write(dir.path(), "appsettings.production.json", r#"{"x":2,"y":"${V}"}"#);
        write(dir.path(), "values.json", r#"{"V":"hello"}"#);

        let assembler = ConfigAssembler::new(ConfigTree::new(), PlaceholderPattern::default());
        let tree = assembler.assemble(Some("production"), dir.path(), &[]).unwrap();
        assert_eq!(tree.to_value(), json!({"x": 2, "y": "hello"}));
    }

    #[test]
    fn test_local_override_has_highest_precedence() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", r#"{"a":"base","b":"base","c":"base"}"#);
        write(dir.path(), "appsettings.dev.json", r#"{"b":"env","c":"env"}"#);
        write(dir.path(), "appsettings.dev.local.json", r#"{"c":"local"}"#);

        let assembler = ConfigAssembler::new(ConfigTree::new(), PlaceholderPattern::default());
        let tree = assembler.assemble(Some("dev"), dir.path(), &[]).unwrap();
        assert_eq!(tree.to_value(), json!({"a": "base", "b": "env", "c": "local"}));
    }

    #[test]
    fn test_missing_files_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = ConfigTree::from_value(json!({"configuration": "staging"})).unwrap();
        let assembler = ConfigAssembler::new(defaults.clone(), PlaceholderPattern::default());
        let tree = assembler.assemble(Some("staging"), dir.path(), &[]).unwrap();
        assert_eq!(tree, defaults);
    }

    #[test]
    fn test_files_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", r#"{"common":{"logging":{"level":"debug"}}}"#);
        let defaults = ConfigTree::from_value(json!({"common": {"logging": {"level": "info", "format": "json"}}})).unwrap();
        let assembler = ConfigAssembler::new(defaults, PlaceholderPattern::default());
        let tree = assembler.assemble(None, dir.path(), &[]).unwrap();
        assert_eq!(tree.get_str("common:logging:level"), Some("debug"));
        assert_eq!(tree.get_str("common:logging:format"), Some("json"));
    }

    #[test]
    fn test_malformed_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", r#"{"x":1}"#);
        write(dir.path(), "appsettings.qa.json", r#"{"x": "#);

        let assembler = ConfigAssembler::new(ConfigTree::new(), PlaceholderPattern::default());
        let err = assembler.assemble(Some("qa"), dir.path(), &[]).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert!(path.ends_with("appsettings.qa.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_values_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "values.json", "not json");
        let assembler = ConfigAssembler::new(ConfigTree::new(), PlaceholderPattern::default());
        let err = assembler.assemble(None, dir.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("values.json"));
    }

    #[test]
    fn test_non_object_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", "[1, 2]");
        let assembler = ConfigAssembler::new(ConfigTree::new(), PlaceholderPattern::default());
        let err = assembler.assemble(None, dir.path(), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject { .. }));
    }

    #[test]
    fn test_application_files_override_shared_library_defaults() {
        let app = tempfile::tempdir().unwrap();
        let libs = tempfile::tempdir().unwrap();
        write(
            app.path(),
            "appsettings.json",
            r#"{"shared-libraries":{"mylib":{"a":"base","b":"base","c":"base"}}}"#,
        );
        write(
            libs.path(),
            "MyLib.settings.json",
            r#"{"b":"lib","c":"lib","d":"lib","endpoint":"${Host}:9000"}"#,
        );
        write(
            app.path(),
            "appsettings.prod.json",
            r#"{"shared-libraries":{"mylib":{"c":"env"}}}"#,
        );
        write(app.path(), "values.json", r#"{"host":"mq.internal"}"#);

        let assembler = ConfigAssembler::new(ConfigTree::new(), PlaceholderPattern::default());
        let tree = assembler
            .assemble(Some("prod"), app.path(), &[libs.path().to_path_buf()])
            .unwrap();
        assert_eq!(
            tree.value("shared-libraries:mylib"),
            Some(&json!({"a": "base", "b": "base", "c": "env", "d": "lib", "endpoint": "mq.internal:9000"}))
        );
    }

    #[test]
    fn test_custom_placeholder_pattern() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "appsettings.json", r##"{"url":"#{Host}#/${Host}"}"##);
        write(dir.path(), "values.json", r#"{"Host":"h"}"#);
        let pattern = PlaceholderPattern::new(r"#\{(\w+)\}#").unwrap();
        let assembler = ConfigAssembler::new(ConfigTree::new(), pattern);
        let tree = assembler.assemble(None, dir.path(), &[]).unwrap();
        assert_eq!(tree.get_str("url"), Some("h/${Host}"));
    }
}
