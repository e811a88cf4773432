//! Shared-library configuration injection.
//!
//! A shared library that wants its own configuration exposes a
//! [`ConfigurationProvider`] from its [`HostModule`](crate::loading::HostModule).
//! Before any component is created, the host hands each provider the
//! section at `shared-libraries:<module name>`, exactly once.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::config::tree::{ConfigSection, ConfigTree};
use crate::error::{BoxError, HostError};
use crate::loading::LoadedModule;

/// Root section under which shared libraries find their configuration.
pub const SHARED_LIBRARIES_SECTION: &str = "shared-libraries";

/// Capability a shared library implements to receive its configuration.
pub trait ConfigurationProvider: Send + Sync {
    /// Called once with the library's section, which may be absent.
    fn apply_configuration(&self, section: &ConfigSection) -> Result<(), BoxError>;
}

/// Provider that materializes the section into `T` before applying it.
pub struct TypedConfigurationProvider<T, F> {
    apply: F,
    _shape: PhantomData<fn(T)>,
}

impl<T, F> TypedConfigurationProvider<T, F>
where
    T: DeserializeOwned,
    F: Fn(Option<T>) -> Result<(), BoxError> + Send + Sync,
{
    pub fn new(apply: F) -> Self {
        Self {
            apply,
            _shape: PhantomData,
        }
    }
}

impl<T, F> ConfigurationProvider for TypedConfigurationProvider<T, F>
where
    T: DeserializeOwned,
    F: Fn(Option<T>) -> Result<(), BoxError> + Send + Sync,
{
    fn apply_configuration(&self, section: &ConfigSection) -> Result<(), BoxError> {
        let settings = section.bind::<T>()?;
        (self.apply)(settings)
    }
}

/// Hand every shared library that asks for it its configuration section.
///
/// Returns the names of the libraries that were configured.
pub fn apply_shared_library_configuration(
    modules: &[LoadedModule],
    configuration: &ConfigTree,
) -> Result<Vec<String>, HostError> {
    let mut configured = Vec::new();
    for module in modules {
        let Some(provider) = module.module().configuration_provider() else {
            continue;
        };

        let section = configuration.section(&format!("{}:{}", SHARED_LIBRARIES_SECTION, module.name()));
        provider
            .apply_configuration(&section)
            .map_err(|source| HostError::SharedLibraryConfiguration {
                module: module.name().to_string(),
                source,
            })?;

        tracing::info!(library = %module.name(), present = section.exists(), "Set configuration for shared library");
        configured.push(module.name().to_string());
    }
    Ok(configured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::{HostModule, LoadedModule};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Deserialize, PartialEq, Clone)]
    struct MyLibSettings {
        endpoint: String,
        retries: u32,
    }

    struct ConfiguredLibrary {
        received: Arc<Mutex<Vec<Option<MyLibSettings>>>>,
        provider: TypedConfigurationProvider<MyLibSettings, Box<dyn Fn(Option<MyLibSettings>) -> Result<(), BoxError> + Send + Sync>>,
    }

    impl ConfiguredLibrary {
        fn new() -> Self {
            let received = Arc::new(Mutex::new(Vec::new()));
            let sink = received.clone();
            let apply: Box<dyn Fn(Option<MyLibSettings>) -> Result<(), BoxError> + Send + Sync> =
                Box::new(move |settings| {
                    sink.lock().unwrap().push(settings);
                    Ok(())
                });
            Self {
                received,
                provider: TypedConfigurationProvider::new(apply),
            }
        }
    }

    impl HostModule for ConfiguredLibrary {
        fn configuration_provider(&self) -> Option<&dyn ConfigurationProvider> {
            Some(&self.provider)
        }
    }

    struct PlainLibrary;

    impl HostModule for PlainLibrary {}

    fn loaded(name: &str, module: Arc<dyn HostModule>) -> LoadedModule {
        LoadedModule::new(name, format!("/modules/{}.bin", name), module)
    }

    #[test]
    fn test_provider_receives_its_section() {
        let library = Arc::new(ConfiguredLibrary::new());
        let received = library.received.clone();
        let tree = ConfigTree::from_value(json!({
            "shared-libraries": {
                "MyLib": {"endpoint": "tcp://mq:5672", "retries": 3},
                "other": {"endpoint": "x", "retries": 0}
            }
        }))
        .unwrap();

        let modules = vec![loaded("mylib", library), loaded("plain", Arc::new(PlainLibrary))];
        let configured = apply_shared_library_configuration(&modules, &tree).unwrap();

        assert_eq!(configured, vec!["mylib".to_string()]);
        assert_eq!(
            *received.lock().unwrap(),
            vec![Some(MyLibSettings {
                endpoint: "tcp://mq:5672".into(),
                retries: 3
            })]
        );
    }

    #[test]
    fn test_provider_receives_absent_section() {
        let library = Arc::new(ConfiguredLibrary::new());
        let received = library.received.clone();
        let modules = vec![loaded("mylib", library)];
        apply_shared_library_configuration(&modules, &ConfigTree::new()).unwrap();
        assert_eq!(*received.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_module_without_provider_is_skipped() {
        let modules = vec![loaded("plain", Arc::new(PlainLibrary))];
        let configured = apply_shared_library_configuration(&modules, &ConfigTree::new()).unwrap();
        assert!(configured.is_empty());
    }

    #[test]
    fn test_shape_mismatch_is_fatal() {
        let library = Arc::new(ConfiguredLibrary::new());
        let tree = ConfigTree::from_value(json!({
            "shared-libraries": {"mylib": {"endpoint": 42}}
        }))
        .unwrap();
        let modules = vec![loaded("mylib", library)];
        let err = apply_shared_library_configuration(&modules, &tree).unwrap_err();
        assert!(matches!(err, HostError::SharedLibraryConfiguration { ref module, .. } if module == "mylib"));
    }
}
