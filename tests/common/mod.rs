//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use hostbox::config::ConfigSection;
use hostbox::loading::{DiscoveredFactory, LoadContext};
use hostbox::{
    BoxError, Component, ComponentFactory, ConfigTree, ConfigurationProvider, HostModule, ModuleCatalog,
    ModuleLoader,
};

/// Ordered record of lifecycle calls, e.g. `start:a`.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// What a fixture component does when called.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
    Block(Duration),
}

fn behave(behavior: Behavior, phase: &str, name: &str) -> Result<(), BoxError> {
    match behavior {
        Behavior::Succeed => Ok(()),
        Behavior::Fail => Err(format!("{} failed: {}", phase, name).into()),
        Behavior::Panic => panic!("{} panicked: {}", phase, name),
        Behavior::Block(duration) => {
            thread::sleep(duration);
            Ok(())
        }
    }
}

pub struct FixtureComponent {
    name: &'static str,
    journal: Journal,
    start: Behavior,
    stop: Behavior,
}

impl Component for FixtureComponent {
    fn start(&self) -> Result<(), BoxError> {
        self.journal.lock().unwrap().push(format!("start:{}", self.name));
        behave(self.start, "start", self.name)
    }

    fn stop(&self) -> Result<(), BoxError> {
        self.journal.lock().unwrap().push(format!("stop:{}", self.name));
        behave(self.stop, "stop", self.name)
    }
}

pub struct FixtureFactory {
    pub name: &'static str,
    pub journal: Journal,
    pub start: Behavior,
    pub stop: Behavior,
    pub construct_fails: bool,
}

impl ComponentFactory for FixtureFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn create_component(
        &self,
        _loader: Arc<dyn ModuleLoader>,
        _configuration: Arc<ConfigTree>,
    ) -> Result<Arc<dyn Component>, BoxError> {
        if self.construct_fails {
            return Err(format!("cannot build {}", self.name).into());
        }
        self.journal.lock().unwrap().push(format!("create:{}", self.name));
        Ok(Arc::new(FixtureComponent {
            name: self.name,
            journal: self.journal.clone(),
            start: self.start,
            stop: self.stop,
        }))
    }
}

/// A discovered factory from module `fixture`.
pub fn factory(name: &'static str, journal: &Journal, start: Behavior, stop: Behavior) -> DiscoveredFactory {
    DiscoveredFactory {
        module: "fixture".to_string(),
        factory: Box::new(FixtureFactory {
            name,
            journal: journal.clone(),
            start,
            stop,
            construct_fails: false,
        }),
    }
}

pub fn failing_factory(name: &'static str, journal: &Journal) -> DiscoveredFactory {
    DiscoveredFactory {
        module: "fixture".to_string(),
        factory: Box::new(FixtureFactory {
            name,
            journal: journal.clone(),
            start: Behavior::Succeed,
            stop: Behavior::Succeed,
            construct_fails: true,
        }),
    }
}

/// Module exporting one well-behaved factory per name.
pub struct FixtureModule {
    pub names: Vec<&'static str>,
    pub journal: Journal,
}

impl HostModule for FixtureModule {
    fn component_factories(&self) -> Vec<Box<dyn ComponentFactory>> {
        self.names
            .iter()
            .map(|name| {
                Box::new(FixtureFactory {
                    name: *name,
                    journal: self.journal.clone(),
                    start: Behavior::Succeed,
                    stop: Behavior::Succeed,
                    construct_fails: false,
                }) as Box<dyn ComponentFactory>
            })
            .collect()
    }
}

/// Shared library recording every section it is handed.
#[derive(Clone, Default)]
pub struct RecordingLibrary {
    pub received: Arc<Mutex<Vec<Option<Value>>>>,
}

impl RecordingLibrary {
    pub fn received(&self) -> Vec<Option<Value>> {
        self.received.lock().unwrap().clone()
    }
}

impl ConfigurationProvider for RecordingLibrary {
    fn apply_configuration(&self, section: &ConfigSection) -> Result<(), BoxError> {
        self.received.lock().unwrap().push(section.value().cloned());
        Ok(())
    }
}

impl HostModule for RecordingLibrary {
    fn configuration_provider(&self) -> Option<&dyn ConfigurationProvider> {
        Some(self)
    }
}

pub fn empty_loader() -> Arc<dyn ModuleLoader> {
    Arc::new(LoadContext::new(ModuleCatalog::new()))
}

/// Write `contents` to `path`, creating parent directories.
pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
