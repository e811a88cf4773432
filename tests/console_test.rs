//! The console driver changes the working directory, so it runs in its own
//! test binary.

mod common;

use std::time::Duration;

use serde_json::json;

use common::{entries, journal, write, FixtureModule};
use hostbox::config::PlaceholderPattern;
use hostbox::hosting::{ConsoleHost, HostingBase};
use hostbox::lifecycle::Shutdown;
use hostbox::{ConfigTree, ModuleCatalog};

#[tokio::test]
async fn test_console_host_runs_until_shutdown() {
    let app = tempfile::tempdir().unwrap();
    let shared = tempfile::tempdir().unwrap();
    write(&app.path().join("service.bin"), "");
    write(&app.path().join("orders.bin"), "");
    write(
        &app.path().join("service.deps.json"),
        r#"{"dependencies":[{"name":"orders"}]}"#,
    );

    let journal = journal();
    let catalog = ModuleCatalog::new().with_module(
        "orders",
        FixtureModule {
            names: vec!["intake", "billing"],
            journal: journal.clone(),
        },
    );
    let base = HostingBase::new(
        &app.path().join("service.bin"),
        vec![shared.path().to_path_buf()],
        ConfigTree::from_value(json!({ "configuration": "Production" })).unwrap(),
        PlaceholderPattern::default(),
        catalog,
    )
    .unwrap();

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    let observed = journal.clone();
    tokio::spawn(async move {
        // Trigger only once every component has started.
        for _ in 0..200 {
            if entries(&observed).iter().any(|e| e == "start:billing") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        trigger.trigger();
    });

    tokio::time::timeout(Duration::from_secs(5), ConsoleHost::new(base).run(shutdown))
        .await
        .expect("console host did not stop")
        .unwrap();

    assert_eq!(
        entries(&journal),
        vec![
            "create:intake",
            "create:billing",
            "start:intake",
            "start:billing",
            "stop:intake",
            "stop:billing",
        ]
    );
    assert_eq!(
        std::env::current_dir().unwrap().canonicalize().unwrap(),
        app.path().canonicalize().unwrap()
    );
}
