use std::error::Error;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use tokio::time::{sleep, timeout};

use themesmith::config::model::{ConfigFile, WatchBinding};
use themesmith::engine::Runtime;
use themesmith::pipeline::PipelineSession;
use themesmith::serve::{BridgeMessage, DevServerBridge};
use themesmith::watch::spawn_watcher;

type TestResult = Result<(), Box<dyn Error>>;

/// Full loop: a scripted edit to the entry stylesheet is picked up by the
/// watcher, rebuilds both bundle variants and pushes one CSS-inject update
/// to the browsers.
#[tokio::test(flavor = "multi_thread")]
async fn style_edit_rewrites_both_bundles_and_pushes_a_live_update() -> TestResult {
    let dir = tempdir()?;
    let entry = dir.path().join("sass/base/global.scss");
    fs::create_dir_all(entry.parent().ok_or("no parent")?)?;
    fs::write(&entry, "body {\n  margin: 0;\n}\n")?;

    let mut cfg = ConfigFile::default();
    // ephemeral port; short debounce keeps the test snappy
    cfg.server.port = 0;
    cfg.server.reload_delay_ms = 50;
    cfg.styles.include_paths = Vec::new();
    cfg.check.clear();
    cfg.watch = vec![WatchBinding {
        patterns: vec!["sass/**/*.{sass,scss}".to_string()],
        exclude: Vec::new(),
        run: vec!["styles".to_string()],
        reload: false,
    }];

    let session = Arc::new(PipelineSession::new(dir.path(), cfg)?);
    let bridge = DevServerBridge::spawn(&session.config().server).await?;
    let mut updates = bridge.subscribe();

    let runtime = Runtime::new(Arc::clone(&session), Some(bridge));
    let events_tx = runtime.events_tx();
    let _watcher = spawn_watcher(dir.path(), session.profiles().to_vec(), events_tx)?;
    tokio::spawn(runtime.run());

    // let the watcher settle before the scripted edit
    sleep(Duration::from_millis(250)).await;
    fs::write(&entry, "body {\n  margin: 0;\n  border-width: 2px;\n}\n")?;

    let hrefs = timeout(Duration::from_secs(15), async {
        loop {
            match updates.recv().await {
                Ok(BridgeMessage::InjectCss { hrefs }) => break hrefs,
                Ok(_) => continue,
                Err(err) => panic!("update stream closed: {err}"),
            }
        }
    })
    .await?;

    assert!(hrefs.contains(&"css/global.min.css".to_string()), "{hrefs:?}");
    assert!(hrefs.contains(&"css/global.css".to_string()), "{hrefs:?}");

    let minified = fs::read_to_string(dir.path().join("css/global.min.css"))?;
    let expanded = fs::read_to_string(dir.path().join("css/global.css"))?;
    assert!(minified.contains("border-width"), "{minified}");
    assert!(expanded.contains("border-width"), "{expanded}");

    Ok(())
}
