use std::{env, sync::Once};

use fiisplorer::{
    config,
    controller::{PageController, ViewStatus},
    search::SearchFilters,
};

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn init_config_once() -> &'static config::Config {
    INIT.call_once(|| {
        set_default_env("FIISPLORER_BACKEND_URL", "http://127.0.0.1:8000");
    });
    config::init_config().expect("valid live configuration")
}

#[tokio::test]
#[ignore = "Requires live search backend"]
async fn live_backend_answers_search() {
    let config = init_config_once();
    let controller = PageController::from_config(config).expect("controller");
    let snapshot = controller
        .search("reglamento", &SearchFilters::default())
        .await;
    assert_eq!(
        snapshot.status,
        ViewStatus::Ready,
        "backend at {} should answer: {snapshot:?}",
        config.backend_url
    );
    assert!(
        snapshot
            .results
            .windows(2)
            .all(|pair| pair[0].score >= pair[1].score),
        "results must be ordered by score"
    );
}
