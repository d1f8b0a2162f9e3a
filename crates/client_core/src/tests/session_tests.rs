use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::{FileId, ModelId},
    error::SessionError,
};
use tokio::sync::{Mutex, Semaphore};

use super::*;
use crate::ResourceFetcher;

struct ScriptedFetcher {
    models: Vec<ModelId>,
    files: Vec<FileId>,
    keywords: HashMap<String, Value>,
    results: HashMap<(String, String), Value>,
    fail_model_list: bool,
    // base -> number of scripted failures before the fetch starts succeeding
    keyword_failures: Mutex<HashMap<String, u32>>,
    // keyword fetches for this base block until the semaphore gets a permit
    block_keywords_for: Option<(String, Arc<Semaphore>)>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetcher {
    fn scenario() -> Self {
        let models = vec![ModelId::from("m1"), ModelId::from("m2")];
        let files = vec![
            FileId::from("a.jpg"),
            FileId::from("b.jpg"),
            FileId::from("c.jpg"),
        ];
        let mut keywords = HashMap::new();
        let mut results = HashMap::new();
        for file in &files {
            let base = file.base_name().to_string();
            keywords.insert(base.clone(), json!({ "keywords": [base.clone()] }));
            for model in &models {
                results.insert(
                    (model.0.clone(), base.clone()),
                    json!({ "model": model.0, "base": base, "score": 0.5 }),
                );
            }
        }
        Self {
            models,
            files,
            keywords,
            results,
            fail_model_list: false,
            keyword_failures: Mutex::new(HashMap::new()),
            block_keywords_for: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_files(mut self, files: &[&str]) -> Self {
        self.files = files.iter().map(|file| FileId::from(*file)).collect();
        self
    }

    fn without_result(mut self, model: &str, base: &str) -> Self {
        self.results.remove(&(model.to_string(), base.to_string()));
        self
    }

    fn failing_model_list(mut self) -> Self {
        self.fail_model_list = true;
        self
    }

    fn with_keyword_failures(self, base: &str, failures: u32) -> Self {
        self.keyword_failures
            .try_lock()
            .expect("unshared at setup")
            .insert(base.to_string(), failures);
        self
    }

    fn with_blocked_keywords(mut self, base: &str, gate: Arc<Semaphore>) -> Self {
        self.block_keywords_for = Some((base.to_string(), gate));
        self
    }

    async fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|recorded| recorded.as_str() == call)
            .count()
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn model_list(&self) -> Result<Vec<ModelId>> {
        self.calls.lock().await.push("models".to_string());
        if self.fail_model_list {
            return Err(anyhow!("scripted model list failure"));
        }
        Ok(self.models.clone())
    }

    async fn file_list(&self) -> Result<Vec<FileId>> {
        self.calls.lock().await.push("files".to_string());
        Ok(self.files.clone())
    }

    async fn keywords(&self, base: &str) -> Result<Value> {
        self.calls.lock().await.push(format!("keywords/{base}"));
        if let Some((blocked, gate)) = &self.block_keywords_for {
            if blocked == base {
                let _permit = gate.acquire().await?;
            }
        }
        {
            let mut failures = self.keyword_failures.lock().await;
            if let Some(remaining) = failures.get_mut(base) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(anyhow!("scripted keywords failure for '{base}'"));
                }
            }
        }
        self.keywords
            .get(base)
            .cloned()
            .ok_or_else(|| anyhow!("no keywords for '{base}'"))
    }

    async fn result(&self, model: &ModelId, base: &str) -> Result<Value> {
        self.calls.lock().await.push(format!("result/{model}/{base}"));
        self.results
            .get(&(model.0.clone(), base.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("no result for '{model}/{base}'"))
    }

    async fn image(&self, file: &FileId) -> Result<Vec<u8>> {
        self.calls.lock().await.push(format!("image/{file}"));
        Ok(vec![0xFF, 0xD8])
    }
}

fn controller(fetcher: ScriptedFetcher) -> (SessionController, Arc<Mutex<Vec<String>>>) {
    let calls = Arc::clone(&fetcher.calls);
    (SessionController::new(Arc::new(fetcher)), calls)
}

fn pretty(value: Value) -> String {
    serde_json::to_string_pretty(&value).expect("pretty")
}

#[tokio::test]
async fn initial_state_selects_first_file_and_distinct_models() {
    let (controller, _) = controller(ScriptedFetcher::scenario());
    let snapshot = controller.initialize().await.expect("initialize");

    assert_eq!(snapshot.position, Some(0));
    assert_eq!(snapshot.current_file, Some(FileId::from("a.jpg")));
    assert_eq!(snapshot.slot_a, Some(ModelId::from("m1")));
    assert_eq!(snapshot.slot_b, Some(ModelId::from("m2")));
    assert!(!snapshot.back_enabled);
    assert!(snapshot.forward_enabled);
    assert_eq!(snapshot.panel_a.header, "m1");
    assert_eq!(snapshot.panel_b.header, "m2");
    assert_eq!(
        snapshot.keywords_text,
        pretty(json!({ "keywords": ["a"] }))
    );
}

#[tokio::test]
async fn forward_navigation_clamps_at_the_last_file() {
    let (controller, _) = controller(ScriptedFetcher::scenario());
    controller.initialize().await.expect("initialize");

    controller.navigate(Direction::Forward).await.expect("forward");
    let snapshot = controller.navigate(Direction::Forward).await.expect("forward");
    assert_eq!(snapshot.current_file, Some(FileId::from("c.jpg")));
    assert_eq!(snapshot.position, Some(2));
    assert!(snapshot.back_enabled);
    assert!(!snapshot.forward_enabled);

    let clamped = controller.navigate(Direction::Forward).await.expect("no-op");
    assert_eq!(clamped, snapshot);
}

#[tokio::test]
async fn forward_then_back_returns_to_the_same_position() {
    let (controller, _) = controller(ScriptedFetcher::scenario());
    controller.initialize().await.expect("initialize");
    controller.navigate(Direction::Forward).await.expect("forward");

    let before = controller.snapshot().await;
    controller.navigate(Direction::Forward).await.expect("forward");
    let after = controller.navigate(Direction::Back).await.expect("back");

    assert_eq!(after.position, before.position);
    assert_eq!(after.current_file, before.current_file);
}

#[tokio::test]
async fn back_is_a_noop_at_position_zero() {
    let (controller, calls) = controller(ScriptedFetcher::scenario());
    controller.initialize().await.expect("initialize");
    let fetches_after_init = calls.lock().await.len();

    let snapshot = controller.navigate(Direction::Back).await.expect("no-op");
    assert_eq!(snapshot.position, Some(0));
    assert!(!snapshot.back_enabled);
    assert_eq!(calls.lock().await.len(), fetches_after_init);
}

#[tokio::test]
async fn revisiting_a_file_reuses_the_cache() {
    let fetcher = ScriptedFetcher::scenario();
    let calls = Arc::clone(&fetcher.calls);
    let controller = SessionController::new(Arc::new(fetcher));
    let first = controller.initialize().await.expect("initialize");

    controller.navigate(Direction::Forward).await.expect("forward");
    let revisited = controller.navigate(Direction::Back).await.expect("back");

    let keyword_fetches = calls
        .lock()
        .await
        .iter()
        .filter(|call| call.as_str() == "keywords/a")
        .count();
    assert_eq!(keyword_fetches, 1);
    assert_eq!(revisited.keywords_text, first.keywords_text);
    assert_eq!(revisited.panel_a, first.panel_a);
    assert_eq!(revisited.panel_b, first.panel_b);
}

#[tokio::test]
async fn failed_fetches_are_never_cached() {
    let fetcher = ScriptedFetcher::scenario().with_keyword_failures("a", 1);
    let calls = Arc::clone(&fetcher.calls);
    let controller = SessionController::new(Arc::new(fetcher));

    let snapshot = controller.initialize().await.expect("initialize");
    assert_eq!(snapshot.keywords_text, PLACEHOLDER_TEXT);

    let snapshot = controller.refresh_content().await.expect("refresh");
    assert_eq!(
        snapshot.keywords_text,
        pretty(json!({ "keywords": ["a"] }))
    );
    let keyword_fetches = calls
        .lock()
        .await
        .iter()
        .filter(|call| call.as_str() == "keywords/a")
        .count();
    assert_eq!(keyword_fetches, 2);
}

#[tokio::test]
async fn changing_slot_b_leaves_slot_a_and_keywords_untouched() {
    let fetcher = ScriptedFetcher::scenario();
    let controller = SessionController::new(Arc::new(fetcher));
    let before = controller.initialize().await.expect("initialize");

    let after = controller
        .set_model(PanelSlot::B, ModelId::from("m1"))
        .await
        .expect("set model");

    assert_eq!(after.panel_a, before.panel_a);
    assert_eq!(after.keywords_text, before.keywords_text);
    assert_eq!(after.panel_b.header, "m1");
    assert_ne!(after.panel_b, before.panel_b);
    assert_eq!(after.position, before.position);
}

#[tokio::test]
async fn cached_result_is_reused_across_slots() {
    let fetcher = ScriptedFetcher::scenario();
    let calls = Arc::clone(&fetcher.calls);
    let controller = SessionController::new(Arc::new(fetcher));
    controller.initialize().await.expect("initialize");

    // Slot B now points at m1, whose result for "a" is already cached from
    // slot A's initial load.
    controller
        .set_model(PanelSlot::B, ModelId::from("m1"))
        .await
        .expect("set model");

    let m1_fetches = calls
        .lock()
        .await
        .iter()
        .filter(|call| call.as_str() == "result/m1/a")
        .count();
    assert_eq!(m1_fetches, 1);
}

#[tokio::test]
async fn missing_result_degrades_only_its_own_slot() {
    let fetcher = ScriptedFetcher::scenario().without_result("m1", "a");
    let controller = SessionController::new(Arc::new(fetcher));

    let snapshot = controller.initialize().await.expect("initialize");
    assert_eq!(snapshot.panel_a.text, PLACEHOLDER_TEXT);
    assert_ne!(snapshot.panel_b.text, PLACEHOLDER_TEXT);
    assert_ne!(snapshot.keywords_text, PLACEHOLDER_TEXT);
}

#[tokio::test]
async fn unknown_file_is_rejected_without_moving() {
    let (controller, _) = controller(ScriptedFetcher::scenario());
    controller.initialize().await.expect("initialize");

    let err = controller
        .select_file(&FileId::from("zz.jpg"))
        .await
        .expect_err("unknown file");
    assert!(matches!(err, SessionError::NotFound(_)));

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.position, Some(0));
    assert_eq!(snapshot.current_file, Some(FileId::from("a.jpg")));
}

#[tokio::test]
async fn enumeration_failure_is_fatal() {
    let (controller, _) = controller(ScriptedFetcher::scenario().failing_model_list());
    let err = controller.initialize().await.expect_err("fatal");
    assert!(matches!(err, SessionError::Initialization(_)));

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.position, None);
    assert!(!snapshot.back_enabled);
    assert!(!snapshot.forward_enabled);
}

#[tokio::test]
async fn empty_file_list_leaves_the_session_inactive() {
    let fetcher = ScriptedFetcher::scenario().with_files(&[]);
    let calls = Arc::clone(&fetcher.calls);
    let controller = SessionController::new(Arc::new(fetcher));

    let snapshot = controller.initialize().await.expect("initialize");
    assert_eq!(snapshot.position, None);
    assert_eq!(snapshot.current_file, None);
    assert!(!snapshot.back_enabled);
    assert!(!snapshot.forward_enabled);
    assert!(calls
        .lock()
        .await
        .iter()
        .all(|call| !call.starts_with("keywords/")));
}

#[tokio::test]
async fn stale_refresh_does_not_overwrite_a_newer_selection() {
    let gate = Arc::new(Semaphore::new(0));
    let fetcher = ScriptedFetcher::scenario()
        .with_files(&["b.jpg", "a.jpg"])
        .with_blocked_keywords("a", Arc::clone(&gate));
    let controller = Arc::new(SessionController::new(Arc::new(fetcher)));
    controller.initialize().await.expect("initialize");

    let slow = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.select_file(&FileId::from("a.jpg")).await })
    };
    // Let the slow refresh capture its generation and park on the gate.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    controller
        .select_file(&FileId::from("b.jpg"))
        .await
        .expect("newer selection");

    gate.add_permits(1);
    slow.await.expect("join").expect("stale refresh completes");

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.current_file, Some(FileId::from("b.jpg")));
    assert_eq!(
        snapshot.keywords_text,
        pretty(json!({ "keywords": ["b"] }))
    );
}
