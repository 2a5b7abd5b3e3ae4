// ../tests/tests.rs
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use athanor::ai::{Capability, StructuredRequest};
use athanor::commands::{self, Command};
use athanor::error::{AIError, AppError, GameError};
use athanor::game_state::{
    AddOutcome, AddSubstanceHook, GameState, WorldSnapshot, cosine_similarity,
};
use athanor::save;
use athanor::substance::Substance;

/// Plays back canned structured replies keyed by schema name and embeds by
/// keyword lookup, so the game logic runs without a network.
struct ScriptedOracle {
    replies: Mutex<HashMap<String, VecDeque<Value>>>,
    calls: Mutex<Vec<(String, String)>>,
    embeddings: Vec<(String, Vec<f32>)>,
}

impl ScriptedOracle {
    fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            embeddings: Vec::new(),
        }
    }

    /// Queues one reply for the given schema name.
    fn script(self, schema_name: &str, reply: Value) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(schema_name.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Texts containing `needle` embed to `embedding`; everything else falls
    /// back to a fixed vector.
    fn embedding(mut self, needle: &str, embedding: Vec<f32>) -> Self {
        self.embeddings.push((needle.to_string(), embedding));
        self
    }

    /// The user prompts seen for a schema name, in call order.
    fn calls_for(&self, schema_name: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == schema_name)
            .map(|(_, user)| user.clone())
            .collect()
    }

    fn remaining(&self) -> usize {
        self.replies.lock().unwrap().values().map(VecDeque::len).sum()
    }
}

#[async_trait]
impl Capability for ScriptedOracle {
    async fn generate_structured(&self, request: StructuredRequest<'_>) -> Result<Value, AIError> {
        self.calls.lock().unwrap().push((
            request.schema_name.to_string(),
            request.user.unwrap_or_default().to_string(),
        ));
        self.replies
            .lock()
            .unwrap()
            .get_mut(request.schema_name)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                AIError::SchemaMismatch(format!("unscripted call: {}", request.schema_name))
            })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AIError> {
        for (needle, embedding) in &self.embeddings {
            if text.contains(needle.as_str()) {
                return Ok(embedding.clone());
            }
        }
        Ok(vec![1.0, 0.0, 0.0, 0.0])
    }
}

fn noop_hook() -> AddSubstanceHook {
    Arc::new(|_| {})
}

fn counting_hook() -> (AddSubstanceHook, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let hook: AddSubstanceHook = Arc::new(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (hook, count)
}

fn make_substance(name: &str, symbol: &str, embedding: Vec<f32>) -> Substance {
    Substance {
        name: name.to_string(),
        description: format!("the primal essence of {name}"),
        symbol: symbol.to_string(),
        pictogram: format!("a sealed flask holding {name}"),
        embedding,
    }
}

fn preloaded(substances: Vec<Substance>, hook: AddSubstanceHook) -> GameState {
    GameState::from_snapshot(WorldSnapshot { substances }, hook)
}

#[tokio::test]
async fn colliding_symbol_is_reresolved() {
    let oracle = ScriptedOracle::new()
        .script("copy_verdict", json!({ "is_copy": false }))
        .script("substance_symbol", json!({ "symbol": "Vn" }));
    let (hook, admitted) = counting_hook();
    let mut state = preloaded(
        vec![make_substance("water", "W", vec![1.0, 0.0, 0.0, 0.0])],
        hook,
    );

    let candidate = make_substance("wine", "W", vec![0.0, 1.0, 0.0, 0.0]);
    let outcome = state.add(&oracle, candidate).await.unwrap();

    assert_eq!(outcome, AddOutcome::Admitted);
    assert_eq!(state.substances().len(), 2);
    let wine = state.find_symbol("Vn").expect("wine admitted under a new symbol");
    assert_eq!(wine.name, "wine");
    assert_ne!(state.substances()[0].symbol, state.substances()[1].symbol);
    assert_eq!(admitted.load(Ordering::SeqCst), 1);

    // The rejected proposal was fed back to the symbol generator.
    let prompts = oracle.calls_for("substance_symbol");
    assert!(prompts[0].contains("CANNOT be used: W"));
}

#[tokio::test]
async fn copy_candidates_are_rejected() {
    let oracle = ScriptedOracle::new().script("copy_verdict", json!({ "is_copy": true }));
    let (hook, admitted) = counting_hook();
    let mut state = preloaded(
        vec![make_substance("water", "W", vec![1.0, 0.0, 0.0, 0.0])],
        hook,
    );

    let candidate = make_substance("sea water", "Sw", vec![0.9, 0.1, 0.0, 0.0]);
    let outcome = state.add(&oracle, candidate).await.unwrap();

    assert_eq!(outcome, AddOutcome::Duplicate);
    assert_eq!(state.substances().len(), 1);
    assert_eq!(admitted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn search_ranks_own_text_first() {
    let oracle = ScriptedOracle::new()
        .embedding("water", vec![1.0, 0.0, 0.0, 0.0])
        .embedding("fire", vec![0.0, 1.0, 0.0, 0.0])
        .embedding("earth", vec![0.0, 0.0, 1.0, 0.0]);
    let state = preloaded(
        vec![
            make_substance("water", "W", vec![1.0, 0.0, 0.0, 0.0]),
            make_substance("fire", "F", vec![0.0, 1.0, 0.0, 0.0]),
            make_substance("earth", "E", vec![0.0, 0.0, 1.0, 0.0]),
        ],
        noop_hook(),
    );

    let results = state
        .search(&oracle, "the primal essence of fire")
        .await
        .unwrap();

    assert_eq!(results[0].name, "fire");
}

#[tokio::test]
async fn starters_seed_only_once() {
    let mut oracle = ScriptedOracle::new()
        .embedding("water", vec![1.0, 0.0, 0.0, 0.0])
        .embedding("fire", vec![0.0, 1.0, 0.0, 0.0])
        .embedding("earth", vec![0.0, 0.0, 1.0, 0.0])
        .embedding("air", vec![0.0, 0.0, 0.0, 1.0]);
    for (name, symbol) in [("water", "W"), ("fire", "F"), ("earth", "E"), ("air", "A")] {
        oracle = oracle
            .script(
                "substance_description",
                json!({ "description": format!("the primal essence of {name}") }),
            )
            .script("substance_symbol", json!({ "symbol": symbol }))
            .script("substance_pictogram", json!({ "pictogram": "a plain triangle" }))
            .script("copy_verdict", json!({ "is_copy": false }));
    }
    let mut state = GameState::new(noop_hook());

    state.seed_starters(&oracle).await.unwrap();

    let names: Vec<&str> = state.substances().iter().map(|s| s.name.as_str()).collect();
    let symbols: Vec<&str> = state.substances().iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(names, ["water", "fire", "earth", "air"]);
    assert_eq!(symbols, ["W", "F", "E", "A"]);
    assert_eq!(oracle.remaining(), 0);

    // A populated world must not re-seed: the script is exhausted, so any
    // AI call here would fail the test.
    state.seed_starters(&oracle).await.unwrap();
    assert_eq!(state.substances().len(), 4);
}

#[tokio::test]
async fn copy_check_caps_neighbors_at_five() {
    let oracle = ScriptedOracle::new().script("copy_verdict", json!({ "is_copy": true }));
    let substances = (0..10)
        .map(|i| {
            make_substance(
                &format!("salt {i}"),
                &format!("S{i}"),
                vec![1.0, i as f32 * 0.01, 0.0, 0.0],
            )
        })
        .collect();
    let mut state = preloaded(substances, noop_hook());

    state
        .add(&oracle, make_substance("salt", "S", vec![1.0, 0.0, 0.0, 0.0]))
        .await
        .unwrap();

    let prompts = oracle.calls_for("copy_verdict");
    let neighbor_lines = prompts[0]
        .lines()
        .filter(|line| line.starts_with("salt "))
        .count();
    assert_eq!(neighbor_lines, 5);
}

#[tokio::test]
async fn symbol_resolution_gives_up() {
    let mut oracle = ScriptedOracle::new().script("copy_verdict", json!({ "is_copy": false }));
    for _ in 0..10 {
        oracle = oracle.script("substance_symbol", json!({ "symbol": "X" }));
    }
    let mut state = preloaded(
        vec![make_substance("salt", "X", vec![1.0, 0.0, 0.0, 0.0])],
        noop_hook(),
    );

    let result = state
        .add(&oracle, make_substance("saltpeter", "X", vec![0.0, 1.0, 0.0, 0.0]))
        .await;

    assert!(matches!(
        result,
        Err(AppError::Game(GameError::SymbolResolutionExhausted(_)))
    ));
    assert_eq!(state.substances().len(), 1);
    assert_eq!(oracle.remaining(), 0);
}

#[tokio::test]
async fn empty_process_reports_failure() {
    let oracle = ScriptedOracle::new()
        .script(
            "alchemical_process",
            json!({ "process": "Both essences are boiled away to nothing.", "problems": null }),
        )
        .script("process_results", json!({ "results": [] }));
    let mut state = preloaded(
        vec![
            make_substance("water", "W", vec![1.0, 0.0, 0.0, 0.0]),
            make_substance("fire", "F", vec![0.0, 1.0, 0.0, 0.0]),
        ],
        noop_hook(),
    );

    let replies = commands::dispatch(
        &mut state,
        &oracle,
        Command::Process {
            image_url: "https://example.com/cauldron.png".to_string(),
            symbols: vec!["W".to_string(), "F".to_string()],
        },
    )
    .await
    .unwrap();

    assert_eq!(replies.last().map(String::as_str), Some("The process failed."));
    assert_eq!(state.substances().len(), 2);
    // The factory is never consulted for a failed process.
    assert!(oracle.calls_for("substance_description").is_empty());
}

#[tokio::test]
async fn problems_are_relayed_before_the_description() {
    let oracle = ScriptedOracle::new()
        .script(
            "alchemical_process",
            json!({
                "process": "The water is brought to a rolling boil over the flame.",
                "problems": "The flask is cracked."
            }),
        )
        .script("process_results", json!({ "results": ["steam"] }))
        .script(
            "substance_description",
            json!({ "description": "a hot, rising vapor" }),
        )
        .script("substance_symbol", json!({ "symbol": "St" }))
        .script("substance_pictogram", json!({ "pictogram": "three wavy lines" }))
        .script("copy_verdict", json!({ "is_copy": false }));
    let mut state = preloaded(
        vec![
            make_substance("water", "W", vec![1.0, 0.0, 0.0, 0.0]),
            make_substance("fire", "F", vec![0.0, 1.0, 0.0, 0.0]),
        ],
        noop_hook(),
    );

    let replies = commands::dispatch(
        &mut state,
        &oracle,
        Command::Process {
            image_url: "https://example.com/cauldron.png".to_string(),
            symbols: vec!["W".to_string(), "F".to_string()],
        },
    )
    .await
    .unwrap();

    assert_eq!(replies[0], "The flask is cracked.");
    assert_eq!(replies[1], "The water is brought to a rolling boil over the flame.");
    assert_eq!(state.substances().len(), 3);
    assert_eq!(state.substances()[2].name, "steam");

    // The problems text travels into the second AI exchange.
    let prompts = oracle.calls_for("process_results");
    assert!(prompts[0].contains("Problems with this process: The flask is cracked."));
    // The first exchange lists pictograms, not descriptions.
    let prompts = oracle.calls_for("alchemical_process");
    assert!(prompts[0].contains("water: a sealed flask holding water"));
}

#[tokio::test]
async fn unknown_symbol_aborts_the_command() {
    let oracle = ScriptedOracle::new();
    let mut state = preloaded(
        vec![make_substance("water", "W", vec![1.0, 0.0, 0.0, 0.0])],
        noop_hook(),
    );

    let failure = commands::dispatch(
        &mut state,
        &oracle,
        Command::Process {
            image_url: "https://example.com/x.png".to_string(),
            symbols: vec!["Q".to_string()],
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        &failure,
        AppError::Game(GameError::UnknownSymbol(symbol)) if symbol == "Q"
    ));
    assert_eq!(
        commands::error_reply(&failure),
        "Substance Q not found. Please try again."
    );
    assert!(oracle.calls_for("alchemical_process").is_empty());
}

#[tokio::test]
async fn listing_pages_by_ten() {
    let substances = (0..23)
        .map(|i| make_substance(&format!("salt {i}"), &format!("S{i}"), vec![1.0, 0.0, 0.0, 0.0]))
        .collect();
    let mut state = preloaded(substances, noop_hook());

    let replies = commands::dispatch(&mut state, &ScriptedOracle::new(), Command::Substances)
        .await
        .unwrap();

    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0].lines().count(), 10);
    assert_eq!(replies[2].lines().count(), 3);
}

#[test]
fn commands_parse() {
    assert_eq!(
        Command::parse("!process https://example.com/a.png W F"),
        Some(Command::Process {
            image_url: "https://example.com/a.png".to_string(),
            symbols: vec!["W".to_string(), "F".to_string()],
        })
    );
    assert_eq!(Command::parse("!substances"), Some(Command::Substances));
    assert_eq!(
        Command::parse("!ssearch molten glass"),
        Some(Command::Search {
            query: "molten glass".to_string(),
        })
    );
    assert_eq!(Command::parse("!process"), None);
    assert_eq!(Command::parse("!ssearch   "), None);
    assert_eq!(Command::parse("hello there"), None);
}

#[test]
fn announcement_leads_with_the_symbol() {
    let substance = make_substance("water", "W", vec![1.0, 0.0, 0.0, 0.0]);
    let text = commands::announcement(&substance);
    assert!(text.starts_with("# W\n**water**\n"));
    assert!(text.ends_with("_a sealed flask holding water_"));
}

#[test]
fn cosine_identical_vectors() {
    let v = [1.0f32, 2.0, 3.0];
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-10);
}

#[test]
fn cosine_orthogonal_vectors() {
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-10);
}

#[test]
fn cosine_zero_vector_counts_as_unrelated() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
}

#[test]
fn cosine_length_mismatch_counts_as_unrelated() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
}

#[test]
fn cosine_empty_counts_as_unrelated() {
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
}

#[test]
fn snapshot_survives_a_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("world.json");
    let snapshot = WorldSnapshot {
        substances: vec![
            make_substance("water", "W", vec![1.0, 0.0, 0.0, 0.0]),
            make_substance("ash", "As", vec![0.0, 0.25, -0.5, 1.0]),
        ],
    };

    save::save_world(&path, &snapshot).expect("save");
    let restored = save::load_world(&path).expect("load");

    assert_eq!(restored, snapshot);
    // The scratch file is renamed away, not left behind.
    assert!(!path.with_extension("json.tmp").exists());
}
