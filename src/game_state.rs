use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::ai::Capability;
use crate::error::{AppError, GameError};
use crate::substance::{self, Substance};

/// The canonical substances a fresh world begins with, in discovery order.
pub const STARTER_SUBSTANCES: [&str; 4] = ["water", "fire", "earth", "air"];

/// How many nearest neighbors the duplicate check and the search report.
const CLOSEST_NEIGHBORS: usize = 5;

/// How often the symbol generator may be re-asked before an admission fails.
const MAX_SYMBOL_ATTEMPTS: usize = 10;

/// Invoked with every admitted substance; the transport persists the world
/// and broadcasts the discovery from here.
pub type AddSubstanceHook = Arc<dyn Fn(&Substance) + Send + Sync>;

/// The serialized form of the world. The notification hook is process-local
/// and gets re-injected when a snapshot is restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub substances: Vec<Substance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Admitted,
    Duplicate,
}

pub struct GameState {
    substances: Vec<Substance>,
    on_add: AddSubstanceHook,
}

/// Cosine similarity between two embeddings, accumulated in f64. Mismatched
/// lengths, empty vectors and zero vectors all count as zero similarity.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for i in 0..a.len() {
        let (x, y) = (a[i] as f64, b[i] as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 { 0.0 } else { dot / denominator }
}

impl GameState {
    pub fn new(on_add: AddSubstanceHook) -> Self {
        Self {
            substances: Vec::new(),
            on_add,
        }
    }

    /// Rebuilds a world from a restored snapshot, binding the current
    /// process's notification hook.
    pub fn from_snapshot(snapshot: WorldSnapshot, on_add: AddSubstanceHook) -> Self {
        Self {
            substances: snapshot.substances,
            on_add,
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            substances: self.substances.clone(),
        }
    }

    /// All substances, in discovery order.
    pub fn substances(&self) -> &[Substance] {
        &self.substances
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.substances.iter().any(|other| other.symbol == symbol)
    }

    pub fn find_symbol(&self, symbol: &str) -> Option<&Substance> {
        self.substances.iter().find(|other| other.symbol == symbol)
    }

    /// The up-to-five most similar substances, most similar first. The sort
    /// is stable, so equally similar entries keep discovery order.
    fn closest(&self, embedding: &[f32]) -> Vec<&Substance> {
        let mut with_similarity: Vec<(&Substance, f64)> = self
            .substances
            .iter()
            .map(|other| (other, cosine_similarity(embedding, &other.embedding)))
            .collect();
        with_similarity.sort_by(|a, b| b.1.total_cmp(&a.1));
        with_similarity.truncate(CLOSEST_NEIGHBORS);
        with_similarity.into_iter().map(|(other, _)| other).collect()
    }

    /// Admits a candidate substance: checks it against its closest neighbors
    /// for duplication, resolves its symbol to a free one, appends it and
    /// fires the notification hook. A rejected or failed admission leaves the
    /// world untouched.
    pub async fn add<C: Capability>(
        &mut self,
        ai: &C,
        mut candidate: Substance,
    ) -> Result<AddOutcome, AppError> {
        let closest = self.closest(&candidate.embedding);
        if substance::identify_copy(ai, &candidate, &closest).await? {
            info!(
                "the substance {} is a copy of another substance and won't be added",
                candidate.name
            );
            return Ok(AddOutcome::Duplicate);
        }

        candidate.symbol = self
            .ensure_symbol(ai, candidate.symbol, &candidate.name, &candidate.description)
            .await?;

        self.substances.push(candidate);
        if let Some(admitted) = self.substances.last() {
            info!("admitted {} as {}", admitted.name, admitted.symbol);
            (self.on_add)(admitted);
        }
        Ok(AddOutcome::Admitted)
    }

    /// Re-asks the symbol generator until the proposal is free, feeding back
    /// every rejected symbol. Gives up after a bounded number of attempts so
    /// a stuck generator cannot loop forever.
    async fn ensure_symbol<C: Capability>(
        &self,
        ai: &C,
        mut symbol: String,
        name: &str,
        description: &str,
    ) -> Result<String, AppError> {
        let mut used: Vec<String> = Vec::new();

        while self.has_symbol(&symbol) {
            if used.len() >= MAX_SYMBOL_ATTEMPTS {
                return Err(GameError::SymbolResolutionExhausted(name.to_string()).into());
            }
            warn!("symbol {symbol} is already taken, asking for another for {name}");
            used.push(symbol);
            symbol = substance::create_symbol(ai, name, description, &used).await?;
        }

        Ok(symbol)
    }

    /// The up-to-five substances closest to a free-text query.
    pub async fn search<C: Capability>(
        &self,
        ai: &C,
        query: &str,
    ) -> Result<Vec<&Substance>, AppError> {
        let query_embedding = ai.embed(query).await?;
        Ok(self.closest(&query_embedding))
    }

    /// Populates a fresh world with the four classical elements through the
    /// normal admission path. A world that already holds substances is left
    /// alone, so a resumed session never re-seeds.
    pub async fn seed_starters<C: Capability>(&mut self, ai: &C) -> Result<(), AppError> {
        if !self.substances.is_empty() {
            return Ok(());
        }
        for name in STARTER_SUBSTANCES {
            let starter = substance::full_substance(ai, name).await?;
            self.add(ai, starter).await?;
        }
        Ok(())
    }
}
