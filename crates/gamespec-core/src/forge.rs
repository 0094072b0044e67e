//! Game Forge
//!
//! Runs one user turn end to end:
//! - Checks the session and its owner
//! - Resolves the prompt into a patch and applies it
//! - Compiles the next spec
//! - Persists spec, rolling summary, history, document and metadata
//!
//! Proposal and compile problems never fail a turn; only session-level
//! failures return [`ForgeError`].

use crate::error::ForgeError;
use crate::store::{
    MemoryPublicationStore, MemoryRecordStore, PublicationStore, RecordStore, HTML_CONTENT_TYPE,
};
use crate::types::{
    summarize, ForgeConfig, GameId, GameRecord, GameStatus, GenerationMetadata, Publication,
    Strategy, Turn, TurnOutcome, UserId,
};
use chrono::Utc;
use gamespec_compiler::Compiler;
use gamespec_intent::patterns::mentions_bubbles;
use gamespec_intent::{IntentResolver, Proposal};
use gamespec_model::{
    apply_with_report, default_spec, ApplyReport, PatchOp, PatchPath, SpecReader,
};
use serde_json::Value;
use std::sync::Arc;

/// The session orchestrator
#[derive(Debug, Clone)]
pub struct GameForge {
    config: ForgeConfig,
    resolver: IntentResolver,
    compiler: Compiler,
    records: Arc<dyn RecordStore>,
    publications: Arc<dyn PublicationStore>,
}

impl GameForge {
    /// Create a forge over explicit collaborators
    #[must_use]
    pub fn new(
        config: ForgeConfig,
        resolver: IntentResolver,
        compiler: Compiler,
        records: Arc<dyn RecordStore>,
        publications: Arc<dyn PublicationStore>,
    ) -> Self {
        Self {
            config,
            resolver,
            compiler,
            records,
            publications,
        }
    }

    /// Create a forge with in-memory stores and the built-in templates
    #[must_use]
    pub fn in_memory(config: ForgeConfig) -> Self {
        let resolver = IntentResolver::from_config(config.intent.clone());
        Self::new(
            config,
            resolver,
            Compiler::default(),
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryPublicationStore::new()),
        )
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Open a new draft session for `user`
    ///
    /// # Errors
    /// Returns error if the record store fails
    pub async fn create_session(
        &self,
        user: &UserId,
        creator_name: Option<&str>,
    ) -> Result<GameId, ForgeError> {
        let record = GameRecord::draft(
            user.clone(),
            creator_name.map(str::to_string),
            self.config.auto_delete_after(),
        );
        let id = record.id;
        self.records.insert(record).await?;
        tracing::info!(game = %id, user = %user, "session created");
        Ok(id)
    }

    /// Fetch a game the caller may modify
    ///
    /// # Errors
    /// Returns error if the game is unknown, owned by someone else, or the
    /// store fails
    pub async fn game(&self, user: &UserId, id: GameId) -> Result<GameRecord, ForgeError> {
        let record = self
            .records
            .get(id)
            .await?
            .ok_or(ForgeError::GameNotFound(id))?;
        if !record.is_editable_by(user) {
            tracing::warn!(game = %id, user = %user, "ownership check failed");
            return Err(ForgeError::forbidden(id, user));
        }
        Ok(record)
    }

    /// Propose, apply and compile one prompt
    ///
    /// # Errors
    /// Returns error on a missing prompt, unknown game, ownership mismatch or
    /// store failure
    pub async fn generate(
        &self,
        user: &UserId,
        id: GameId,
        prompt: &str,
    ) -> Result<TurnOutcome, ForgeError> {
        self.turn(user, id, prompt, Strategy::SpecCompile).await
    }

    /// Propose and apply one prompt without compiling
    ///
    /// # Errors
    /// Same as [`GameForge::generate`]
    pub async fn update_spec(
        &self,
        user: &UserId,
        id: GameId,
        prompt: &str,
    ) -> Result<TurnOutcome, ForgeError> {
        self.turn(user, id, prompt, Strategy::PatchOnly).await
    }

    /// Compile the stored spec without consulting the resolver
    ///
    /// # Errors
    /// Returns error on unknown game, ownership mismatch or store failure
    pub async fn compile(&self, user: &UserId, id: GameId) -> Result<String, ForgeError> {
        let mut record = self.game(user, id).await?;
        let spec = record.spec.clone().unwrap_or_else(|| default_spec(""));
        let html = self.compiler.compile(&spec);

        let now = Utc::now();
        record.html = Some(html.clone());
        record.status = GameStatus::Generated;
        record.updated_at = now;
        record.metadata = Some(GenerationMetadata {
            strategy: Strategy::CompileOnly,
            model: "none".to_string(),
            patch_size: 0,
            source: None,
            degradations: Vec::new(),
            generated_at: now,
        });
        self.records.put(record).await?;

        tracing::info!(game = %id, bytes = html.len(), "compiled stored spec");
        Ok(html)
    }

    /// Publish the compiled document under a stable per-game path
    ///
    /// # Errors
    /// Returns error on a missing title, unknown game, ownership mismatch,
    /// no compiled document, or store failure
    pub async fn publish(
        &self,
        user: &UserId,
        id: GameId,
        title: &str,
        description: Option<&str>,
    ) -> Result<Publication, ForgeError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ForgeError::MissingTitle);
        }

        let mut record = self.game(user, id).await?;
        let html = record
            .html
            .as_deref()
            .filter(|html| !html.is_empty())
            .ok_or(ForgeError::NoArtifact(id))?;

        let path = self.config.publication_path(id);
        self.publications
            .put(&path, html.as_bytes().to_vec(), HTML_CONTENT_TYPE)
            .await?;

        let now = Utc::now();
        record.title = title.chars().take(self.config.title_chars).collect();
        record.description = description.unwrap_or_default().to_string();
        record.status = GameStatus::Published;
        record.storage_path = Some(path.clone());
        record.published_at = Some(now);
        record.updated_at = now;
        self.records.put(record).await?;

        let url = self
            .config
            .public_base_url
            .as_deref()
            .map(|base| format!("{}/{path}", base.trim_end_matches('/')));
        tracing::info!(game = %id, %path, "game published");
        Ok(Publication {
            game_id: id,
            path,
            url,
        })
    }

    /// Published document of a game, as served to players
    ///
    /// # Errors
    /// Returns error if the game was never published or the store fails
    pub async fn play(&self, id: GameId) -> Result<String, ForgeError> {
        let path = self.config.publication_path(id);
        let object = self
            .publications
            .get(&path)
            .await?
            .ok_or(ForgeError::NotPublished(id))?;
        Ok(String::from_utf8_lossy(&object.body).into_owned())
    }

    async fn turn(
        &self,
        user: &UserId,
        id: GameId,
        prompt: &str,
        strategy: Strategy,
    ) -> Result<TurnOutcome, ForgeError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ForgeError::MissingPrompt);
        }
        let mut record = self.game(user, id).await?;

        let current = record.spec.clone().unwrap_or_else(|| default_spec(prompt));
        let proposal = self.resolver.propose(&current, prompt, &record.summary).await;
        let (mut next, report) = apply_with_report(&current, proposal.patch.ops());
        if !report.is_complete() {
            tracing::debug!(skipped = report.skipped.len(), "patch partially applied");
        }
        if strategy == Strategy::SpecCompile {
            next = bubble_safety_net(next, prompt);
        }

        let html = (strategy == Strategy::SpecCompile).then(|| self.compiler.compile(&next));
        let model = self.model_name(&proposal);
        let direct_mode = SpecReader::new(&next).direct_mode();

        let now = Utc::now();
        record.summary = summarize(&record.summary, prompt, self.config.summary_chars);
        record.history.push(Turn::user(prompt));
        record.spec = Some(next.clone());
        record.updated_at = now;
        record.metadata = Some(GenerationMetadata {
            strategy,
            model: model.clone(),
            patch_size: proposal.patch.len(),
            source: Some(proposal.source),
            degradations: proposal.degradations.clone(),
            generated_at: now,
        });
        if let Some(html) = &html {
            record.html = Some(html.clone());
            record.status = GameStatus::Generated;
        }
        let history = record.history.clone();
        self.records.put(record).await?;

        tracing::info!(
            game = %id,
            source = proposal.source.as_str(),
            ops = proposal.patch.len(),
            skipped = report.skipped.len(),
            compiled = html.is_some(),
            "turn complete"
        );

        Ok(outcome(id, next, html, history, proposal, report, model, direct_mode))
    }

    fn model_name(&self, proposal: &Proposal) -> String {
        proposal
            .model
            .clone()
            .or_else(|| self.resolver.has_service().then(|| self.config.intent.model.clone()))
            .unwrap_or_else(|| "mock".to_string())
    }
}

/// Force the timed-spawn template when the prompt is plainly about bubbles
/// and nothing chose a template
fn bubble_safety_net(spec: Value, prompt: &str) -> Value {
    let reader = SpecReader::new(&spec);
    if reader.has_template() || !mentions_bubbles(prompt) {
        return spec;
    }
    let mut ops = vec![PatchOp::add(
        PatchPath::from_segments(&["meta", "template"]),
        "bubble_clicker",
    )];
    if reader.title().is_none() {
        ops.push(PatchOp::add(
            PatchPath::from_segments(&["meta", "title"]),
            "Bubble Rush",
        ));
    }
    tracing::debug!("bubble template forced");
    apply_with_report(&spec, &ops).0
}

#[allow(clippy::too_many_arguments)]
fn outcome(
    game_id: GameId,
    spec: Value,
    html: Option<String>,
    history: Vec<Turn>,
    proposal: Proposal,
    report: ApplyReport,
    model: String,
    direct_mode: bool,
) -> TurnOutcome {
    TurnOutcome {
        game_id,
        spec,
        html,
        history,
        source: proposal.source,
        degradations: proposal.degradations,
        report,
        model,
        direct_mode,
    }
}
