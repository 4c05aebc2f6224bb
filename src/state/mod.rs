use std::path::PathBuf;
use std::sync::Arc;

use crate::assistant::Responder;
use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::llm::LlmService;
use crate::rag::{ChunkStore, Retriever, VectorRetriever};

pub mod error;

use error::InitializationError;

/// Shared, read-only state handed to every route.
///
/// Retrieval and the hosted model are optional; when either is missing the
/// responder answers from its built-in fallbacks.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Settings,
    pub responder: Arc<Responder>,
    pub store: Option<Arc<dyn ChunkStore>>,
}

impl AppState {
    pub fn new(
        paths: Arc<AppPaths>,
        settings: Settings,
        responder: Responder,
        store: Option<Arc<dyn ChunkStore>>,
    ) -> Self {
        let config = ConfigService::new(paths.clone());
        Self {
            paths,
            config,
            settings,
            responder: Arc::new(responder),
            store,
        }
    }

    /// Loads configuration, opens the chunk store if one was ingested and
    /// selects a hosted model if a credential is available.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let store_dir = paths.resolve(&settings.store.dir);
        let retriever = VectorRetriever::open(&store_dir, &settings.embedding).await;
        let store = retriever.as_ref().map(|r| r.store().clone());
        let retriever = retriever.map(|r| Arc::new(r) as Arc<dyn Retriever>);

        let llm = LlmService::connect(&settings.llm).await;
        if llm.is_none() {
            tracing::info!("Running in local mode: answers come from retrieval and built-in text");
        }

        let responder = Responder::new(&settings, retriever, llm);
        Ok(Arc::new(Self::new(paths, settings, responder, store)))
    }

    pub fn store_dir(&self) -> PathBuf {
        self.paths.resolve(&self.settings.store.dir)
    }
}
