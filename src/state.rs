// src/state.rs

use std::sync::Arc;

use crate::emotion::EmotionClassifier;
use crate::speech::Transcriber;
use crate::storage::EmotionStore;

/// Shared service handles, assembled once at startup and injected into every
/// handler. The classifier and transcriber own their lazily-initialized model
/// handles; nothing here is mutable after construction.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EmotionStore>,
    pub classifier: Arc<EmotionClassifier>,
    pub transcriber: Arc<Transcriber>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EmotionStore>,
        classifier: Arc<EmotionClassifier>,
        transcriber: Arc<Transcriber>,
    ) -> Self {
        Self {
            store,
            classifier,
            transcriber,
        }
    }
}
