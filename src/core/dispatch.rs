use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use tokio::sync::oneshot;

use crate::core::backend::TranslationBackend;
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::Settings;

/// The one cached translation. Capacity 1, keyed by (text, target_lang).
#[derive(Debug, Clone)]
struct CacheSlot {
    text: String,
    target_lang: String,
    translation: String,
}

type InFlightKey = (String, String);
type Waiters = Vec<oneshot::Sender<Option<String>>>;

/// Routes translation requests to the backend, suppressing duplicates via the
/// single-slot cache and coalescing concurrent identical requests onto one
/// in-flight call.
pub struct Dispatcher {
    backend: Arc<dyn TranslationBackend>,
    cache: Mutex<Option<CacheSlot>>,
    in_flight: Mutex<HashMap<InFlightKey, Waiters>>,
    /// Bumped on clear() so a request that was in flight when the cache was
    /// invalidated cannot repopulate the slot.
    epoch: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self {
            backend,
            cache: Mutex::new(None),
            in_flight: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Cached translation for exactly this source text, if the slot holds it.
    pub fn cached(&self, text: &str) -> Option<String> {
        let cache = lock(&self.cache);
        let slot = cache.as_ref().filter(|slot| slot.text == text)?;
        debug!("cache hit for {:?} ({})", text, slot.target_lang);
        Some(slot.translation.clone())
    }

    /// Whatever translation the slot currently holds, regardless of text.
    /// Used by the press-mode branch that repositions an existing popup.
    pub fn last_result(&self) -> Option<String> {
        lock(&self.cache)
            .as_ref()
            .map(|slot| slot.translation.clone())
    }

    /// Invalidate the cache. The next request for any text re-queries, even if
    /// an identical request is still in flight.
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        lock(&self.cache).take();
    }

    /// Detect, resolve the target language, translate, cache.
    ///
    /// Ok(Some) is a translation to display; Ok(None) means the backend failed
    /// and the popup stays hidden. Context invalidation is the only error that
    /// propagates.
    pub async fn request_translation(
        &self,
        text: &str,
        settings: &Settings,
    ) -> AppResult<Option<String>> {
        if let Some(hit) = self.cached(text) {
            return Ok(Some(hit));
        }

        let source_lang = match self.backend.detect(text).await {
            Ok(lang) => lang,
            Err(AppError::ContextInvalidated) => return Err(AppError::ContextInvalidated),
            Err(err) => {
                debug!("language detection failed, assuming auto: {}", err);
                "auto".to_string()
            }
        };
        let target_lang = settings.target_for(&source_lang).to_string();
        debug!(
            "translating {:?} ({} -> {})",
            text, source_lang, target_lang
        );

        self.translate_coalesced(text, &target_lang).await
    }

    async fn translate_coalesced(
        &self,
        text: &str,
        target_lang: &str,
    ) -> AppResult<Option<String>> {
        let key: InFlightKey = (text.to_string(), target_lang.to_string());

        // Either join an identical request already in flight, or become the
        // leader for this key.
        let waiter = {
            let mut in_flight = lock(&self.in_flight);
            if let Some(waiters) = in_flight.get_mut(&key) {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Some(rx)
            } else {
                in_flight.insert(key.clone(), Vec::new());
                None
            }
        };
        if let Some(rx) = waiter {
            debug!("coalescing duplicate request for {:?}", text);
            return Ok(rx.await.unwrap_or(None));
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let result = self.backend.translate(text, target_lang).await;
        let waiters = lock(&self.in_flight).remove(&key).unwrap_or_default();

        match result {
            Ok(translation) => {
                self.store(text, target_lang, &translation, epoch);
                for tx in waiters {
                    let _ = tx.send(Some(translation.clone()));
                }
                Ok(Some(translation))
            }
            Err(err) => {
                for tx in waiters {
                    let _ = tx.send(None);
                }
                if err.is_context_invalidated() {
                    Err(err)
                } else {
                    // Failed calls leave the existing cache untouched.
                    warn!("translation failed for {:?}: {}", text, err);
                    Ok(None)
                }
            }
        }
    }

    fn store(&self, text: &str, target_lang: &str, translation: &str, epoch: u64) {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("cache cleared while request was in flight, result not stored");
            return;
        }
        *lock(&self.cache) = Some(CacheSlot {
            text: text.to_string(),
            target_lang: target_lang.to_string(),
            translation: translation.to_string(),
        });
    }
}
