use std::sync::Arc;
use tokio::sync::Mutex;

/// Word → description mapping shared by every dictionary connection.
///
/// Cloning is cheap and yields a handle to the same store. All access goes
/// through one mutex; entries keep the order in which words were first set.
#[derive(Debug, Clone, Default)]
pub struct DictionaryStore {
    entries: Arc<Mutex<Vec<(String, String)>>>,
}

impl DictionaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, word: &str) -> Option<String> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|(w, _)| w == word)
            .map(|(_, desc)| desc.clone())
    }

    /// Sets a description. Re-setting a word keeps its original position.
    pub async fn set(&self, word: impl Into<String>, desc: impl Into<String>) {
        let word = word.into();
        let desc = desc.into();
        let mut entries = self.entries.lock().await;

        match entries.iter_mut().find(|(w, _)| *w == word) {
            Some((_, existing)) => *existing = desc,
            None => entries.push((word, desc)),
        }
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// All words in insertion order.
    pub async fn words(&self) -> Vec<String> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|(w, _)| w.clone())
            .collect()
    }
}
