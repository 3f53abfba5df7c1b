//! Pad documents and their revision history, kept in the shared store.
//!
//! A pad lives at `pad:<id>`; revision `n` (1-based) at `pad:<id>:revs:<n>`.
//! Changesets are opaque to the server.

use std::sync::Arc;

use {
    anyhow::Context,
    scribe_storage::Store,
    serde::{Deserialize, Serialize},
    tokio::sync::Mutex,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadDocument {
    pub text: String,
    /// Latest revision number; 0 for a pad nobody has edited.
    pub head: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub rev: u64,
    pub changeset: String,
    pub author: String,
}

fn pad_key(pad_id: &str) -> String {
    format!("pad:{pad_id}")
}

fn revision_key(pad_id: &str, rev: u64) -> String {
    format!("pad:{pad_id}:revs:{rev}")
}

#[derive(Clone)]
pub struct PadRepository {
    storage: Arc<dyn Store>,
    /// Serializes head updates.
    writes: Arc<Mutex<()>>,
}

impl PadRepository {
    pub fn new(storage: Arc<dyn Store>) -> Self {
        Self {
            storage,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load(&self, pad_id: &str) -> anyhow::Result<Option<PadDocument>> {
        let Some(value) = self.storage.get(&pad_key(pad_id)).await? else {
            return Ok(None);
        };
        let doc = serde_json::from_value(value)
            .with_context(|| format!("corrupt pad record for {pad_id:?}"))?;
        Ok(Some(doc))
    }

    /// Load the pad, creating it with `default_text` if it does not exist.
    pub async fn get_or_create(
        &self,
        pad_id: &str,
        default_text: &str,
    ) -> anyhow::Result<PadDocument> {
        let _guard = self.writes.lock().await;
        if let Some(doc) = self.load(pad_id).await? {
            return Ok(doc);
        }
        let doc = PadDocument {
            text: default_text.to_string(),
            head: 0,
        };
        self.save(pad_id, &doc).await?;
        Ok(doc)
    }

    /// Record a changeset as the next revision and return its number.
    pub async fn append(&self, pad_id: &str, changeset: &str, author: &str) -> anyhow::Result<u64> {
        let _guard = self.writes.lock().await;
        let mut doc = self
            .load(pad_id)
            .await?
            .with_context(|| format!("no such pad {pad_id:?}"))?;
        let rev = doc.head + 1;
        let revision = Revision {
            rev,
            changeset: changeset.to_string(),
            author: author.to_string(),
        };
        self.storage
            .set(&revision_key(pad_id, rev), &serde_json::to_value(&revision)?)
            .await?;
        doc.head = rev;
        self.save(pad_id, &doc).await?;
        Ok(rev)
    }

    /// Up to `count` revisions starting at `start`, stopping at the head.
    pub async fn revisions(
        &self,
        pad_id: &str,
        start: u64,
        count: u64,
    ) -> anyhow::Result<Vec<Revision>> {
        let Some(doc) = self.load(pad_id).await? else {
            return Ok(Vec::new());
        };
        let first = start.max(1);
        let last = doc.head.min(first.saturating_add(count).saturating_sub(1));
        let mut revisions = Vec::new();
        for rev in first..=last {
            if let Some(value) = self.storage.get(&revision_key(pad_id, rev)).await? {
                revisions.push(serde_json::from_value(value)?);
            }
        }
        Ok(revisions)
    }

    async fn save(&self, pad_id: &str, doc: &PadDocument) -> anyhow::Result<()> {
        self.storage
            .set(&pad_key(pad_id), &serde_json::to_value(doc)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use scribe_storage::MemoryStore;

    use super::*;

    fn repo() -> PadRepository {
        PadRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn creates_pad_once() {
        let pads = repo();
        let doc = pads.get_or_create("notes", "hello").await.unwrap();
        assert_eq!(doc, PadDocument {
            text: "hello".into(),
            head: 0
        });
        let again = pads.get_or_create("notes", "ignored").await.unwrap();
        assert_eq!(again.text, "hello");
    }

    #[tokio::test]
    async fn append_advances_head() {
        let pads = repo();
        pads.get_or_create("notes", "").await.unwrap();
        assert_eq!(pads.append("notes", "Z:1>1*0+1$a", "u1").await.unwrap(), 1);
        assert_eq!(pads.append("notes", "Z:2>1*0+1$b", "u2").await.unwrap(), 2);
        assert_eq!(pads.load("notes").await.unwrap().unwrap().head, 2);
    }

    #[tokio::test]
    async fn append_to_unknown_pad_fails() {
        assert!(repo().append("nope", "x", "u").await.is_err());
    }

    #[tokio::test]
    async fn revisions_window_is_clamped_to_head() {
        let pads = repo();
        pads.get_or_create("notes", "").await.unwrap();
        for cs in ["a", "b", "c"] {
            pads.append("notes", cs, "u").await.unwrap();
        }

        let revs = pads.revisions("notes", 2, 10).await.unwrap();
        let changesets: Vec<_> = revs.iter().map(|r| r.changeset.as_str()).collect();
        assert_eq!(changesets, vec!["b", "c"]);

        let from_zero = pads.revisions("notes", 0, 1).await.unwrap();
        assert_eq!(from_zero[0].rev, 1);

        assert!(pads.revisions("missing", 1, 5).await.unwrap().is_empty());
    }
}
