//! The `timeslider` component: read-only playback of a pad's history.

use std::{collections::HashMap, sync::Arc};

use {
    anyhow::Context,
    async_trait::async_trait,
    scribe_protocol::{
        ComponentMessage, OutboundFrame, components::TIMESLIDER, is_valid_pad_name,
        message_types::{CHANGESET_REQ, CLIENT_READY, CLIENT_VARS},
    },
    serde_json::json,
    tokio::sync::RwLock,
    tracing::debug,
};

use crate::{pads::PadRepository, router::ComponentHandler, state::GatewayState};

/// Upper bound on revisions returned for one `CHANGESET_REQ`.
pub const MAX_GRANULARITY: u64 = 100;

pub struct TimesliderMessageHandler {
    state: Arc<GatewayState>,
    pads: PadRepository,
    /// conn_id → pad being viewed.
    sessions: RwLock<HashMap<String, String>>,
}

impl TimesliderMessageHandler {
    pub fn new(state: Arc<GatewayState>, pads: PadRepository) -> Self {
        Self {
            state,
            pads,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn client_ready(&self, conn_id: &str, message: &ComponentMessage) -> anyhow::Result<()> {
        let pad_id = message
            .str_field("padId")
            .context("CLIENT_READY without padId")?;
        anyhow::ensure!(is_valid_pad_name(pad_id), "invalid pad id {pad_id:?}");
        let doc = self
            .pads
            .load(pad_id)
            .await?
            .with_context(|| format!("no such pad {pad_id:?}"))?;

        self.sessions
            .write()
            .await
            .insert(conn_id.to_string(), pad_id.to_string());
        self.state
            .send_to(
                conn_id,
                &OutboundFrame::new(
                    TIMESLIDER,
                    CLIENT_VARS,
                    json!({ "padId": pad_id, "totalRevs": doc.head }),
                ),
            )
            .await;
        Ok(())
    }

    async fn changeset_req(&self, conn_id: &str, message: &ComponentMessage) -> anyhow::Result<()> {
        let pad_id = self
            .sessions
            .read()
            .await
            .get(conn_id)
            .cloned()
            .context("CHANGESET_REQ before CLIENT_READY")?;
        let start = message.u64_field("start").unwrap_or(1);
        let granularity = message
            .u64_field("granularity")
            .unwrap_or(MAX_GRANULARITY)
            .min(MAX_GRANULARITY);

        let revisions = self.pads.revisions(&pad_id, start, granularity).await?;
        debug!(conn_id, pad = %pad_id, start, count = revisions.len(), "changesets requested");
        self.state
            .send_to(
                conn_id,
                &OutboundFrame::new(
                    TIMESLIDER,
                    CHANGESET_REQ,
                    json!({ "start": start, "changesets": revisions }),
                ),
            )
            .await;
        Ok(())
    }
}

#[async_trait]
impl ComponentHandler for TimesliderMessageHandler {
    async fn handle_message(
        &self,
        conn_id: &str,
        message: ComponentMessage,
    ) -> anyhow::Result<()> {
        match message.kind.as_str() {
            CLIENT_READY => self.client_ready(conn_id, &message).await,
            CHANGESET_REQ => self.changeset_req(conn_id, &message).await,
            other => anyhow::bail!("unknown timeslider message type {other:?}"),
        }
    }

    async fn handle_disconnect(&self, conn_id: &str) {
        self.sessions.write().await.remove(conn_id);
    }
}
