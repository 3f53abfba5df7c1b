//! The `pad` component: live editing sessions.

use std::{collections::HashMap, sync::Arc};

use {
    anyhow::Context,
    async_trait::async_trait,
    scribe_protocol::{
        ComponentMessage, OutboundFrame, components::PAD, is_valid_pad_name, message_types::*,
    },
    serde_json::json,
    tokio::sync::RwLock,
    tracing::{debug, info},
};

use crate::{pads::PadRepository, router::ComponentHandler, state::GatewayState};

struct PadSession {
    pad_id: String,
    author: String,
}

pub struct PadMessageHandler {
    state: Arc<GatewayState>,
    pads: PadRepository,
    /// conn_id → the pad that connection joined.
    sessions: RwLock<HashMap<String, PadSession>>,
}

impl PadMessageHandler {
    pub fn new(state: Arc<GatewayState>, pads: PadRepository) -> Self {
        Self {
            state,
            pads,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Connections currently in `pad_id`, excluding `except`.
    async fn room(&self, pad_id: &str, except: &str) -> Vec<String> {
        self.sessions
            .read()
            .await
            .iter()
            .filter(|(conn_id, s)| s.pad_id == pad_id && conn_id.as_str() != except)
            .map(|(conn_id, _)| conn_id.clone())
            .collect()
    }

    async fn broadcast(&self, pad_id: &str, except: &str, kind: &str, payload: serde_json::Value) {
        let members = self.room(pad_id, except).await;
        let frame = OutboundFrame::new(PAD, kind, payload);
        self.state
            .send_to_many(members.iter().map(String::as_str), &frame)
            .await;
    }

    async fn client_ready(&self, conn_id: &str, message: &ComponentMessage) -> anyhow::Result<()> {
        let pad_id = message
            .str_field("padId")
            .context("CLIENT_READY without padId")?;
        anyhow::ensure!(is_valid_pad_name(pad_id), "invalid pad id {pad_id:?}");

        let author = message
            .str_field("userId")
            .map(str::to_string)
            .unwrap_or_else(|| format!("a.{}", uuid::Uuid::new_v4().simple()));
        let doc = self
            .pads
            .get_or_create(pad_id, &self.state.config.pad.default_text)
            .await?;

        let others = self.room(pad_id, conn_id).await;
        self.sessions.write().await.insert(conn_id.to_string(), PadSession {
            pad_id: pad_id.to_string(),
            author: author.clone(),
        });
        info!(conn_id, pad = %pad_id, author = %author, "client joined pad");

        self.state
            .send_to(
                conn_id,
                &OutboundFrame::new(
                    PAD,
                    CLIENT_VARS,
                    json!({
                        "padId": pad_id,
                        "text": doc.text,
                        "rev": doc.head,
                        "userId": author,
                        "userCount": others.len() + 1,
                    }),
                ),
            )
            .await;
        self.broadcast(pad_id, conn_id, USER_NEWINFO, json!({ "userId": author }))
            .await;
        Ok(())
    }

    async fn user_changes(&self, conn_id: &str, message: &ComponentMessage) -> anyhow::Result<()> {
        let (pad_id, author) = {
            let sessions = self.sessions.read().await;
            let session = sessions
                .get(conn_id)
                .context("USER_CHANGES before CLIENT_READY")?;
            (session.pad_id.clone(), session.author.clone())
        };
        let changeset = message
            .str_field("changeset")
            .context("USER_CHANGES without changeset")?;

        let new_rev = self.pads.append(&pad_id, changeset, &author).await?;
        debug!(conn_id, pad = %pad_id, new_rev, "changeset accepted");

        self.state
            .send_to(
                conn_id,
                &OutboundFrame::new(PAD, ACCEPT_COMMIT, json!({ "newRev": new_rev })),
            )
            .await;
        self.broadcast(
            &pad_id,
            conn_id,
            NEW_CHANGES,
            json!({ "newRev": new_rev, "changeset": changeset, "author": author }),
        )
        .await;
        Ok(())
    }
}

#[async_trait]
impl ComponentHandler for PadMessageHandler {
    async fn handle_message(
        &self,
        conn_id: &str,
        message: ComponentMessage,
    ) -> anyhow::Result<()> {
        match message.kind.as_str() {
            CLIENT_READY => self.client_ready(conn_id, &message).await,
            USER_CHANGES => self.user_changes(conn_id, &message).await,
            other => anyhow::bail!("unknown pad message type {other:?}"),
        }
    }

    async fn handle_disconnect(&self, conn_id: &str) {
        let Some(session) = self.sessions.write().await.remove(conn_id) else {
            return;
        };
        info!(conn_id, pad = %session.pad_id, "client left pad");
        self.broadcast(
            &session.pad_id,
            conn_id,
            USER_LEAVE,
            json!({ "userId": session.author }),
        )
        .await;
    }
}
