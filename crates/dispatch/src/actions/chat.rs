//! Default chat fallback.

use {
    async_trait::async_trait,
    larkbot_common::types::{ChatMessage, Role},
    larkbot_records::QaRecord,
    tracing::{debug, warn},
};

use crate::{
    ActionInfo, Result, cards,
    chain::{Action, Flow},
};

/// Answers with the completion engine using the session history, then
/// records the exchange.
pub struct MessageAction;

#[async_trait]
impl Action for MessageAction {
    fn name(&self) -> &'static str {
        "message"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        let services = &info.services;
        let session_id = info.session_id();
        let msg_id = info.message_id();
        let question = info.text.trim();

        let history = services.sessions.history(session_id).await?;
        let first_exchange = history.iter().all(|m| m.role == Role::System);
        let answer = services.engine.generate_reply(&history, question).await?;

        services
            .sessions
            .append_history(session_id, vec![
                ChatMessage::user(question),
                ChatMessage::assistant(answer.as_str()),
            ])
            .await?;

        if first_exchange {
            let card = cards::new_topic_card(&answer);
            services.outbound.reply_card(msg_id, &card).await?;
        } else {
            services.outbound.reply_text(msg_id, &answer).await?;
        }
        debug!(
            session_id,
            msg_id,
            history = history.len(),
            first_exchange,
            "answer sent"
        );

        if let Some(records) = services.records.clone() {
            let record = QaRecord::new(
                info.info().sender_id(),
                info.info().sender_name().unwrap_or_default(),
                question,
                answer,
            );
            let msg_id = msg_id.to_string();
            services.spawner.spawn(
                "persist-record",
                Box::pin(async move {
                    if let Err(e) = records.insert(&record).await {
                        warn!(msg_id, error = %e, "failed to persist record");
                    }
                }),
            );
        }
        Ok(Flow::Continue)
    }
}
