use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound chat frame, serialized once per delivery.
#[derive(Debug, Clone, Serialize)]
pub struct ChatDelivery {
    pub dialogue_id: Uuid,
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub date: DateTime<Utc>,
}

enum HubCommand {
    Connect {
        user_id: Uuid,
        conn_id: Uuid,
        sender: mpsc::UnboundedSender<String>,
    },
    Disconnect {
        user_id: Uuid,
        conn_id: Uuid,
    },
    Deliver {
        participants: [Uuid; 2],
        delivery: ChatDelivery,
    },
}

/// Handle to the chat hub task.
///
/// The registry (user_id -> open connections) is owned by a single task and
/// mutated only through this channel, so connect/disconnect/deliver need no
/// locking. Delivery targets the two participants of the message's dialogue
/// and nobody else.
#[derive(Clone)]
pub struct ChatHub {
    tx: mpsc::Sender<HubCommand>,
}

impl ChatHub {
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::channel::<HubCommand>(256);

        tokio::spawn(async move {
            let mut registry: HashMap<Uuid, HashMap<Uuid, mpsc::UnboundedSender<String>>> =
                HashMap::new();

            while let Some(cmd) = rx.recv().await {
                match cmd {
                    HubCommand::Connect { user_id, conn_id, sender } => {
                        registry.entry(user_id).or_default().insert(conn_id, sender);
                        tracing::debug!(user_id = %user_id, conn_id = %conn_id, "chat connection registered");
                    }
                    HubCommand::Disconnect { user_id, conn_id } => {
                        if let Some(conns) = registry.get_mut(&user_id) {
                            conns.remove(&conn_id);
                            if conns.is_empty() {
                                registry.remove(&user_id);
                            }
                        }
                        tracing::debug!(user_id = %user_id, conn_id = %conn_id, "chat connection removed");
                    }
                    HubCommand::Deliver { participants, delivery } => {
                        let payload = match serde_json::to_string(&delivery) {
                            Ok(p) => p,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to serialize chat delivery");
                                continue;
                            }
                        };

                        let [a, b] = participants;
                        let targets = if a == b { vec![a] } else { vec![a, b] };

                        for user_id in targets {
                            let Some(conns) = registry.get_mut(&user_id) else {
                                continue;
                            };
                            // A failed send means the socket task is gone.
                            conns.retain(|_, sender| sender.send(payload.clone()).is_ok());
                            if conns.is_empty() {
                                registry.remove(&user_id);
                            }
                        }
                    }
                }
            }
        });

        Self { tx }
    }

    pub async fn connect(&self, user_id: Uuid, conn_id: Uuid, sender: mpsc::UnboundedSender<String>) {
        let _ = self.tx.send(HubCommand::Connect { user_id, conn_id, sender }).await;
    }

    pub async fn disconnect(&self, user_id: Uuid, conn_id: Uuid) {
        let _ = self.tx.send(HubCommand::Disconnect { user_id, conn_id }).await;
    }

    pub async fn deliver(&self, participants: [Uuid; 2], delivery: ChatDelivery) {
        let _ = self.tx.send(HubCommand::Deliver { participants, delivery }).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(dialogue_id: Uuid, sender: Uuid, text: &str) -> ChatDelivery {
        ChatDelivery {
            dialogue_id,
            message_id: Uuid::now_v7(),
            user_id: sender,
            message: text.to_string(),
            date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn delivers_to_both_participants_only() {
        let hub = ChatHub::spawn();
        let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();
        hub.connect(alice, Uuid::now_v7(), tx_a).await;
        hub.connect(bob, Uuid::now_v7(), tx_b).await;
        hub.connect(carol, Uuid::now_v7(), tx_c).await;

        let dialogue_id = Uuid::new_v4();
        hub.deliver([alice, bob], delivery(dialogue_id, alice, "hi")).await;

        let frame_a = rx_a.recv().await.unwrap();
        let frame_b = rx_b.recv().await.unwrap();
        assert!(frame_a.contains("hi"));
        assert_eq!(frame_a, frame_b);

        // Carol is connected but not a participant.
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_connection_of_a_user_receives_the_frame() {
        let hub = ChatHub::spawn();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let (tx_1, mut rx_1) = mpsc::unbounded_channel();
        let (tx_2, mut rx_2) = mpsc::unbounded_channel();
        hub.connect(alice, Uuid::now_v7(), tx_1).await;
        hub.connect(alice, Uuid::now_v7(), tx_2).await;

        hub.deliver([alice, bob], delivery(Uuid::new_v4(), bob, "ping")).await;

        assert!(rx_1.recv().await.unwrap().contains("ping"));
        assert!(rx_2.recv().await.unwrap().contains("ping"));
    }

    #[tokio::test]
    async fn disconnected_connections_receive_nothing() {
        let hub = ChatHub::spawn();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let conn_id = Uuid::now_v7();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.connect(alice, conn_id, tx).await;
        hub.disconnect(alice, conn_id).await;

        hub.deliver([alice, bob], delivery(Uuid::new_v4(), bob, "gone")).await;

        // Queue another frame through the hub so the deliver above has been
        // processed before we assert.
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.connect(bob, Uuid::now_v7(), tx_b).await;
        hub.deliver([alice, bob], delivery(Uuid::new_v4(), bob, "sync")).await;
        rx_b.recv().await.unwrap();

        assert!(rx.try_recv().is_err());
    }
}
