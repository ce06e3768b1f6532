//! Notification dispatcher.
//!
//! Lifecycle mutations publish intents onto a channel; a background worker
//! consumes them, records the delivery and logs it. Dispatch is
//! fire-and-forget: no failure here ever reaches the caller of the
//! triggering lifecycle operation.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::db::Repository;

/// An outbound notification intent published by a lifecycle transition.
#[derive(Debug, Clone)]
pub enum NotificationIntent {
    /// A new SOS was broadcast; every other user should hear about it.
    SosBroadcast {
        sos_id: String,
        sos_type: String,
        reporter_name: String,
        recipients: Vec<String>,
    },
    /// An admin assigned a mission to a volunteer.
    TaskAssigned {
        sos_id: String,
        volunteer_id: String,
    },
    /// A password reset was requested.
    PasswordReset {
        user_id: String,
        email: String,
        token: String,
    },
}

/// Handle used by lifecycle code to publish intents.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<NotificationIntent>,
}

impl NotificationDispatcher {
    /// Spawn the delivery worker and return the dispatch handle.
    pub fn spawn(repo: Arc<Repository>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<NotificationIntent>();

        tokio::spawn(async move {
            while let Some(intent) = rx.recv().await {
                if let Err(e) = deliver(&repo, intent).await {
                    tracing::warn!("Notification delivery failed: {}", e);
                }
            }
        });

        Self { tx }
    }

    /// Publish an intent. Never fails from the caller's perspective.
    pub fn dispatch(&self, intent: NotificationIntent) {
        if self.tx.send(intent).is_err() {
            tracing::warn!("Notification worker is gone; dropping intent");
        }
    }
}

async fn deliver(
    repo: &Repository,
    intent: NotificationIntent,
) -> Result<(), crate::errors::AppError> {
    match intent {
        NotificationIntent::SosBroadcast {
            sos_id,
            sos_type,
            reporter_name,
            recipients,
        } => {
            let subject = format!("New SOS: {}", sos_type);
            let body = format!("{} broadcast an emergency signal ({})", reporter_name, sos_id);
            tracing::info!(
                "Broadcasting SOS {} to {} recipients",
                sos_id,
                recipients.len()
            );
            for recipient in recipients {
                repo.record_notification("sos_broadcast", Some(&recipient), &subject, &body)
                    .await?;
            }
        }
        NotificationIntent::TaskAssigned { sos_id, volunteer_id } => {
            tracing::info!("Notifying volunteer {} of assignment {}", volunteer_id, sos_id);
            repo.record_notification(
                "task_assigned",
                Some(&volunteer_id),
                "New mission assigned",
                &format!("You have been assigned to SOS {}", sos_id),
            )
            .await?;
        }
        NotificationIntent::PasswordReset { user_id, email, token } => {
            tracing::info!("Dispatching password reset for {}", email);
            repo.record_notification(
                "password_reset",
                Some(&user_id),
                "Password reset requested",
                &format!("Reset token: {}", token),
            )
            .await?;
        }
    }

    Ok(())
}
