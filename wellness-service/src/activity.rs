use mongodb::Collection;
use schema::{ActivityEvent, ActivityKind};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::auth::AuthContext;

/// Best-effort writer for the activity log.
///
/// `record` never waits on the database: events are queued and inserted by a
/// background task. A full queue or a failed insert drops the event.
#[derive(Clone, Debug)]
pub struct ActivityRecorder {
    tx: mpsc::Sender<ActivityEvent>,
}

impl ActivityRecorder {
    pub fn spawn(collection: Collection<ActivityEvent>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<ActivityEvent>(capacity);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match collection.insert_one(&event).await {
                    Ok(_) => debug!(
                        username = %event.username,
                        activity = %event.activity_type,
                        "recorded activity"
                    ),
                    Err(e) => warn!(
                        error = ?e,
                        username = %event.username,
                        activity = %event.activity_type,
                        "unable to record activity"
                    ),
                }
            }
            debug!("activity recorder stopped");
        });

        ActivityRecorder { tx }
    }

    /// Queues an event for `auth` stamped with the current server time
    pub fn record(&self, auth: &AuthContext, kind: ActivityKind) {
        let event = ActivityEvent::new(auth.username.as_str(), kind);

        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => warn!(
                username = %event.username,
                activity = %event.activity_type,
                "activity queue full, dropping event"
            ),
            Err(TrySendError::Closed(event)) => warn!(
                username = %event.username,
                activity = %event.activity_type,
                "activity recorder stopped, dropping event"
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_sender(tx: mpsc::Sender<ActivityEvent>) -> Self {
        ActivityRecorder { tx }
    }
}
