use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::health::collaborators::NotifyError;
use crate::health::CheckKind;
use crate::http::response::MaintenanceOutcome;
use crate::http::server::AppState;

type Reply = (StatusCode, Json<MaintenanceOutcome>);

/// Re-run datastore seeding and drop the cached database report.
pub async fn retry_seeding(State(state): State<AppState>) -> Reply {
    let Some(datastore) = state.collaborators.datastore.as_ref() else {
        return MaintenanceOutcome::fail(StatusCode::NOT_FOUND, "Datastore is not available");
    };

    match datastore.retry_seeding().await {
        Ok(()) => {
            state.health.cache().invalidate(CheckKind::Database.name());
            tracing::info!("Seeding retry triggered");
            MaintenanceOutcome::ok("Seeding retry triggered")
        }
        Err(e) => {
            tracing::error!(error = %e, "Seeding retry failed");
            MaintenanceOutcome::fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to retry seeding: {e}"),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClearQueueParams {
    pub queue: Option<String>,
}

/// Clear one named queue, or every queue when no name is given.
pub async fn clear_queue_data(
    State(state): State<AppState>,
    Query(params): Query<ClearQueueParams>,
) -> Reply {
    let queues = &state.collaborators.queues;
    let targets: Vec<_> = match params.queue.as_deref() {
        Some(name) => match state.collaborators.queue(name) {
            Some(queue) => vec![queue.clone()],
            None => {
                return MaintenanceOutcome::fail(
                    StatusCode::NOT_FOUND,
                    format!("Queue '{name}' not found"),
                )
            }
        },
        None if queues.is_empty() => {
            return MaintenanceOutcome::fail(StatusCode::NOT_FOUND, "No queues registered")
        }
        None => queues.clone(),
    };

    let mut cleared = 0;
    for queue in &targets {
        match queue.clear().await {
            Ok(n) => cleared += n,
            Err(e) => {
                tracing::error!(queue = queue.name(), error = %e, "Failed to clear queue");
                return MaintenanceOutcome::fail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to clear queue '{}': {e}", queue.name()),
                );
            }
        }
    }

    state.health.cache().invalidate(CheckKind::Queues.name());
    let names: Vec<&str> = targets.iter().map(|q| q.name()).collect();
    tracing::info!(queues = ?names, cleared, "Queue data cleared");
    MaintenanceOutcome::ok(format!("Cleared {cleared} jobs from {}", names.join(", ")))
}

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub async fn send_test_notification(
    State(state): State<AppState>,
    Query(params): Query<NotificationParams>,
) -> Reply {
    let Some(user_id) = params.user_id.filter(|id| !id.is_empty()) else {
        return MaintenanceOutcome::fail(StatusCode::BAD_REQUEST, "userId query parameter is required");
    };
    let Some(notifier) = state.collaborators.notifier.as_ref() else {
        return MaintenanceOutcome::fail(StatusCode::NOT_FOUND, "Notifications are not available");
    };

    match notifier.send_test(&user_id).await {
        Ok(()) => MaintenanceOutcome::ok(format!("Test notification sent to {user_id}")),
        Err(e @ NotifyError::UserNotFound(_)) => {
            MaintenanceOutcome::fail(StatusCode::NOT_FOUND, e.to_string())
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "Test notification failed");
            MaintenanceOutcome::fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
