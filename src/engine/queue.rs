use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub async fn enqueue_booking(state: &AppState, booking_id: Uuid) -> Result<(), AppError> {
    state
        .assignment_tx
        .send(booking_id)
        .await
        .map_err(|err| AppError::Internal(format!("assignment queue send failed: {err}")))?;

    state.metrics.bookings_in_queue.inc();
    Ok(())
}
