use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::pricing::{self, Demand, Quote};
use crate::engine::queue::enqueue_booking;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::booking::{Booking, BookingStatus, GoodsInfo};
use crate::models::event::{BookingEvent, BookingEventKind};
use crate::models::vehicle::VehicleClass;
use crate::notify::{self, NotificationOutcome};
use crate::state::AppState;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user: String,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub vehicle_type: VehicleClass,
    pub booking_date: Option<DateTime<Utc>>,
    pub goods: Option<GoodsInfo>,
    pub promo_code: Option<String>,
}

/// Result of a lifecycle operation: the booking as it stands afterwards
/// (or as it was, for a cancellation) and what happened to the notification.
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub booking: Booking,
    pub notification: NotificationOutcome,
}

pub fn current_demand(store: &Store) -> Demand {
    Demand {
        open_bookings: store.count_bookings_with_status(BookingStatus::Booked),
        available_drivers: store.available_driver_count(),
    }
}

pub fn quote(
    state: &AppState,
    pickup: &GeoPoint,
    dropoff: &GeoPoint,
    vehicle: &VehicleClass,
    promo_code: Option<&str>,
) -> Result<Quote, AppError> {
    let pricing_config = &state.config.pricing;
    let quote = pricing::estimate(
        pricing_config,
        pickup,
        dropoff,
        vehicle,
        current_demand(&state.store),
    );

    match promo_code {
        Some(code) => pricing::apply_promo(pricing_config, quote, code),
        None => Ok(quote),
    }
}

pub async fn create(state: &AppState, request: NewBooking) -> Result<Transition, AppError> {
    let user = request.user.trim();
    if user.is_empty() {
        return Err(AppError::BadRequest("user cannot be empty".to_string()));
    }

    if !request.vehicle_type.is_known() {
        return Err(AppError::BadRequest(format!(
            "unsupported vehicle type {}, expected car/van/truck",
            request.vehicle_type
        )));
    }

    if let Some(goods) = &request.goods {
        if goods.weight_kg.is_some_and(|weight| weight < 0.0) {
            return Err(AppError::BadRequest("goods weight must be >= 0".to_string()));
        }
    }

    let quote = quote(
        state,
        &request.pickup,
        &request.dropoff,
        &request.vehicle_type,
        request.promo_code.as_deref(),
    )?;

    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        user: user.to_string(),
        driver: None,
        pickup: request.pickup,
        dropoff: request.dropoff,
        vehicle_type: request.vehicle_type,
        estimated_cost: quote.estimated_cost,
        status: BookingStatus::Booked,
        booking_date: request.booking_date,
        goods: request.goods,
        promo_code: request
            .promo_code
            .map(|code| code.trim().to_ascii_uppercase()),
        created_at: now,
        updated_at: now,
    };

    state.store.insert_booking(booking.clone());
    state
        .metrics
        .bookings_total
        .with_label_values(&[booking.vehicle_type.as_str()])
        .inc();

    info!(
        booking_id = %booking.id,
        user = %booking.user,
        vehicle = %booking.vehicle_type,
        estimated_cost = booking.estimated_cost,
        surge = quote.surge_applied,
        "booking created"
    );

    publish(state, &booking, BookingEventKind::Created);
    let notification = notify_requester(
        state,
        &booking,
        "Booking confirmed",
        &format!(
            "Your {} trip {} is booked. Estimated cost: {:.2}",
            booking.vehicle_type, booking.id, booking.estimated_cost
        ),
    )
    .await;

    // Queued last so the worker's `Accepted` can never overtake `Created`.
    if state.config.auto_assign {
        if let Err(err) = enqueue_booking(state, booking.id).await {
            warn!(
                booking_id = %booking.id,
                error = %err,
                "automatic assignment unavailable; booking left open"
            );
        }
    }

    Ok(Transition {
        booking,
        notification,
    })
}

/// Hands an unassigned booking to a driver.
///
/// The checks on `driver == None` and on the driver's availability run while
/// both entries are locked, so two concurrent accepts cannot both win and a
/// driver going off duty cannot be assigned mid-toggle.
pub async fn assign(
    state: &AppState,
    booking_id: Uuid,
    driver_id: Uuid,
) -> Result<Transition, AppError> {
    let (booking, driver_name) =
        state
            .store
            .booking_with_driver_mut(booking_id, driver_id, |booking, driver| {
                if !driver.available {
                    return Err(AppError::Conflict(format!(
                        "driver {driver_id} is not available"
                    )));
                }

                if let Some(current) = booking.driver {
                    return Err(AppError::Conflict(format!(
                        "booking {booking_id} is already assigned to driver {current}"
                    )));
                }

                if booking.status != BookingStatus::Booked {
                    return Err(AppError::Conflict(format!(
                        "booking {booking_id} is {}, expected booked",
                        booking.status
                    )));
                }

                if booking.vehicle_type != driver.vehicle {
                    return Err(AppError::BadRequest(format!(
                        "booking {booking_id} needs a {}, driver {driver_id} drives a {}",
                        booking.vehicle_type, driver.vehicle
                    )));
                }

                booking.driver = Some(driver_id);
                booking.status = BookingStatus::Accepted;
                booking.updated_at = Utc::now();
                Ok((booking.clone(), driver.name.clone()))
            })?;

    record_transition(state, &booking);
    info!(booking_id = %booking_id, driver_id = %driver_id, "booking accepted");

    publish(state, &booking, BookingEventKind::Accepted);
    let notification = notify_requester(
        state,
        &booking,
        "Driver assigned",
        &format!("{driver_name} accepted your booking {}", booking.id),
    )
    .await;

    Ok(Transition {
        booking,
        notification,
    })
}

/// Moves an accepted booking forward to `in_progress` or `delivered`.
///
/// Re-reporting `in_progress` is accepted and leaves the booking untouched.
pub async fn advance(
    state: &AppState,
    booking_id: Uuid,
    target: BookingStatus,
) -> Result<Transition, AppError> {
    if target < BookingStatus::InProgress {
        return Err(AppError::BadRequest(format!(
            "status {target} cannot be set directly"
        )));
    }

    let (booking, changed) = state.store.booking_mut(booking_id, |booking| {
        if booking.driver.is_none() {
            return Err(AppError::Conflict(format!(
                "booking {booking_id} has not been accepted by a driver"
            )));
        }

        if booking.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "booking {booking_id} is already delivered"
            )));
        }

        if target < booking.status {
            return Err(AppError::Conflict(format!(
                "booking {booking_id} cannot move from {} back to {target}",
                booking.status
            )));
        }

        if target == booking.status {
            return Ok((booking.clone(), false));
        }

        booking.status = target;
        booking.updated_at = Utc::now();
        Ok((booking.clone(), true))
    })?;

    if !changed {
        return Ok(Transition {
            booking,
            notification: NotificationOutcome::Skipped,
        });
    }

    record_transition(state, &booking);
    info!(booking_id = %booking_id, status = %booking.status, "booking status updated");

    publish(state, &booking, BookingEventKind::StatusChanged);
    let notification = notify_requester(
        state,
        &booking,
        "Booking status update",
        &format!("Booking {} is now {}", booking.id, booking.status),
    )
    .await;

    Ok(Transition {
        booking,
        notification,
    })
}

/// Deletes a booking that no driver has accepted yet.
pub async fn cancel(state: &AppState, booking_id: Uuid) -> Result<Transition, AppError> {
    let removed = state
        .store
        .remove_booking_if(booking_id, |booking| booking.status == BookingStatus::Booked)?;

    let Some(booking) = removed else {
        let status = state
            .store
            .booking(booking_id)
            .map(|booking| booking.status.to_string())
            .unwrap_or_else(|| "gone".to_string());
        return Err(AppError::Conflict(format!(
            "booking {booking_id} is {status}; only booked trips can be cancelled"
        )));
    };

    state.store.remove_tracking(booking_id);
    state
        .store
        .log_admin_action(format!("booking {booking_id} cancelled by {}", booking.user));
    state
        .metrics
        .status_transitions_total
        .with_label_values(&["cancelled"])
        .inc();
    info!(booking_id = %booking_id, "booking cancelled");

    publish(state, &booking, BookingEventKind::Cancelled);
    let notification = notify_requester(
        state,
        &booking,
        "Booking cancelled",
        &format!("Booking {} has been cancelled", booking.id),
    )
    .await;

    Ok(Transition {
        booking,
        notification,
    })
}

fn record_transition(state: &AppState, booking: &Booking) {
    state
        .metrics
        .status_transitions_total
        .with_label_values(&[booking.status.as_str()])
        .inc();
}

fn publish(state: &AppState, booking: &Booking, kind: BookingEventKind) {
    let event = BookingEvent {
        booking_id: booking.id,
        kind,
        status: booking.status,
        driver: booking.driver,
        at: Utc::now(),
    };
    let _ = state.booking_events_tx.send(event);
}

async fn notify_requester(
    state: &AppState,
    booking: &Booking,
    subject: &str,
    body: &str,
) -> NotificationOutcome {
    let recipient = if state.config.notifications_enabled {
        state
            .store
            .user_by_username(&booking.user)
            .map(|user| user.email)
    } else {
        None
    };

    let outcome = notify::deliver(state.notifier.as_ref(), recipient.as_deref(), subject, body).await;

    let label = match &outcome {
        NotificationOutcome::Sent => "sent",
        NotificationOutcome::Skipped => "skipped",
        NotificationOutcome::Failed(_) => "failed",
    };
    state
        .metrics
        .notifications_total
        .with_label_values(&[label])
        .inc();

    outcome
}
