use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::admin_log::AdminLog;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::driver::Driver;
use crate::models::review::Review;
use crate::models::tracking::TrackingSample;
use crate::models::user::User;

/// In-memory tables keyed by id.
///
/// Mutations that depend on the current value of a record go through the
/// `*_mut` helpers, which hold the entry lock for the duration of the closure.
/// Closures must not touch the same table again or the shard lock deadlocks.
#[derive(Default)]
pub struct Store {
    bookings: DashMap<Uuid, Booking>,
    drivers: DashMap<Uuid, Driver>,
    reviews: DashMap<Uuid, Review>,
    tracking: DashMap<Uuid, TrackingSample>,
    users: DashMap<String, User>,
    admin_logs: DashMap<Uuid, AdminLog>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_booking(&self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }

    pub fn booking(&self, id: Uuid) -> Option<Booking> {
        self.bookings.get(&id).map(|entry| entry.value().clone())
    }

    pub fn bookings(&self) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by_key(|booking| booking.created_at);
        bookings
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    pub fn count_bookings_with_status(&self, status: BookingStatus) -> usize {
        self.bookings
            .iter()
            .filter(|entry| entry.value().status == status)
            .count()
    }

    pub fn bookings_for_driver(&self, driver_id: Uuid) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|entry| entry.value().driver == Some(driver_id))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn booking_mut<T>(
        &self,
        id: Uuid,
        update: impl FnOnce(&mut Booking) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut booking = self
            .bookings
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("booking {id} not found")))?;

        update(booking.value_mut())
    }

    /// Runs `update` on the booking while the driver's entry is also held, so
    /// an availability toggle cannot land between the check and the write.
    ///
    /// Lock order is driver, then booking; nothing else takes them reversed.
    pub fn booking_with_driver_mut<T>(
        &self,
        booking_id: Uuid,
        driver_id: Uuid,
        update: impl FnOnce(&mut Booking, &Driver) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let driver = self
            .drivers
            .get(&driver_id)
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;

        let mut booking = self
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        update(booking.value_mut(), driver.value())
    }

    /// Removes the booking only if `allowed` holds for it.
    ///
    /// Returns `Ok(None)` when the booking exists but was kept.
    pub fn remove_booking_if(
        &self,
        id: Uuid,
        allowed: impl FnOnce(&Booking) -> bool,
    ) -> Result<Option<Booking>, AppError> {
        if !self.bookings.contains_key(&id) {
            return Err(AppError::NotFound(format!("booking {id} not found")));
        }

        Ok(self
            .bookings
            .remove_if(&id, |_, booking| allowed(booking))
            .map(|(_, booking)| booking))
    }

    pub fn insert_driver(&self, driver: Driver) {
        self.drivers.insert(driver.id, driver);
    }

    pub fn driver(&self, id: Uuid) -> Option<Driver> {
        self.drivers.get(&id).map(|entry| entry.value().clone())
    }

    pub fn drivers(&self) -> Vec<Driver> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by_key(|driver| driver.created_at);
        drivers
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn available_driver_count(&self) -> usize {
        self.drivers
            .iter()
            .filter(|entry| entry.value().available)
            .count()
    }

    pub fn driver_mut<T>(
        &self,
        id: Uuid,
        update: impl FnOnce(&mut Driver) -> T,
    ) -> Result<T, AppError> {
        let mut driver = self
            .drivers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

        Ok(update(driver.value_mut()))
    }

    pub fn insert_review(&self, review: Review) {
        self.reviews.insert(review.id, review);
    }

    pub fn reviews(&self) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        reviews.sort_by_key(|review| review.created_at);
        reviews
    }

    pub fn reviews_for_booking(&self, booking_id: Uuid) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|entry| entry.value().booking_id == booking_id)
            .map(|entry| entry.value().clone())
            .collect();
        reviews.sort_by_key(|review| review.created_at);
        reviews
    }

    /// Returns the stored sample for the booking, inserting the generated one
    /// on first access.
    pub fn tracking_or_insert_with(
        &self,
        booking_id: Uuid,
        generate: impl FnOnce() -> TrackingSample,
    ) -> TrackingSample {
        self.tracking
            .entry(booking_id)
            .or_insert_with(generate)
            .value()
            .clone()
    }

    pub fn remove_tracking(&self, booking_id: Uuid) {
        self.tracking.remove(&booking_id);
    }

    /// Inserts the user unless the username is taken. The boolean is `true`
    /// when a new record was created.
    pub fn insert_user_if_absent(&self, user: User) -> (User, bool) {
        match self.users.entry(user.username.to_ascii_lowercase()) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => (slot.insert(user).value().clone(), true),
        }
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .get(&username.to_ascii_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|user| user.created_at);
        users
    }

    pub fn log_admin_action(&self, action: impl Into<String>) -> AdminLog {
        let entry = AdminLog {
            id: Uuid::new_v4(),
            action: action.into(),
            timestamp: Utc::now(),
        };
        self.admin_logs.insert(entry.id, entry.clone());
        entry
    }

    pub fn admin_logs(&self) -> Vec<AdminLog> {
        let mut logs: Vec<AdminLog> = self
            .admin_logs
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        logs.sort_by_key(|log| log.timestamp);
        logs
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::Store;
    use crate::error::AppError;
    use crate::models::booking::{Booking, BookingStatus};
    use crate::models::driver::Driver;
    use crate::models::vehicle::VehicleClass;

    fn booking() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user: "user1".to_string(),
            driver: None,
            pickup: "40.7128,-74.0060".parse().unwrap(),
            dropoff: "40.730610,-73.935242".parse().unwrap(),
            vehicle_type: VehicleClass::Car,
            estimated_cost: 12.5,
            status: BookingStatus::Booked,
            booking_date: None,
            goods: None,
            promo_code: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn driver() -> Driver {
        Driver {
            id: Uuid::new_v4(),
            name: "driver1".to_string(),
            vehicle: VehicleClass::Car,
            available: true,
            experience_years: None,
            vehicle_capacity_kg: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn booking_with_driver_sees_both_records() {
        let store = Store::new();
        let b = booking();
        let d = driver();
        store.insert_booking(b.clone());
        store.insert_driver(d.clone());

        let seen = store
            .booking_with_driver_mut(b.id, d.id, |booking, driver| {
                booking.driver = Some(driver.id);
                Ok(driver.available)
            })
            .unwrap();

        assert!(seen);
        assert_eq!(store.booking(b.id).unwrap().driver, Some(d.id));
    }

    #[test]
    fn booking_with_driver_reports_missing_records() {
        let store = Store::new();
        let b = booking();
        let d = driver();
        store.insert_booking(b.clone());

        let missing_driver = store.booking_with_driver_mut(b.id, d.id, |_, _| Ok(()));
        assert!(matches!(missing_driver, Err(AppError::NotFound(msg)) if msg.contains("driver")));

        store.insert_driver(d.clone());
        let missing_booking = store.booking_with_driver_mut(Uuid::new_v4(), d.id, |_, _| Ok(()));
        assert!(matches!(missing_booking, Err(AppError::NotFound(msg)) if msg.contains("booking")));
    }

    #[test]
    fn user_insert_ignores_taken_username() {
        let store = Store::new();
        let user = crate::models::user::User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: Utc::now(),
        };

        let (_, created) = store.insert_user_if_absent(user.clone());
        assert!(created);

        let (existing, created) = store.insert_user_if_absent(crate::models::user::User {
            id: Uuid::new_v4(),
            username: "ALICE".to_string(),
            ..user.clone()
        });
        assert!(!created);
        assert_eq!(existing.id, user.id);
    }
}
