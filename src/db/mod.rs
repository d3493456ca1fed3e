// src/db/mod.rs
pub mod models;
pub mod store;

pub use models::{
    DailyMenu, Holiday, LastReset, MenuItem, Reservation, ReservationTimeWindow, Review,
    SalesRecord, User, UNLIMITED_STOCK,
};
pub use store::{JsonFile, JsonStore};
