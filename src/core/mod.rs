//! Lógica de negocio pura del comedor, sin HTTP.
//!
//! - [`hours`] - Horario de apertura y estado del día
//! - [`congestion`] - Nivel de ocupación por número de reservas
//! - [`reservations`] - Validación y alta de reservas
//! - [`daily_reset`] - Reinicio diario y registro de ventas
//! - [`monthly_report`] - Agregación mensual (JSON / CSV)

pub mod congestion;
pub mod daily_reset;
pub mod hours;
pub mod monthly_report;
pub mod reservations;
