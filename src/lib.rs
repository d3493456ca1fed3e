//! # Cafeteria Reservation Server
//!
//! Reservas del comedor, menú del día, valoraciones y un asistente de chat,
//! todo persistido en ficheros JSON planos.
//!
//! ## Módulos
//!
//! - [`api`] - Rutas HTTP y errores
//! - [`assistant`] - Generador de respuestas del chat
//! - [`core`] - Reglas de negocio sin E/S de red
//! - [`db`] - Modelos y almacén JSON
//! - [`session`] - Sesiones de usuario en memoria

pub mod api;
pub mod assistant;
pub mod config;
pub mod core;
pub mod db;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod test_utils;
