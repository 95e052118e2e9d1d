//! Cricket-ground booking server: customer booking flow, slot availability,
//! advance/remaining payment tracking and the admin dashboard API.

pub mod booking;
pub mod cache;
pub mod cleanup;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod http;
pub mod metrics;
