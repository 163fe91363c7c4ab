//! # School Scheduling Backend
//!
//! Class schedule (timetable) management for a school: recurring weekly
//! sessions that bind a class room, a subject and a teacher to a weekday and
//! time range within an academic term.
//!
//! ## Features
//!
//! - **Conflict checking**: detect teacher and class room double bookings
//!   before a schedule is stored, with skip / allow-overlap policies
//! - **Schedule workflow**: create, update, logical delete, bulk create, search
//! - **Reporting**: timetables, statistics, availability and free periods
//! - **Persistence**: in-memory or PostgreSQL (Diesel) repositories
//! - **HTTP API**: RESTful endpoints via Axum
//!
//! ## Architecture
//!
//! - [`models`]: Identifiers, time ranges, schedule records and directory entities
//! - [`scheduler`]: Pure conflict detection and free-period computation
//! - [`db`]: Repository traits, implementations and factory
//! - [`services`]: The schedule workflow and reports
//! - [`config`]: Scheduling policy and server settings from the environment
//! - [`api`]: Flat re-export of the types used on the wire
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod scheduler;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
