//! Scoring API Library
//!
//! A validating JSON-RPC-style endpoint. Clients POST an envelope naming a
//! method (`online_score` or `clients_interests`) plus its arguments; the
//! service authenticates the caller, validates the arguments against
//! declarative field rules, runs the method and answers with a
//! `{"response"|"error", "code"}` envelope.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Validation and dispatch core.
//! - `integrations`: External collaborators (key-value store, scoring).
//! - `auth`: Token derivation for regular and admin principals.
//! - `config`: Configuration management.
//! - `dispatcher`: Envelope validation, authentication and method routing.
//! - `errors`: Error handling types.
//! - `fields`: Field descriptors and per-kind format checks.
//! - `handlers`: HTTP request handlers.
//! - `models`: Response envelope and method results.
//! - `requests`: Request envelope and argument schemas.
//! - `schema`: Ordered schemas and validation errors.
//! - `scoring`: Score computation and interest lookup.
//! - `store`: Key-value store trait and backends.

pub mod api;
pub mod core;
pub mod integrations;

pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod fields;
pub mod handlers;
pub mod models;
pub mod requests;
pub mod schema;
pub mod scoring;
pub mod store;
