// Library root: the draft engine and the infrastructure around it.
//
// courtdraft-core holds the pure rules (season selection, scoring,
// validation); this crate wires them to storage, the catalog, the
// per-draft actors, and the WebSocket fan-out.

pub mod actor;
pub mod catalog;
pub mod config;
pub mod db;
pub mod draft;
pub mod engine;
pub mod error;
pub mod notify;
pub mod protocol;
pub mod registry;
pub mod repository;
pub mod score;
pub mod ws_server;
