//! Control-panel library crate.
//!
//! # Purpose
//! Exposes the access-control store, the admin API client, the editor
//! view-model, service health checks, configuration and observability wiring
//! for use by the `controlpanel` binary and tests.
//!
//! # Notes
//! Every shared handle (HTTP client, document source, store) is constructed
//! explicitly through [`app::PanelContext`]; nothing is initialized as ambient
//! global state apart from the tracing/metrics recorders.
pub mod api;
pub mod app;
pub mod config;
pub mod health;
pub mod observability;
pub mod store;
pub mod view;
