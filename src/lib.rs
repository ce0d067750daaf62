//! # fleet-dashboard
//!
//! Server-rendered administrative dashboard for an IoT device fleet.
//!
//! Pages list devices and projects, edit device configuration, flip a
//! device's manual switch through a remote function, and manage projects
//! with their custom-field schemas. All data lives in a hosted relational
//! backend reached through its REST interface; this service renders HTML
//! and validates input.
//!
//! ## Architecture
//!
//! ```text
//! Browser (HTML forms, small static script)
//!     │
//!     ├── Page handlers (web/)
//!     ├── Views + askama templates (web/views)
//!     │
//!     ├── DeviceService / ProjectService (service/)
//!     ├── Devices, projects, custom fields, telemetry (domain/)
//!     │
//!     └── Backend trait (backend/)
//!           ├── PostgrestBackend (REST + functions over HTTP)
//!           └── MemoryBackend (in-process)
//! ```

pub mod app_state;
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod format;
pub mod service;
pub mod web;
