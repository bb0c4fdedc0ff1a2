//! `clause-review`: contract review engine.
//!
//! An analysis collaborator proposes findings (risky clause + suggested
//! redline); the user accepts, edits, dismisses or bulk-accepts them against
//! the live contract text. The engine keeps every pending finding's anchor
//! valid while the text changes underneath it.
//!
//! # Modules
//!
//! - `anchor`: Nth-occurrence locator, ordered replacer, right-to-left batch
//! - `finding`: findings and analyzer-output anchoring
//! - `state`: `AppState`, `Action`, the pure `reduce` function
//! - `session`: serializing dispatcher with persistence and collaborator calls
//! - `store`: `StateStore` trait, atomic file snapshots
//! - `collab`: `Parser` / `Analyzer` / `Refiner` seams
//! - `export`: occurrence-honoring export
//! - `server` / `commands`: JSON-RPC 2.0 over stdio
//!
//! # Architecture
//!
//! ```text
//! stdin (JSON-RPC) → server → CommandRouter → Session → reduce(state, action)
//!                                                 ↓
//! stdout (JSON-RPC) ←──────────────────────── StateStore (atomic JSON)
//! ```

pub mod anchor;
pub mod collab;
pub mod commands;
pub mod document;
pub mod error;
pub mod export;
pub mod finding;
pub mod server;
pub mod session;
pub mod state;
pub mod store;

pub use error::{ReviewError, ReviewResult};
pub use server::run_server;
