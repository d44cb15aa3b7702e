//! # Wikinotes
//!
//! A TUI study assistant that turns Wikipedia summaries into study material.
//!
//! ## Features
//!
//! - **Four templates**: bullet notes, raw summary, quiz questions and pro tips
//! - **Batch topics**: comma-separated topics render in order, one block each
//! - **Non-blocking lookups**: the TUI fetches on background tasks
//! - **PDF export**: save the output pane as a paginated document

pub mod config;
pub mod export;
pub mod fetcher;
pub mod format;
pub mod pipeline;
pub mod state;
pub mod summary;
pub mod ui;

pub use config::Config;
pub use fetcher::{SummaryProvider, WikipediaClient};
pub use format::Mode;
pub use state::{Theme, UiState};
pub use summary::{SummaryResult, Topic};
