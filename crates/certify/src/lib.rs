//! Certificate Engine - validation, placement, rendering, batch sending
//!
//! This crate provides:
//! - Roster row validation (name/email heuristics)
//! - Placeholder placement resolution on a template PDF
//! - Certificate rendering (redact placeholder, draw centered name)
//! - Batch orchestration over a delivery collaborator
//!
//! # Example
//!
//! ```ignore
//! use certify::{batch, placement, roster, RenderStyle, Session};
//!
//! let mut session = Session::new();
//! session.authenticate();
//! session.load_template(template_bytes)?;
//!
//! let rows = roster::read_roster_file("attendees.csv")?;
//! let report = batch::run_batch(
//!     &session, &rows, &RenderStyle::default(), "<fullName>",
//!     None, &mut delivery, &options,
//! )?;
//! ```

pub mod batch;
pub mod placement;
pub mod render;
pub mod roster;
pub mod session;
pub mod style;
pub mod template;
pub mod validate;

pub use batch::{
    run_batch, BatchOptions, BatchReport, Delivery, DeliveryError, MailSettings, OutgoingMail,
    Outcome,
};
pub use placement::Placement;
pub use render::render;
pub use roster::RosterRow;
pub use session::Session;
pub use style::{FontChoice, RenderStyle};
pub use template::Template;

pub use pdf_stamp::{Color, Rect};

use thiserror::Error;

/// Errors that can occur in the certificate engine
#[derive(Debug, Error)]
pub enum Error {
    /// Placeholder not found and no manual rectangle supplied; fatal for
    /// the whole batch against this template.
    #[error("no placement target: placeholder not found and no manual rectangle supplied")]
    NoPlacementTarget,

    /// Per-row render failure (malformed template, bad rectangle, bad font)
    #[error("render error: {0}")]
    Render(String),

    /// Batch-fatal configuration problem, surfaced before any row runs
    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Stamp(#[from] pdf_stamp::StampError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
