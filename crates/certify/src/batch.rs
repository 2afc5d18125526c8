//! Batch orchestration
//!
//! Walks the roster in order, renders one certificate per valid row, and
//! hands each artifact to the delivery collaborator. Row failures (render
//! or delivery) never abort the batch; every input row ends up with exactly
//! one outcome in the report.

use crate::placement;
use crate::render::render;
use crate::roster::RosterRow;
use crate::session::Session;
use crate::style::RenderStyle;
use crate::{Error, Result};
use pdf_stamp::Rect;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use tracing::{info, warn};

/// Failure reported by a delivery collaborator (transport, auth, quota)
#[derive(Debug, ThisError)]
#[error("{0}")]
pub struct DeliveryError(pub String);

/// One outgoing message with its certificate attached
pub struct OutgoingMail<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: String,
    pub html_body: String,
    pub attachment: &'a [u8],
    pub attachment_name: &'a str,
}

/// The delivery collaborator: external transport that reports a status
/// code or an error per send.
pub trait Delivery {
    fn send(&mut self, mail: &OutgoingMail<'_>) -> std::result::Result<u16, DeliveryError>;
}

/// Subject and body templates plus the sender address.
///
/// `{first_name}` in subject and body is substituted per row; body
/// newlines become `<br>` in the HTML part.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Batch-level knobs: where artifacts go and what the emails say
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub out_dir: PathBuf,
    pub mail: MailSettings,
}

/// Final state of one roster row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rendered, written, and accepted by the delivery collaborator
    Sent { status: u16, artifact: String },
    /// Attempted but failed (render, write, or delivery); batch continued
    Failed { reason: String },
    /// Never attempted: one or both fields failed validation
    SkippedInvalid { valid_name: bool, valid_email: bool },
}

/// Everything that happened to a batch, one entry per input row in roster
/// order.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<(RosterRow, Outcome)>,
}

impl BatchReport {
    pub fn sent_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Sent { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::SkippedInvalid { .. }))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Run a full batch against an authenticated session.
///
/// Fatal before any row: unauthenticated session, missing template, or an
/// unresolvable placement. Everything after that is row-scoped.
pub fn run_batch(
    session: &Session,
    rows: &[RosterRow],
    style: &RenderStyle,
    token: &str,
    manual_default: Option<Rect>,
    delivery: &mut dyn Delivery,
    options: &BatchOptions,
) -> Result<BatchReport> {
    if !session.is_authenticated() {
        return Err(Error::Config(
            "session is not authenticated; refusing to start the batch".to_string(),
        ));
    }
    let template = session
        .template()
        .ok_or_else(|| Error::Config("no template loaded in this session".to_string()))?;

    // Placement depends on the template, not on any row: resolve once.
    let placement = placement::resolve(template, token, manual_default)?;
    info!(
        page = placement.page,
        found = placement.found,
        "placement resolved"
    );

    std::fs::create_dir_all(&options.out_dir)?;

    let mut outcomes = Vec::with_capacity(rows.len());
    let mut used_names: HashMap<String, u32> = HashMap::new();

    for row in rows {
        let outcome = if !row.is_valid() {
            Outcome::SkippedInvalid {
                valid_name: row.valid_name(),
                valid_email: row.valid_email(),
            }
        } else {
            process_row(row, template, &placement, style, delivery, options, &mut used_names)
        };

        match &outcome {
            Outcome::Sent { status, .. } => info!(name = %row.name, status, "sent"),
            Outcome::Failed { reason } => warn!(name = %row.name, %reason, "row failed"),
            Outcome::SkippedInvalid { .. } => info!(name = %row.name, "skipped invalid row"),
        }
        outcomes.push((row.clone(), outcome));
    }

    Ok(BatchReport { outcomes })
}

/// Render, write, and deliver one valid row; all failures become the row's
/// outcome instead of an error.
fn process_row(
    row: &RosterRow,
    template: &crate::Template,
    placement: &crate::Placement,
    style: &RenderStyle,
    delivery: &mut dyn Delivery,
    options: &BatchOptions,
    used_names: &mut HashMap<String, u32>,
) -> Outcome {
    let bytes = match render(&row.name, template, placement, style) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Outcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    let file_name = artifact_name(&row.name, used_names);
    let path = options.out_dir.join(&file_name);
    if let Err(e) = std::fs::write(&path, &bytes) {
        return Outcome::Failed {
            reason: format!("failed to write {}: {e}", path.display()),
        };
    }

    let first_name = row.first_name();
    let mail = OutgoingMail {
        from: &options.mail.from,
        to: &row.email,
        subject: options.mail.subject.replace("{first_name}", first_name),
        html_body: options
            .mail
            .body
            .replace("{first_name}", first_name)
            .replace('\n', "<br>"),
        attachment: &bytes,
        attachment_name: &file_name,
    };

    match delivery.send(&mail) {
        Ok(status) => Outcome::Sent {
            status,
            artifact: file_name,
        },
        Err(e) => Outcome::Failed {
            reason: e.to_string(),
        },
    }
}

/// Derive an artifact file name from a display name.
///
/// Two recipients with the same displayed name would collide; later rows
/// get a numeric suffix instead of silently overwriting earlier output.
fn artifact_name(display_name: &str, used: &mut HashMap<String, u32>) -> String {
    let base = sanitize_filename::sanitize(display_name.trim());
    let base = if base.is_empty() {
        "certificate".to_string()
    } else {
        base
    };

    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        format!("{base}.pdf")
    } else {
        format!("{base}-{count}.pdf")
    }
}

/// List artifact paths currently present in an output directory (for
/// packaging)
pub fn artifact_paths(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == "pdf").unwrap_or(false))
        .collect();
    paths.sort();
    Ok(paths)
}
