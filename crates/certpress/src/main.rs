//! certpress - bulk certificate generator and sender
//!
//! Reads a roster CSV, stamps each recipient's name into a template PDF,
//! emails the result through SendGrid, and packages all outputs into a
//! zip. Rows that fail validation are exported for manual review instead
//! of being sent.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use certify::batch::MailSettings;
use certify::{
    placement, roster, run_batch, BatchOptions, Delivery, FontChoice, Outcome, Rect, RenderStyle,
    Session,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod delivery;
mod package;

use config::Config;
use delivery::{DryRunDelivery, SendGridDelivery};

/// certpress - bulk certificate generator and sender
#[derive(Parser, Debug)]
#[command(name = "certpress")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Roster CSV with `Name` and `Email` columns
    roster: PathBuf,

    /// Certificate template PDF
    template: PathBuf,

    /// Placeholder token searched verbatim in the template text
    #[arg(long, default_value = "<fullName>")]
    token: String,

    /// Built-in font (Helvetica/Times/Courier families, -Bold/-Italic/-BoldItalic)
    #[arg(long, default_value = "Helvetica")]
    font: String,

    /// TTF file to embed instead of a built-in font
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Font size in points
    #[arg(long, default_value_t = 24.0)]
    size: f64,

    /// Name color as #rrggbb
    #[arg(long, default_value = "#000000")]
    color: String,

    /// Manual fallback rectangle "x0,y0,x1,y1" in points from the top-left
    /// of the page, used when the placeholder is not found
    #[arg(long)]
    rect: Option<String>,

    /// Derive the fallback rectangle from page geometry instead
    #[arg(long)]
    auto_rect: bool,

    /// Output directory for rendered certificates
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Where to write the review CSV for rows failing validation
    /// (defaults to invalid_rows.csv inside the output directory)
    #[arg(long)]
    review_report: Option<PathBuf>,

    /// Render and package everything without sending any email
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("certpress={0},certify={0}", cli.log_level))
        }))
        .init();

    if cli.size <= 0.0 {
        bail!("--size must be positive");
    }

    // Configuration is validated before anything else runs; a live batch
    // never starts with missing credentials.
    let config = if cli.dry_run {
        Config::dry_run()
    } else {
        Config::from_env()?
    };

    let mut session = Session::new();
    session.authenticate();
    let template_bytes = std::fs::read(&cli.template)
        .with_context(|| format!("failed to read template {}", cli.template.display()))?;
    session.load_template(template_bytes)?;

    let rows = roster::read_roster_file(&cli.roster)
        .with_context(|| format!("failed to read roster {}", cli.roster.display()))?;
    if rows.is_empty() {
        bail!("roster {} contains no rows", cli.roster.display());
    }

    let font_data = cli
        .font_file
        .as_ref()
        .map(|path| {
            std::fs::read(path)
                .with_context(|| format!("failed to read font file {}", path.display()))
        })
        .transpose()?;
    let style = RenderStyle {
        color: certify::style::parse_hex_color(&cli.color)?,
        font_size: cli.size,
        font: FontChoice::pick(Some(&cli.font), font_data)?,
    };

    let manual_rect = resolve_manual_rect(&cli, &session)?;

    let options = BatchOptions {
        out_dir: cli.out_dir.clone(),
        mail: MailSettings {
            from: config.from_email.clone(),
            subject: config.subject.clone(),
            body: config.body.clone(),
        },
    };

    let mut transport: Box<dyn Delivery> = if cli.dry_run {
        Box::new(DryRunDelivery)
    } else {
        Box::new(SendGridDelivery::new(config.sendgrid_api_key.clone()))
    };

    let report = run_batch(
        &session,
        &rows,
        &style,
        &cli.token,
        manual_rect,
        transport.as_mut(),
        &options,
    )?;

    for (row, outcome) in &report.outcomes {
        match outcome {
            Outcome::Sent { status, artifact } => {
                println!("{} ({}) -> sent, status {status}, {artifact}", row.name, row.email);
            }
            Outcome::Failed { reason } => {
                println!("{} ({}) -> FAILED: {reason}", row.name, row.email);
            }
            Outcome::SkippedInvalid {
                valid_name,
                valid_email,
            } => {
                println!(
                    "{} ({}) -> skipped (valid name: {valid_name}, valid email: {valid_email})",
                    row.name, row.email
                );
            }
        }
    }

    if report.skipped_count() > 0 {
        let review_path = cli
            .review_report
            .clone()
            .unwrap_or_else(|| cli.out_dir.join("invalid_rows.csv"));
        let file = std::fs::File::create(&review_path)
            .with_context(|| format!("failed to create {}", review_path.display()))?;
        let written = roster::export_review_report(&rows, file)?;
        println!(
            "{written} row(s) need review: {}",
            review_path.display()
        );
    }

    if report.sent_count() > 0 {
        let archive_path = cli
            .out_dir
            .join(package::archive_name(chrono::Local::now().date_naive()));
        let packed = package::zip_outputs(&cli.out_dir, &archive_path)?;
        println!("packed {packed} certificate(s) into {}", archive_path.display());
    }

    println!(
        "done: {} sent, {} failed, {} skipped",
        report.sent_count(),
        report.failed_count(),
        report.skipped_count()
    );

    Ok(())
}

/// Parse --rect, or derive a geometry default with --auto-rect
fn resolve_manual_rect(cli: &Cli, session: &Session) -> Result<Option<Rect>> {
    if let Some(spec) = &cli.rect {
        let parts: Vec<f64> = spec
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("--rect expects x0,y0,x1,y1, got {spec}"))?;
        if parts.len() != 4 {
            bail!("--rect expects exactly four numbers, got {spec}");
        }
        let rect = Rect::new(parts[0], parts[1], parts[2], parts[3]);
        if !rect.is_valid() {
            bail!("--rect has zero or negative width/height: {spec}");
        }
        return Ok(Some(rect));
    }

    if cli.auto_rect {
        let template = session
            .template()
            .expect("template loaded before rect resolution");
        let (width, height) = template
            .page_size(1)
            .context("template has no first page")?;
        return Ok(Some(placement::default_rect(width, height)));
    }

    Ok(None)
}
