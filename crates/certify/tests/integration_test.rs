//! Integration tests for placement, rendering, and batch orchestration

use certify::batch::{artifact_paths, MailSettings, OutgoingMail};
use certify::{
    placement, render, roster, run_batch, BatchOptions, Delivery, DeliveryError, FontChoice,
    Outcome, Rect, RenderStyle, RosterRow, Session, Template,
};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream};
use pdf_stamp::WorkingDoc;
use pretty_assertions::assert_eq;

/// Build a single-page US Letter certificate template with a placeholder
/// run and a title run.
fn build_template(placeholder: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 18.into()]),
            Operation::new("Td", vec![150.into(), 700.into()]),
            Operation::new(
                "Tj",
                vec![Object::string_literal("Certificate of Attendance")],
            ),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 400.into()]),
            Operation::new("Tj", vec![Object::string_literal(placeholder)]),
            Operation::new("ET", vec![]),
        ],
    };

    let content_bytes = content.encode().unwrap();
    let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

    let page_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(page_tree_id)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
    ]));

    let page_tree = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ("Count", Object::Integer(1)),
    ]);
    doc.objects.insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Test double for the delivery collaborator: records sends, optionally
/// failing the n-th call.
#[derive(Default)]
struct RecordingDelivery {
    sent: Vec<(String, String, String)>,
    fail_on_call: Option<usize>,
    calls: usize,
}

impl Delivery for RecordingDelivery {
    fn send(&mut self, mail: &OutgoingMail<'_>) -> Result<u16, DeliveryError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on_call == Some(call) {
            return Err(DeliveryError("quota exceeded (429)".to_string()));
        }
        self.sent.push((
            mail.to.to_string(),
            mail.subject.clone(),
            mail.html_body.clone(),
        ));
        Ok(202)
    }
}

fn test_session() -> Session {
    let mut session = Session::new();
    session.authenticate();
    session.load_template(build_template("<fullName>")).unwrap();
    session
}

fn test_options(out_dir: &std::path::Path) -> BatchOptions {
    BatchOptions {
        out_dir: out_dir.to_path_buf(),
        mail: MailSettings {
            from: "events@example.com".to_string(),
            subject: "Your certificate, {first_name}".to_string(),
            body: "Dear {first_name},\n\nThank you for attending.".to_string(),
        },
    }
}

#[test]
fn placement_finds_placeholder() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let found = placement::resolve(&template, "<fullName>", None).unwrap();

    assert!(found.found);
    assert_eq!(found.page, 1);
    assert!((found.rect.x0 - 100.0).abs() < 1e-6);
}

#[test]
fn placeholder_takes_precedence_over_manual_rect() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let manual = Rect::new(0.0, 0.0, 50.0, 50.0);

    let resolved = placement::resolve(&template, "<fullName>", Some(manual)).unwrap();
    assert!(resolved.found);
    assert_ne!(resolved.rect, manual);
}

#[test]
fn placement_falls_back_to_manual_rect() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let manual = Rect::new(100.0, 350.0, 500.0, 420.0);

    let resolved = placement::resolve(&template, "<missingToken>", Some(manual)).unwrap();
    assert!(!resolved.found);
    assert_eq!(resolved.page, 1);
    assert_eq!(resolved.rect, manual);
}

#[test]
fn placement_without_target_fails() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let result = placement::resolve(&template, "<missingToken>", None);
    assert!(matches!(result, Err(certify::Error::NoPlacementTarget)));
}

#[test]
fn placement_is_deterministic() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let a = placement::resolve(&template, "<fullName>", None).unwrap();
    let b = placement::resolve(&template, "<fullName>", None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn render_erases_placeholder_and_centers_name() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let resolved = placement::resolve(&template, "<fullName>", None).unwrap();
    let style = RenderStyle::default();

    let output = render("Jane Doe", &template, &resolved, &style).unwrap();

    let doc = WorkingDoc::from_bytes(&output).unwrap();
    let spans = doc.scan_text().unwrap();

    assert!(spans.iter().all(|s| !s.text.contains("<fullName>")));
    let drawn = spans
        .iter()
        .find(|s| s.text == "Jane Doe")
        .expect("name not drawn");

    // Horizontally centered within the placeholder rectangle
    let drawn_center = (drawn.rect.x0 + drawn.rect.x1) / 2.0;
    let rect_center = (resolved.rect.x0 + resolved.rect.x1) / 2.0;
    assert!((drawn_center - rect_center).abs() < 0.5);

    // The title run is untouched
    assert!(spans.iter().any(|s| s.text.contains("Certificate")));
}

#[test]
fn render_is_idempotent_in_content() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let resolved = placement::resolve(&template, "<fullName>", None).unwrap();
    let style = RenderStyle::default();

    let first = render("Jane Doe", &template, &resolved, &style).unwrap();
    let second = render("Jane Doe", &template, &resolved, &style).unwrap();

    let spans_a = WorkingDoc::from_bytes(&first).unwrap().scan_text().unwrap();
    let spans_b = WorkingDoc::from_bytes(&second).unwrap().scan_text().unwrap();

    assert_eq!(spans_a.len(), spans_b.len());
    for (a, b) in spans_a.iter().zip(spans_b.iter()) {
        assert_eq!(a.text, b.text);
        assert_eq!(a.rect, b.rect);
    }
}

#[test]
fn render_with_manual_rect_skips_redaction() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let manual = certify::Placement {
        page: 1,
        rect: Rect::new(100.0, 500.0, 500.0, 560.0),
        found: false,
    };

    let output = render("Bob Smith", &template, &manual, &RenderStyle::default()).unwrap();
    let spans = WorkingDoc::from_bytes(&output).unwrap().scan_text().unwrap();

    // Nothing was erased: the placeholder run is still there, plus the name
    assert!(spans.iter().any(|s| s.text.contains("<fullName>")));
    assert!(spans.iter().any(|s| s.text == "Bob Smith"));
}

#[test]
fn render_rejects_invalid_rect() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let degenerate = certify::Placement {
        page: 1,
        rect: Rect::new(100.0, 500.0, 100.0, 560.0),
        found: false,
    };

    let result = render("Jane Doe", &template, &degenerate, &RenderStyle::default());
    assert!(matches!(result, Err(certify::Error::Render(_))));
}

#[test]
fn render_rejects_malformed_embedded_font() {
    let template = Template::from_bytes(build_template("<fullName>")).unwrap();
    let resolved = placement::resolve(&template, "<fullName>", None).unwrap();

    let style = RenderStyle {
        font: FontChoice::Embedded(vec![0u8; 32]),
        ..RenderStyle::default()
    };

    let result = render("Jane Doe", &template, &resolved, &style);
    assert!(matches!(result, Err(certify::Error::Render(_))));
}

#[test]
fn batch_end_to_end_three_rows() {
    let session = test_session();
    let rows = vec![
        RosterRow::new("Jane Doe", "jane@x.com"),
        RosterRow::new("Test", "bad-email"),
        RosterRow::new("Bob Smith", "bob@x.com"),
    ];
    let out_dir = tempfile::tempdir().unwrap();
    let options = test_options(out_dir.path());
    let mut delivery = RecordingDelivery::default();

    let report = run_batch(
        &session,
        &rows,
        &RenderStyle::default(),
        "<fullName>",
        None,
        &mut delivery,
        &options,
    )
    .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.sent_count(), 2);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.failed_count(), 0);

    // Outcomes stay in roster order
    assert!(matches!(report.outcomes[0].1, Outcome::Sent { .. }));
    assert!(matches!(
        report.outcomes[1].1,
        Outcome::SkippedInvalid {
            valid_name: false,
            valid_email: false,
        }
    ));
    assert!(matches!(report.outcomes[2].1, Outcome::Sent { .. }));

    // Two artifacts, named after the valid recipients
    let paths = artifact_paths(out_dir.path()).unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["Bob Smith.pdf", "Jane Doe.pdf"]);

    // One row in the review report
    let mut review = Vec::new();
    let written = roster::export_review_report(&rows, &mut review).unwrap();
    assert_eq!(written, 1);
}

#[test]
fn batch_substitutes_first_name() {
    let session = test_session();
    let rows = vec![RosterRow::new("Jane Doe", "jane@x.com")];
    let out_dir = tempfile::tempdir().unwrap();
    let options = test_options(out_dir.path());
    let mut delivery = RecordingDelivery::default();

    run_batch(
        &session,
        &rows,
        &RenderStyle::default(),
        "<fullName>",
        None,
        &mut delivery,
        &options,
    )
    .unwrap();

    assert_eq!(delivery.sent.len(), 1);
    let (to, subject, body) = &delivery.sent[0];
    assert_eq!(to, "jane@x.com");
    assert_eq!(subject, "Your certificate, Jane");
    assert!(body.contains("Dear Jane,"));
    assert!(body.contains("<br>"));
    assert!(!body.contains('\n'));
}

#[test]
fn batch_survives_delivery_failure_mid_run() {
    let session = test_session();
    let rows = vec![
        RosterRow::new("Jane Doe", "jane@x.com"),
        RosterRow::new("Ann Lee", "ann@x.com"),
        RosterRow::new("Bob Smith", "bob@x.com"),
    ];
    let out_dir = tempfile::tempdir().unwrap();
    let options = test_options(out_dir.path());
    let mut delivery = RecordingDelivery {
        fail_on_call: Some(1),
        ..Default::default()
    };

    let report = run_batch(
        &session,
        &rows,
        &RenderStyle::default(),
        "<fullName>",
        None,
        &mut delivery,
        &options,
    )
    .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert!(matches!(report.outcomes[0].1, Outcome::Sent { .. }));
    assert!(
        matches!(&report.outcomes[1].1, Outcome::Failed { reason } if reason.contains("quota"))
    );
    assert!(matches!(report.outcomes[2].1, Outcome::Sent { .. }));
}

#[test]
fn batch_disambiguates_duplicate_names() {
    let session = test_session();
    let rows = vec![
        RosterRow::new("Jane Doe", "jane@x.com"),
        RosterRow::new("Jane Doe", "jane.d@y.com"),
    ];
    let out_dir = tempfile::tempdir().unwrap();
    let options = test_options(out_dir.path());
    let mut delivery = RecordingDelivery::default();

    let report = run_batch(
        &session,
        &rows,
        &RenderStyle::default(),
        "<fullName>",
        None,
        &mut delivery,
        &options,
    )
    .unwrap();

    assert_eq!(report.sent_count(), 2);
    let names: Vec<String> = artifact_paths(out_dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["Jane Doe-2.pdf", "Jane Doe.pdf"]);
}

#[test]
fn batch_requires_authentication() {
    let mut session = Session::new();
    session.load_template(build_template("<fullName>")).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let options = test_options(out_dir.path());
    let mut delivery = RecordingDelivery::default();

    let result = run_batch(
        &session,
        &[RosterRow::new("Jane Doe", "jane@x.com")],
        &RenderStyle::default(),
        "<fullName>",
        None,
        &mut delivery,
        &options,
    );
    assert!(matches!(result, Err(certify::Error::Config(_))));
    assert_eq!(delivery.calls, 0);
}

#[test]
fn batch_requires_template() {
    let mut session = Session::new();
    session.authenticate();

    let out_dir = tempfile::tempdir().unwrap();
    let options = test_options(out_dir.path());
    let mut delivery = RecordingDelivery::default();

    let result = run_batch(
        &session,
        &[RosterRow::new("Jane Doe", "jane@x.com")],
        &RenderStyle::default(),
        "<fullName>",
        None,
        &mut delivery,
        &options,
    );
    assert!(matches!(result, Err(certify::Error::Config(_))));
}

#[test]
fn batch_no_placement_target_is_fatal() {
    let session = test_session();
    let out_dir = tempfile::tempdir().unwrap();
    let options = test_options(out_dir.path());
    let mut delivery = RecordingDelivery::default();

    let result = run_batch(
        &session,
        &[RosterRow::new("Jane Doe", "jane@x.com")],
        &RenderStyle::default(),
        "<nothingHere>",
        None,
        &mut delivery,
        &options,
    );
    assert!(matches!(result, Err(certify::Error::NoPlacementTarget)));
    assert_eq!(delivery.calls, 0);
}
