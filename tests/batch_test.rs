use std::fs;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;
use tempfile::TempDir;

use pdf_outline::batch::{self, BatchOptions};
use pdf_outline::{
    extract, BoundingBox, DocumentInput, Error, OutlineConfig, TextSpan, TitleSource,
};

/// One-page PDF: a 24pt bold title, a 16pt numbered heading and body text.
fn write_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let body = "The committee met twice during the quarter to review spending against the plan \
                and agreed the priorities that are described in the sections below.";
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F2".into(), 24.into()]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), 760.into()]),
            Operation::new("Tj", vec![Object::string_literal("Quarterly Report")]),
            Operation::new("Tf", vec!["F2".into(), 16.into()]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("1. Spending")]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), 660.into()]),
            Operation::new("Tj", vec![Object::string_literal(body)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn span_dump() -> DocumentInput {
    let line = |text: &str, order: usize, y: f64, size: f64| {
        TextSpan::new(
            text,
            1,
            size,
            "Arial",
            BoundingBox::new(72.0, y, 400.0, y + size),
            order,
        )
    };
    DocumentInput::new(vec![
        line("2. Methods", 0, 700.0, 18.0),
        line(
            "Samples were collected weekly from each site and analysed in the central laboratory \
             under the same conditions throughout.",
            1,
            660.0,
            11.0,
        ),
        line("2.1 Sampling", 2, 620.0, 14.0),
    ])
    .with_metadata_title("Field Study")
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_pdf_file_end_to_end() {
    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("report.pdf");
    write_pdf(&pdf);

    let input = extract::load_pdf(&pdf).unwrap();
    assert_eq!(input.spans.len(), 3);
    assert!(input.spans[0].is_bold);

    let outline = batch::process_file(&pdf, &OutlineConfig::default()).unwrap();
    assert_eq!(outline.title.text, "Quarterly Report");
    assert_eq!(outline.title.source, TitleSource::FirstPageHeuristic);
    assert_eq!(outline.entries.len(), 1);
    assert_eq!(outline.entries[0].text, "1. Spending");
}

#[test]
fn test_span_dump_written_in_outline_format() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("study.json");
    let output = dir.path().join("study.outline.json");
    fs::write(&input, serde_json::to_string(&span_dump()).unwrap()).unwrap();

    let outline = batch::process_file(&input, &OutlineConfig::default()).unwrap();
    batch::write_outline(&outline, &output, true).unwrap();

    let json = read_json(&output);
    assert_eq!(json["title"], "Field Study");
    assert_eq!(json["outline"][0]["level"], "H1");
    assert_eq!(json["outline"][0]["text"], "2. Methods");
    assert_eq!(json["outline"][0]["page"], 1);
    assert_eq!(json["outline"][1]["level"], "H2");
    assert_eq!(json["outline"].as_array().unwrap().len(), 2);
}

#[test]
fn test_directory_batch_skips_failures() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let out = output_dir.path().join("outlines");

    write_pdf(&input_dir.path().join("alpha.pdf"));
    fs::write(
        input_dir.path().join("beta.json"),
        serde_json::to_string(&span_dump()).unwrap(),
    )
    .unwrap();
    fs::write(input_dir.path().join("broken.json"), "{ not json").unwrap();
    fs::write(input_dir.path().join("notes.txt"), "ignored").unwrap();

    for parallel in [true, false] {
        let options = BatchOptions::default().with_parallel(parallel);
        let report =
            batch::process_directory(input_dir.path(), &out, &OutlineConfig::default(), &options)
                .unwrap();

        assert!(!report.is_success());
        assert_eq!(
            report.written,
            vec![out.join("alpha.json"), out.join("beta.json")]
        );
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("broken.json"));
    }

    assert_eq!(read_json(&out.join("alpha.json"))["title"], "Quarterly Report");
    assert_eq!(read_json(&out.join("beta.json"))["title"], "Field Study");
    assert!(!out.join("broken.json").exists());
    assert!(!out.join("notes.json").exists());
}

#[test]
fn test_compact_output_is_single_line() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("study.json");
    fs::write(&input, serde_json::to_string(&span_dump()).unwrap()).unwrap();

    let options = BatchOptions::default().with_pretty(false);
    let out = dir.path().join("out");
    let report =
        batch::process_directory(dir.path(), &out, &OutlineConfig::default(), &options).unwrap();

    assert!(report.is_success());
    let text = fs::read_to_string(out.join("study.json")).unwrap();
    assert!(!text.contains('\n'));
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"max_heading_words": 12, "max_text_recurrence": 5}"#).unwrap();

    let config = OutlineConfig::from_file(&path).unwrap();
    assert_eq!(config.max_heading_words, 12);
    assert_eq!(config.max_text_recurrence, 5);
    assert_eq!(config.tier_tolerance, OutlineConfig::default().tier_tolerance);
}

#[test]
fn test_same_stem_inputs_do_not_share_output() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let out = output_dir.path().join("o");

    write_pdf(&input_dir.path().join("a.pdf"));
    fs::write(
        input_dir.path().join("a.json"),
        serde_json::to_string(&span_dump()).unwrap(),
    )
    .unwrap();

    for parallel in [true, false] {
        let options = BatchOptions::default().with_parallel(parallel);
        let report =
            batch::process_directory(input_dir.path(), &out, &OutlineConfig::default(), &options)
                .unwrap();

        assert_eq!(report.written, vec![out.join("a.json")]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("a.pdf"));
        assert!(report.failed[0].1.contains("already written"));
    }

    // a.json sorts first, so its outline is the one on disk.
    assert_eq!(read_json(&out.join("a.json"))["title"], "Field Study");
}

#[test]
fn test_outline_file_rejected_as_input() {
    let dir = TempDir::new().unwrap();
    let previous = dir.path().join("report.json");
    fs::write(
        &previous,
        r#"{"title":"Quarterly Report","outline":[{"level":"H1","text":"1. Spending","page":1}]}"#,
    )
    .unwrap();

    let err = batch::process_file(&previous, &OutlineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}
