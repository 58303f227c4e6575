//! Converter tests against a recording stand-in for the Pandoc binary.

use std::sync::Arc;

use downfolio_core::convert::{ConvertError, Converter};
use downfolio_store::OutputFormat;
use downfolio_test_utils::RecordingRunner;

fn markdown_in(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("resume.md");
    std::fs::write(&path, "# Resume").unwrap();
    path
}

#[tokio::test]
async fn pdf_falls_back_to_xelatex() {
    let tmp = tempfile::TempDir::new().unwrap();
    let md = markdown_in(&tmp);
    let runner = Arc::new(RecordingRunner::new().failing_on("--pdf-engine=pdflatex"));

    runner
        .converter()
        .convert_to_pdf(&md, &tmp.path().join("resume.pdf"))
        .await
        .expect("xelatex fallback should succeed");

    let runs = runner.conversions();
    assert_eq!(runs.len(), 2, "exactly two converter invocations");
    assert!(runs[0].args.contains(&"--pdf-engine=pdflatex".to_string()));
    assert!(runs[1].args.contains(&"--pdf-engine=xelatex".to_string()));
    assert!(tmp.path().join("resume.pdf").exists());
}

#[tokio::test]
async fn pdf_gives_up_after_two_engines() {
    let tmp = tempfile::TempDir::new().unwrap();
    let md = markdown_in(&tmp);
    let runner = Arc::new(
        RecordingRunner::new()
            .failing_on("--pdf-engine=pdflatex")
            .failing_on("--pdf-engine=xelatex"),
    );

    let err = runner
        .converter()
        .convert_to_pdf(&md, &tmp.path().join("resume.pdf"))
        .await
        .unwrap_err();

    match &err {
        ConvertError::PdfEnginesExhausted { tex_dir, .. } => assert!(tex_dir.is_none()),
        other => panic!("expected PdfEnginesExhausted, got {other:?}"),
    }
    assert!(err.to_string().contains("wkhtmltopdf"));
    assert_eq!(runner.conversions().len(), 2);
}

#[tokio::test]
async fn pdf_diagnostic_names_present_tex_dir() {
    let tmp = tempfile::TempDir::new().unwrap();
    let md = markdown_in(&tmp);
    let tex = tmp.path().join("texbin");
    std::fs::create_dir(&tex).unwrap();
    let runner = Arc::new(
        RecordingRunner::new()
            .failing_on("--pdf-engine=pdflatex")
            .failing_on("--pdf-engine=xelatex"),
    );
    let converter = Converter::new(runner.clone(), "pandoc").with_tex_dirs(vec![
        tmp.path().join("missing"),
        tex.clone(),
    ]);

    let err = converter
        .convert_to_pdf(&md, &tmp.path().join("resume.pdf"))
        .await
        .unwrap_err();

    match err {
        ConvertError::PdfEnginesExhausted { tex_dir, .. } => assert_eq!(tex_dir, Some(tex)),
        other => panic!("expected PdfEnginesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_source_is_reported_without_running() {
    let tmp = tempfile::TempDir::new().unwrap();
    let runner = Arc::new(RecordingRunner::new());

    let err = runner
        .converter()
        .convert_to_docx(&tmp.path().join("nope.md"), &tmp.path().join("nope.docx"))
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::SourceNotFound { .. }));
    assert!(runner.invocations().is_empty());
}

#[tokio::test]
async fn docx_uses_smart_markdown_and_standalone() {
    let tmp = tempfile::TempDir::new().unwrap();
    let md = markdown_in(&tmp);
    let runner = Arc::new(RecordingRunner::new());
    let out = tmp.path().join("resume.docx");

    runner.converter().convert_to_docx(&md, &out).await.unwrap();

    let run = &runner.conversions()[0];
    assert_eq!(run.program, "pandoc");
    assert_eq!(
        run.args,
        vec![
            md.display().to_string(),
            "-o".to_string(),
            out.display().to_string(),
            "--from".to_string(),
            "markdown+smart".to_string(),
            "--to".to_string(),
            "docx".to_string(),
            "--standalone".to_string(),
        ]
    );
}

#[tokio::test]
async fn formats_run_docx_before_pdf() {
    let tmp = tempfile::TempDir::new().unwrap();
    let runner = Arc::new(RecordingRunner::new());

    let created = runner
        .converter()
        .convert_markdown_to_formats(
            "# Resume",
            "resume.md",
            tmp.path(),
            &[OutputFormat::Pdf, OutputFormat::Docx],
        )
        .await
        .unwrap();

    assert_eq!(
        created,
        vec![
            tmp.path().join("resume.md"),
            tmp.path().join("resume.docx"),
            tmp.path().join("resume.pdf"),
        ]
    );
    let invocations = runner.invocations();
    assert!(invocations[0].is_version_check());
    assert_eq!(invocations.len(), 3);
}

#[tokio::test]
async fn docx_failure_skips_pdf() {
    let tmp = tempfile::TempDir::new().unwrap();
    let runner = Arc::new(RecordingRunner::new().failing_on("docx"));

    let err = runner
        .converter()
        .convert_markdown_to_formats(
            "# Resume",
            "resume.md",
            tmp.path(),
            &[OutputFormat::Docx, OutputFormat::Pdf],
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ConvertError::Failed {
            format: OutputFormat::Docx,
            ..
        }
    ));
    assert_eq!(runner.conversions().len(), 1);
    assert!(tmp.path().join("resume.md").exists());
}

#[tokio::test]
async fn availability_reflects_version_check() {
    let installed = Arc::new(RecordingRunner::new());
    assert!(installed.converter().is_available().await);

    let missing = Arc::new(RecordingRunner::not_installed());
    assert!(!missing.converter().is_available().await);
}
