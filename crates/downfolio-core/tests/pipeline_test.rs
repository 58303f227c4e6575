//! End-to-end tests for the generation pipeline with a stubbed model and a
//! recording converter.

use std::sync::Arc;

use downfolio_core::ai::AiError;
use downfolio_core::pipeline::{DocumentSelection, GenerateError, GenerationRequest, Pipeline};
use downfolio_store::{DocumentType, MapEnv, OutputFormat, Provider, RegistryError};
use downfolio_test_utils::{RecordingRunner, StubBackend, TestProfile};

fn openai_profile() -> TestProfile {
    TestProfile::new().with_env(MapEnv::new().with("OPENAI_API_KEY", "sk-test"))
}

fn resume_request(formats: Vec<OutputFormat>) -> GenerationRequest {
    GenerationRequest {
        job: "acme-swe".to_string(),
        selection: DocumentSelection::Resume,
        resume_template: Some("base".to_string()),
        cover_letter_template: None,
        formats,
        provider: Some(Provider::OpenAi),
        model: None,
        output_name: "acme".to_string(),
    }
}

fn pipeline(tp: &TestProfile, backend: &Arc<StubBackend>, runner: &Arc<RecordingRunner>) -> Pipeline {
    Pipeline::new(
        tp.profile().clone(),
        tp.customizer(backend.clone()),
        runner.converter(),
    )
}

#[tokio::test]
async fn markdown_only_writes_model_output_verbatim() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme Corp\nSenior Software Engineer\nRust, Postgres\n");
    tp.add_template("base", DocumentType::Resume, "# Jane Doe\n\n- Rust\n");
    let backend = StubBackend::replying("# Resume\nCustomized");
    let runner = Arc::new(RecordingRunner::new());

    let report = pipeline(&tp, &backend, &runner)
        .run(&resume_request(vec![OutputFormat::Markdown]))
        .await
        .expect("generation should succeed");

    let out = tp.output_dir("acme");
    assert_eq!(report.output_dir, out);
    assert_eq!(
        std::fs::read_to_string(out.join("resume.md")).unwrap(),
        "# Resume\nCustomized"
    );
    assert!(!out.join("resume.docx").exists());
    assert!(!out.join("resume.pdf").exists());
    assert!(runner.invocations().is_empty(), "markdown needs no converter");

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].provider, Provider::OpenAi);
    assert_eq!(calls[0].model, "gpt-4o-mini");
    assert!(calls[0].user.contains("Acme Corp\nSenior Software Engineer"));
    assert!(calls[0].user.contains("# Jane Doe"));
}

#[tokio::test]
async fn docx_writes_markdown_then_docx() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("```markdown\n# Resume\n```");
    let runner = Arc::new(RecordingRunner::new());

    let report = pipeline(&tp, &backend, &runner)
        .run(&resume_request(vec![OutputFormat::Docx]))
        .await
        .expect("generation should succeed");

    let out = tp.output_dir("acme");
    let files: Vec<_> = report.files().cloned().collect();
    assert_eq!(files, vec![out.join("resume.md"), out.join("resume.docx")]);
    assert!(out.join("resume.docx").exists());
    assert_eq!(
        std::fs::read_to_string(out.join("resume.md")).unwrap(),
        "# Resume",
        "code fence should be stripped before writing"
    );

    let conversions = runner.conversions();
    assert_eq!(conversions.len(), 1);
    assert!(conversions[0].args.contains(&"docx".to_string()));
}

#[tokio::test]
async fn no_api_keys_fails_before_any_side_effect() {
    let tp = TestProfile::new();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::new());

    let mut request = resume_request(vec![OutputFormat::Markdown]);
    request.provider = None;

    let err = pipeline(&tp, &backend, &runner)
        .run(&request)
        .await
        .expect_err("generation must fail without keys");

    assert!(
        matches!(err, GenerateError::Ai(AiError::NoApiKeyConfigured)),
        "unexpected error: {err:?}"
    );
    assert_eq!(backend.call_count(), 0);
    assert!(!tp.output_dir("acme").exists());
}

#[tokio::test]
async fn explicit_provider_without_key_is_rejected() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::new());

    let mut request = resume_request(vec![OutputFormat::Markdown]);
    request.provider = Some(Provider::Anthropic);

    let err = pipeline(&tp, &backend, &runner)
        .run(&request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GenerateError::Ai(AiError::MissingApiKey {
            provider: Provider::Anthropic
        })
    ));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn both_documents_generated_resume_first() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    tp.add_template("base", DocumentType::CoverLetter, "Dear team");
    let backend = StubBackend::with_responses(vec![
        Ok("# Resume".to_string()),
        Ok("Dear Acme".to_string()),
    ]);
    let runner = Arc::new(RecordingRunner::new());

    let mut request = resume_request(vec![OutputFormat::Markdown]);
    request.selection = DocumentSelection::Both;
    request.cover_letter_template = Some("base".to_string());

    let report = pipeline(&tp, &backend, &runner).run(&request).await.unwrap();

    let types: Vec<_> = report.documents.iter().map(|d| d.doc_type).collect();
    assert_eq!(types, vec![DocumentType::Resume, DocumentType::CoverLetter]);

    let out = tp.output_dir("acme");
    assert_eq!(std::fs::read_to_string(out.join("resume.md")).unwrap(), "# Resume");
    assert_eq!(
        std::fs::read_to_string(out.join("cover_letter.md")).unwrap(),
        "Dear Acme"
    );

    let calls = backend.calls();
    assert!(calls[0].system.contains("resume writer"));
    assert!(calls[1].system.contains("cover letter writer"));
}

#[tokio::test]
async fn failure_on_second_document_keeps_first() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    tp.add_template("base", DocumentType::CoverLetter, "Dear team");
    let backend = StubBackend::with_responses(vec![
        Ok("# Resume".to_string()),
        Err(AiError::RateLimited {
            provider: Provider::OpenAi,
            message: "slow down".to_string(),
        }),
    ]);
    let runner = Arc::new(RecordingRunner::new());

    let mut request = resume_request(vec![OutputFormat::Markdown]);
    request.selection = DocumentSelection::Both;
    request.cover_letter_template = Some("base".to_string());

    let err = pipeline(&tp, &backend, &runner)
        .run(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::Ai(AiError::RateLimited { .. })));
    let out = tp.output_dir("acme");
    assert!(out.join("resume.md").exists());
    assert!(!out.join("cover_letter.md").exists());
}

#[tokio::test]
async fn missing_cover_letter_template_is_caught_up_front() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::new());

    let mut request = resume_request(vec![OutputFormat::Markdown]);
    request.selection = DocumentSelection::Both;

    let err = pipeline(&tp, &backend, &runner)
        .run(&request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GenerateError::MissingTemplate {
            doc_type: DocumentType::CoverLetter
        }
    ));
    assert_eq!(backend.call_count(), 0);
    assert!(!tp.output_dir("acme").exists());
}

#[tokio::test]
async fn unknown_model_for_provider_is_rejected() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::new());

    let mut request = resume_request(vec![OutputFormat::Markdown]);
    request.model = Some("claude-opus-4-5".to_string());

    let err = pipeline(&tp, &backend, &runner)
        .run(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::InvalidModel { .. }));
    assert!(err.to_string().contains("gpt-4o-mini, gpt-4o, gpt-4-turbo"));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn deleted_job_file_is_a_hard_error() {
    let tp = openai_profile();
    let job_file = tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    std::fs::remove_file(&job_file).unwrap();
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::new());

    let err = pipeline(&tp, &backend, &runner)
        .run(&resume_request(vec![OutputFormat::Markdown]))
        .await
        .unwrap_err();

    assert!(
        matches!(err, GenerateError::Registry(RegistryError::FileNotFound { .. })),
        "unexpected error: {err:?}"
    );
    assert!(err.to_string().starts_with("Job file not found: "));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn unavailable_converter_stops_after_markdown() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::not_installed());

    let err = pipeline(&tp, &backend, &runner)
        .run(&resume_request(vec![OutputFormat::Markdown, OutputFormat::Pdf]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GenerateError::Convert(downfolio_core::ConvertError::ConverterUnavailable { .. })
    ));
    let out = tp.output_dir("acme");
    assert!(out.join("resume.md").exists());
    assert!(runner.conversions().is_empty());
}

#[tokio::test]
async fn configured_default_model_is_used() {
    let tp = openai_profile();
    tp.set_config("OPENAI_MODEL", "gpt-4o");
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::new());

    let report = pipeline(&tp, &backend, &runner)
        .run(&resume_request(vec![OutputFormat::Markdown]))
        .await
        .unwrap();

    assert_eq!(report.documents[0].model, "gpt-4o");
    assert_eq!(backend.calls()[0].model, "gpt-4o");
}

#[tokio::test]
async fn empty_model_falls_back_to_custom_default() {
    let tp = openai_profile();
    tp.set_config("OPENAI_MODEL", "gpt-4.1");
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::new());

    let mut request = resume_request(vec![OutputFormat::Markdown]);
    request.model = Some(String::new());

    let report = pipeline(&tp, &backend, &runner)
        .run(&request)
        .await
        .expect("an empty model should defer to the configured default");

    assert_eq!(report.documents[0].model, "gpt-4.1");
    assert_eq!(backend.calls()[0].model, "gpt-4.1");
}

#[tokio::test]
async fn output_name_is_trimmed_on_disk() {
    let tp = openai_profile();
    tp.add_job("acme-swe", "Acme");
    tp.add_template("base", DocumentType::Resume, "# Jane");
    let backend = StubBackend::replying("# Resume");
    let runner = Arc::new(RecordingRunner::new());

    let mut request = resume_request(vec![OutputFormat::Markdown]);
    request.output_name = " acme ".to_string();

    let report = pipeline(&tp, &backend, &runner).run(&request).await.unwrap();

    assert_eq!(report.output_dir, tp.output_dir("acme"));
    assert!(tp.output_dir("acme").join("resume.md").exists());
    assert!(!tp.profile().output_dir().join(" acme ").exists());
}
