//! Integration tests for the template and job registries.

use downfolio_store::{
    DocumentType, Job, JobKey, Profile, Registry, RegistryError, Template, TemplateKey,
};
use downfolio_test_utils::TestProfile;

#[test]
fn read_content_returns_exact_bytes() {
    let tp = TestProfile::new();
    let content = "# Jane Doe\r\n\n- Rust  \n- Go\n\n\n";
    tp.add_template("base", DocumentType::Resume, content);

    let read = tp
        .templates()
        .read_content(&TemplateKey::new("base", DocumentType::Resume))
        .unwrap();
    assert_eq!(read, content);
}

#[test]
fn remove_leaves_file_untouched() {
    let tp = TestProfile::new();
    let path = tp.add_job("acme", "Acme is hiring");

    let removed = tp.jobs().remove(&JobKey::from("acme")).unwrap();

    assert_eq!(removed.name, "acme");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Acme is hiring");
    assert!(tp.jobs().list().is_empty());
}

#[test]
fn duplicate_name_and_type_fails_but_other_type_succeeds() {
    let tp = TestProfile::new();
    let path = tp.write_template("base.md", "# Base");
    let templates = tp.templates();

    templates
        .add(Template::new("base", DocumentType::Resume), &path)
        .unwrap();

    let err = templates
        .add(Template::new("base", DocumentType::Resume), &path)
        .unwrap_err();
    assert!(matches!(err, RegistryError::Duplicate { .. }));
    assert_eq!(
        err.to_string(),
        "Template \"base\" of type \"resume\" already exists"
    );

    templates
        .add(Template::new("base", DocumentType::CoverLetter), &path)
        .unwrap();
    assert_eq!(templates.list().len(), 2);
    assert_eq!(templates.of_type(DocumentType::CoverLetter).len(), 1);
}

#[test]
fn add_requires_existing_file() {
    let tp = TestProfile::new();
    let missing = tp.profile().jobs_dir().join("ghost.md");

    let err = tp.jobs().add(Job::new("ghost"), &missing).unwrap_err();

    assert!(matches!(err, RegistryError::FileNotFound { .. }));
    assert!(err.to_string().starts_with("Job file not found: "));
    assert!(!tp.jobs().path().exists(), "nothing should be persisted");
}

#[test]
fn add_stores_absolute_path() {
    let tp = TestProfile::new();
    let path = tp.write_job("acme.md", "Acme");

    let job = tp.jobs().add(Job::new("acme"), &path).unwrap();

    assert!(job.file_path.is_absolute());
    assert_eq!(job.file_path, path);
    assert_eq!(tp.jobs().get(&JobKey::from("acme")), Some(job));
}

#[test]
fn remove_unknown_is_not_found() {
    let tp = TestProfile::new();
    let err = tp
        .templates()
        .remove(&TemplateKey::new("base", DocumentType::CoverLetter))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Template \"base\" of type \"cover-letter\" not found"
    );
}

#[test]
fn read_content_after_file_deleted_is_file_not_found() {
    let tp = TestProfile::new();
    let path = tp.add_job("acme", "Acme");
    std::fs::remove_file(&path).unwrap();

    let err = tp.jobs().read_content(&JobKey::from("acme")).unwrap_err();
    assert!(matches!(err, RegistryError::FileNotFound { .. }));
}

#[test]
fn storage_file_is_pretty_json_array_with_original_field_names() {
    let tp = TestProfile::new();
    let path = tp.add_template("base", DocumentType::CoverLetter, "Dear team");

    let raw = std::fs::read_to_string(tp.profile().templates_dir().join("storage.json")).unwrap();
    assert!(raw.contains('\n'), "expected pretty-printed JSON");

    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!([{
            "name": "base",
            "type": "cover-letter",
            "filePath": path.display().to_string(),
        }])
    );
}

#[test]
fn registries_are_independent() {
    let tp = TestProfile::new();
    tp.add_job("acme", "Acme");
    let profile: &Profile = tp.profile();

    let templates = Registry::<Template>::templates(profile);
    assert!(templates.list().is_empty());
    assert_eq!(Registry::<Job>::jobs(profile).list().len(), 1);
}
