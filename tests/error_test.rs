//! Tests for error types

use unmix_sweep::Error;

#[test]
fn test_unsupported_model_error() {
    let error = Error::UnsupportedModel("KMeans".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Unsupported model"));
    assert!(error_str.contains("KMeans"));
    assert!(error_str.contains("unmix-sweep registry"));
}

#[test]
fn test_unsupported_extractor_error() {
    let error = Error::UnsupportedExtractor("PPI".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Unsupported extractor"));
    assert!(error_str.contains("PPI"));
}

#[test]
fn test_missing_extractor_error() {
    let error = Error::MissingExtractor {
        model: "FCLS".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("FCLS"));
    assert!(error_str.contains("requires an extractor"));
}

#[test]
fn test_external_process_error() {
    let error = Error::ExternalProcess {
        command: "python unmixing.py mode=blind data=A_4 model=MSNet".to_string(),
        code: 3,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("exit status 3"));
    assert!(error_str.contains("model=MSNet"));
    assert_eq!(error.exit_code(), Some(3));
}

#[test]
fn test_malformed_artifact_error() {
    let error = Error::MalformedArtifact("variable 'E' not found".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Malformed result artifact"));
    assert!(error_str.contains("'E'"));
}

#[test]
fn test_parse_error() {
    let error = Error::ParseError("unexpected end".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Filter parse error"));
    assert!(error_str.contains("unexpected end"));
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("filter has 2 keys but 1 values".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("missing"));
}

#[test]
fn test_configuration_classification() {
    assert!(Error::UnsupportedModel("x".into()).is_configuration());
    assert!(Error::UnsupportedExtractor("x".into()).is_configuration());
    assert!(Error::MissingExtractor { model: "FCLS".into() }.is_configuration());
    assert!(Error::NoExtractors { model: "FCLS".into() }.is_configuration());

    assert!(!Error::ExternalProcess {
        command: "x".into(),
        code: 1
    }
    .is_configuration());
    assert!(!Error::Other("x".into()).is_configuration());
}

#[test]
fn test_exit_code_only_for_external_process() {
    assert_eq!(Error::Other("x".into()).exit_code(), None);
    assert_eq!(Error::Config("x".into()).exit_code(), None);
}
