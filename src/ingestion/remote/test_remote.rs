use super::*;

#[test]
fn status_error_test_auth_failures() {
    for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
        match _status_error(status, "{\"title\":\"Unauthorized\"}") {
            IngestionError::Authentication(message) => {
                assert!(message.contains(status.as_str()));
                assert!(message.contains("Unauthorized"));
            }
            other => panic!("expected an authentication error, got {:?}", other),
        }
    }
}

#[test]
fn status_error_test_other_statuses() {
    for status in [StatusCode::TOO_MANY_REQUESTS, StatusCode::INTERNAL_SERVER_ERROR] {
        match _status_error(status, "try later") {
            IngestionError::StreamStatus(message) => {
                assert!(message.contains(status.as_str()));
                assert!(message.contains("try later"));
            }
            other => panic!("expected a stream status error, got {:?}", other),
        }
    }
}

#[test]
fn rules_url_test() {
    let source = FilteredStream::new("https://api.example.com/2/", "token");
    assert_eq!(
        source._rules_url().unwrap(),
        "https://api.example.com/2/tweets/search/stream/rules"
    );
}
