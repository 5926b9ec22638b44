use super::*;

#[test]
fn test_kind_taxonomy() {
    assert_eq!(
        Error::from(agentic_llm::Error::Timeout(10)).kind(),
        ErrorKind::Upstream
    );
    assert_eq!(
        Error::from(agentic_llm::Error::Parse("x".into())).kind(),
        ErrorKind::Parsing
    );
    assert_eq!(
        Error::from(agentic_tools::Error::Http {
            status: 500,
            body: String::new()
        })
        .kind(),
        ErrorKind::Upstream
    );
    assert_eq!(Error::InvalidState("fifth".into()).kind(), ErrorKind::Protocol);
    assert_eq!(
        Error::ConversationActive {
            user_id: "u".into(),
            kind: ConversationKind::Resume
        }
        .kind(),
        ErrorKind::Protocol
    );
    assert_eq!(Error::InvalidToken("x".into()).kind(), ErrorKind::Protocol);
    assert_eq!(Error::Internal("x".into()).kind(), ErrorKind::Internal);
}

#[test]
fn test_user_message_hides_details() {
    let err = Error::from(agentic_tools::Error::Http {
        status: 500,
        body: "stack trace at line 42".into(),
    });
    assert!(!err.user_message().contains("line 42"));
    assert!(err.suggestion().is_some());
}

#[test]
fn test_conversation_messages_name_the_kind() {
    let err = Error::ConversationActive {
        user_id: "u1".into(),
        kind: ConversationKind::CoverLetter,
    };
    assert!(err.user_message().contains("cover letter"));
    assert!(err.to_string().contains("u1"));
}
