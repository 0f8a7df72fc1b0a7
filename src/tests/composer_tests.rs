//! tests/composer_tests.rs
//! SmtpComposer sin servidor SMTP: borradores y validación de campos.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_rt::test;

    use crate::error::MailerError;
    use crate::models::message_model::MessageRequest;
    use crate::models::settings_model::Settings;
    use crate::services::composer_service::{ComposeOutcome, Composer, SmtpComposer};
    use crate::tests::support::message;

    fn review(required: bool) -> Settings {
        Settings {
            require_manual_review: required,
            ..Settings::default()
        }
    }

    #[test]
    async fn test_manual_review_writes_draft() {
        let dir = tempfile::tempdir().expect("tempdir");
        let composer = SmtpComposer::new(None, dir.path().join("drafts"), Duration::ZERO);

        let outcome = composer.compose(&message(1), &review(true)).await.unwrap();
        let path = match outcome {
            ComposeOutcome::Drafted(path) => path,
            other => panic!("expected draft, got {:?}", other),
        };

        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("eml"));
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("To: recruiter1@example.com"));
        assert!(raw.contains("Subject: Application 1"));
        assert!(raw.contains("Hello recruiter 1"));
    }

    #[test]
    async fn test_missing_field_is_field_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let composer = SmtpComposer::new(None, dir.path().to_path_buf(), Duration::ZERO);

        let no_subject = MessageRequest {
            subject: "  ".to_string(),
            ..message(1)
        };
        match composer.compose(&no_subject, &review(true)).await {
            Err(MailerError::FieldNotFound(field)) => assert_eq!(field, "subject"),
            other => panic!("expected FieldNotFound, got {:?}", other),
        }

        let no_to = MessageRequest {
            to: String::new(),
            ..message(1)
        };
        assert!(matches!(
            composer.compose(&no_to, &review(true)).await,
            Err(MailerError::FieldNotFound(_))
        ));
    }

    #[test]
    async fn test_invalid_address_is_blocked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let composer = SmtpComposer::new(None, dir.path().to_path_buf(), Duration::ZERO);

        let bad = MessageRequest {
            to: "not an address".to_string(),
            ..message(1)
        };
        assert!(matches!(
            composer.compose(&bad, &review(true)).await,
            Err(MailerError::ActionBlocked(_))
        ));
    }

    #[test]
    async fn test_auto_send_without_smtp_is_blocked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let composer = SmtpComposer::new(None, dir.path().to_path_buf(), Duration::ZERO);

        match composer.compose(&message(1), &review(false)).await {
            Err(MailerError::ActionBlocked(msg)) => assert!(msg.contains("SMTP is not configured")),
            other => panic!("expected ActionBlocked, got {:?}", other),
        }
        // No se dejó ningún borrador
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
