use std::sync::Arc;

use crate::{
    dto::{SendEmailRequest, SendEmailResponse},
    mailer::{Mailer, MailerError, OutgoingEmail},
};

pub const SUCCESS_STATUS: &str = "email sent successfully!";

pub struct EmailService {
    sender: String,
    mailer: Arc<dyn Mailer>,
}

impl EmailService {
    pub fn new(sender: String, mailer: Arc<dyn Mailer>) -> Self {
        EmailService { sender, mailer }
    }

    pub async fn send_email(
        &self,
        request: SendEmailRequest,
    ) -> Result<SendEmailResponse, MailerError> {
        tracing::info!(
            "Sending email to '{}' with subject '{}'",
            request.to,
            request.subject
        );

        self.mailer
            .send(OutgoingEmail {
                from: self.sender.clone(),
                to: request.to,
                subject: request.subject,
                body: request.message,
            })
            .await?;

        Ok(SendEmailResponse {
            status: SUCCESS_STATUS.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::mailer::{Mailer, MailerError, OutgoingEmail};

    /// Records every message instead of delivering it.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl RecordingMailer {
        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: OutgoingEmail) -> Result<(), MailerError> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::RecordingMailer, *};

    #[tokio::test]
    async fn maps_request_onto_outgoing_email() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = EmailService::new("relay@example.com".into(), mailer.clone());

        let response = service
            .send_email(SendEmailRequest {
                to: "a@b.com".into(),
                subject: "Hi".into(),
                message: "test".into(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, SUCCESS_STATUS);
        assert_eq!(
            mailer.sent(),
            vec![OutgoingEmail {
                from: "relay@example.com".into(),
                to: "a@b.com".into(),
                subject: "Hi".into(),
                body: "test".into(),
            }]
        );
    }
}
