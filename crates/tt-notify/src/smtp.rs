// smtp.rs - SmtpMailer: STARTTLS submission with username/password auth.
//
// Every send opens its own SMTP session and closes it when the transport
// is dropped. There is no pooling and no retry.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::NotifyError;
use crate::mail::{Mailer, OutgoingMail};

/// Where and as whom to submit mail.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl SmtpSettings {
    pub const DEFAULT_HOST: &'static str = "smtp.gmail.com";
    pub const DEFAULT_PORT: u16 = 587;
}

/// Mailer that submits over SMTP with STARTTLS.
pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }
}

impl Mailer for SmtpMailer {
    fn send_mail(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        let message = build_message(mail)?;
        let credentials = Credentials::new(
            self.settings.username.clone(),
            self.settings.password.clone(),
        );
        let transport = SmtpTransport::starttls_relay(&self.settings.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(self.settings.port)
            .credentials(credentials)
            .build();

        transport
            .send(&message)
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Assemble a plain-text message with every recipient on the To header.
pub fn build_message(mail: &OutgoingMail) -> Result<Message, NotifyError> {
    if mail.to.is_empty() {
        return Err(NotifyError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(parse_mailbox(&mail.from)?)
        .subject(mail.subject.as_str())
        .header(ContentType::TEXT_PLAIN);
    for recipient in &mail.to {
        builder = builder.to(parse_mailbox(recipient)?);
    }
    builder
        .body(mail.body.clone())
        .map_err(|e| NotifyError::Build(e.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(to: &[&str]) -> OutgoingMail {
        OutgoingMail {
            from: "bot@x.io".into(),
            to: to.iter().map(|s| s.to_string()).collect(),
            subject: "Change In Status of task: Ride app".into(),
            body: "Hello".into(),
        }
    }

    #[test]
    fn message_addresses_every_recipient() {
        let message = build_message(&mail(&["a@x.io", "b@x.io"])).unwrap();
        assert_eq!(message.envelope().to().len(), 2);

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Change In Status of task: Ride app"));
        assert!(raw.contains("a@x.io"));
        assert!(raw.contains("b@x.io"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let result = build_message(&mail(&["not an address"]));
        assert!(matches!(result, Err(NotifyError::InvalidAddress { .. })));
    }

    #[test]
    fn no_recipients_is_rejected() {
        assert!(matches!(
            build_message(&mail(&[])),
            Err(NotifyError::NoRecipients)
        ));
    }
}
