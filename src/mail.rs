use lettre_email::Email;
use quill_models::CONFIG;

#[cfg(feature = "debug-mailer")]
mod mailer {
    use lettre::{SendableEmail, Transport};

    pub struct DebugTransport;

    impl<'a> Transport<'a> for DebugTransport {
        type Result = Result<(), ()>;

        fn send(&mut self, email: SendableEmail) -> Self::Result {
            println!(
                "{}: from=<{}> to=<{:?}>\n{:#?}",
                email.message_id().to_string(),
                email
                    .envelope()
                    .from()
                    .map(|from| from.to_string())
                    .unwrap_or_default(),
                email.envelope().to().to_vec(),
                email
                    .message_to_string()
                    .map(|message| message.to_string()),
            );
            Ok(())
        }
    }

    pub type Mailer = Option<DebugTransport>;

    pub fn init() -> Mailer {
        Some(DebugTransport)
    }
}

#[cfg(not(feature = "debug-mailer"))]
mod mailer {
    use lettre::smtp::{
        authentication::{Credentials, Mechanism},
        extension::ClientId,
        ConnectionReuseParameters,
    };
    use lettre::{SmtpClient, SmtpTransport};
    use quill_models::CONFIG;

    pub type Mailer = Option<SmtpTransport>;

    pub fn init() -> Mailer {
        let config = CONFIG.mail.as_ref()?;
        let mail = SmtpClient::new_simple(&config.server)
            .expect("Couldn't build SMTP client")
            .hello_name(ClientId::Domain(config.helo_name.clone()))
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .smtp_utf8(true)
            .authentication_mechanism(Mechanism::Plain)
            .connection_reuse(ConnectionReuseParameters::NoReuse)
            .transport();
        Some(mail)
    }
}

pub use self::mailer::*;

pub fn build_mail(dest: String, subject: String, body: String) -> Option<Email> {
    Email::builder()
        .from(
            CONFIG
                .mail
                .as_ref()
                .map(|mail| mail.username.clone())
                .unwrap_or_else(|| "noreply@localhost".to_owned()),
        )
        .to(dest)
        .subject(subject)
        .text(body)
        .build()
        .ok()
}
