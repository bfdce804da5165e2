use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::info;

use super::{Mailer, ServiceError};

/// SMTP delivery through an authenticated STARTTLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(host: &str, user: &str, password: &str) -> Result<Self, ServiceError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| ServiceError::Email(e.to_string()))?
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();
        Ok(SmtpMailer {
            transport,
            from: format!("\"Wardrobe Wizards\" <{}>", user),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), ServiceError> {
        let email = Message::builder()
            .from(self.from.parse().map_err(|_| ServiceError::Email(format!("bad sender {}", self.from)))?)
            .to(to.parse().map_err(|_| ServiceError::Email(format!("bad recipient {}", to)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| ServiceError::Email(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| ServiceError::Email(e.to_string()))?;
        info!("Email sent to {}", to);
        Ok(())
    }
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"<a href="{href}" style="display: inline-block; padding: 10px 20px; margin-top: 10px; background-color: #4CAF50; color: white; text-decoration: none; border-radius: 5px; font-weight: bold;">{label}</a>"#
    )
}

fn wrap(body: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">{body}<p>If you did not request this, please ignore this email.</p><p>Thanks,<br>The Wardrobe Wizards Team</p></div>"#
    )
}

pub async fn send_verification_email(mailer: &dyn Mailer, to: &str, link: &str) -> Result<(), ServiceError> {
    let html = wrap(&format!(
        "<h2>Welcome to Wardrobe Wizards!</h2><p>We're excited to have you onboard. Please click the button below to verify your email address:</p>{}",
        button(link, "Verify Your Email")
    ));
    mailer.send_html(to, "Verify Your Email", &html).await
}

pub async fn send_password_reset_email(mailer: &dyn Mailer, to: &str, link: &str) -> Result<(), ServiceError> {
    let html = wrap(&format!(
        "<h2>Password Recovery</h2><p>We received a request to reset your password for your Wardrobe Wizards account.</p><p>Please click the button below to set a new password:</p>{}",
        button(link, "Reset Password")
    ));
    mailer.send_html(to, "Reset Your Password", &html).await
}

pub async fn send_email_recovery_notice(mailer: &dyn Mailer, to: &str, username: &str) -> Result<(), ServiceError> {
    let html = wrap(&format!(
        "<h2>Email Recovery Request</h2><p>Hello {username},</p><p>We received a request to recover the email associated with your account. Your email is: <strong>{to}</strong>.</p>"
    ));
    mailer.send_html(to, "Email Recovery", &html).await
}
