use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_sesv2::{
    types::{Body, Content, Destination, EmailContent, Message},
    Client as SesClient,
};
use tracing::{info, instrument};

const OTP_SUBJECT: &str = "Welcome to resume-service!";

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to: &str, otp: &str) -> anyhow::Result<()>;
}

pub fn otp_html(otp: &str) -> String {
    format!("<h1>Welcome to resume service</h1><br/><p>Your OTP is {otp}</p>")
}

pub fn otp_text(otp: &str) -> String {
    format!("Welcome to resume service. Your OTP is {otp}")
}

/// Sends mail through AWS SES v2.
pub struct SesMailer {
    client: SesClient,
    sender: String,
}

impl SesMailer {
    pub fn new(shared: &aws_config::SdkConfig, sender: impl Into<String>) -> Self {
        Self {
            client: SesClient::new(shared),
            sender: sender.into(),
        }
    }
}

fn utf8(data: String) -> anyhow::Result<Content> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .context("build ses content")
}

#[async_trait]
impl Mailer for SesMailer {
    #[instrument(skip(self, otp))]
    async fn send_otp(&self, to: &str, otp: &str) -> anyhow::Result<()> {
        let body = Body::builder()
            .html(utf8(otp_html(otp))?)
            .text(utf8(otp_text(otp))?)
            .build();
        let message = Message::builder()
            .subject(utf8(OTP_SUBJECT.to_string())?)
            .body(body)
            .build();

        let out = self
            .client
            .send_email()
            .from_email_address(&self.sender)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .context("ses send_email")?;

        info!(message_id = out.message_id().unwrap_or("unknown"), "otp mail sent");
        Ok(())
    }
}
