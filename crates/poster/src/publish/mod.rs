//! Delivery of a generated post.
//!
//! Exactly one branch runs per request: a LinkedIn post or an email to the
//! requester. Provider failures surface as a single [`DeliveryError`].

pub mod compose;
mod email;
mod linkedin;

pub use email::{classify_reply_code, Mailer, OutgoingEmail, SmtpCredentials, SmtpMailer};
pub use linkedin::{post_url, ImageAttachment, LinkedInClient, LinkedInPost};

use std::sync::Arc;

use crate::config::LinkedInConfig;
use crate::error::DeliveryError;
use crate::generate::{EngagementAnalysis, GeneratedPost};
use crate::request::DeliveryTarget;

/// What the delivery branch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReceipt {
    LinkedIn { post_id: String, post_url: String },
    Email { destination: String },
}

/// Routes a post to its delivery branch.
pub struct Publisher {
    http: reqwest::Client,
    linkedin: LinkedInConfig,
    mailer: Arc<dyn Mailer>,
}

impl Publisher {
    pub fn new(http: reqwest::Client, linkedin: LinkedInConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            http,
            linkedin,
            mailer,
        }
    }

    /// Deliver the post through the branch selected by `target`.
    pub async fn deliver(
        &self,
        target: &DeliveryTarget,
        topic: &str,
        post: &GeneratedPost,
        analysis: &EngagementAnalysis,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        match target {
            DeliveryTarget::LinkedIn { access_token } => {
                let client = LinkedInClient::new(
                    self.http.clone(),
                    self.linkedin.api_base.as_str(),
                    access_token.as_str(),
                    self.linkedin.timeout,
                );

                let image = post.image_bytes().map(|(data, mime)| ImageAttachment {
                    data,
                    mime,
                    description: topic,
                });

                let created = client.publish(&post.body, image).await?;
                Ok(DeliveryReceipt::LinkedIn {
                    post_id: created.id,
                    post_url: created.url,
                })
            }
            DeliveryTarget::Email {
                destination,
                app_password,
            } => {
                let email = OutgoingEmail {
                    from: destination.clone(),
                    to: destination.clone(),
                    subject: compose::subject(topic),
                    text_body: compose::text_body(topic, post, analysis),
                    html_body: compose::html_body(topic, post, analysis),
                };
                let credentials = SmtpCredentials {
                    username: destination.clone(),
                    password: app_password.clone(),
                };

                self.mailer.send(&email, &credentials).await?;
                Ok(DeliveryReceipt::Email {
                    destination: destination.clone(),
                })
            }
        }
    }
}
