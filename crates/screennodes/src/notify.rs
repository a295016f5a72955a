//! Interview invitations for shortlisted candidates.

use crate::evaluation::Verdict;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub recipient: String,
    pub candidate_name: String,
    pub score: u32,
}

impl Invitation {
    pub fn new(recipient: impl Into<String>, candidate_name: impl Into<String>, score: u32) -> Self {
        Self {
            recipient: recipient.into(),
            candidate_name: candidate_name.into(),
            score,
        }
    }

    pub fn subject(&self) -> &'static str {
        "Interview Invitation - Shortlisted for the Role"
    }

    pub fn body(&self) -> String {
        format!(
            "Hi {},\n\n\
             Congratulations! Based on our evaluation of your profile, you have been shortlisted\n\
             with a match score of {}/100.\n\n\
             We would like to invite you for the next round of the interview process.\n\n\
             Please reply to this email with your availability for the next 3-5 working days.\n\n\
             Best regards,\n\
             AI Recruitment Assistant\n\
             (on behalf of the Hiring Team)\n",
            self.candidate_name, self.score
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Failed(String),
}

impl NotificationOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationOutcome::Sent)
    }
}

/// Delivery channel for invitations. Failures are reported, never raised.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, invitation: &Invitation) -> NotificationOutcome;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    recipient: &'a str,
    candidate_name: &'a str,
    score: u32,
    subject: &'a str,
    body: String,
}

/// Posts the invitation as JSON to a webhook (mail relay, chat hook, ...).
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, invitation: &Invitation) -> NotificationOutcome {
        if invitation.recipient.trim().is_empty() {
            return NotificationOutcome::Failed("Candidate email is missing.".to_string());
        }

        let payload = WebhookPayload {
            recipient: &invitation.recipient,
            candidate_name: &invitation.candidate_name,
            score: invitation.score,
            subject: invitation.subject(),
            body: invitation.body(),
        };

        match self.http.post(&self.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(recipient = %invitation.recipient, "Invitation sent");
                NotificationOutcome::Sent
            }
            Ok(response) => NotificationOutcome::Failed(format!("HTTP {}", response.status())),
            Err(e) => NotificationOutcome::Failed(e.to_string()),
        }
    }
}

/// Writes the invitation to the log instead of delivering it.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, invitation: &Invitation) -> NotificationOutcome {
        tracing::info!(
            recipient = %invitation.recipient,
            subject = invitation.subject(),
            "{}",
            invitation.body()
        );
        NotificationOutcome::Sent
    }
}

/// Send an invitation when the verdict shortlists and a recipient is known.
///
/// Returns `None` when nothing was attempted.
pub async fn notify_if_shortlisted(
    notifier: &dyn Notifier,
    verdict: &Verdict,
    recipient: Option<&str>,
    candidate_name: &str,
) -> Option<NotificationOutcome> {
    if !verdict.shortlisted {
        return None;
    }
    let recipient = recipient.filter(|r| !r.trim().is_empty())?;

    let invitation = Invitation::new(recipient, candidate_name, verdict.score);
    Some(notifier.notify(&invitation).await)
}
