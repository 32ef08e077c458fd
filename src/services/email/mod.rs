// Email service module
// Orchestrates template registration, builders, and the sender.

pub mod builders;
pub mod sender;
pub mod types;

use self::types::EmailBuilder;
use crate::app_config::EmailConfig;
use anyhow::Result;
use async_trait::async_trait;
use builders::PaymentReminderEmailBuilder;
use handlebars::Handlebars;
use sender::EmailSender;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::Member;
use crate::services::billing_cycle::ReminderSender;

/// Email service for sending billing emails
#[derive(Clone)]
pub struct EmailService {
    sender: EmailSender,
    config: EmailConfig,
    templates: Arc<Handlebars<'static>>,
}

impl EmailService {
    /// Create a new email service instance
    pub fn new(config: EmailConfig) -> Result<Self> {
        let mut templates = Handlebars::new();
        Self::register_templates(&mut templates)?;

        let sender = EmailSender::new_resend(
            config.api_key.clone(),
            config.api_url.clone(),
            Duration::from_secs(config.send_timeout_secs),
        )
        .with_max_retries(3)
        .with_retry_delay(Duration::from_secs(1));

        Ok(Self {
            sender,
            config,
            templates: Arc::new(templates),
        })
    }

    /// Register all email templates
    fn register_templates(templates: &mut Handlebars) -> Result<(), types::EmailError> {
        let payment_reminder_template =
            include_str!("../../../templates/email/payment_reminder.html");
        templates
            .register_template_string("payment_reminder", payment_reminder_template)
            .map_err(|e| types::EmailError::TemplateError(e.to_string()))?;

        Ok(())
    }

    /// Send a payment reminder to a member
    #[instrument(skip(self))]
    pub async fn send_payment_reminder_email(
        &self,
        to_email: &str,
        member_name: &str,
        gym_name: &str,
        amount_cents: i32,
        due_in_days: i64,
        billing_day: i32,
    ) -> Result<(), types::EmailError> {
        info!("Sending payment reminder to {}", to_email);

        let builder = PaymentReminderEmailBuilder::new(
            to_email,
            member_name,
            gym_name,
            amount_cents,
            due_in_days,
            billing_day,
            &self.config,
            &self.templates,
        );

        let message = builder.build()?;
        self.sender.send_with_retry(message).await
    }
}

#[async_trait]
impl ReminderSender for EmailService {
    async fn send_payment_reminder(
        &self,
        member: &Member,
        gym_name: &str,
        days_until: i64,
    ) -> Result<(), types::EmailError> {
        let to_email = member
            .email
            .as_deref()
            .ok_or_else(|| types::EmailError::InvalidEmail("member has no email".to_string()))?;

        self.send_payment_reminder_email(
            to_email,
            &member.full_name,
            gym_name,
            member.monthly_fee_cents.unwrap_or(0),
            days_until,
            member.billing_day_of_month.unwrap_or(1),
        )
        .await
    }
}
