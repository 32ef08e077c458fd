// Email builders - one builder per email type

use super::types::{
    format_cents, EmailBuilder, EmailError, EmailMessage, PaymentReminderEmailData,
};
use crate::app_config::EmailConfig;
use handlebars::Handlebars;
use tracing::instrument;

/// Builder for monthly payment reminder emails
pub struct PaymentReminderEmailBuilder<'a> {
    to_email: &'a str,
    member_name: &'a str,
    gym_name: &'a str,
    amount_cents: i32,
    due_in_days: i64,
    billing_day: i32,
    config: &'a EmailConfig,
    templates: &'a Handlebars<'a>,
}

impl<'a> PaymentReminderEmailBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        to_email: &'a str,
        member_name: &'a str,
        gym_name: &'a str,
        amount_cents: i32,
        due_in_days: i64,
        billing_day: i32,
        config: &'a EmailConfig,
        templates: &'a Handlebars<'a>,
    ) -> Self {
        Self {
            to_email,
            member_name,
            gym_name,
            amount_cents,
            due_in_days,
            billing_day,
            config,
            templates,
        }
    }
}

impl<'a> EmailBuilder for PaymentReminderEmailBuilder<'a> {
    #[instrument(skip(self))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let amount_display = format_cents(self.amount_cents);

        let data = PaymentReminderEmailData {
            member_name: self.member_name.to_string(),
            gym_name: self.gym_name.to_string(),
            amount_display: amount_display.clone(),
            due_in_days: self.due_in_days,
            billing_day: self.billing_day,
            support_email: self.config.support_email.clone(),
        };

        let html = self
            .templates
            .render("payment_reminder", &data)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        let when = match self.due_in_days {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };

        let text = format!(
            "Hi {},\n\n\
            Your monthly membership fee of {} at {} is due {} \
            (day {} of the month).\n\n\
            Questions? Contact us at {}.\n\n\
            Thanks,\n\
            {}",
            self.member_name,
            amount_display,
            self.gym_name,
            when,
            self.billing_day,
            self.config.support_email,
            self.gym_name
        );

        Ok(EmailMessage::new(
            format!("{} <{}>", self.gym_name, self.config.from_email),
            vec![self.to_email.to_string()],
            format!("{}: your membership payment is due {}", self.gym_name, when),
            html,
        )
        .with_text(text)
        .with_reply_to(self.config.support_email.clone()))
    }
}
