use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    error::{AppError, Result},
};

const RESEND_URL: &str = "https://api.resend.com/emails";
const FALLBACK_FROM: &str = "FTG designmatch <onboarding@resend.dev>";

/// The templates this service knows how to build. `verification` is the only
/// kind accepted from the API's `type` field; anything else is rejected
/// explicitly instead of falling through to an empty template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Verification,
    Test,
}

impl EmailKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "verification" => Some(EmailKind::Verification),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

/// Sender address: branded domain when configured, fixed fallback otherwise.
pub fn from_address(domain: Option<&str>) -> String {
    match domain {
        Some(domain) => format!("FTG designmatch <noreply@{domain}>"),
        None => FALLBACK_FROM.to_string(),
    }
}

pub fn build_template(
    kind: EmailKind,
    full_name: Option<&str>,
    to: &str,
    app_url: &str,
) -> (String, String, String) {
    match kind {
        EmailKind::Verification => verification_template(full_name, to, app_url),
        EmailKind::Test => test_template(full_name, app_url),
    }
}

/// Sends a branded email via Resend and returns the provider's message id.
pub async fn send_branded(
    http: &reqwest::Client,
    config: &Config,
    to: &str,
    full_name: Option<&str>,
    kind: EmailKind,
) -> Result<String> {
    let api_key = config
        .resend_api_key
        .as_deref()
        .ok_or_else(|| AppError::Email("Email service not configured".to_string()))?;

    let from = from_address(config.resend_domain.as_deref());
    let (subject, html, text) = build_template(kind, full_name, to, &config.app_url);

    let response = http
        .post(RESEND_URL)
        .bearer_auth(api_key)
        .json(&json!({
            "from": from,
            "to": [to],
            "subject": subject,
            "html": html,
            "text": text,
        }))
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Resend request failed: {err}");
            AppError::Email("Failed to send email".to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Resend API error: {status} {body}");
        return Err(AppError::Email(format!("Resend API error: {status}")));
    }

    let parsed: ResendResponse = response.json().await.map_err(|err| {
        tracing::error!("Unexpected Resend response: {err}");
        AppError::Email("Failed to send email".to_string())
    })?;

    Ok(parsed.id)
}

fn verification_template(
    full_name: Option<&str>,
    to: &str,
    app_url: &str,
) -> (String, String, String) {
    let name = full_name.filter(|n| !n.trim().is_empty()).unwrap_or("Designer");
    let subject = "Welcome to FTG designmatch - Verify Your Designer Account".to_string();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Welcome to FTG designmatch</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #0f172a;">
  <div style="max-width: 600px; margin: 0 auto; background: linear-gradient(135deg, #1e293b, #334155); border-radius: 12px; overflow: hidden;">
    <div style="background: linear-gradient(135deg, #f59e0b, #d97706); padding: 40px 30px; text-align: center;">
      <div style="color: #0f172a; font-size: 24px; font-weight: bold; margin-bottom: 8px;">FTG designmatch</div>
      <div style="color: #0f172a; font-size: 12px; opacity: 0.8;">you dream, we design</div>
    </div>
    <div style="padding: 40px 30px; color: #e2e8f0;">
      <div style="font-size: 24px; font-weight: bold; margin-bottom: 20px; color: #f59e0b;">Welcome to designmatch, {name}! 🎨</div>
      <p>Thank you for joining our creative community! You're now part of a platform that connects talented designers with clients who value quality work.</p>
      <ul>
        <li><strong>Keep 90%</strong> of your earnings (only 10% commission)</li>
        <li><strong>Secure payments</strong> with escrow protection</li>
        <li><strong>Quality clients</strong> and verified projects</li>
      </ul>
      <p><strong>Next Steps:</strong></p>
      <ul>
        <li>Complete your profile with portfolio samples</li>
        <li>Set your availability and rates</li>
        <li>Start receiving project invitations</li>
      </ul>
      <div style="text-align: center;">
        <a href="{app_url}" style="display: inline-block; background: #f59e0b; color: #0f172a; padding: 14px 28px; text-decoration: none; border-radius: 8px; font-weight: 600; margin: 20px 0;">Complete Your Registration</a>
      </div>
    </div>
    <div style="padding: 30px; text-align: center; color: #64748b; font-size: 14px; border-top: 1px solid #334155;">
      <p>© 2024 FTG designmatch. All rights reserved.</p>
      <p>This email was sent to {to}. If you didn't create an account, please ignore this email.</p>
    </div>
  </div>
</body>
</html>"#
    );

    let text = format!(
        "Welcome to FTG designmatch, {name}!\n\n\
Thank you for joining our creative community! You're now part of a platform that connects talented designers with clients who value quality work.\n\n\
What you get:\n\
- Keep 90% of your earnings (only 10% commission)\n\
- Secure payments with escrow protection\n\
- Access to quality, verified clients\n\n\
Next Steps:\n\
1. Complete your profile with portfolio samples\n\
2. Set your availability and rates\n\
3. Start receiving project invitations\n\n\
Complete your registration: {app_url}\n\n\
© 2024 FTG designmatch. All rights reserved.\n\
This email was sent to {to}. If you didn't create an account, please ignore this email."
    );

    (subject, html, text)
}

fn test_template(full_name: Option<&str>, app_url: &str) -> (String, String, String) {
    let name = full_name.filter(|n| !n.trim().is_empty()).unwrap_or("Test User");
    let subject = "Welcome to FTG designmatch - Test Email".to_string();

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; background: #0f172a; color: #e2e8f0; border-radius: 12px; overflow: hidden;">
  <div style="background: linear-gradient(135deg, #f59e0b, #d97706); padding: 40px 30px; text-align: center;">
    <div style="color: #0f172a; font-size: 24px; font-weight: bold; margin-bottom: 8px;">FTG designmatch</div>
    <div style="color: #0f172a; font-size: 12px; opacity: 0.8;">you dream, we design</div>
  </div>
  <div style="padding: 40px 30px;">
    <h2 style="color: #f59e0b; margin-bottom: 20px;">Test Email - Welcome {name}! 🎨</h2>
    <p>This is a test email to verify the branded email system is working correctly.</p>
    <p>If you receive this email, the FTG designmatch email system is functioning properly!</p>
    <div style="text-align: center; margin: 30px 0;">
      <a href="{app_url}" style="display: inline-block; background: #f59e0b; color: #0f172a; padding: 14px 28px; text-decoration: none; border-radius: 8px; font-weight: 600;">Visit FTG designmatch</a>
    </div>
  </div>
  <div style="padding: 30px; text-align: center; color: #64748b; font-size: 14px; border-top: 1px solid #334155;">
    <p>© 2024 FTG designmatch. All rights reserved.</p>
  </div>
</div>"#
    );

    let text = format!(
        "Welcome to FTG designmatch, {name}!\n\n\
This is a test email to verify the branded email system is working correctly.\n\n\
If you receive this email, the FTG designmatch email system is functioning properly!\n\n\
Visit: {app_url}\n\n\
© 2024 FTG designmatch. All rights reserved."
    );

    (subject, html, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_verification_is_a_valid_request_kind() {
        assert_eq!(EmailKind::parse("verification"), Some(EmailKind::Verification));
        assert_eq!(EmailKind::parse("test"), None);
        assert_eq!(EmailKind::parse("password_reset"), None);
        assert_eq!(EmailKind::parse(""), None);
    }

    #[test]
    fn sender_uses_branded_domain_when_configured() {
        assert_eq!(
            from_address(Some("designmatch.studio")),
            "FTG designmatch <noreply@designmatch.studio>"
        );
        assert_eq!(from_address(None), "FTG designmatch <onboarding@resend.dev>");
    }

    #[test]
    fn verification_template_falls_back_to_generic_name() {
        let (subject, html, text) =
            build_template(EmailKind::Verification, None, "a@b.com", "https://dm.example");
        assert!(subject.contains("Verify Your Designer Account"));
        assert!(html.contains("Welcome to designmatch, Designer!"));
        assert!(text.contains("Welcome to FTG designmatch, Designer!"));
        assert!(html.contains("a@b.com"));
        assert!(html.contains("https://dm.example"));
    }

    #[test]
    fn templates_address_the_recipient_by_name() {
        let (_, html, text) = build_template(
            EmailKind::Verification,
            Some("Sarah Chen"),
            "sarah@example.com",
            "https://dm.example",
        );
        assert!(html.contains("Sarah Chen"));
        assert!(text.contains("Sarah Chen"));

        let (subject, html, _) = build_template(
            EmailKind::Test,
            Some("Sarah Chen"),
            "sarah@example.com",
            "https://dm.example",
        );
        assert!(subject.contains("Test Email"));
        assert!(html.contains("Test Email - Welcome Sarah Chen!"));
    }
}
