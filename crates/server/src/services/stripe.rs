use serde::Deserialize;

use crate::{
    config::Config,
    db::models::PaymentType,
    error::{AppError, Result},
};

const PAYMENT_INTENTS_URL: &str = "https://api.stripe.com/v1/payment_intents";

#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Stripe amounts are integer minor currency units (cents for usd).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Creates a PaymentIntent for the given amount. Processor errors are logged
/// in full and surfaced as a generic failure.
pub async fn create_payment_intent(
    http: &reqwest::Client,
    config: &Config,
    amount: f64,
    project_id: &str,
    payment_type: PaymentType,
    commission_rate: f64,
) -> Result<PaymentIntent> {
    let secret_key = config
        .stripe_secret_key
        .as_deref()
        .ok_or_else(|| AppError::Payment("Stripe configuration missing".to_string()))?;

    let params = [
        ("amount", to_minor_units(amount).to_string()),
        ("currency", "usd".to_string()),
        ("metadata[project_id]", project_id.to_string()),
        ("metadata[payment_type]", payment_type.as_str().to_string()),
        ("metadata[commission_rate]", commission_rate.to_string()),
        ("automatic_payment_methods[enabled]", "true".to_string()),
    ];

    let response = http
        .post(PAYMENT_INTENTS_URL)
        .bearer_auth(secret_key)
        .form(&params)
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Stripe request failed: {err}");
            AppError::Payment("Payment processing failed".to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Stripe API error: {status} {body}");
        return Err(AppError::Payment("Payment processing failed".to_string()));
    }

    response.json::<PaymentIntent>().await.map_err(|err| {
        tracing::error!("Unexpected Stripe response: {err}");
        AppError::Payment("Payment processing failed".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::to_minor_units;

    #[test]
    fn amounts_convert_to_cents_with_rounding() {
        assert_eq!(to_minor_units(200.0), 20000);
        assert_eq!(to_minor_units(0.01), 1);
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(333.33), 33333);
    }
}
