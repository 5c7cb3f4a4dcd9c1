//! Transactional email for paid orders.
//!
//! Uses SMTP via lettre for delivery with Askama templates. The customer
//! receives an itemized HTML confirmation, the operator a plain-text notice.

use std::sync::{Arc, RwLock};

use askama::Template;
use async_trait::async_trait;
use domain::{Money, OrderSummary, PaymentMethodSummary, ShippingProfile};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display name on customer emails.
pub const STORE_NAME: &str = "Anemone King";

/// Display name on operator emails.
pub const OPERATOR_SENDER_NAME: &str = "Anemone King Orders";

/// Default recipient of new-order notices.
pub const DEFAULT_OPERATOR_EMAIL: &str = "anemoneking99@gmail.com";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Delivery refused (used by the in-memory notifier).
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// SMTP settings.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailSettings {
    pub host: String,
    pub port: u16,
    /// Implicit TLS when true, STARTTLS otherwise.
    pub secure: bool,
    pub username: String,
    pub password: SecretString,
    pub operator_email: String,
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("operator_email", &self.operator_email)
            .finish()
    }
}

/// One purchased item as shown in emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Everything both order emails need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEmail {
    pub order_number: String,
    pub items: Vec<EmailItem>,
    pub shipping_address: ShippingProfile,
    pub summary: OrderSummary,
    pub payment_method: PaymentMethodSummary,
}

impl OrderEmail {
    /// Recipient of the customer confirmation.
    pub fn customer_email(&self) -> Result<String, EmailError> {
        self.shipping_address
            .email()
            .ok_or_else(|| EmailError::InvalidAddress("missing customer email".to_string()))
    }

    pub fn customer_subject(&self) -> String {
        format!("Order Confirmation #{} - {STORE_NAME}", self.order_number)
    }

    pub fn operator_subject(&self) -> String {
        format!("New Order #{} - {}", self.order_number, self.summary.total)
    }
}

/// Which of the two order emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Customer,
    Operator,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Customer => "customer",
            EmailKind::Operator => "operator",
        }
    }
}

struct EmailLine {
    name: String,
    quantity: u32,
    price: String,
    line_total: String,
}

fn email_lines(items: &[EmailItem]) -> Vec<EmailLine> {
    items
        .iter()
        .map(|item| EmailLine {
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.unit_price.to_string(),
            line_total: item.unit_price.multiply(item.quantity).to_string(),
        })
        .collect()
}

fn city_line(address: &ShippingProfile) -> String {
    format!(
        "{}, {} {}",
        address.city, address.state, address.postal_code
    )
}

/// HTML template for the customer confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_number: &'a str,
    customer_name: String,
    items: Vec<EmailLine>,
    subtotal: String,
    tax: String,
    shipping: String,
    total: String,
    address_line1: &'a str,
    address_line2: Option<&'a str>,
    city_line: String,
    payment_method: String,
    support_email: &'a str,
}

/// Plain text template for the operator notice.
#[derive(Template)]
#[template(path = "email/order_notification.txt")]
struct OrderNotificationText<'a> {
    order_number: &'a str,
    customer_name: String,
    customer_email: String,
    items: Vec<EmailLine>,
    total: String,
    address_line1: &'a str,
    address_line2: Option<&'a str>,
    city_line: String,
}

/// Renders the customer confirmation body.
pub fn render_customer_confirmation(
    email: &OrderEmail,
    support_email: &str,
) -> Result<String, EmailError> {
    let address = &email.shipping_address;
    let summary = &email.summary;
    let html = OrderConfirmationHtml {
        order_number: &email.order_number,
        customer_name: address.full_name(),
        items: email_lines(&email.items),
        subtotal: summary.subtotal.to_string(),
        tax: summary.tax.to_string(),
        shipping: if summary.ships_free() {
            "Free".to_string()
        } else {
            summary.shipping.to_string()
        },
        total: summary.total.to_string(),
        address_line1: &address.address_line1,
        address_line2: address.address_line2.as_deref().filter(|s| !s.is_empty()),
        city_line: city_line(address),
        payment_method: email.payment_method.to_string(),
        support_email,
    };
    Ok(html.render()?)
}

/// Renders the operator notice body.
pub fn render_operator_notification(email: &OrderEmail) -> Result<String, EmailError> {
    let address = &email.shipping_address;
    let text = OrderNotificationText {
        order_number: &email.order_number,
        customer_name: address.full_name(),
        customer_email: address.email().unwrap_or_default(),
        items: email_lines(&email.items),
        total: email.summary.total.to_string(),
        address_line1: &address.address_line1,
        address_line2: address.address_line2.as_deref().filter(|s| !s.is_empty()),
        city_line: city_line(address),
    };
    Ok(text.render()?)
}

/// Trait for delivering the two order emails.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the HTML confirmation to the buyer.
    async fn send_customer_confirmation(&self, email: &OrderEmail) -> Result<(), EmailError>;

    /// Sends the plain-text notice to the store operator.
    async fn send_operator_notification(&self, email: &OrderEmail) -> Result<(), EmailError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn send_customer_confirmation(&self, email: &OrderEmail) -> Result<(), EmailError> {
        (**self).send_customer_confirmation(email).await
    }

    async fn send_operator_notification(&self, email: &OrderEmail) -> Result<(), EmailError> {
        (**self).send_operator_notification(email).await
    }
}

/// SMTP notifier.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    username: String,
    operator_email: String,
}

impl SmtpNotifier {
    /// Create a new SMTP notifier from settings.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(settings: &EmailSettings) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            settings.username.clone(),
            settings.password.expose_secret().to_string(),
        );

        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        };
        let mailer = builder
            .port(settings.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            username: settings.username.clone(),
            operator_email: settings.operator_email.clone(),
        })
    }

    fn mailbox(name: &str, address: &str) -> Result<Mailbox, EmailError> {
        format!("{name} <{address}>")
            .parse()
            .map_err(|_| EmailError::InvalidAddress(address.to_string()))
    }

    async fn send(
        &self,
        from: Mailbox,
        to: &str,
        subject: &str,
        content_type: ContentType,
        body: String,
    ) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(from)
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(content_type)
            .body(body)?;

        self.mailer.send(message).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[tracing::instrument(skip(self, email), fields(order_number = %email.order_number))]
    async fn send_customer_confirmation(&self, email: &OrderEmail) -> Result<(), EmailError> {
        let to = email.customer_email()?;
        let body = render_customer_confirmation(email, &self.operator_email)?;
        self.send(
            Self::mailbox(STORE_NAME, &self.username)?,
            &to,
            &email.customer_subject(),
            ContentType::TEXT_HTML,
            body,
        )
        .await
    }

    #[tracing::instrument(skip(self, email), fields(order_number = %email.order_number))]
    async fn send_operator_notification(&self, email: &OrderEmail) -> Result<(), EmailError> {
        let body = render_operator_notification(email)?;
        self.send(
            Self::mailbox(OPERATOR_SENDER_NAME, &self.username)?,
            &self.operator_email,
            &email.operator_subject(),
            ContentType::TEXT_PLAIN,
            body,
        )
        .await
    }
}

/// An email recorded by [`InMemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub kind: EmailKind,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<SentEmail>,
    fail_on_customer: bool,
    fail_on_operator: bool,
}

/// In-memory notifier for testing. Renders the real templates.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail customer sends.
    pub fn set_fail_on_customer(&self, fail: bool) {
        self.state.write().unwrap().fail_on_customer = fail;
    }

    /// Configures the notifier to fail operator sends.
    pub fn set_fail_on_operator(&self, fail: bool) {
        self.state.write().unwrap().fail_on_operator = fail;
    }

    /// Returns every email sent so far.
    pub fn sent(&self) -> Vec<SentEmail> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of emails of one kind sent so far.
    pub fn count(&self, kind: EmailKind) -> usize {
        self.state
            .read()
            .unwrap()
            .sent
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_customer_confirmation(&self, email: &OrderEmail) -> Result<(), EmailError> {
        let to = email.customer_email()?;
        let body = render_customer_confirmation(email, DEFAULT_OPERATOR_EMAIL)?;
        let mut state = self.state.write().unwrap();
        if state.fail_on_customer {
            return Err(EmailError::Delivery("SMTP connection refused".to_string()));
        }
        state.sent.push(SentEmail {
            kind: EmailKind::Customer,
            to,
            subject: email.customer_subject(),
            body,
        });
        Ok(())
    }

    async fn send_operator_notification(&self, email: &OrderEmail) -> Result<(), EmailError> {
        let body = render_operator_notification(email)?;
        let mut state = self.state.write().unwrap();
        if state.fail_on_operator {
            return Err(EmailError::Delivery("SMTP connection refused".to_string()));
        }
        state.sent.push(SentEmail {
            kind: EmailKind::Operator,
            to: DEFAULT_OPERATOR_EMAIL.to_string(),
            subject: email.operator_subject(),
            body,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_email() -> OrderEmail {
        let items = vec![EmailItem {
            name: "Rock Flower Anemone".to_string(),
            quantity: 3,
            unit_price: Money::from_cents(1000),
        }];
        OrderEmail {
            order_number: "ORD-240307-42".to_string(),
            summary: OrderSummary::from_items([(Money::from_cents(1000), 3)]),
            items,
            shipping_address: ShippingProfile {
                first_name: "Coral".to_string(),
                last_name: "Diver".to_string(),
                address_line1: "9 Lagoon Ln".to_string(),
                address_line2: Some("Unit <B>".to_string()),
                city: "Key West".to_string(),
                state: "FL".to_string(),
                postal_code: "33040".to_string(),
                phone: "555-0123".to_string(),
                email: Some("coral@example.com".to_string()),
            },
            payment_method: PaymentMethodSummary::new("visa", "4242"),
        }
    }

    #[test]
    fn test_subjects() {
        let email = order_email();
        assert_eq!(
            email.customer_subject(),
            "Order Confirmation #ORD-240307-42 - Anemone King"
        );
        assert_eq!(email.operator_subject(), "New Order #ORD-240307-42 - $47.10");
    }

    #[test]
    fn test_customer_html_is_itemized_and_escaped() {
        let html = render_customer_confirmation(&order_email(), DEFAULT_OPERATOR_EMAIL).unwrap();

        assert!(html.contains("Order #ORD-240307-42"));
        assert!(html.contains("Dear Coral Diver,"));
        assert!(html.contains("Rock Flower Anemone"));
        assert!(html.contains("$10.00"));
        assert!(html.contains("$30.00"));
        assert!(html.contains("$2.10"));
        assert!(html.contains("$15.00"));
        assert!(html.contains("$47.10"));
        assert!(html.contains("visa ending in 4242"));
        assert!(html.contains("Key West, FL 33040"));
        assert!(!html.contains("Unit <B>"));
    }

    #[test]
    fn test_free_shipping_is_spelled_out() {
        let mut email = order_email();
        email.summary = OrderSummary::from_items([(Money::from_cents(25_000), 1)]);
        let html = render_customer_confirmation(&email, DEFAULT_OPERATOR_EMAIL).unwrap();
        assert!(html.contains("Free"));
    }

    #[test]
    fn test_operator_text() {
        let text = render_operator_notification(&order_email()).unwrap();

        assert!(text.starts_with("New Order #ORD-240307-42"));
        assert!(text.contains("Customer: Coral Diver (coral@example.com)"));
        assert!(text.contains("- Rock Flower Anemone (3 × $10.00 = $30.00)"));
        assert!(text.contains("Unit <B>"));
        assert!(text.contains("Total: $47.10"));
    }

    #[tokio::test]
    async fn test_in_memory_notifier_records_and_fails() {
        let notifier = InMemoryNotifier::new();
        let email = order_email();

        notifier.send_customer_confirmation(&email).await.unwrap();
        notifier.set_fail_on_operator(true);
        assert!(notifier.send_operator_notification(&email).await.is_err());

        assert_eq!(notifier.count(EmailKind::Customer), 1);
        assert_eq!(notifier.count(EmailKind::Operator), 0);
        assert_eq!(notifier.sent()[0].to, "coral@example.com");
    }

    #[tokio::test]
    async fn test_missing_customer_email() {
        let notifier = InMemoryNotifier::new();
        let mut email = order_email();
        email.shipping_address.email = None;

        let result = notifier.send_customer_confirmation(&email).await;
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }

    #[test]
    fn test_settings_debug_redacts_password() {
        let settings = EmailSettings {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            secure: false,
            username: "shop@example.com".to_string(),
            password: SecretString::from("hunter2".to_string()),
            operator_email: DEFAULT_OPERATOR_EMAIL.to_string(),
        };
        assert!(!format!("{settings:?}").contains("hunter2"));
    }
}
