//! Checkout: payment form validation and the cart-to-sale flow.
//!
//! The flow is strictly sequential. Every cart line is pushed to the
//! backend's server-side cart in order, then the sale is submitted. A line
//! the backend refuses is skipped with a warning; only an expired session or
//! a line that cannot be sent at all stops the checkout. The
//! receipt is fetched later, on demand.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use applegym_core::PaymentMethod;

use crate::api::types::Sale;
use crate::api::{ApiClient, ApiError};
use crate::cart::Cart;
use crate::token::BearerToken;

const DEFAULT_SUCCESS_MESSAGE: &str = "Purchase completed successfully";

// =============================================================================
// Payment form
// =============================================================================

/// Checkout form as posted by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub card_holder: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub card_expiry: String,
    #[serde(default)]
    pub card_cvv: String,
}

impl PaymentForm {
    /// The chosen method, plus the card fields if that method needs them.
    ///
    /// # Errors
    ///
    /// Returns the first failing `CardError`.
    pub fn validate(
        &self,
        today: NaiveDate,
    ) -> Result<(PaymentMethod, Option<CardDetails>), CardError> {
        let method = self.method.ok_or(CardError::Method)?;
        if method.requires_card() {
            Ok((method, Some(CardDetails::validate(self, today)?)))
        } else {
            Ok((method, None))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("Please select a payment method")]
    Method,
    #[error("Please enter the cardholder name")]
    Holder,
    #[error("Please enter a valid card number")]
    Number,
    #[error("Please enter a valid expiry date (MM/YY)")]
    ExpiryFormat,
    #[error("Invalid month. Must be between 01 and 12")]
    ExpiryMonth,
    #[error("The card has expired")]
    Expired,
    #[error("Please enter a valid CVV")]
    Cvv,
}

/// Card fields that passed validation. Only the last four digits are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub holder: String,
    pub last4: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
}

impl CardDetails {
    /// Validate the card fields of `form`, in the order the form shows them.
    ///
    /// # Errors
    ///
    /// Returns the first failing `CardError`.
    pub fn validate(form: &PaymentForm, today: NaiveDate) -> Result<Self, CardError> {
        let holder = form.card_holder.trim();
        if holder.chars().count() < 3 {
            return Err(CardError::Holder);
        }

        let number: String = form
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if !(13..=19).contains(&number.len()) || !is_digits(&number) {
            return Err(CardError::Number);
        }

        let (month, year) = parse_expiry(form.card_expiry.trim())?;
        if year < today.year() || (year == today.year() && month < today.month()) {
            return Err(CardError::Expired);
        }

        let cvv = form.card_cvv.trim();
        if !(3..=4).contains(&cvv.len()) || !is_digits(cvv) {
            return Err(CardError::Cvv);
        }

        let last4 = number
            .get(number.len().saturating_sub(4)..)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            holder: holder.to_string(),
            last4,
            expiry_month: month,
            expiry_year: year,
        })
    }
}

/// Parse `MM/YY` into `(month, 20YY)`.
fn parse_expiry(value: &str) -> Result<(u32, i32), CardError> {
    let Some((mm, yy)) = value.split_once('/') else {
        return Err(CardError::ExpiryFormat);
    };
    if mm.len() != 2 || yy.len() != 2 || !is_digits(mm) || !is_digits(yy) {
        return Err(CardError::ExpiryFormat);
    }

    let month: u32 = mm.parse().map_err(|_| CardError::ExpiryFormat)?;
    let year: i32 = yy.parse().map_err(|_| CardError::ExpiryFormat)?;
    if !(1..=12).contains(&month) {
        return Err(CardError::ExpiryMonth);
    }
    Ok((month, 2000 + year))
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Group the digits of a card number in fours: `4111 1111 1111 1111`.
#[must_use]
pub fn format_card_number(input: &str) -> String {
    let digits: Vec<char> = input.chars().filter(char::is_ascii_digit).take(19).collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Insert the `/` of an expiry date once the month is typed: `1228` → `12/28`.
#[must_use]
pub fn format_expiry(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).take(4).collect();
    if digits.len() >= 2 {
        let (month, year) = digits.split_at(2);
        format!("{month}/{year}")
    } else {
        digits
    }
}

// =============================================================================
// Checkout flow
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,
    #[error("{0}")]
    Card(#[from] CardError),
    #[error("Could not add {item} to your order: {message}")]
    Sync { item: String, message: String },
    #[error("{0}")]
    Sale(String),
}

/// A cart line the backend refused while syncing. The sale still goes ahead
/// without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub item: String,
    pub message: String,
}

impl fmt::Display for SkippedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} was not added to your order: {}", self.item, self.message)
    }
}

/// A sale the backend accepted.
#[derive(Debug, Clone)]
pub struct Completed {
    pub sale: Option<Sale>,
    pub message: String,
    pub skipped: Vec<SkippedLine>,
}

/// Runs a checkout on behalf of one signed-in customer.
pub struct Checkout<'a> {
    api: &'a ApiClient,
    token: &'a BearerToken,
}

impl<'a> Checkout<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, token: &'a BearerToken) -> Self {
        Self { api, token }
    }

    /// Sync the cart to the backend and submit the sale.
    ///
    /// The cart itself is left untouched; the caller clears it on success.
    ///
    /// # Errors
    ///
    /// - `EmptyCart` without making any request
    /// - `SessionExpired` if the token is expired locally or rejected remotely
    /// - `Sync` if a line could not be sent at all (network or unreadable
    ///   reply); a line the backend answers with an error is skipped and
    ///   reported in [`Completed::skipped`]
    /// - `Sale` with the backend's message if the sale is refused
    #[instrument(skip(self, cart, method, now), fields(lines = cart.items().len(), method = %method))]
    pub async fn run(
        &self,
        cart: &Cart,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Completed, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if self.token.is_expired_at(now) {
            return Err(CheckoutError::SessionExpired);
        }

        let mut skipped = Vec::new();
        for line in cart.items() {
            match self
                .api
                .add_cart_line(self.token, line.kind, line.id, line.quantity)
                .await
            {
                Ok(()) => {}
                Err(ApiError::SessionExpired) => return Err(CheckoutError::SessionExpired),
                Err(e @ (ApiError::Http(_) | ApiError::Parse(_) | ApiError::Url(_))) => {
                    tracing::error!(item = %line.name, "Cart sync aborted: {e}");
                    return Err(CheckoutError::Sync {
                        item: line.name.clone(),
                        message: e.user_message(),
                    });
                }
                Err(e) => {
                    tracing::warn!(item = %line.name, "Cart line refused, continuing: {e}");
                    skipped.push(SkippedLine {
                        item: line.name.clone(),
                        message: e.user_message(),
                    });
                }
            }
        }

        let response = self
            .api
            .process_sale(self.token, method)
            .await
            .map_err(|e| match e {
                ApiError::SessionExpired => CheckoutError::SessionExpired,
                other => {
                    tracing::error!("Sale was not processed: {other}");
                    CheckoutError::Sale(other.user_message())
                }
            })?;

        if let Some(sale) = &response.venta {
            tracing::info!(sale_id = %sale.id_venta, "Sale processed");
        }

        Ok(Completed {
            sale: response.venta,
            skipped,
            message: response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
        })
    }
}
