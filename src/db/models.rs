//! Row types

use crate::error::{Error, Result};
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// A book category
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub cat_id: i64,
    pub category_name: String,
}

/// An author, keyed by the id the catalog metadata uses
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Author {
    pub author_id: i64,
    pub author_name: String,
    pub author_name_native: Option<String>,
    pub death_year: Option<i64>,
    pub biography: Option<String>,
}

/// A catalog book (`books_metadata`)
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub book_type: Option<i64>,
    pub printed: Option<i64>,
    pub info: Option<String>,
    pub version: Option<String>,
    pub author_id: Option<i64>,
    pub cat_id: Option<i64>,
    pub date_built: Option<i64>,
    pub pdf_link: Option<String>,
    pub pdf_size: Option<i64>,
    pub cover_id: Option<i64>,
}

/// A row of the `books_with_categories` listing
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub book: Book,
    pub category_name: Option<String>,
}

/// An account created through Google sign-in
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: String,
    pub last_login: String,
}

/// Identity claims taken from a verified Google ID token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// A saved word
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: i64,
    pub user_id: i64,
    pub word: String,
    pub translation: Option<String>,
    pub book_id: Option<i64>,
    pub page_number: Option<i64>,
    pub volume_number: Option<i64>,
    pub word_position: Option<i64>,
    pub context: Option<String>,
    pub created_at: String,
}

/// Input for saving a word
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVocabularyEntry {
    pub word: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub book_id: Option<i64>,
    #[serde(default)]
    pub page_number: Option<i64>,
    #[serde(default)]
    pub volume_number: Option<i64>,
    #[serde(default)]
    pub word_position: Option<i64>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Last-read position of a user in a book
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub current_page: i64,
    pub current_volume: Option<i64>,
    pub last_read_at: String,
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Cancelled => write!(f, "cancelled"),
            SubscriptionStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            _ => Err(Error::InvalidInput(format!(
                "Unknown subscription status: {}",
                s
            ))),
        }
    }
}

/// Billing period of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Monthly,
    Yearly,
}

impl SubscriptionType {
    /// End of one billing period starting at `from`
    pub fn period_end(self, from: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            SubscriptionType::Monthly => Months::new(1),
            SubscriptionType::Yearly => Months::new(12),
        };
        from.checked_add_months(months).unwrap_or(from)
    }
}

impl std::fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionType::Monthly => write!(f, "monthly"),
            SubscriptionType::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for SubscriptionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Ok(SubscriptionType::Monthly),
            "yearly" | "year" | "annual" => Ok(SubscriptionType::Yearly),
            _ => Err(Error::InvalidInput(format!(
                "Unknown subscription type: {}",
                s
            ))),
        }
    }
}

/// A user's subscription row
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub subscription_type: String,
    pub status: String,
    pub paypal_plan_id: Option<String>,
    pub paypal_subscription_id: Option<String>,
    pub amount: Option<String>,
    pub currency: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub cancelled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Subscription {
    pub fn get_status(&self) -> Result<SubscriptionStatus> {
        self.status.parse()
    }

    pub fn get_type(&self) -> Result<SubscriptionType> {
        self.subscription_type.parse()
    }
}

/// Input for recording a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub subscription_type: SubscriptionType,
    #[serde(default)]
    pub paypal_plan_id: Option<String>,
    pub paypal_subscription_id: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// New lifecycle values for a subscription row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUpdate {
    pub status: SubscriptionStatus,
    pub end_date: Option<String>,
    pub cancelled_at: Option<String>,
}
