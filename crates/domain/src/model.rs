use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Package name whose memberships are handed out as vouchers.
pub const GIFT_PACKAGE_NAME: &str = "ABO_GIVE";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Testimonial {
    pub id: String,
    pub user_id: String,
    pub role: Option<String>,
    pub quote: String,
    /// Public URL of the small monochrome rendition.
    pub image: Option<String>,
    /// Public URL of the rendered share card.
    pub sm_image: Option<String>,
    pub published: bool,
    pub sequence_number: Option<i64>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Partial testimonial update; `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TestimonialPatch {
    /// `Some(None)` clears the role.
    pub role: Option<Option<String>>,
    pub quote: Option<String>,
    pub image: Option<String>,
    pub sm_image: Option<String>,
    pub published: Option<bool>,
    pub sequence_number: Option<i64>,
    pub updated_at_ms: Option<i64>,
}

impl TestimonialPatch {
    pub fn apply(&self, testimonial: &mut Testimonial) {
        if let Some(role) = &self.role {
            testimonial.role = role.clone();
        }
        if let Some(quote) = &self.quote {
            testimonial.quote = quote.clone();
        }
        if let Some(image) = &self.image {
            testimonial.image = Some(image.clone());
        }
        if let Some(sm_image) = &self.sm_image {
            testimonial.sm_image = Some(sm_image.clone());
        }
        if let Some(published) = self.published {
            testimonial.published = published;
        }
        if let Some(sequence_number) = self.sequence_number {
            testimonial.sequence_number = Some(sequence_number);
        }
        if let Some(updated_at_ms) = self.updated_at_ms {
            testimonial.updated_at_ms = updated_at_ms;
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub published: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PledgeStatus {
    Draft,
    WaitingForPayment,
    PaidInvestigate,
    Successful,
    Cancelled,
}

impl PledgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::WaitingForPayment => "WAITING_FOR_PAYMENT",
            Self::PaidInvestigate => "PAID_INVESTIGATE",
            Self::Successful => "SUCCESSFUL",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for PledgeStatus {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DRAFT" => Ok(Self::Draft),
            "WAITING_FOR_PAYMENT" => Ok(Self::WaitingForPayment),
            "PAID_INVESTIGATE" => Ok(Self::PaidInvestigate),
            "SUCCESSFUL" => Ok(Self::Successful),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err("unknown pledge status"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pledge {
    pub id: String,
    pub user_id: String,
    pub package_id: String,
    /// Amount in minor currency units.
    pub total: i64,
    pub status: PledgeStatus,
    pub send_confirm_mail: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub pledge_id: Option<String>,
    pub sequence_number: i64,
    pub voucher_code: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<String>,
    pub address_id: Option<String>,
    pub verified: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

/// Profile fields written during a reclaim; `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<String>,
    pub address_id: Option<String>,
}

impl ProfilePatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(birthday) = &self.birthday {
            user.birthday = Some(birthday.clone());
        }
        if let Some(address_id) = &self.address_id {
            user.address_id = Some(address_id.clone());
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub id: String,
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

impl Address {
    /// Renders the address as the HTML block used in confirmation mails.
    pub fn to_mail_html(&self) -> String {
        let line2 = self
            .line2
            .as_deref()
            .filter(|line| !line.is_empty())
            .map(|line| format!("{line}<br/>"))
            .unwrap_or_default();
        format!(
            "<span>{}<br/>\n{}<br/>\n{}\n{} {}<br/>\n{}</span>",
            self.name, self.line1, line2, self.postal_code, self.city, self.country
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentSource {
    pub id: String,
    pub user_id: String,
    pub method: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    pub id: String,
    pub name: String,
}

impl Package {
    pub fn is_gift(&self) -> bool {
        self.name == GIFT_PACKAGE_NAME
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Paymentslip,
    Stripe,
    Postfinancecard,
    Paypal,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub id: String,
    /// Human readable reference printed on invoices.
    pub hrid: String,
    pub method: PaymentMethod,
    pub paper_invoice: bool,
    pub total: i64,
}

/// Links a pledge to one payment attempt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PledgePayment {
    pub pledge_id: String,
    pub payment_id: String,
    pub created_at_ms: i64,
}
