use std::sync::Arc;

use futures_util::future::join_all;

use crate::DomainResult;
use crate::config::WorkflowConfig;
use crate::error::DomainError;
use crate::model::{Address, Membership, Package, Payment, PaymentMethod, Pledge, PledgeStatus, User};
use crate::ports::effects::{MailMessage, Mailer, MergeVar};
use crate::ports::store::StoreScope;
use crate::uow::{UnitOfWork, settle};

const OPERATION: &str = "send_pending_pledge_confirmations";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PledgeFailure {
    pub pledge_id: String,
    pub error: DomainError,
}

/// Result of one sweep. Pledges listed in `failures` keep their
/// owing-confirmation flag and are picked up by the next sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub confirmed: Vec<String>,
    pub failures: Vec<PledgeFailure>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.failures.is_empty()
    }
}

/// Sends the confirmation mail owed for each of a user's pledges and clears
/// the flag for every pledge whose mail went out.
#[derive(Clone)]
pub struct ConfirmationSweep {
    uow: UnitOfWork,
    mailer: Arc<dyn Mailer>,
    config: Arc<WorkflowConfig>,
}

impl ConfirmationSweep {
    pub fn new(uow: UnitOfWork, mailer: Arc<dyn Mailer>, config: Arc<WorkflowConfig>) -> Self {
        Self {
            uow,
            mailer,
            config,
        }
    }

    pub async fn run(&self, user_id: &str) -> DomainResult<SweepReport> {
        let mut scope = self.uow.begin().await?;
        let outcome = self.prepare_all(scope.as_mut(), user_id).await;
        let prepared = settle(scope, OPERATION, outcome).await?;
        if prepared.is_empty() {
            return Ok(SweepReport::default());
        }

        let mut report = SweepReport::default();
        let mut outgoing = Vec::new();
        for (pledge_id, message) in prepared {
            match message {
                Ok(message) => outgoing.push((pledge_id, message)),
                Err(error) => report.failures.push(PledgeFailure { pledge_id, error }),
            }
        }

        let sends = outgoing.into_iter().map(|(pledge_id, message)| async move {
            let sent = self.mailer.send(message).await.map_err(DomainError::from);
            (pledge_id, sent)
        });
        for (pledge_id, sent) in join_all(sends).await {
            match sent {
                Ok(()) => report.confirmed.push(pledge_id),
                Err(error) => report.failures.push(PledgeFailure { pledge_id, error }),
            }
        }

        for failure in &report.failures {
            tracing::warn!(
                operation = OPERATION,
                user_id,
                pledge_id = %failure.pledge_id,
                error = %failure.error,
                "pledge confirmation not sent"
            );
        }

        if !report.confirmed.is_empty() {
            let mut scope = self.uow.begin().await?;
            let outcome = scope.clear_confirmation_flags(&report.confirmed).await;
            settle(scope, OPERATION, outcome).await?;
        }
        tracing::info!(
            operation = OPERATION,
            user_id,
            confirmed = report.confirmed.len(),
            failed = report.failures.len(),
            "pledge confirmations swept"
        );
        Ok(report)
    }

    async fn prepare_all(
        &self,
        scope: &mut dyn StoreScope,
        user_id: &str,
    ) -> DomainResult<Vec<(String, DomainResult<MailMessage>)>> {
        let pledges = scope.pledges_owing_confirmation(user_id).await?;
        if pledges.is_empty() {
            return Ok(Vec::new());
        }
        let Some(user) = scope.find_user(user_id).await? else {
            return Err(DomainError::NotFound(format!("user {user_id}")));
        };
        let address = match user.address_id.as_deref() {
            Some(address_id) => scope.find_address(address_id).await?,
            None => None,
        };

        let mut prepared = Vec::with_capacity(pledges.len());
        for pledge in pledges {
            let message = self
                .prepare_one(scope, &user, address.as_ref(), &pledge)
                .await;
            prepared.push((pledge.id, message));
        }
        Ok(prepared)
    }

    async fn prepare_one(
        &self,
        scope: &mut dyn StoreScope,
        user: &User,
        address: Option<&Address>,
        pledge: &Pledge,
    ) -> DomainResult<MailMessage> {
        let package = scope
            .find_package(&pledge.package_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("package {}", pledge.package_id)))?;
        let memberships = scope.memberships_for_pledge(&pledge.id).await?;
        let link = scope
            .latest_pledge_payment(&pledge.id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("payment for pledge {}", pledge.id)))?;
        let payment = scope
            .find_payment(&link.payment_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("payment {}", link.payment_id)))?;

        Ok(build_pledge_message(
            &self.config,
            user,
            address,
            PledgeMailContext {
                pledge,
                package: &package,
                memberships: &memberships,
                payment: &payment,
            },
        ))
    }
}

pub struct PledgeMailContext<'a> {
    pub pledge: &'a Pledge,
    pub package: &'a Package,
    pub memberships: &'a [Membership],
    pub payment: &'a Payment,
}

pub fn build_pledge_message(
    config: &WorkflowConfig,
    user: &User,
    address: Option<&Address>,
    context: PledgeMailContext<'_>,
) -> MailMessage {
    let PledgeMailContext {
        pledge,
        package,
        memberships,
        payment,
    } = context;

    let voucher_codes = package.is_gift().then(|| {
        memberships
            .iter()
            .filter_map(|membership| membership.voucher_code.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    });

    MailMessage {
        to: user.email.clone(),
        from_email: config.mail_from_address.clone(),
        subject: config.pledge_mail_subject.clone(),
        template_name: config.pledge_mail_template.clone(),
        fields: vec![
            MergeVar::new("NAME", user.display_name()),
            MergeVar::new(
                "WAITING_FOR_PAYMENT",
                pledge.status == PledgeStatus::WaitingForPayment,
            ),
            MergeVar::new("PAPER_INVOICE", payment.paper_invoice),
            MergeVar::new("HRID", payment.hrid.clone()),
            MergeVar::new("PAYMENTSLIP", payment.method == PaymentMethod::Paymentslip),
            MergeVar::new(
                "ASK_PERSONAL_INFO",
                user.address_id.is_none() || user.birthday.is_none(),
            ),
            MergeVar::new("VOUCHER_CODES", voucher_codes),
            MergeVar::new("TOTAL", pledge.total as f64 / 100.0),
            MergeVar::new("ADDRESS", address.map(Address::to_mail_html)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::GIFT_PACKAGE_NAME;

    fn user() -> User {
        User {
            id: "user-1".into(),
            email: "jane@example.org".into(),
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            birthday: None,
            address_id: Some("addr-1".into()),
            verified: true,
        }
    }

    fn pledge(status: PledgeStatus) -> Pledge {
        Pledge {
            id: "pledge-1".into(),
            user_id: "user-1".into(),
            package_id: "package-1".into(),
            total: 24_050,
            status,
            send_confirm_mail: true,
        }
    }

    fn payment(method: PaymentMethod) -> Payment {
        Payment {
            id: "payment-1".into(),
            hrid: "HX42".into(),
            method,
            paper_invoice: true,
            total: 24_050,
        }
    }

    fn voucher(id: &str, code: Option<&str>) -> Membership {
        Membership {
            id: id.into(),
            user_id: "user-1".into(),
            pledge_id: Some("pledge-1".into()),
            sequence_number: 1,
            voucher_code: code.map(str::to_string),
        }
    }

    #[test]
    fn gift_package_lists_voucher_codes() {
        let package = Package {
            id: "package-1".into(),
            name: GIFT_PACKAGE_NAME.into(),
        };
        let memberships = vec![voucher("m-1", Some("AAA")), voucher("m-2", Some("BBB"))];
        let message = build_pledge_message(
            &WorkflowConfig::default(),
            &user(),
            None,
            PledgeMailContext {
                pledge: &pledge(PledgeStatus::WaitingForPayment),
                package: &package,
                memberships: &memberships,
                payment: &payment(PaymentMethod::Paymentslip),
            },
        );

        assert_eq!(message.template_name, "cf_pledge");
        assert_eq!(message.to, "jane@example.org");
        assert_eq!(message.field("NAME"), Some(&json!("Jane Doe")));
        assert_eq!(message.field("VOUCHER_CODES"), Some(&json!("AAA, BBB")));
        assert_eq!(message.field("WAITING_FOR_PAYMENT"), Some(&json!(true)));
        assert_eq!(message.field("PAYMENTSLIP"), Some(&json!(true)));
        assert_eq!(message.field("PAPER_INVOICE"), Some(&json!(true)));
        assert_eq!(message.field("HRID"), Some(&json!("HX42")));
        assert_eq!(message.field("TOTAL"), Some(&json!(240.5)));
        assert_eq!(message.field("ASK_PERSONAL_INFO"), Some(&json!(true)));
        assert_eq!(message.field("ADDRESS"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn regular_package_has_no_voucher_codes() {
        let package = Package {
            id: "package-1".into(),
            name: "ABO".into(),
        };
        let address = Address {
            id: "addr-1".into(),
            name: "Jane Doe".into(),
            line1: "Main Street 1".into(),
            line2: Some("c/o Office".into()),
            postal_code: "8000".into(),
            city: "Zurich".into(),
            country: "Switzerland".into(),
        };
        let message = build_pledge_message(
            &WorkflowConfig::default(),
            &user(),
            Some(&address),
            PledgeMailContext {
                pledge: &pledge(PledgeStatus::Successful),
                package: &package,
                memberships: &[voucher("m-1", Some("AAA"))],
                payment: &payment(PaymentMethod::Stripe),
            },
        );

        assert_eq!(message.field("VOUCHER_CODES"), Some(&serde_json::Value::Null));
        assert_eq!(message.field("WAITING_FOR_PAYMENT"), Some(&json!(false)));
        assert_eq!(message.field("PAYMENTSLIP"), Some(&json!(false)));
        let rendered = message
            .field("ADDRESS")
            .and_then(|value| value.as_str())
            .expect("address html");
        assert!(rendered.contains("c/o Office<br/>"));
    }
}
