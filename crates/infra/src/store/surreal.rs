use std::sync::Arc;

use patronage_domain::DomainResult;
use patronage_domain::error::DomainError;
use patronage_domain::model::{
    Address, Comment, Membership, Package, Payment, PaymentMethod, Pledge, PledgePayment,
    PledgeStatus, ProfilePatch, Testimonial, TestimonialPatch, User,
};
use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::store::{Store, StoreScope};
use patronage_domain::util::format_ms_rfc3339;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::Client;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::db::DbConfig;

const INDEXES: &str = "\
    DEFINE INDEX IF NOT EXISTS testimonial_user ON TABLE testimonial FIELDS user_id UNIQUE;\n\
    DEFINE INDEX IF NOT EXISTS testimonial_key ON TABLE testimonial FIELDS testimonial_id UNIQUE;\n\
    DEFINE INDEX IF NOT EXISTS comment_key ON TABLE comment FIELDS comment_id UNIQUE;\n\
    DEFINE INDEX IF NOT EXISTS pledge_key ON TABLE pledge FIELDS pledge_id UNIQUE;\n\
    DEFINE INDEX IF NOT EXISTS pledge_user ON TABLE pledge FIELDS user_id;\n\
    DEFINE INDEX IF NOT EXISTS membership_user ON TABLE membership FIELDS user_id;\n\
    DEFINE INDEX IF NOT EXISTS membership_pledge ON TABLE membership FIELDS pledge_id;\n\
    DEFINE INDEX IF NOT EXISTS payment_source_user ON TABLE payment_source FIELDS user_id;\n\
    DEFINE INDEX IF NOT EXISTS user_key ON TABLE user FIELDS user_id UNIQUE;\n\
    DEFINE INDEX IF NOT EXISTS pledge_payment_pledge ON TABLE pledge_payment FIELDS pledge_id;";

const TESTIMONIAL_FIELDS: &str = "testimonial_id, user_id, role, quote, image, sm_image, published, \
    sequence_number, <string>created_at AS created_at, <string>updated_at AS updated_at";
const PLEDGE_FIELDS: &str = "pledge_id, user_id, package_id, total, status, send_confirm_mail";
const MEMBERSHIP_FIELDS: &str = "membership_id, user_id, pledge_id, sequence_number, voucher_code";

/// SurrealDB backend. Reads hit the database directly; writes are staged on
/// the scope and sent as one transaction at commit.
#[derive(Clone)]
pub struct SurrealStore {
    client: Arc<Surreal<Client>>,
}

impl SurrealStore {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn connect(db_config: &DbConfig) -> anyhow::Result<Self> {
        let client = db_config.connect().await?;
        let store = Self::with_client(Arc::new(client));
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let response = self.client.query(INDEXES).await?;
        response.check()?;
        Ok(())
    }
}

impl Store for SurrealStore {
    fn name(&self) -> &'static str {
        "surrealdb"
    }

    fn begin(&self) -> BoxFuture<'_, DomainResult<Box<dyn StoreScope>>> {
        let scope: Box<dyn StoreScope> = Box::new(SurrealScope {
            client: self.client.clone(),
            staged: Vec::new(),
        });
        Box::pin(async move { Ok(scope) })
    }
}

fn map_surreal_error(err: surrealdb::Error) -> DomainError {
    let message = err.to_string().to_lowercase();
    if message.contains("already contains")
        || message.contains("already exists")
        || message.contains("unique")
    {
        return DomainError::Persistence(format!("constraint violated: {message}"));
    }
    DomainError::Persistence(format!("surreal query failed: {message}"))
}

fn decode_rows<R: DeserializeOwned>(rows: Vec<Value>, table: &str) -> DomainResult<Vec<R>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<R>(row)
                .map_err(|err| DomainError::Persistence(format!("invalid {table} row: {err}")))
        })
        .collect()
}

fn parse_rfc3339(value: &str) -> DomainResult<i64> {
    let dt = OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|err| DomainError::Persistence(format!("invalid timestamp: {err}")))?;
    Ok((dt.unix_timestamp_nanos() / 1_000_000) as i64)
}

/// Right-hand side of a staged `SET` clause.
enum Assign {
    Value(Value),
    DateTime(i64),
    Unset,
}

struct Staged {
    sql: String,
    params: Vec<(String, Value)>,
}

struct SurrealScope {
    client: Arc<Surreal<Client>>,
    staged: Vec<Staged>,
}

impl SurrealScope {
    /// Parameter prefix unique to the next staged statement.
    fn prefix(&self) -> String {
        format!("s{}_", self.staged.len())
    }

    fn push(&mut self, sql: String, params: Vec<(String, Value)>) -> BoxFuture<'_, DomainResult<()>> {
        self.staged.push(Staged { sql, params });
        Box::pin(async { Ok(()) })
    }

    /// Stages an update of exactly one row; the transaction aborts when the
    /// row does not exist.
    fn update_one(
        &mut self,
        table: &'static str,
        key_field: &'static str,
        key: &str,
        assignments: Vec<(&'static str, Assign)>,
    ) -> BoxFuture<'_, DomainResult<()>> {
        if assignments.is_empty() {
            return Box::pin(async { Ok(()) });
        }
        let p = self.prefix();
        let mut params = vec![(format!("{p}key"), json!(key))];
        let sets = assignments
            .into_iter()
            .map(|(field, assign)| match assign {
                Assign::Value(value) => {
                    params.push((format!("{p}{field}"), value));
                    format!("{field} = ${p}{field}")
                }
                Assign::DateTime(epoch_ms) => {
                    params.push((format!("{p}{field}"), json!(format_ms_rfc3339(epoch_ms))));
                    format!("{field} = <datetime>${p}{field}")
                }
                Assign::Unset => format!("{field} = NONE"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "LET ${p}rows = (UPDATE {table} SET {sets} WHERE {key_field} = ${p}key RETURN AFTER);\n\
             IF array::len(${p}rows) = 0 {{ THROW \"{table} \" + ${p}key + \" does not exist\" }};"
        );
        self.push(sql, params)
    }

    fn select<R>(
        &self,
        sql: String,
        table: &'static str,
        binds: Vec<(&'static str, String)>,
    ) -> BoxFuture<'_, DomainResult<Vec<R>>>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let client = self.client.clone();
        Box::pin(async move {
            let mut query = client.query(sql);
            for bind in binds {
                query = query.bind(bind);
            }
            let mut response = query.await.map_err(map_surreal_error)?;
            let rows: Vec<Value> = response.take(0).map_err(map_surreal_error)?;
            decode_rows(rows, table)
        })
    }

    fn select_one<R, T>(
        &self,
        sql: String,
        table: &'static str,
        binds: Vec<(&'static str, String)>,
        convert: fn(R) -> DomainResult<T>,
    ) -> BoxFuture<'_, DomainResult<Option<T>>>
    where
        R: DeserializeOwned + Send + 'static,
        T: Send + 'static,
    {
        let rows = self.select::<R>(sql, table, binds);
        Box::pin(async move { rows.await?.into_iter().next().map(convert).transpose() })
    }

    fn count(&self, table: &'static str, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let rows = self.select::<CountRow>(
            format!("SELECT count() AS total FROM {table} WHERE user_id = $user_id GROUP ALL"),
            table,
            vec![("user_id", user_id.to_string())],
        );
        Box::pin(async move { Ok(rows.await?.first().map_or(0, |row| row.total)) })
    }
}

impl StoreScope for SurrealScope {
    fn count_pledges_for_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        self.count("pledge", user_id)
    }

    fn count_memberships_for_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        self.count("membership", user_id)
    }

    fn find_testimonial_by_user(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Testimonial>>> {
        self.select_one(
            format!("SELECT {TESTIMONIAL_FIELDS} FROM testimonial WHERE user_id = $user_id LIMIT 1"),
            "testimonial",
            vec![("user_id", user_id.to_string())],
            TestimonialRow::into_domain,
        )
    }

    fn first_membership_for_user(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Membership>>> {
        self.select_one(
            format!(
                "SELECT {MEMBERSHIP_FIELDS} FROM membership WHERE user_id = $user_id \
                 ORDER BY sequence_number ASC LIMIT 1"
            ),
            "membership",
            vec![("user_id", user_id.to_string())],
            MembershipRow::into_domain,
        )
    }

    fn insert_testimonial(&mut self, testimonial: &Testimonial) -> BoxFuture<'_, DomainResult<()>> {
        let p = self.prefix();
        let sql = format!(
            "CREATE testimonial CONTENT {{\n\
                testimonial_id: ${p}id,\n\
                user_id: ${p}user_id,\n\
                role: ${p}role,\n\
                quote: ${p}quote,\n\
                image: ${p}image,\n\
                sm_image: ${p}sm_image,\n\
                published: ${p}published,\n\
                sequence_number: ${p}sequence_number,\n\
                created_at: <datetime>${p}created_at,\n\
                updated_at: <datetime>${p}updated_at\n\
            }};"
        );
        let params = vec![
            (format!("{p}id"), json!(testimonial.id)),
            (format!("{p}user_id"), json!(testimonial.user_id)),
            (format!("{p}role"), json!(testimonial.role)),
            (format!("{p}quote"), json!(testimonial.quote)),
            (format!("{p}image"), json!(testimonial.image)),
            (format!("{p}sm_image"), json!(testimonial.sm_image)),
            (format!("{p}published"), json!(testimonial.published)),
            (format!("{p}sequence_number"), json!(testimonial.sequence_number)),
            (
                format!("{p}created_at"),
                json!(format_ms_rfc3339(testimonial.created_at_ms)),
            ),
            (
                format!("{p}updated_at"),
                json!(format_ms_rfc3339(testimonial.updated_at_ms)),
            ),
        ];
        self.push(sql, params)
    }

    fn update_testimonial(
        &mut self,
        testimonial_id: &str,
        patch: &TestimonialPatch,
    ) -> BoxFuture<'_, DomainResult<()>> {
        let mut assignments = Vec::new();
        match &patch.role {
            Some(Some(role)) => assignments.push(("role", Assign::Value(json!(role)))),
            Some(None) => assignments.push(("role", Assign::Unset)),
            None => {}
        }
        if let Some(quote) = &patch.quote {
            assignments.push(("quote", Assign::Value(json!(quote))));
        }
        if let Some(image) = &patch.image {
            assignments.push(("image", Assign::Value(json!(image))));
        }
        if let Some(sm_image) = &patch.sm_image {
            assignments.push(("sm_image", Assign::Value(json!(sm_image))));
        }
        if let Some(published) = patch.published {
            assignments.push(("published", Assign::Value(json!(published))));
        }
        if let Some(sequence_number) = patch.sequence_number {
            assignments.push(("sequence_number", Assign::Value(json!(sequence_number))));
        }
        if let Some(updated_at_ms) = patch.updated_at_ms {
            assignments.push(("updated_at", Assign::DateTime(updated_at_ms)));
        }
        self.update_one("testimonial", "testimonial_id", testimonial_id, assignments)
    }

    fn find_comment(&mut self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        self.select_one(
            "SELECT comment_id, user_id, content, published FROM comment \
             WHERE comment_id = $comment_id LIMIT 1"
                .to_string(),
            "comment",
            vec![("comment_id", comment_id.to_string())],
            CommentRow::into_domain,
        )
    }

    fn set_comment_published(
        &mut self,
        comment_id: &str,
        published: bool,
    ) -> BoxFuture<'_, DomainResult<()>> {
        self.update_one(
            "comment",
            "comment_id",
            comment_id,
            vec![("published", Assign::Value(json!(published)))],
        )
    }

    fn find_pledge(&mut self, pledge_id: &str) -> BoxFuture<'_, DomainResult<Option<Pledge>>> {
        self.select_one(
            format!("SELECT {PLEDGE_FIELDS} FROM pledge WHERE pledge_id = $pledge_id LIMIT 1"),
            "pledge",
            vec![("pledge_id", pledge_id.to_string())],
            PledgeRow::into_domain,
        )
    }

    fn find_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<User>>> {
        self.select_one(
            "SELECT user_id, email, first_name, last_name, birthday, address_id, verified \
             FROM user WHERE user_id = $user_id LIMIT 1"
                .to_string(),
            "user",
            vec![("user_id", user_id.to_string())],
            UserRow::into_domain,
        )
    }

    fn find_address(
        &mut self,
        address_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Address>>> {
        self.select_one(
            "SELECT address_id, name, line1, line2, postal_code, city, country \
             FROM address WHERE address_id = $address_id LIMIT 1"
                .to_string(),
            "address",
            vec![("address_id", address_id.to_string())],
            AddressRow::into_domain,
        )
    }

    fn reassign_pledge(
        &mut self,
        pledge_id: &str,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        let p = self.prefix();
        let sql = format!(
            "LET ${p}rows = (UPDATE pledge SET user_id = ${p}to \
             WHERE pledge_id = ${p}key AND user_id = ${p}from RETURN AFTER);\n\
             IF array::len(${p}rows) = 0 {{ THROW \"pledge \" + ${p}key + \" is no longer owned by \" + ${p}from }};"
        );
        let params = vec![
            (format!("{p}key"), json!(pledge_id)),
            (format!("{p}from"), json!(from_user_id)),
            (format!("{p}to"), json!(to_user_id)),
        ];
        self.push(sql, params)
    }

    fn reassign_memberships(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        let p = self.prefix();
        let sql = format!("UPDATE membership SET user_id = ${p}to WHERE user_id = ${p}from;");
        let params = vec![
            (format!("{p}from"), json!(from_user_id)),
            (format!("{p}to"), json!(to_user_id)),
        ];
        self.push(sql, params)
    }

    fn reassign_payment_sources(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        let p = self.prefix();
        let sql = format!("UPDATE payment_source SET user_id = ${p}to WHERE user_id = ${p}from;");
        let params = vec![
            (format!("{p}from"), json!(from_user_id)),
            (format!("{p}to"), json!(to_user_id)),
        ];
        self.push(sql, params)
    }

    fn update_user_profile(
        &mut self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> BoxFuture<'_, DomainResult<()>> {
        let assignments = [
            ("first_name", &patch.first_name),
            ("last_name", &patch.last_name),
            ("birthday", &patch.birthday),
            ("address_id", &patch.address_id),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .as_ref()
                .map(|value| (field, Assign::Value(json!(value))))
        })
        .collect();
        self.update_one("user", "user_id", user_id, assignments)
    }

    fn clear_user_address(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        self.update_one("user", "user_id", user_id, vec![("address_id", Assign::Unset)])
    }

    fn pledges_owing_confirmation(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Pledge>>> {
        let rows = self.select::<PledgeRow>(
            format!(
                "SELECT {PLEDGE_FIELDS} FROM pledge \
                 WHERE user_id = $user_id AND send_confirm_mail = true ORDER BY pledge_id ASC"
            ),
            "pledge",
            vec![("user_id", user_id.to_string())],
        );
        Box::pin(async move {
            rows.await?
                .into_iter()
                .map(PledgeRow::into_domain)
                .collect()
        })
    }

    fn find_package(&mut self, package_id: &str) -> BoxFuture<'_, DomainResult<Option<Package>>> {
        self.select_one(
            "SELECT package_id, name FROM package WHERE package_id = $package_id LIMIT 1"
                .to_string(),
            "package",
            vec![("package_id", package_id.to_string())],
            PackageRow::into_domain,
        )
    }

    fn memberships_for_pledge(
        &mut self,
        pledge_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Membership>>> {
        let rows = self.select::<MembershipRow>(
            format!(
                "SELECT {MEMBERSHIP_FIELDS} FROM membership WHERE pledge_id = $pledge_id \
                 ORDER BY sequence_number ASC"
            ),
            "membership",
            vec![("pledge_id", pledge_id.to_string())],
        );
        Box::pin(async move {
            rows.await?
                .into_iter()
                .map(MembershipRow::into_domain)
                .collect()
        })
    }

    fn latest_pledge_payment(
        &mut self,
        pledge_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<PledgePayment>>> {
        self.select_one(
            "SELECT pledge_id, payment_id, created_at, <string>created_at AS created_at_text \
             FROM pledge_payment WHERE pledge_id = $pledge_id ORDER BY created_at DESC LIMIT 1"
                .to_string(),
            "pledge_payment",
            vec![("pledge_id", pledge_id.to_string())],
            PledgePaymentRow::into_domain,
        )
    }

    fn find_payment(&mut self, payment_id: &str) -> BoxFuture<'_, DomainResult<Option<Payment>>> {
        self.select_one(
            "SELECT payment_id, hrid, method, paper_invoice, total FROM payment \
             WHERE payment_id = $payment_id LIMIT 1"
                .to_string(),
            "payment",
            vec![("payment_id", payment_id.to_string())],
            PaymentRow::into_domain,
        )
    }

    fn clear_confirmation_flags(
        &mut self,
        pledge_ids: &[String],
    ) -> BoxFuture<'_, DomainResult<()>> {
        if pledge_ids.is_empty() {
            return Box::pin(async { Ok(()) });
        }
        let p = self.prefix();
        let sql = format!("UPDATE pledge SET send_confirm_mail = false WHERE pledge_id IN ${p}ids;");
        self.push(sql, vec![(format!("{p}ids"), json!(pledge_ids))])
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, DomainResult<()>> {
        let Self { client, staged } = *self;
        Box::pin(async move {
            if staged.is_empty() {
                return Ok(());
            }
            let statements = staged.len();
            let mut sql = String::from("BEGIN TRANSACTION;\n");
            let mut params = Vec::new();
            for statement in staged {
                sql.push_str(&statement.sql);
                sql.push('\n');
                params.extend(statement.params);
            }
            sql.push_str("COMMIT TRANSACTION;");

            let mut query = client.query(sql);
            for param in params {
                query = query.bind(param);
            }
            let response = query.await.map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            tracing::debug!(statements, "surreal unit of work committed");
            Ok(())
        })
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, ()> {
        let discarded = self.staged.len();
        Box::pin(async move {
            tracing::debug!(discarded, "surreal unit of work discarded");
        })
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct TestimonialRow {
    testimonial_id: String,
    user_id: String,
    #[serde(default)]
    role: Option<String>,
    quote: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    sm_image: Option<String>,
    published: bool,
    #[serde(default)]
    sequence_number: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl TestimonialRow {
    fn into_domain(self) -> DomainResult<Testimonial> {
        Ok(Testimonial {
            id: self.testimonial_id,
            user_id: self.user_id,
            role: self.role,
            quote: self.quote,
            image: self.image,
            sm_image: self.sm_image,
            published: self.published,
            sequence_number: self.sequence_number,
            created_at_ms: parse_rfc3339(&self.created_at)?,
            updated_at_ms: parse_rfc3339(&self.updated_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CommentRow {
    comment_id: String,
    user_id: String,
    #[serde(default)]
    content: String,
    published: bool,
}

impl CommentRow {
    fn into_domain(self) -> DomainResult<Comment> {
        Ok(Comment {
            id: self.comment_id,
            user_id: self.user_id,
            content: self.content,
            published: self.published,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PledgeRow {
    pledge_id: String,
    user_id: String,
    package_id: String,
    total: i64,
    status: String,
    #[serde(default)]
    send_confirm_mail: bool,
}

impl PledgeRow {
    fn into_domain(self) -> DomainResult<Pledge> {
        let status = self.status.parse::<PledgeStatus>().map_err(|_| {
            DomainError::Persistence(format!("invalid pledge status '{}'", self.status))
        })?;
        Ok(Pledge {
            id: self.pledge_id,
            user_id: self.user_id,
            package_id: self.package_id,
            total: self.total,
            status,
            send_confirm_mail: self.send_confirm_mail,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MembershipRow {
    membership_id: String,
    user_id: String,
    #[serde(default)]
    pledge_id: Option<String>,
    sequence_number: i64,
    #[serde(default)]
    voucher_code: Option<String>,
}

impl MembershipRow {
    fn into_domain(self) -> DomainResult<Membership> {
        Ok(Membership {
            id: self.membership_id,
            user_id: self.user_id,
            pledge_id: self.pledge_id,
            sequence_number: self.sequence_number,
            voucher_code: self.voucher_code,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserRow {
    user_id: String,
    email: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    birthday: Option<String>,
    #[serde(default)]
    address_id: Option<String>,
    #[serde(default)]
    verified: bool,
}

impl UserRow {
    fn into_domain(self) -> DomainResult<User> {
        Ok(User {
            id: self.user_id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            birthday: self.birthday,
            address_id: self.address_id,
            verified: self.verified,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AddressRow {
    address_id: String,
    name: String,
    line1: String,
    #[serde(default)]
    line2: Option<String>,
    postal_code: String,
    city: String,
    country: String,
}

impl AddressRow {
    fn into_domain(self) -> DomainResult<Address> {
        Ok(Address {
            id: self.address_id,
            name: self.name,
            line1: self.line1,
            line2: self.line2,
            postal_code: self.postal_code,
            city: self.city,
            country: self.country,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PackageRow {
    package_id: String,
    name: String,
}

impl PackageRow {
    fn into_domain(self) -> DomainResult<Package> {
        Ok(Package {
            id: self.package_id,
            name: self.name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PledgePaymentRow {
    pledge_id: String,
    payment_id: String,
    created_at_text: String,
}

impl PledgePaymentRow {
    fn into_domain(self) -> DomainResult<PledgePayment> {
        Ok(PledgePayment {
            pledge_id: self.pledge_id,
            payment_id: self.payment_id,
            created_at_ms: parse_rfc3339(&self.created_at_text)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PaymentRow {
    payment_id: String,
    hrid: String,
    method: PaymentMethod,
    #[serde(default)]
    paper_invoice: bool,
    total: i64,
}

impl PaymentRow {
    fn into_domain(self) -> DomainResult<Payment> {
        Ok(Payment {
            id: self.payment_id,
            hrid: self.hrid,
            method: self.method,
            paper_invoice: self.paper_invoice,
            total: self.total,
        })
    }
}
