use log::warn;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Payout record as exposed by the backend.
///
/// `amount` is kept as the raw JSON value because the backend sends it either
/// as a number or as a decimal string; use [`Payout::amount_value`] to compare.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(from = "PayoutRecord")]
pub struct Payout {
    pub uuid: String,
    pub amount: Value,
    pub customer_name: String,
    pub customer_surname: String,
    pub creation_time: String,
}

/// Wire shape of a payout. Text fields may be missing, `null` or numeric,
/// and the identifier may come as `uuid` or `id`.
#[derive(Deserialize)]
struct PayoutRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    id: Option<String>,
    #[serde(default)]
    amount: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    customer_surname: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    creation_time: Option<String>,
}

impl From<PayoutRecord> for Payout {
    fn from(record: PayoutRecord) -> Self {
        let uuid = record
            .uuid
            .filter(|uuid| !uuid.is_empty())
            .or(record.id)
            .unwrap_or_default();
        Self {
            uuid,
            amount: record.amount,
            customer_name: record.customer_name.unwrap_or_default(),
            customer_surname: record.customer_surname.unwrap_or_default(),
            creation_time: record.creation_time.unwrap_or_default(),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(de::Error::custom(format!("expected text, got {}", other))),
    }
}

impl Payout {
    pub fn new(uuid: &str, amount: f64, creation_time: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            amount: serde_json::json!(amount),
            creation_time: creation_time.to_string(),
            ..Default::default()
        }
    }

    /// Parsed amount, `None` when missing, unparsable or not finite.
    pub fn amount_value(&self) -> Option<f64> {
        let parsed = match &self.amount {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        parsed.is_finite().then_some(parsed)
    }

    pub fn customer(&self) -> String {
        format!("{} {}", self.customer_name, self.customer_surname)
            .trim()
            .to_string()
    }
}

/// Envelope of `GET /payouts` and `GET /pending-payouts`.
///
/// Records stay raw until [`PayoutList::into_payouts`] so one malformed entry
/// cannot reject the whole snapshot.
#[derive(Debug, Deserialize, Default)]
pub struct PayoutList {
    #[serde(default)]
    pub payouts: Option<Vec<Value>>,
}

impl PayoutList {
    /// Well-formed records in source order; the rest are logged and skipped.
    pub fn into_payouts(self) -> Vec<Payout> {
        self.payouts
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(i, raw)| match serde_json::from_value::<Payout>(raw) {
                Ok(payout) => Some(payout),
                Err(e) => {
                    warn!("Skipping malformed payout record #{}: {}", i, e);
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct MutationRequest<'a> {
    pub ids: &'a [String],
}

/// Response of `POST /accept-payouts` and `POST /cancel-payouts`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MutationResult {
    #[serde(default)]
    pub success: Vec<String>,
    #[serde(default)]
    pub error: HashMap<String, String>,
}

impl MutationResult {
    /// Result used when the request itself failed; every id carries `reason`.
    pub fn failed(ids: &[String], reason: &str) -> Self {
        Self {
            success: Vec::new(),
            error: ids
                .iter()
                .map(|id| (id.clone(), reason.to_string()))
                .collect(),
        }
    }

    pub fn succeeded(&self, id: &str) -> bool {
        self.success.iter().any(|s| s == id)
    }

    pub fn reason(&self, id: &str) -> String {
        self.error
            .get(id)
            .cloned()
            .unwrap_or_else(|| "not confirmed by backend".to_string())
    }
}
