use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Company a voucher is issued under.
///
/// Each company owns its own counter sequence and identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Company {
    #[default]
    Mentari,
    Nes,
}

impl Company {
    /// Every company known to the store, in counter seeding order
    pub const ALL: [Company; 2] = [Company::Mentari, Company::Nes];

    /// Lowercase key used in persisted records and counter names
    pub fn key(&self) -> &'static str {
        match self {
            Company::Mentari => "mentari",
            Company::Nes => "nes",
        }
    }

    /// Prefix of the human-readable voucher identifier
    pub fn code(&self) -> &'static str {
        match self {
            Company::Mentari => "MI",
            Company::Nes => "NES",
        }
    }

    /// Registered name printed on the document header
    pub fn legal_name(&self) -> &'static str {
        match self {
            Company::Mentari => "MENTARI INFINITI SDN BHD",
            Company::Nes => "NES SOLUTION & NETWORK SDN BHD",
        }
    }

    /// Company registration number as printed under the name
    pub fn registration(&self) -> &'static str {
        match self {
            Company::Mentari => "(1175141-K)",
            Company::Nes => "(1545048-W)",
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Company {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mentari" | "mi" => Ok(Company::Mentari),
            "nes" => Ok(Company::Nes),
            other => Err(format!("Unknown company: {}", other)),
        }
    }
}

/// How the payee is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cheque,
    Cash,
    Online,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Cheque, PaymentMethod::Cash, PaymentMethod::Online];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Online => "online",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the voucher items table.
///
/// `amount` is kept exactly as the form sent it; it is only parsed when a
/// total is derived, so a stored voucher reads back the way it was typed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "invNo")]
    pub inv_no: String,
    #[serde(default, deserialize_with = "amount_text")]
    pub amount: String,
}

impl LineItem {
    pub fn new(description: &str, inv_no: &str, amount: &str) -> Self {
        Self {
            description: description.to_string(),
            inv_no: inv_no.to_string(),
            amount: amount.to_string(),
        }
    }

    /// Numeric value of the amount; anything that is not a number counts as zero
    pub fn parsed_amount(&self) -> Decimal {
        Decimal::from_str(self.amount.trim()).unwrap_or(Decimal::ZERO)
    }
}

/// Accepts the amount as a JSON string, number or null.
fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// A persisted payment voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Natural key, `{CODE}-{NNNN}`
    pub pv_number: String,
    pub company: Company,
    /// Calendar date as entered (`YYYY-MM-DD`)
    pub date: String,
    pub pay_to: String,
    pub payment_method: PaymentMethod,
    /// Only meaningful for cheque payments
    pub cheque_number: Option<String>,
    /// Only meaningful for online payments
    #[serde(default)]
    pub bank_name: Option<String>,
    pub items: Vec<LineItem>,
    /// Sum of item amounts at save time
    pub total_amount: Decimal,
    pub prepared_by: String,
    pub approved_by: String,
    pub received_by: String,
    /// Signature images as data URLs
    pub prepared_sig: Option<String>,
    pub approved_sig: Option<String>,
    pub received_sig: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Form data sent by the shell when a voucher is saved
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVoucherRequest {
    #[serde(default)]
    pub pv_number: String,
    #[serde(default)]
    pub company: Company,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub pay_to: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub cheque_number: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub prepared_by: String,
    #[serde(default)]
    pub approved_by: String,
    #[serde(default)]
    pub received_by: String,
    #[serde(default)]
    pub prepared_sig: Option<String>,
    #[serde(default)]
    pub approved_sig: Option<String>,
    #[serde(default)]
    pub received_sig: Option<String>,
    /// Overrides the creation timestamp ("save as new" stamps a fresh one)
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Voucher> for SaveVoucherRequest {
    fn from(voucher: Voucher) -> Self {
        Self {
            pv_number: voucher.pv_number,
            company: voucher.company,
            date: voucher.date,
            pay_to: voucher.pay_to,
            payment_method: voucher.payment_method,
            cheque_number: voucher.cheque_number,
            bank_name: voucher.bank_name,
            items: voucher.items,
            prepared_by: voucher.prepared_by,
            approved_by: voucher.approved_by,
            received_by: voucher.received_by,
            prepared_sig: voucher.prepared_sig,
            approved_sig: voucher.approved_sig,
            received_sig: voucher.received_sig,
            created_at: Some(voucher.created_at),
        }
    }
}

/// Database-wide figures shown in the history view footer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherStats {
    pub total_vouchers: usize,
    pub total_amount: Decimal,
    /// Next sequence number each company would hand out
    #[serde(default)]
    pub next_counters: BTreeMap<Company, u32>,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Category of a failed store call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Storage,
    NotFound,
    InvalidRequest,
    Export,
}

/// Uniform result shape returned by every store call.
///
/// On the wire a success is `{"success": true, ...payload}` and a failure is
/// `{"success": false, "kind": .., "error": .., ...fallback}`. Read calls put
/// an empty payload in `fallback` so the shell always has something to show.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure {
        kind: ErrorKind,
        error: String,
        fallback: Option<T>,
    },
}

impl<T> Envelope<T> {
    pub fn success(payload: T) -> Self {
        Envelope::Success(payload)
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Envelope::Failure {
            kind,
            error: error.into(),
            fallback: None,
        }
    }

    pub fn failure_with(kind: ErrorKind, error: impl Into<String>, fallback: T) -> Self {
        Envelope::Failure {
            kind,
            error: error.into(),
            fallback: Some(fallback),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Envelope::Success(payload) => Some(payload),
            Envelope::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure { error, .. } => Some(error),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct SuccessRepr<'a, P> {
            success: bool,
            #[serde(flatten)]
            payload: &'a P,
        }

        #[derive(Serialize)]
        struct FailureRepr<'a, P> {
            success: bool,
            kind: ErrorKind,
            error: &'a str,
            #[serde(flatten)]
            fallback: Option<&'a P>,
        }

        match self {
            Envelope::Success(payload) => {
                SuccessRepr { success: true, payload }.serialize(serializer)
            }
            Envelope::Failure { kind, error, fallback } => FailureRepr {
                success: false,
                kind: *kind,
                error,
                fallback: fallback.as_ref(),
            }
            .serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Map::deserialize(deserializer)?;
        let success = map
            .remove("success")
            .and_then(|value| value.as_bool())
            .ok_or_else(|| D::Error::missing_field("success"))?;

        if success {
            let payload = T::deserialize(Value::Object(map)).map_err(D::Error::custom)?;
            return Ok(Envelope::Success(payload));
        }

        let kind = match map.remove("kind") {
            Some(value) => serde_json::from_value(value).map_err(D::Error::custom)?,
            None => ErrorKind::Storage,
        };
        let error = map
            .remove("error")
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        let fallback = if map.is_empty() {
            None
        } else {
            T::deserialize(Value::Object(map)).ok()
        };

        Ok(Envelope::Failure { kind, error, fallback })
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterPayload {
    pub company: Company,
    pub counter: u32,
    pub pv_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPayload {
    pub pv_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherPayload {
    pub voucher: Voucher,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoucherListPayload {
    pub vouchers: Vec<Voucher>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsPayload {
    pub stats: VoucherStats,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeletedPayload {
    /// Number of records removed (0 or 1)
    pub removed: usize,
}

/// A file the backend wrote or located
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPayload {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub path: String,
    /// Pages for PDF, rows for spreadsheets
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupPayload {
    pub markup: String,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Destructive reset; the shell must ask the user first and send `confirm: true`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRequest {
    pub path: String,
}

/// Where an export lands: a directory (defaults to Documents) and a file name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTarget {
    #[serde(default)]
    pub custom_path: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPdfRequest {
    pub pv_numbers: Vec<String>,
    #[serde(flatten)]
    pub target: ExportTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadsheetFormat {
    #[default]
    Xlsx,
    Csv,
}

impl SpreadsheetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Xlsx => "xlsx",
            SpreadsheetFormat::Csv => "csv",
        }
    }
}

/// Spreadsheet export of the listed vouchers, or of every voucher when none are listed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSpreadsheetRequest {
    #[serde(default)]
    pub pv_numbers: Option<Vec<String>>,
    #[serde(default)]
    pub format: SpreadsheetFormat,
    #[serde(flatten)]
    pub target: ExportTarget,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMarkupRequest {
    pub pv_numbers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJsonRequest {
    pub pv_number: String,
    #[serde(flatten)]
    pub target: ExportTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJsonRequest {
    pub path: String,
}
