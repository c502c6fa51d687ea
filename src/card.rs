//! Card data model: the canonical record served by the card API, the form
//! draft submitted back to it, and the read-only view the renderer consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::assets::AssetSource;

/// Blood groups offered by the card form.
pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Railway division codes offered by the card form.
pub const DIVISIONS: [&str; 18] = [
    "NWR BKN", "NWR JP", "NWR JU", "NWR AII", "CR", "ER", "ECR", "NR", "NCR", "NER", "NFR", "SR",
    "SCR", "SER", "SECR", "SWR", "WR", "WCR",
];

/// Fallback artifact name used when the record carries no employee name.
pub const DEFAULT_FILE_BASE: &str = "ID-Card";

fn ser_wire_date<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
        None => s.serialize_none(),
    }
}

// The service emits calendar dates either bare ("2024-01-31") or with a time
// suffix ("2024-01-31T00:00:00.000Z"); anything unparseable maps to None.
fn de_wire_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_wire_date))
}

/// Parse a wire date, tolerating an ISO time suffix after the calendar part.
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split('T').next().unwrap_or(raw).trim();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Format a calendar date for card display, `dd/MM/yyyy` or `-` when unset.
pub fn format_display_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => "-".to_string(),
    }
}

/// The canonical card entity as persisted by the remote service.
///
/// All person/employment fields are plain strings; the two validity windows
/// (card issue/expiry and contract issue/expiry) are calendar dates with no
/// time component. The three asset fields hold server-hosted URLs once the
/// record is persisted; freshly captured previews live outside the record
/// (see [`AssetPreviews`]) and always win over these URLs when rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub employee_name: String,
    pub father_name: String,
    pub designation: String,
    pub adhar_card_number: String,
    /// Name of the issuing authority.
    pub hirer: String,
    pub blood_group: String,
    pub police_verification: String,
    #[serde(serialize_with = "ser_wire_date", deserialize_with = "de_wire_date")]
    pub date_of_issue: Option<NaiveDate>,
    #[serde(serialize_with = "ser_wire_date", deserialize_with = "de_wire_date")]
    pub valid_till: Option<NaiveDate>,
    pub mobile_number: String,
    pub address: String,
    pub card_no: String,
    pub division_name: String,
    /// Profile/company name of the contracting agency.
    pub profile_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
    #[serde(serialize_with = "ser_wire_date", deserialize_with = "de_wire_date")]
    pub contract_validity_date: Option<NaiveDate>,
    #[serde(serialize_with = "ser_wire_date", deserialize_with = "de_wire_date")]
    pub contract_expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Validity badge derived from a card's expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityStatus {
    Active,
    Expired,
}

impl ValidityStatus {
    pub fn label(self) -> &'static str {
        match self {
            ValidityStatus::Active => "Active",
            ValidityStatus::Expired => "Expired",
        }
    }
}

/// Evaluate an expiry date against `today` by calendar order only.
///
/// A missing expiry date never expires the card.
pub fn validity_on(valid_till: Option<NaiveDate>, today: NaiveDate) -> ValidityStatus {
    match valid_till {
        Some(expiry) if expiry < today => ValidityStatus::Expired,
        _ => ValidityStatus::Active,
    }
}

impl CardRecord {
    /// Validity badge for the card's own issue/expiry window.
    pub fn validity(&self, today: NaiveDate) -> ValidityStatus {
        validity_on(self.valid_till, today)
    }

    /// Base name used for exported artifacts.
    pub fn file_base(&self) -> &str {
        if self.employee_name.trim().is_empty() {
            DEFAULT_FILE_BASE
        } else {
            &self.employee_name
        }
    }
}

/// Compose the artifact file name for an export, `<base>_card.<ext>`.
///
/// Path separators in the base are replaced so the name stays a single
/// path component; everything else is kept verbatim.
pub fn export_file_name(base: &str, ext: &str) -> String {
    let base = if base.trim().is_empty() { DEFAULT_FILE_BASE } else { base };
    let safe: String = base
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    format!("{}_card.{}", safe, ext)
}

/// The form payload submitted on create/update. Mirrors the record's text
/// fields; assets travel separately as multipart file parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardDraft {
    pub employee_name: String,
    pub father_name: String,
    pub designation: String,
    pub adhar_card_number: String,
    pub hirer: String,
    pub blood_group: String,
    pub police_verification: String,
    #[serde(serialize_with = "ser_wire_date", deserialize_with = "de_wire_date")]
    pub date_of_issue: Option<NaiveDate>,
    #[serde(serialize_with = "ser_wire_date", deserialize_with = "de_wire_date")]
    pub valid_till: Option<NaiveDate>,
    pub mobile_number: String,
    pub address: String,
    pub card_no: String,
    pub division_name: String,
    pub profile_name: String,
    pub description: Option<String>,
    #[serde(serialize_with = "ser_wire_date", deserialize_with = "de_wire_date")]
    pub contract_validity_date: Option<NaiveDate>,
    #[serde(serialize_with = "ser_wire_date", deserialize_with = "de_wire_date")]
    pub contract_expiry_date: Option<NaiveDate>,
}

impl CardDraft {
    /// Wire field name/value pairs in form order. Unset dates and the unset
    /// description serialize as empty strings; payload policy (skip vs send)
    /// is decided by the API client.
    pub fn wire_fields(&self) -> Vec<(&'static str, String)> {
        let date = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
        };
        vec![
            ("employeeName", self.employee_name.clone()),
            ("fatherName", self.father_name.clone()),
            ("designation", self.designation.clone()),
            ("adharCardNumber", self.adhar_card_number.clone()),
            ("hirer", self.hirer.clone()),
            ("bloodGroup", self.blood_group.clone()),
            ("policeVerification", self.police_verification.clone()),
            ("dateOfIssue", date(self.date_of_issue)),
            ("validTill", date(self.valid_till)),
            ("mobileNumber", self.mobile_number.clone()),
            ("address", self.address.clone()),
            ("cardNo", self.card_no.clone()),
            ("divisionName", self.division_name.clone()),
            ("profileName", self.profile_name.clone()),
            ("description", self.description.clone().unwrap_or_default()),
            ("contractValidityDate", date(self.contract_validity_date)),
            ("contractExpiryDate", date(self.contract_expiry_date)),
        ]
    }

    /// Derive a draft from an existing record (edit-page prefill).
    pub fn from_record(record: &CardRecord) -> CardDraft {
        CardDraft {
            employee_name: record.employee_name.clone(),
            father_name: record.father_name.clone(),
            designation: record.designation.clone(),
            adhar_card_number: record.adhar_card_number.clone(),
            hirer: record.hirer.clone(),
            blood_group: record.blood_group.clone(),
            police_verification: record.police_verification.clone(),
            date_of_issue: record.date_of_issue,
            valid_till: record.valid_till,
            mobile_number: record.mobile_number.clone(),
            address: record.address.clone(),
            card_no: record.card_no.clone(),
            division_name: record.division_name.clone(),
            profile_name: record.profile_name.clone(),
            description: record.description.clone(),
            contract_validity_date: record.contract_validity_date,
            contract_expiry_date: record.contract_expiry_date,
        }
    }
}

/// Freshly captured data-URL previews, keyed like the record's asset fields.
/// A present preview reflects an unsaved edit and beats the persisted URL.
#[derive(Debug, Clone, Default)]
pub struct AssetPreviews {
    pub photo: Option<String>,
    pub sign: Option<String>,
    pub seal: Option<String>,
}

/// Read-only projection of a [`CardRecord`] plus resolved asset sources.
/// This is the only input the scene composer accepts; it owns nothing.
#[derive(Debug, Clone)]
pub struct CardView<'a> {
    pub record: &'a CardRecord,
    pub photo: Option<AssetSource>,
    pub sign: Option<AssetSource>,
    pub seal: Option<AssetSource>,
}

impl<'a> CardView<'a> {
    /// Project a record for rendering; local previews win over server URLs.
    pub fn new(record: &'a CardRecord, previews: &AssetPreviews) -> CardView<'a> {
        let pick = |preview: &Option<String>, stored: &Option<String>| {
            preview
                .as_deref()
                .or(stored.as_deref())
                .filter(|s| !s.is_empty())
                .map(AssetSource::from_value)
        };
        CardView {
            record,
            photo: pick(&previews.photo, &record.photo),
            sign: pick(&previews.sign, &record.sign),
            seal: pick(&previews.seal, &record.seal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn wire_dates_tolerate_time_suffix() {
        assert_eq!(parse_wire_date("2024-01-31"), Some(day("2024-01-31")));
        assert_eq!(
            parse_wire_date("2024-01-31T00:00:00.000Z"),
            Some(day("2024-01-31"))
        );
        assert_eq!(parse_wire_date(""), None);
        assert_eq!(parse_wire_date("31/01/2024"), None);
    }

    #[test]
    fn record_roundtrips_camel_case() {
        let json = r#"{
            "_id": "abc123",
            "employeeName": "Ravi Kumar",
            "bloodGroup": "B+",
            "validTill": "2099-01-01T00:00:00.000Z",
            "cardNo": "C-42"
        }"#;
        let record: CardRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_deref(), Some("abc123"));
        assert_eq!(record.employee_name, "Ravi Kumar");
        assert_eq!(record.valid_till, Some(day("2099-01-01")));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["employeeName"], "Ravi Kumar");
        assert_eq!(back["validTill"], "2099-01-01");
    }

    #[test]
    fn validity_is_calendar_order_only() {
        let today = day("2024-06-01");
        assert_eq!(validity_on(Some(day("2020-01-01")), today), ValidityStatus::Expired);
        assert_eq!(validity_on(Some(day("2099-01-01")), today), ValidityStatus::Active);
        // Boundary day is still active; no time component exists to compare.
        assert_eq!(validity_on(Some(today), today), ValidityStatus::Active);
        assert_eq!(validity_on(None, today), ValidityStatus::Active);
    }

    #[test]
    fn export_names_follow_employee_name() {
        assert_eq!(export_file_name("Ravi Kumar", "png"), "Ravi Kumar_card.png");
        assert_eq!(export_file_name("", "png"), "ID-Card_card.png");
        assert_eq!(export_file_name("  ", "pdf"), "ID-Card_card.pdf");
        assert_eq!(export_file_name("a/b", "png"), "a-b_card.png");
    }

    #[test]
    fn view_prefers_local_previews() {
        let record = CardRecord {
            photo: Some("https://cdn.example.com/p.png".into()),
            ..Default::default()
        };
        let previews = AssetPreviews {
            photo: Some("data:image/png;base64,AAAA".into()),
            ..Default::default()
        };
        let view = CardView::new(&record, &previews);
        assert!(matches!(view.photo, Some(AssetSource::DataUrl(_))));

        let view = CardView::new(&record, &AssetPreviews::default());
        assert!(matches!(view.photo, Some(AssetSource::Remote(_))));
        assert!(view.sign.is_none());
    }

    #[test]
    fn draft_wire_fields_keep_form_order() {
        let draft = CardDraft {
            employee_name: "Ravi Kumar".into(),
            valid_till: Some(day("2025-03-01")),
            ..Default::default()
        };
        let fields = draft.wire_fields();
        assert_eq!(fields[0], ("employeeName", "Ravi Kumar".to_string()));
        assert!(fields.contains(&("validTill", "2025-03-01".to_string())));
        // Unset dates serialize as empty, to be dropped or sent by policy.
        assert!(fields.contains(&("dateOfIssue", String::new())));
    }
}
