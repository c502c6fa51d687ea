//! QR payload strategies and matrix generation.
//!
//! Two payload schemes exist across card revisions: a verification URL
//! (preferred; the printed code stays valid as record fields change) and an
//! embedded JSON blob of the verification fields (superseded, kept
//! selectable for already-printed stock).

use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};

use crate::card::{format_display_date, CardView};
use crate::error::{Error, Result};

/// Which payload the card's QR glyph carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QrStrategy {
    /// `<verify_base>/verify/<id>`: resolves to the public verification page.
    #[default]
    VerificationUrl,
    /// JSON blob of the reduced verification field set, frozen at print time.
    EmbeddedRecord,
}

/// Build the QR payload for a card under the configured strategy.
pub fn payload(strategy: QrStrategy, verify_base: &str, view: &CardView) -> String {
    let record = view.record;
    match strategy {
        QrStrategy::VerificationUrl => {
            let id = record.id.as_deref().unwrap_or("");
            format!("{}/verify/{}", verify_base.trim_end_matches('/'), id)
        }
        QrStrategy::EmbeddedRecord => serde_json::json!({
            "id": record.id,
            "employeeName": record.employee_name,
            "adharCardNumber": record.adhar_card_number,
            "cardNo": record.card_no,
            "bloodGroup": record.blood_group,
            "mobileNumber": record.mobile_number,
            "validTill": format_display_date(record.valid_till),
        })
        .to_string(),
    }
}

/// A rendered QR module grid. `modules` is row-major, `size × size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    size: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules.get(y * self.size + x).copied().unwrap_or(false)
    }
}

/// Encode a payload at low error correction; the printed window is small
/// and a short URL needs the coarser modules to stay scannable.
pub fn encode(payload: &str) -> Result<QrMatrix> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
        .map_err(|e| Error::Other(format!("QR encoding failed: {}", e)))?;
    let size = code.width();
    let modules = code
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();
    Ok(QrMatrix { size, modules })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{AssetPreviews, CardRecord};

    #[test]
    fn url_strategy_points_at_the_verification_route() {
        let record = CardRecord {
            id: Some("abc123".into()),
            ..Default::default()
        };
        let view = CardView::new(&record, &AssetPreviews::default());
        let data = payload(QrStrategy::VerificationUrl, "https://megarail.example/", &view);
        assert_eq!(data, "https://megarail.example/verify/abc123");
    }

    #[test]
    fn embedded_strategy_freezes_the_reduced_field_set() {
        let record = CardRecord {
            id: Some("abc123".into()),
            employee_name: "Ravi Kumar".into(),
            blood_group: "B+".into(),
            ..Default::default()
        };
        let view = CardView::new(&record, &AssetPreviews::default());
        let data = payload(QrStrategy::EmbeddedRecord, "https://unused.example", &view);
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["employeeName"], "Ravi Kumar");
        assert_eq!(value["bloodGroup"], "B+");
        assert_eq!(value["validTill"], "-");
    }

    #[test]
    fn matrices_are_square_with_finder_corners() {
        let matrix = encode("https://megarail.example/verify/abc123").unwrap();
        assert!(matrix.size() >= 21);
        // Finder patterns put dark modules in three corners.
        assert!(matrix.is_dark(0, 0));
        assert!(matrix.is_dark(matrix.size() - 1, 0));
        assert!(matrix.is_dark(0, matrix.size() - 1));
        // Out-of-range probes read as light instead of panicking.
        assert!(!matrix.is_dark(matrix.size(), matrix.size()));
    }
}
