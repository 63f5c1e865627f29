//! CSV export of reviewed predictions

use crate::error::{Error, Result};
use crate::store::CaseRecord;

pub const EXPORT_FILENAME: &str = "idc_predictions_export.csv";

pub const EXPORT_HEADER: [&str; 8] = [
    "ID",
    "Date",
    "Patient ID",
    "Image Path",
    "Prediction",
    "Confidence",
    "Status",
    "Notes",
];

/// Render cases as CSV, one row per prediction in the given order
pub fn predictions_to_csv(cases: &[CaseRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for case in cases {
        let p = &case.prediction;
        writer.write_record([
            p.id.to_string(),
            p.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            p.user_id.to_string(),
            p.image_path.clone(),
            p.label().to_string(),
            format!("{:.4}", p.confidence),
            p.status.to_string(),
            p.notes.clone().unwrap_or_default(),
        ])?;
    }

    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Prediction, PredictionStatus};
    use chrono::TimeZone;

    fn case(id: i64, result_class: i64, confidence: f64, notes: Option<&str>) -> CaseRecord {
        CaseRecord {
            prediction: Prediction {
                id,
                user_id: 3,
                image_path: format!("static/uploads/{}.png", id),
                result_class,
                confidence,
                notes: notes.map(str::to_string),
                status: PredictionStatus::Approved,
                timestamp: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            },
            owner_username: "patient-a".to_string(),
        }
    }

    #[test]
    fn test_header_and_rows() {
        let csv = predictions_to_csv(&[case(1, 1, 0.873249, None), case(2, 0, 0.5, Some("ok, fine"))])
            .unwrap();
        let text = String::from_utf8(csv).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ID,Date,Patient ID,Image Path,Prediction,Confidence,Status,Notes");
        assert_eq!(
            lines[1],
            "1,2024-05-01 09:30:00,3,static/uploads/1.png,IDC Positive,0.8732,Approved,"
        );
        assert_eq!(
            lines[2],
            "2,2024-05-01 09:30:00,3,static/uploads/2.png,Negative,0.5000,Approved,\"ok, fine\""
        );
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let text = String::from_utf8(predictions_to_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
