//! Plain-text rendering of the controller's view projections.

use std::fmt::Write as _;

use client_core::view::{ResultPanel, UploadPanel};
use shared::error::Locale;

struct Labels {
    selected: &'static str,
    processing: &'static str,
    awaiting: &'static str,
    awaiting_hint: &'static str,
    detected_ok: &'static str,
    detected_objects: &'static str,
}

fn labels(locale: Locale) -> Labels {
    match locale {
        Locale::English => Labels {
            selected: "Selected",
            processing: "Processing...",
            awaiting: "Waiting for an image upload",
            awaiting_hint: "Detection results will appear here",
            detected_ok: "Detection complete",
            detected_objects: "Detected objects",
        },
        Locale::Thai => Labels {
            selected: "ไฟล์ที่เลือก",
            processing: "กำลังประมวลผล...",
            awaiting: "รอการอัปโหลดรูปภาพ",
            awaiting_hint: "ผลการตรวจจับจะแสดงที่นี่",
            detected_ok: "ตรวจจับสำเร็จ",
            detected_objects: "วัตถุที่ตรวจพบ",
        },
    }
}

pub fn render_upload_panel(panel: &UploadPanel, locale: Locale) -> Option<String> {
    let name = panel.file_name.as_deref()?;
    Some(format!("{}: {name}", labels(locale).selected))
}

pub fn render_result_panel(panel: &ResultPanel, locale: Locale) -> String {
    let labels = labels(locale);
    match panel {
        ResultPanel::Loading => labels.processing.to_string(),
        ResultPanel::AwaitingUpload => format!("{}\n{}", labels.awaiting, labels.awaiting_hint),
        ResultPanel::Detected { rows, .. } => {
            let mut out = format!(
                "{}\n{} ({})",
                labels.detected_ok,
                labels.detected_objects,
                rows.len()
            );
            for row in rows {
                let _ = write!(out, "\n{:>3}. {}", row.index, row.label);
                if let Some(confidence) = &row.confidence {
                    let _ = write!(out, "  {confidence}");
                }
            }
            out
        }
    }
}
