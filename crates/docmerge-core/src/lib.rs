//! Overlay submitted form values onto template PDFs
//!
//! A template is a PDF plus a list of field boxes placed by the editor. A
//! merge draws each submitted value into its box:
//! - `text` fields as one line of 12pt Helvetica
//! - `signature` fields as a PNG scaled to fill the box
//!
//! Fields without a value, on a page the document does not have, or with a
//! signature that is not a PNG data URI are skipped and reported in
//! [`MergeReport`]. The template bytes are only read.

pub mod coords;
pub mod error;
pub mod overlay;
pub mod signature;
pub mod template;

pub use error::MergeError;
pub use overlay::PageOverlay;
pub use template::{FieldDefinition, FieldKind, FormData, Template};

use tracing::{debug, warn};

/// Font size used for every text field
pub const TEXT_FONT_SIZE: f64 = 12.0;

/// Why a field was left blank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No value, or an empty one, was submitted
    NoValue,
    /// The field points at a page the document does not have
    PageOutOfRange,
    /// The signature value is not a PNG data URI
    NotPngDataUri,
    /// The field kind has no drawing rule
    UnsupportedKind,
}

/// What happened to each field during a merge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub drawn: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Result of a successful merge
#[derive(Debug, Clone)]
pub struct MergedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub report: MergeReport,
}

/// Draw `form_data` onto `template_pdf` following `fields`, in field order
pub fn merge_fields(
    template_pdf: &[u8],
    fields: &[FieldDefinition],
    form_data: &FormData,
) -> Result<MergedPdf, MergeError> {
    let mut overlay = PageOverlay::load(template_pdf)?;
    let page_count = overlay.page_count();
    let mut report = MergeReport::default();

    for field in fields {
        match apply_field(&mut overlay, field, form_data)? {
            None => report.drawn.push(field.id.clone()),
            Some(reason) => {
                debug!(field = %field.id, ?reason, "Skipping field");
                report.skipped.push((field.id.clone(), reason));
            }
        }
    }

    let bytes = overlay.finish()?;
    Ok(MergedPdf {
        bytes,
        page_count,
        report,
    })
}

/// Draw one field; `Ok(Some(reason))` means it was skipped
fn apply_field(
    overlay: &mut PageOverlay,
    field: &FieldDefinition,
    form_data: &FormData,
) -> Result<Option<SkipReason>, MergeError> {
    let value = match form_data.get(&field.id) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(Some(SkipReason::NoValue)),
    };

    let Some((index, page_height)) = field
        .page_index()
        .and_then(|i| overlay.page_height(i).map(|h| (i, h)))
    else {
        return Ok(Some(SkipReason::PageOutOfRange));
    };

    match field.kind {
        FieldKind::Text => {
            let (x, y) = coords::text_origin(page_height, field.x, field.y, field.height);
            overlay.draw_text(index, x, y, TEXT_FONT_SIZE, value)?;
        }
        FieldKind::Signature => {
            let Some(payload) = signature::strip_png_data_uri(value) else {
                warn!(field = %field.id, "Signature value is not a PNG data URI");
                return Ok(Some(SkipReason::NotPngDataUri));
            };
            let image = signature::decode_png_base64(payload).map_err(|reason| {
                MergeError::InvalidSignature {
                    field: field.id.clone(),
                    reason,
                }
            })?;
            let (x, y) = coords::image_origin(page_height, field.x, field.y, field.height);
            overlay.draw_image(index, &image, x, y, field.width, field.height)?;
        }
        FieldKind::Other => return Ok(Some(SkipReason::UnsupportedKind)),
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::tests::{create_test_pdf, page_content};
    use crate::signature::tests::{encode_png, oversized_png, png_data_uri};
    use lopdf::Document;
    use pretty_assertions::assert_eq;

    fn field(id: &str, kind: FieldKind, page: Option<i64>) -> FieldDefinition {
        FieldDefinition {
            id: id.to_string(),
            kind,
            page,
            x: 50.0,
            y: 100.0,
            width: 200.0,
            height: 30.0,
        }
    }

    fn form(entries: &[(&str, &str)]) -> FormData {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_text_field_drawn_at_converted_position() {
        let pdf = create_test_pdf(1, 612, 792);
        let fields = vec![field("name", FieldKind::Text, None)];
        let merged = merge_fields(&pdf, &fields, &form(&[("name", "Maria")])).unwrap();

        assert_eq!(merged.report.drawn, vec!["name".to_string()]);
        let doc = Document::load_mem(&merged.bytes).unwrap();
        let content = page_content(&doc, 1);
        // 792 - 100 - 30 = 662; baseline 662 + 15 - 5 = 672; x 50 + 5
        assert!(content.contains("55 672 Td"), "{}", content);
        assert!(content.contains("(Maria) Tj"));
    }

    #[test]
    fn test_signature_field_drawn_scaled_to_box() {
        let pdf = create_test_pdf(1, 612, 792);
        let png = encode_png(1, 1, png::ColorType::Rgba, &[0, 0, 0, 200]);
        let fields = vec![field("sig", FieldKind::Signature, Some(1))];
        let merged = merge_fields(&pdf, &fields, &form(&[("sig", &png_data_uri(&png))])).unwrap();

        let doc = Document::load_mem(&merged.bytes).unwrap();
        let content = page_content(&doc, 1);
        assert!(content.contains("200 0 0 30 50 662 cm"), "{}", content);
    }

    #[test]
    fn test_missing_and_empty_values_are_skipped() {
        let pdf = create_test_pdf(1, 612, 792);
        let fields = vec![
            field("a", FieldKind::Text, None),
            field("b", FieldKind::Text, None),
        ];
        let merged = merge_fields(&pdf, &fields, &form(&[("b", "")])).unwrap();
        assert_eq!(
            merged.report.skipped,
            vec![
                ("a".to_string(), SkipReason::NoValue),
                ("b".to_string(), SkipReason::NoValue),
            ]
        );
    }

    #[test]
    fn test_out_of_range_page_is_skipped() {
        let pdf = create_test_pdf(2, 612, 792);
        let fields = vec![
            field("far", FieldKind::Text, Some(5)),
            field("near", FieldKind::Text, Some(2)),
        ];
        let merged =
            merge_fields(&pdf, &fields, &form(&[("far", "x"), ("near", "y")])).unwrap();

        assert_eq!(merged.page_count, 2);
        assert_eq!(merged.report.drawn, vec!["near".to_string()]);
        assert_eq!(
            merged.report.skipped,
            vec![("far".to_string(), SkipReason::PageOutOfRange)]
        );
        let doc = Document::load_mem(&merged.bytes).unwrap();
        assert!(page_content(&doc, 2).contains("(y) Tj"));
        assert!(!page_content(&doc, 1).contains("(y) Tj"));
    }

    #[test]
    fn test_signature_without_png_prefix_is_skipped() {
        let pdf = create_test_pdf(1, 612, 792);
        let fields = vec![field("sig", FieldKind::Signature, None)];
        let merged =
            merge_fields(&pdf, &fields, &form(&[("sig", "data:image/jpeg;base64,AAAA")])).unwrap();
        assert_eq!(
            merged.report.skipped,
            vec![("sig".to_string(), SkipReason::NotPngDataUri)]
        );
    }

    #[test]
    fn test_corrupt_png_payload_fails_merge() {
        let pdf = create_test_pdf(1, 612, 792);
        let fields = vec![field("sig", FieldKind::Signature, None)];
        let err = merge_fields(&pdf, &fields, &form(&[("sig", "data:image/png;base64,AAAA")]))
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidSignature { ref field, .. } if field == "sig"));
    }

    #[test]
    fn test_oversized_signature_fails_merge() {
        let pdf = create_test_pdf(1, 612, 792);
        let fields = vec![field("sig", FieldKind::Signature, None)];
        let uri = png_data_uri(&oversized_png());
        let err = merge_fields(&pdf, &fields, &form(&[("sig", &uri)])).unwrap_err();
        assert!(matches!(err, MergeError::InvalidSignature { ref field, .. } if field == "sig"));
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let pdf = create_test_pdf(1, 612, 792);
        let fields = vec![field("box", FieldKind::Other, None)];
        let merged = merge_fields(&pdf, &fields, &form(&[("box", "on")])).unwrap();
        assert_eq!(
            merged.report.skipped,
            vec![("box".to_string(), SkipReason::UnsupportedKind)]
        );
    }

    #[test]
    fn test_template_bytes_are_not_modified() {
        let pdf = create_test_pdf(1, 612, 792);
        let copy = pdf.clone();
        let fields = vec![field("name", FieldKind::Text, None)];
        let merged = merge_fields(&pdf, &fields, &form(&[("name", "x")])).unwrap();
        assert_eq!(pdf, copy);
        assert_ne!(merged.bytes, pdf);
    }
}
