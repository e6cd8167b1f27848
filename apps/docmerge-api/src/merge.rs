//! Merge orchestration: lookup, download, overlay, upload

use docmerge_core::{merge_fields, FormData, MergedPdf};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Storage path for a freshly merged document
pub fn output_path() -> String {
    format!("signed/{}.pdf", Uuid::new_v4())
}

/// Merge `form_data` into template `template_id` and store the result
///
/// Returns the output path inside the output bucket. Nothing is written
/// unless every earlier step succeeded.
#[instrument(skip(state, form_data), fields(fields = form_data.len()))]
pub async fn merge_document(
    state: &AppState,
    template_id: &str,
    form_data: FormData,
) -> Result<String, ApiError> {
    let template = state.templates.get(template_id).await?;
    let template_pdf = state
        .documents
        .download(&state.template_bucket, &template.storage_path)
        .await?;

    let fields = template.editable_fields;
    let MergedPdf {
        bytes,
        page_count,
        report,
    } = tokio::task::spawn_blocking(move || merge_fields(&template_pdf, &fields, &form_data))
        .await
        .map_err(|e| ApiError::Internal(format!("Merge task failed: {}", e)))??;

    let path = output_path();
    state
        .documents
        .upload(&state.output_bucket, &path, bytes, PDF_CONTENT_TYPE)
        .await?;

    info!(
        path = %path,
        pages = page_count,
        drawn = report.drawn.len(),
        skipped = report.skipped.len(),
        "Merged document stored"
    );
    Ok(path)
}
