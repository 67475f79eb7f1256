use crate::credential::ApiKey;
use crate::workflow::UploadedFile;
use axum::extract::Multipart;

/// Fields of the upload form, before the page selector is parsed.
#[derive(Debug, Default)]
pub struct FormFields {
    pub api_key: Option<ApiKey>,
    pub file: Option<UploadedFile>,
    /// Raw page selector text as typed.
    pub pages: String,
    pub system_prompt: Option<String>,
}

/// Read the multipart form into [`FormFields`]. Unknown fields are ignored.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<FormFields, String> {
    let mut fields = FormFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "pdf" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file data: {}", e))?
                    .to_vec();

                // An empty file input still sends a part with no filename.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let file_name = if file_name.is_empty() {
                    "upload.pdf".to_string()
                } else {
                    file_name
                };
                fields.file = Some(UploadedFile { file_name, bytes });
            }
            "api_key" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read api_key: {}", e))?;
                fields.api_key = ApiKey::new(val);
            }
            "pages" => {
                fields.pages = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read pages: {}", e))?;
            }
            "system_prompt" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read system_prompt: {}", e))?;
                if !val.trim().is_empty() {
                    fields.system_prompt = Some(val);
                }
            }
            _ => {}
        }
    }

    Ok(fields)
}
