//! 3D asset uploads.

use crate::service::UploadService;
use atelier_core::{AccessLocator, UploadError, UploadFile, UploadRequest, UploadResult};

/// Check `file_name` against an allow-list of extensions.
///
/// Matching ignores ASCII case and a leading dot on allow-list entries, so
/// `["GLB", ".gltf"]` behaves like `["glb", "gltf"]`.
pub fn validate_model_extension(file_name: &str, allowed: &[String]) -> UploadResult<()> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();

    let permitted = !extension.is_empty()
        && allowed
            .iter()
            .any(|entry| entry.trim().trim_start_matches('.').eq_ignore_ascii_case(extension));

    if !permitted {
        return Err(UploadError::InvalidFormat {
            file_name: file_name.to_string(),
            allowed: allowed.to_vec(),
        });
    }

    Ok(())
}

impl UploadService {
    /// Upload a 3D asset into the model folder.
    ///
    /// The extension is checked before anything reaches the network.
    pub async fn upload_model(&self, file: UploadFile) -> UploadResult<AccessLocator> {
        validate_model_extension(&file.name, &self.config().model_extensions)?;

        let request = UploadRequest::new(file, self.config().model_folder.clone());
        self.upload(&request).await
    }
}
