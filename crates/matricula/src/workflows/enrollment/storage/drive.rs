use std::io::Cursor;

use google_drive3::{api::File, api::Scope, DriveHub};
use tokio::runtime::Runtime;

use super::{validate_upload, FileReference, FileStore, FileUpload, StorageError};

/// Drive-backed blob store. Wraps the generated async client behind a
/// dedicated runtime so the synchronous review workflow can call it without
/// exposing async details.
pub struct GoogleDriveFileStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    hub: DriveHub<C>,
    runtime: Runtime,
    folder_id: Option<String>,
}

impl<C> GoogleDriveFileStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: DriveHub<C>, runtime: Runtime, folder_id: Option<String>) -> Self {
        Self {
            hub,
            runtime,
            folder_id,
        }
    }

    pub fn with_runtime(hub: DriveHub<C>, folder_id: Option<String>) -> Result<Self, StorageError> {
        let runtime = Runtime::new().map_err(|err| StorageError::Runtime(err.to_string()))?;
        Ok(Self::new(hub, runtime, folder_id))
    }

    fn map_error<E: std::fmt::Display>(err: E) -> StorageError {
        StorageError::Backend(err.to_string())
    }
}

impl<C> std::fmt::Debug for GoogleDriveFileStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveFileStore").finish_non_exhaustive()
    }
}

impl<C> FileStore for GoogleDriveFileStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn save(&self, upload: FileUpload) -> Result<FileReference, StorageError> {
        validate_upload(&upload)?;

        let metadata = File {
            name: Some(upload.name.clone()),
            parents: self.folder_id.as_ref().map(|parent| vec![parent.clone()]),
            ..File::default()
        };

        let cursor = Cursor::new(upload.bytes);
        let content_type = upload.content_type;

        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .create(metadata)
                .param("fields", "id")
                .supports_all_drives(true)
                .add_scope(Scope::File)
                .upload(cursor, content_type)
                .await
        });

        let (_, file) = result.map_err(Self::map_error)?;
        let id = file
            .id
            .ok_or_else(|| StorageError::Backend("drive returned no file id".to_string()))?;
        Ok(FileReference(id))
    }

    fn resolve_url(&self, reference: &FileReference) -> Result<String, StorageError> {
        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .get(&reference.0)
                .param("fields", "id,webViewLink")
                .supports_all_drives(true)
                .add_scope(Scope::Readonly)
                .doit()
                .await
        });

        let (_, file) = result.map_err(Self::map_error)?;
        file.web_view_link
            .ok_or_else(|| StorageError::NotFound(reference.0.clone()))
    }

    fn delete(&self, reference: &FileReference) -> Result<bool, StorageError> {
        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .delete(&reference.0)
                .supports_all_drives(true)
                .add_scope(Scope::File)
                .doit()
                .await
        });

        match result {
            Ok(_) => Ok(true),
            // Drive reports unknown ids as 404; the boundary contract wants false.
            Err(err) if err.to_string().contains("404") => Ok(false),
            Err(err) => Err(Self::map_error(err)),
        }
    }
}
