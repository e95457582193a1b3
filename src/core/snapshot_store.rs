use crate::domain::model::VehicleSnapshot;
use crate::domain::ports::Storage;
use crate::utils::error::{ConnectorError, Result};
use std::path::Path;

pub const SNAPSHOT_FILE: &str = "snapshot.json";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// Writes snapshots as `{vin}/snapshot.json` plus one `{vin}/{endpoint}.json` per response.
pub struct SnapshotWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> SnapshotWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the relative paths written.
    pub async fn write(&self, snapshot: &VehicleSnapshot) -> Result<Vec<String>> {
        let mut written = Vec::with_capacity(snapshot.raw_api.len() + 1);

        for (endpoint, body) in &snapshot.raw_api {
            let path = format!("{}/{}.json", snapshot.vin, endpoint);
            let data = serde_json::to_vec_pretty(body)?;
            self.storage.write_file(&path, &data).await?;
            written.push(path);
        }

        let path = format!("{}/{}", snapshot.vin, SNAPSHOT_FILE);
        let data = serde_json::to_vec_pretty(snapshot)?;
        self.storage.write_file(&path, &data).await?;
        written.push(path);

        tracing::debug!("Wrote {} file(s) for {}", written.len(), snapshot.vin);
        Ok(written)
    }

    /// The previously written snapshot of `vin`, or `None` if there is none.
    pub async fn read_previous(&self, vin: &str) -> Result<Option<VehicleSnapshot>> {
        let path = format!("{}/{}", vin, SNAPSHOT_FILE);
        match self.storage.read_file(&path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(ConnectorError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
