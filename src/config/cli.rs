use crate::core::Storage;
use crate::utils::error::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
    // Shared by clones so the empty-file check and the write happen together.
    append_lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self {
            base_path,
            append_lock: Arc::new(Mutex::new(())),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn append_file(&self, path: &str, header: &[u8], data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let _guard = self.append_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&full_path)?;

        let mut chunk = Vec::with_capacity(header.len() + data.len());
        if file.metadata()?.len() == 0 {
            chunk.extend_from_slice(header);
        }
        chunk.extend_from_slice(data);

        file.write_all(&chunk)?;
        Ok(())
    }
}
