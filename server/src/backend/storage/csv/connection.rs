//! # File-backed document store connection
//!
//! ```text
//! data/
//! ├── catalog.csv
//! ├── gift_orders.csv
//! ├── parents/
//! │   └── {parent_dir}/
//! │       ├── parent.yaml
//! │       └── approval_settings.yaml
//! └── children/
//!     └── {child_dir}/
//!         └── child.yaml
//! ```
//!
//! Every write goes to a temp file that is renamed over the original, so a
//! crash never leaves half a document behind.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Name of the file that points the default data directory somewhere else
pub const REDIRECT_FILE_NAME: &str = ".santa_redirect";

#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    /// Serialises read-modify-write cycles on collection files
    write_lock: Arc<Mutex<()>>,
    /// Serialises point, balance and wallet mutations across services
    ledger_lock: Arc<Mutex<()>>,
}

impl CsvConnection {
    /// Create a new connection rooted at `base_directory`
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {}", base_path.display()))?;
        }

        Ok(Self {
            base_directory: base_path,
            write_lock: Arc::new(Mutex::new(())),
            ledger_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create a new connection in the default data directory
    pub fn new_default() -> Result<Self> {
        Self::new(Self::default_data_directory()?)
    }

    /// `~/Documents/Santa Ledger`, unless a redirect file points elsewhere
    pub fn default_data_directory() -> Result<PathBuf> {
        let documents_dir = dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

        let default_data_dir = documents_dir.join("Santa Ledger");
        let redirect_file = default_data_dir.join(REDIRECT_FILE_NAME);

        if !redirect_file.exists() {
            info!("No redirect file found, using default data directory: {}", default_data_dir.display());
            return Ok(default_data_dir);
        }

        match fs::read_to_string(&redirect_file) {
            Ok(redirected_path) => {
                let path = PathBuf::from(redirected_path.trim());
                if path.exists() {
                    info!("Found redirect file, using data directory: {}", path.display());
                    Ok(path)
                } else {
                    warn!(
                        "Redirect file points to non-existent directory: {}. Using default.",
                        path.display()
                    );
                    Ok(default_data_dir)
                }
            }
            Err(e) => {
                error!("Failed to read redirect file: {}. Using default directory.", e);
                Ok(default_data_dir)
            }
        }
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn write_lock(&self) -> Arc<Mutex<()>> {
        self.write_lock.clone()
    }

    pub fn ledger_lock(&self) -> Arc<Mutex<()>> {
        self.ledger_lock.clone()
    }

    /// Filesystem-safe directory name for a document id ("child::abc" -> "child__abc")
    pub fn safe_directory_name(id: &str) -> String {
        id.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    pub fn parents_directory(&self) -> PathBuf {
        self.base_directory.join("parents")
    }

    pub fn children_directory(&self) -> PathBuf {
        self.base_directory.join("children")
    }

    pub fn parent_directory(&self, parent_id: &str) -> PathBuf {
        self.parents_directory().join(Self::safe_directory_name(parent_id))
    }

    pub fn child_directory(&self, child_id: &str) -> PathBuf {
        self.children_directory().join(Self::safe_directory_name(child_id))
    }

    pub fn collection_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    /// Read a YAML document, `None` if it does not exist
    pub fn read_yaml<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(document))
    }

    /// Write a YAML document atomically, creating parent directories
    pub fn write_yaml<T: Serialize>(&self, path: &Path, document: &T) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                debug!("Created directory: {:?}", dir);
            }
        }

        let content = serde_yaml::to_string(document)?;
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Read every row of a CSV collection; a missing file is an empty collection
    pub fn read_csv<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader = csv::Reader::from_reader(BufReader::new(file));

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let row: T = result.with_context(|| format!("Malformed row in {}", path.display()))?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rewrite a CSV collection atomically
    pub fn write_csv<T: Serialize>(&self, path: &Path, rows: &[T]) -> Result<()> {
        let temp_path = path.with_extension("csv.tmp");
        {
            let temp_file = File::create(&temp_path)
                .with_context(|| format!("Failed to create {}", temp_path.display()))?;
            let mut writer = csv::Writer::from_writer(BufWriter::new(temp_file));
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, path).with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!("Wrote {} rows to {:?}", rows.len(), path);
        Ok(())
    }
}
