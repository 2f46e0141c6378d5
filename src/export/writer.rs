//! Export writer
//!
//! Streams an [`ExportBundle`] into a zip sink in a fixed order: config,
//! branding assets, library images, credentials (when there is something to
//! protect and a password was given), and the manifest last so it can list
//! the checksum of every other entry.

use std::io::{self, Seek, SeekFrom, Write};

use chrono::Utc;
use tracing::{debug, info};

use crate::archive::ArchiveWriter;
use crate::crypto::CredentialVault;
use crate::error::{PackError, PackResult};
use crate::package::{
    Manifest, APP_VERSION, CONFIG_PATH, CREDENTIALS_PATH, FORMAT_VERSION, MANIFEST_PATH,
};

use super::assembler::ExportBundle;

/// Bytes a streamed export keeps in memory before spilling to disk
const SPOOL_LIMIT: usize = 16 * 1024 * 1024;

/// Writes bundles as archives
pub struct ExportWriter {
    producer: String,
    vault: CredentialVault,
}

impl ExportWriter {
    pub fn new(producer: impl Into<String>, vault: CredentialVault) -> Self {
        Self {
            producer: producer.into(),
            vault,
        }
    }

    /// Write the archive and return the sink together with the manifest.
    ///
    /// Any failure leaves the sink holding an incomplete archive that must be
    /// discarded.
    pub fn write<W: Write + Seek>(
        &self,
        bundle: &ExportBundle,
        sink: W,
        password: Option<&str>,
    ) -> PackResult<(W, Manifest)> {
        let mut archive = ArchiveWriter::new(sink);

        let config = serde_json::to_vec_pretty(&bundle.snapshot)
            .map_err(|e| PackError::Export(format!("Failed to serialize config: {}", e)))?;
        archive.add_entry(CONFIG_PATH, &config)?;

        for asset in &bundle.assets {
            archive.add_file(&asset.archive_path, &asset.source)?;
        }

        let mut contents = bundle.contents.clone();
        match password {
            Some(password) if !bundle.credentials.is_empty() => {
                let payload = self.vault.encrypt(&bundle.credentials, password)?;
                let bytes = serde_json::to_vec_pretty(&payload).map_err(|e| {
                    PackError::Export(format!("Failed to serialize credentials: {}", e))
                })?;
                archive.add_entry(CREDENTIALS_PATH, &bytes)?;
                contents.has_credentials = true;
            }
            Some(_) => debug!("Password supplied but no secrets to protect"),
            None => {}
        }

        let manifest = Manifest {
            format_version: FORMAT_VERSION.to_string(),
            app_version: APP_VERSION.to_string(),
            created_at: Utc::now(),
            producer: self.producer.clone(),
            checksums: archive.checksums().clone(),
            contents,
            total_files: archive.entry_count() + 1,
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| PackError::Export(format!("Failed to serialize manifest: {}", e)))?;
        archive.add_unchecked(MANIFEST_PATH, &manifest_bytes)?;

        let sink = archive.finish()?;
        info!(
            files = manifest.total_files,
            credentials = manifest.contents.has_credentials,
            "Archive written"
        );

        Ok((sink, manifest))
    }

    /// Write the archive to a sink that cannot seek, such as standard output
    /// or a response body.
    ///
    /// The container is assembled in a spooled temporary file and copied out
    /// only once complete, so a failed export writes nothing to `sink`.
    pub fn write_stream<W: Write>(
        &self,
        bundle: &ExportBundle,
        mut sink: W,
        password: Option<&str>,
    ) -> PackResult<(W, Manifest)> {
        let (mut spool, manifest) =
            self.write(bundle, tempfile::spooled_tempfile(SPOOL_LIMIT), password)?;

        spool
            .seek(SeekFrom::Start(0))
            .and_then(|_| io::copy(&mut spool, &mut sink))
            .and_then(|_| sink.flush())
            .map_err(|e| PackError::Export(format!("Failed to stream archive: {}", e)))?;
        Ok((sink, manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CredentialsData;
    use crate::export::assembler::AssetEntry;
    use crate::models::SecretFields;
    use crate::package::{ConfigSnapshot, ManifestContents};
    use std::io::Cursor;
    use std::path::PathBuf;

    fn fast_vault() -> CredentialVault {
        CredentialVault::new(crate::config::KeyDerivationCost {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        })
    }

    fn bundle(credentials: CredentialsData) -> ExportBundle {
        ExportBundle {
            snapshot: ConfigSnapshot {
                format_version: FORMAT_VERSION.into(),
                exported_at: Utc::now(),
                dashboards: vec![],
                integrations: vec![],
                branding: Default::default(),
                templates: Default::default(),
                network: Default::default(),
                media: Default::default(),
            },
            credentials,
            assets: vec![],
            contents: ManifestContents::default(),
        }
    }

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(String::from).collect()
    }

    #[test]
    fn test_plain_export_has_no_credentials() {
        let writer = ExportWriter::new("test", fast_vault());
        let (sink, manifest) = writer
            .write(&bundle(CredentialsData::new()), Cursor::new(Vec::new()), None)
            .unwrap();

        let names = entry_names(sink.into_inner());
        assert!(names.contains(&CONFIG_PATH.to_string()));
        assert!(names.contains(&MANIFEST_PATH.to_string()));
        assert!(!names.contains(&CREDENTIALS_PATH.to_string()));
        assert!(manifest.checksums.contains_key(CONFIG_PATH));
        assert!(!manifest.checksums.contains_key(MANIFEST_PATH));
        assert_eq!(manifest.total_files, 2);
    }

    #[test]
    fn test_password_without_secrets_omits_credentials() {
        let writer = ExportWriter::new("test", fast_vault());
        let (sink, manifest) = writer
            .write(&bundle(CredentialsData::new()), Cursor::new(Vec::new()), Some("pw"))
            .unwrap();

        assert!(!entry_names(sink.into_inner()).contains(&CREDENTIALS_PATH.to_string()));
        assert!(!manifest.contents.has_credentials);
    }

    #[test]
    fn test_credentials_written_before_manifest() {
        let mut secrets = SecretFields::new();
        secrets.insert("token".into(), "t0ken".into());
        let mut credentials = CredentialsData::new();
        credentials.insert("int-1".into(), secrets);

        let writer = ExportWriter::new("test", fast_vault());
        let (sink, manifest) = writer
            .write(&bundle(credentials), Cursor::new(Vec::new()), Some("pw"))
            .unwrap();

        let names = entry_names(sink.into_inner());
        assert!(names.contains(&CREDENTIALS_PATH.to_string()));
        assert!(manifest.contents.has_credentials);
        assert!(manifest.checksums.contains_key(CREDENTIALS_PATH));
    }

    #[test]
    fn test_stream_to_unseekable_sink() {
        let writer = ExportWriter::new("test", fast_vault());
        let (bytes, manifest) = writer
            .write_stream(&bundle(CredentialsData::new()), Vec::new(), None)
            .unwrap();

        let names = entry_names(bytes);
        assert!(names.contains(&CONFIG_PATH.to_string()));
        assert!(names.contains(&MANIFEST_PATH.to_string()));
        assert_eq!(manifest.total_files, 2);
    }

    #[test]
    fn test_failed_stream_writes_nothing() {
        let mut b = bundle(CredentialsData::new());
        b.assets.push(AssetEntry {
            archive_path: "assets/logo.png".into(),
            source: PathBuf::from("/nonexistent/logo.png"),
        });

        let writer = ExportWriter::new("test", fast_vault());
        let mut sink = Vec::new();
        assert!(writer.write_stream(&b, &mut sink, None).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_missing_asset_aborts() {
        let mut b = bundle(CredentialsData::new());
        b.assets.push(AssetEntry {
            archive_path: "assets/logo.png".into(),
            source: PathBuf::from("/nonexistent/logo.png"),
        });

        let writer = ExportWriter::new("test", fast_vault());
        assert!(writer.write(&b, Cursor::new(Vec::new()), None).is_err());
    }
}
