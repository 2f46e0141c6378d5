//! Import orchestration
//!
//! One run per archive. Extraction and checksum verification are
//! all-or-nothing: any failure there aborts before the store is touched.
//! Everything after is best-effort per record and accumulated into an
//! [`ImportResult`].

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::crypto::{CredentialVault, CredentialsData};
use crate::error::{PackError, PackResult};
use crate::package::ConfigSnapshot;
use crate::storage::Storage;

use super::entities::{import_dashboards, import_integrations};
use super::media::{import_media, rewrite_media_references};
use super::preview::compatibility_warnings;
use super::remap::IdentityRemap;
use super::result::{ClearedCounts, ImportResult};
use super::settings::import_settings;
use super::staging::StagedPackage;

/// Per-request import switches
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions<'a> {
    /// Password for the encrypted credentials entry
    pub password: Option<&'a str>,
    pub skip_checksums: bool,
    /// Delete all existing data before importing
    pub replace_all: bool,
}

/// Import steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Extract,
    Verify,
    Credentials,
    Clear,
    Integrations,
    Dashboards,
    Settings,
    Media,
    Rewrite,
    Cleanup,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extract => "extract",
            Self::Verify => "verify",
            Self::Credentials => "credentials",
            Self::Clear => "clear",
            Self::Integrations => "integrations",
            Self::Dashboards => "dashboards",
            Self::Settings => "settings",
            Self::Media => "media",
            Self::Rewrite => "rewrite",
            Self::Cleanup => "cleanup",
        };
        write!(f, "{}", name)
    }
}

/// State shared by the per-record import steps
pub struct ImportContext<'a> {
    pub storage: &'a Storage,
    pub staged: &'a StagedPackage,
    pub snapshot: &'a ConfigSnapshot,
    pub remap: IdentityRemap,
    pub result: ImportResult,
    /// Decrypted secrets keyed by archived integration id
    pub credentials: Option<CredentialsData>,
    pub replace_all: bool,
}

/// Applies archives to a store
pub struct Importer<'a> {
    storage: &'a Storage,
    vault: CredentialVault,
}

impl<'a> Importer<'a> {
    pub fn new(storage: &'a Storage, vault: CredentialVault) -> Self {
        Self { storage, vault }
    }

    /// Import the archive at `path`
    pub fn import_from_path(
        &self,
        path: &Path,
        options: &ImportOptions<'_>,
    ) -> PackResult<ImportResult> {
        let file = File::open(path).map_err(|e| {
            PackError::Io(format!("Failed to open {}: {}", path.display(), e))
        })?;
        self.import(BufReader::new(file), options)
    }

    /// Run every import step against `source`.
    ///
    /// Returns an error only for fatal package problems (unreadable
    /// container, missing manifest or config, checksum mismatch) or when
    /// replace-all cannot clear the store. Per-record failures are reported
    /// in the result.
    pub fn import<R: Read + Seek>(
        &self,
        source: R,
        options: &ImportOptions<'_>,
    ) -> PackResult<ImportResult> {
        enter(ImportStage::Extract);
        let staged = StagedPackage::extract(source, &self.storage.paths().scratch_dir())?;

        let outcome = self.run(&staged, options);

        enter(ImportStage::Cleanup);
        staged.close();
        outcome
    }

    fn run(&self, staged: &StagedPackage, options: &ImportOptions<'_>) -> PackResult<ImportResult> {
        if options.skip_checksums {
            warn!("Checksum verification skipped");
        } else {
            enter(ImportStage::Verify);
            staged.verify_checksums()?;
        }
        let snapshot = staged.load_snapshot()?;

        enter(ImportStage::Credentials);
        let (credentials, credential_warning) = self.unlock_credentials(staged, options.password);

        let mut result = ImportResult {
            checksums_verified: !options.skip_checksums,
            credential_warning,
            warnings: compatibility_warnings(
                &staged.manifest,
                &snapshot,
                staged.has_credentials(),
            ),
            ..ImportResult::default()
        };

        if options.replace_all {
            enter(ImportStage::Clear);
            result.cleared = Some(clear_store(self.storage)?);
        }

        let mut ctx = ImportContext {
            storage: self.storage,
            staged,
            snapshot: &snapshot,
            remap: IdentityRemap::new(),
            result,
            credentials,
            replace_all: options.replace_all,
        };

        enter(ImportStage::Integrations);
        import_integrations(&mut ctx);

        enter(ImportStage::Dashboards);
        import_dashboards(&mut ctx);

        enter(ImportStage::Settings);
        import_settings(&mut ctx);

        enter(ImportStage::Media);
        import_media(&mut ctx);

        enter(ImportStage::Rewrite);
        ctx.result.rewritten_configs = rewrite_media_references(&mut ctx);

        self.storage.save_all()?;

        let result = ctx.result;
        info!(
            errors = result.total_errors(),
            dashboards = result.dashboards.imported,
            widgets = result.widgets.imported,
            images = result.images.imported,
            "Import completed"
        );
        Ok(result)
    }

    /// Decrypt the credentials entry if possible. Failures never abort the
    /// import; they come back as a warning and no secrets.
    fn unlock_credentials(
        &self,
        staged: &StagedPackage,
        password: Option<&str>,
    ) -> (Option<CredentialsData>, Option<String>) {
        let password = password.filter(|p| !p.is_empty());

        let warning = match (staged.has_credentials(), password) {
            (false, None) => return (None, None),
            (false, Some(_)) => {
                "A password was supplied but the package contains no encrypted credentials"
                    .to_string()
            }
            (true, None) => {
                "The package contains encrypted credentials but no password was supplied; \
                 secret fields were left empty"
                    .to_string()
            }
            (true, Some(password)) => {
                match staged
                    .read_credentials()
                    .and_then(|payload| self.vault.decrypt(&payload, password))
                {
                    Ok(credentials) => {
                        info!(integrations = credentials.len(), "Credentials decrypted");
                        return (Some(credentials), None);
                    }
                    Err(PackError::InvalidCredentials(_)) => {
                        "The encrypted credentials file is malformed; secret fields were left empty"
                            .to_string()
                    }
                    Err(_) => {
                        "Credentials could not be decrypted (wrong password or corrupted data); \
                         secret fields were left empty"
                            .to_string()
                    }
                }
            }
        };

        warn!(warning = %warning, "Credentials not applied");
        (None, Some(warning))
    }
}

fn enter(stage: ImportStage) {
    debug!(stage = %stage, "Import stage");
}

/// Delete every entity, children before parents. Asset files backing the
/// removed images are deleted too.
fn clear_store(storage: &Storage) -> PackResult<ClearedCounts> {
    let dashboards = &storage.dashboards;
    let mut cleared = ClearedCounts {
        group_members: dashboards.clear_group_members()?,
        group_layouts: dashboards.clear_group_layouts()?,
        ..ClearedCounts::default()
    };
    cleared.groups = dashboards.clear_groups()?;
    cleared.widget_layouts = dashboards.clear_widget_layouts()?;
    cleared.widgets = dashboards.clear_widgets()?;
    cleared.dashboards = dashboards.clear_dashboards()?;
    cleared.integrations = storage.integrations.clear()?;

    let images = storage.media.clear_images()?;
    cleared.images = images.len();
    for image in &images {
        if let Err(e) = storage.assets.remove(&image.filename) {
            warn!(file = %image.filename, error = %e, "Failed to remove asset of cleared image");
        }
    }
    cleared.libraries = storage.media.clear_libraries()?;

    info!(
        dashboards = cleared.dashboards,
        widgets = cleared.widgets,
        integrations = cleared.integrations,
        images = cleared.images,
        "Cleared existing data"
    );
    Ok(cleared)
}
