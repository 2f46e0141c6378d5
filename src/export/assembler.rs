//! Export assembler
//!
//! Walks the store and builds everything an archive needs: the config
//! snapshot with secrets redacted, the collected plaintext secrets, and the
//! list of binary files to copy in. Nothing here writes.

use std::path::PathBuf;

use chrono::Utc;
use tracing::debug;

use crate::crypto::CredentialsData;
use crate::error::PackResult;
use crate::models::{Dashboard, Group, Widget};
use crate::package::{
    branding_path, library_dir, ConfigSnapshot, ExportedDashboard, ExportedGroup, ExportedImage,
    ExportedIntegration, ExportedLibrary, ExportedMember, ExportedWidget, LibraryListing,
    ManifestContents, MediaSnapshot, NetworkSnapshot, Record, TemplateSnapshot, FORMAT_VERSION,
};
use crate::storage::settings::{
    BRANDING, DEVICE_TEMPLATES, FAVICON_URL, LOGO_URL, NETWORK_CONNECTIONS, NETWORK_DEVICES,
    NIC_MAPPINGS, PORT_MAPPINGS, SWITCH_TEMPLATES, TEMPLATE_SETTINGS,
};
use crate::storage::Storage;

/// A file to copy into the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub archive_path: String,
    pub source: PathBuf,
}

/// Everything assembled for one export
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub snapshot: ConfigSnapshot,
    /// Plaintext secrets keyed by integration id; empty when there are none
    pub credentials: CredentialsData,
    /// Branding files, then library images
    pub assets: Vec<AssetEntry>,
    /// Asset inventory for the manifest
    pub contents: ManifestContents,
}

/// Read-only walk over a store
pub struct ExportAssembler<'a> {
    storage: &'a Storage,
}

impl<'a> ExportAssembler<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Build the bundle for a full export
    pub fn assemble(&self) -> PackResult<ExportBundle> {
        let mut assets = Vec::new();
        let mut contents = ManifestContents::default();

        let (integrations, credentials) = self.integrations()?;
        let dashboards: Vec<Record<ExportedDashboard>> = self
            .storage
            .dashboards
            .get_all_dashboards()?
            .iter()
            .map(|d| self.dashboard(d).map(Into::into))
            .collect::<PackResult<Vec<_>>>()?;

        let branding = self.storage.settings.get_object(BRANDING)?;
        for (kind, key) in [("logo", LOGO_URL), ("favicon", FAVICON_URL)] {
            let Some(url) = branding.get(key).and_then(|v| v.as_str()) else {
                continue;
            };
            let Some(source) = self.storage.assets.resolve_url(url) else {
                continue;
            };
            let filename = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let archive_path = branding_path(kind, &filename);
            if kind == "logo" {
                contents.logo = Some(archive_path.clone());
            } else {
                contents.favicon = Some(archive_path.clone());
            }
            assets.push(AssetEntry {
                archive_path,
                source,
            });
        }

        let (media, listings, image_assets) = self.media()?;
        contents.libraries = listings;
        assets.extend(image_assets);

        let snapshot = ConfigSnapshot {
            format_version: FORMAT_VERSION.to_string(),
            exported_at: Utc::now(),
            dashboards,
            integrations,
            branding,
            templates: TemplateSnapshot {
                device_templates: self.storage.settings.get_array(DEVICE_TEMPLATES)?,
                switch_templates: self.storage.settings.get_array(SWITCH_TEMPLATES)?,
                editor_settings: self.storage.settings.get(TEMPLATE_SETTINGS)?,
            },
            network: NetworkSnapshot {
                devices: self.storage.settings.get_array(NETWORK_DEVICES)?,
                connections: self.storage.settings.get_array(NETWORK_CONNECTIONS)?,
                port_mappings: self.storage.settings.get(PORT_MAPPINGS)?.unwrap_or_default(),
                nic_mappings: self.storage.settings.get(NIC_MAPPINGS)?.unwrap_or_default(),
            },
            media,
        };

        debug!(
            dashboards = snapshot.dashboard_count(),
            integrations = snapshot.integration_count(),
            assets = assets.len(),
            "Assembled export bundle"
        );

        Ok(ExportBundle {
            snapshot,
            credentials,
            assets,
            contents,
        })
    }

    /// Integrations with secrets redacted, plus the secrets themselves
    fn integrations(
        &self,
    ) -> PackResult<(Vec<Record<ExportedIntegration>>, CredentialsData)> {
        let mut exported = Vec::new();
        let mut credentials = CredentialsData::new();

        for integration in self.storage.integrations.get_all()? {
            let id = integration.id.as_uuid().to_string();
            let mut config = integration.config;

            let secrets = config.secrets();
            if !secrets.is_empty() {
                credentials.insert(id.clone(), secrets);
            }
            config.redact();

            exported.push(
                ExportedIntegration {
                    id,
                    name: integration.name,
                    integration_type: integration.integration_type,
                    enabled: integration.enabled,
                    config,
                }
                .into(),
            );
        }

        Ok((exported, credentials))
    }

    fn dashboard(&self, dashboard: &Dashboard) -> PackResult<ExportedDashboard> {
        let repo = &self.storage.dashboards;

        let mut widgets = Vec::new();
        for widget in repo.get_widgets_for(dashboard.id)? {
            let layout = repo.get_widget_layout(widget.id)?;
            if layout.is_some() || !repo.is_grouped(widget.id)? {
                widgets.push(self.widget(&widget)?.into());
            }
        }

        let groups: Vec<Record<ExportedGroup>> = repo
            .get_groups_for(dashboard.id)?
            .iter()
            .map(|g| self.group(g).map(Into::into))
            .collect::<PackResult<Vec<_>>>()?;

        Ok(ExportedDashboard {
            id: dashboard.id.as_uuid().to_string(),
            name: dashboard.name.clone(),
            description: dashboard.description.clone(),
            is_default: dashboard.is_default,
            sort_order: dashboard.sort_order,
            settings: dashboard.settings.clone(),
            widgets,
            groups,
        })
    }

    fn widget(&self, widget: &Widget) -> PackResult<ExportedWidget> {
        Ok(ExportedWidget {
            id: widget.id.as_uuid().to_string(),
            widget_type: widget.widget_type.clone(),
            title: widget.title.clone(),
            integration_id: widget.integration_id.map(|id| id.as_uuid().to_string()),
            config: widget.config.clone(),
            layout: self
                .storage
                .dashboards
                .get_widget_layout(widget.id)?
                .map(|l| l.rect),
        })
    }

    fn group(&self, group: &Group) -> PackResult<ExportedGroup> {
        let repo = &self.storage.dashboards;

        let mut members = Vec::new();
        for member in repo.get_members(group.id)? {
            let widget = match repo.get_widget(member.widget_id)? {
                Some(w) => Some(self.widget(&w)?),
                None => None,
            };
            members.push(
                ExportedMember {
                    widget_id: member.widget_id.as_uuid().to_string(),
                    position: member.position,
                    widget,
                }
                .into(),
            );
        }

        Ok(ExportedGroup {
            id: group.id.as_uuid().to_string(),
            name: group.name.clone(),
            config: group.config.clone(),
            layout: repo.get_group_layout(group.id)?.map(|l| l.rect),
            members,
        })
    }

    /// Library metadata, manifest listings, and image files
    fn media(&self) -> PackResult<(MediaSnapshot, Vec<LibraryListing>, Vec<AssetEntry>)> {
        let mut snapshot = MediaSnapshot::default();
        let mut listings = Vec::new();
        let mut assets = Vec::new();

        for library in self.storage.media.get_libraries()? {
            let library_id = library.id.as_uuid().to_string();
            let dir = library_dir(&library_id);
            let images = self.storage.media.get_images(library.id)?;

            let mut files = Vec::with_capacity(images.len());
            let mut exported_images = Vec::with_capacity(images.len());
            for image in images {
                assets.push(AssetEntry {
                    archive_path: format!("{}/{}", dir, image.filename),
                    source: self.storage.assets.path_of(&image.filename),
                });
                files.push(image.filename.clone());
                exported_images.push(ExportedImage {
                    id: image.id.as_uuid().to_string(),
                    filename: image.filename,
                    original_name: image.original_name,
                    mime_type: image.mime_type,
                    size_bytes: image.size_bytes,
                    width: image.width,
                    height: image.height,
                    alt_text: image.alt_text,
                    url: image.url,
                });
            }

            listings.push(LibraryListing {
                library_id: library_id.clone(),
                name: library.name.clone(),
                path: dir,
                image_count: files.len(),
                files,
            });
            snapshot.libraries.push(
                ExportedLibrary {
                    id: library_id,
                    name: library.name,
                    description: library.description,
                    images: exported_images,
                }
                .into(),
            );
        }

        Ok((snapshot, listings, assets))
    }
}
