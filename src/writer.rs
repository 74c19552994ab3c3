//! Epub Writer
//!
//! This module provides functionality for assembling EPUB eBook files.
//! The `EpubWriter` structure accumulates resources, metadata, a raster
//! cover, and a table-of-contents forest, then derives a mutually
//! consistent set of documents (package document, navigation document,
//! NCX, cover page, container pointer) on close and streams everything
//! into a zip archive.
//!
//! ## Usage
//!
//! ```rust, no_run
//! # fn main() -> Result<(), bindery::error::EpubError> {
//! use std::{fs::File, io::Write};
//!
//! use bindery::{
//!     types::{EpubNavItem, EpubResource, EpubVersion},
//!     writer::EpubWriter,
//! };
//!
//! let file = File::create("output.epub")?;
//! let mut writer = EpubWriter::create(file, EpubVersion::Epub3)?;
//!
//! writer.title = "My Book".to_string();
//! let mut chapter = writer.create_resource(EpubResource::new("chapter-1.xhtml"))?;
//! chapter.write_all(b"<html><body>Hello</body></html>")?;
//!
//! writer.add_toc(vec![EpubNavItem::new("Chapter 1", "chapter-1.xhtml")], false)?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Notes
//!
//! - The writer owns the archive handle; registrations stream straight into
//!   the archive, no temporary directory is involved.
//! - The archive keeps one entry open at a time. A sink handed out by
//!   `create_resource` must be fully written before the next registration.
//! - On error the partially written archive is not cleaned up; discarding
//!   it is the caller's responsibility.

mod cover;
mod meta_inf;
mod navigation;
mod ncx;
mod package;

use std::{
    collections::HashSet,
    io::{self, Read, Seek, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use log::debug;
use uuid::Uuid;
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

use crate::{
    error::{EpubError, EpubWriterError},
    mediatype::APPLICATION_EPUB_ZIP,
    types::{EpubCreator, EpubDirection, EpubNavItem, EpubResource, EpubVersion},
    writer::{navigation::NavigationDocument, ncx::NcxDocument, package::PackageDocument},
    xml::XmlDocument,
};

pub(crate) const CONTAINER_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:container";
pub(crate) const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
pub(crate) const NCX_NAMESPACE: &str = "http://www.daisy.org/z3986/2005/ncx/";
pub(crate) const OPF_NAMESPACE: &str = "http://www.idpf.org/2007/opf";
pub(crate) const OPS_NAMESPACE: &str = "http://www.idpf.org/2007/ops";
pub(crate) const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// File names starting with this prefix belong to generated system
/// documents; caller resources may not claim them.
const RESERVED_PREFIX: &str = ".";

const DEFAULT_CONTENT_DIRECTORY: &str = "OEBPS";

fn reserved_href(name: &str) -> String {
    format!("{}{}", RESERVED_PREFIX, name)
}

/// Which auxiliary documents a publication carries
///
/// A pure mapping from the target version and the writer's feature flags to
/// the four emission booleans, evaluated once at finalization. Which
/// documents are mandatory differs between the two format generations, and
/// the legacy/structural flags pull optional ones in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPolicy {
    /// Emit the XHTML navigation document
    pub navigation_document: bool,

    /// Emit the NCX legacy navigation table
    pub ncx: bool,

    /// Emit the landmarks list inside the navigation document
    pub landmarks: bool,

    /// Emit the guide subtree of the package document
    pub guide: bool,
}

impl DocumentPolicy {
    /// Evaluate the policy for a version and the writer's feature flags
    pub fn evaluate(
        version: EpubVersion,
        toc_in_sequence: bool,
        include_legacy_features: bool,
        include_structural_components: bool,
    ) -> Result<Self, EpubError> {
        if version == EpubVersion::Unknown {
            return Err(EpubError::InvalidVersion);
        }

        let epub2 = version == EpubVersion::Epub2;
        let epub3 = version == EpubVersion::Epub3;

        Ok(DocumentPolicy {
            navigation_document: epub3 || (epub2 && toc_in_sequence),
            ncx: epub2 || (epub3 && include_legacy_features),
            landmarks: include_structural_components && epub3,
            guide: include_structural_components
                && (epub2 || (epub3 && include_legacy_features)),
        })
    }
}

/// EPUB assembly writer
///
/// The writer moves through three phases: opening (the mimetype entry and
/// container pointer are written immediately), accumulation (resources,
/// cover, table of contents, metadata fields), and finalization via
/// [close](EpubWriter::close), after which the instance is consumed and the
/// archive is complete.
///
/// The writer is a single-owner, sequential structure; none of its
/// operations are meant to run concurrently.
pub struct EpubWriter<W: Write + Seek> {
    zip: ZipWriter<W>,

    version: EpubVersion,

    /// Directory inside the archive holding all content documents
    content_directory: String,

    package: PackageDocument,
    navigation: NavigationDocument,
    ncx: NcxDocument,

    /// Archive paths claimed by registered resources
    resource_paths: HashSet<String>,

    /// Registered resources in registration order
    resources: Vec<EpubResource>,

    cover_href: Option<String>,
    cover_in_sequence: bool,

    toc: Option<Vec<EpubNavItem>>,
    toc_in_sequence: bool,

    /// The unique identifier of the publication
    pub identifier: String,

    /// The title of the publication
    pub title: String,

    /// Languages of the publication; an empty list falls back to "en"
    pub languages: Vec<String>,

    /// Creators of the publication, in emission order
    pub creators: Vec<EpubCreator>,

    /// Optional publication date
    pub date: Option<DateTime<Utc>>,

    /// Whether the publication uses a fixed, pre-paginated layout
    pub pre_paginated: bool,

    /// Last-modified timestamp, always emitted under EPUB 3
    pub modified: DateTime<Utc>,

    /// Page progression direction hint
    pub direction: EpubDirection,

    /// Emit landmarks and/or guide references per the document policy
    pub include_structural_components: bool,

    /// Emit legacy documents (NCX, guide) alongside their EPUB 3 successors
    pub include_legacy_features: bool,
}

impl<W: Write + Seek> EpubWriter<W> {
    /// Open a new publication with the default content root `OEBPS`
    pub fn create(writer: W, version: EpubVersion) -> Result<Self, EpubError> {
        Self::create_in(writer, version, DEFAULT_CONTENT_DIRECTORY)
    }

    /// Open a new publication with a custom content root
    ///
    /// Writes the two documents that never depend on later state, the
    /// mimetype entry and the container pointer, before returning.
    ///
    /// # Return
    /// - `Ok(EpubWriter)`: Writer ready for accumulation
    /// - `Err(EpubError)`: The version is `Unknown` or the archive rejected
    ///   the initial entries
    pub fn create_in(
        writer: W,
        version: EpubVersion,
        content_directory: &str,
    ) -> Result<Self, EpubError> {
        if version == EpubVersion::Unknown {
            return Err(EpubError::InvalidVersion);
        }

        let mut epub_writer = EpubWriter {
            zip: ZipWriter::new(writer),

            version,
            content_directory: content_directory.to_string(),

            package: PackageDocument::new(version)?,
            navigation: NavigationDocument::new(version)?,
            ncx: NcxDocument::new(version)?,

            resource_paths: HashSet::new(),
            resources: vec![],

            cover_href: None,
            cover_in_sequence: false,

            toc: None,
            toc_in_sequence: false,

            identifier: format!("urn:uuid:{}", Uuid::new_v4()),
            title: "Unknown Title".to_string(),
            languages: vec!["en".to_string()],
            creators: vec![],
            date: None,
            pre_paginated: false,
            modified: Utc::now(),
            direction: EpubDirection::Default,
            include_structural_components: false,
            include_legacy_features: false,
        };

        epub_writer.write_mimetype()?;
        epub_writer.write_container_xml()?;

        Ok(epub_writer)
    }

    /// The target format generation of this publication
    pub fn version(&self) -> EpubVersion {
        self.version
    }

    /// Register a resource and return a sink for its content
    ///
    /// The sink writes straight into the archive entry of the resource. The
    /// archive keeps one entry open at a time, so the sink must be dropped
    /// before the next registration call.
    ///
    /// # Return
    /// - `Ok(impl Write)`: Sink for the resource content
    /// - `Err(EpubError)`: The href collides with the reserved prefix or an
    ///   already registered path
    pub fn create_resource(
        &mut self,
        resource: EpubResource,
    ) -> Result<impl Write + '_, EpubError> {
        let file_stem = Path::new(&resource.href)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        if file_stem.starts_with(RESERVED_PREFIX) {
            return Err(EpubWriterError::ReservedResourceName {
                href: resource.href.clone(),
                prefix: RESERVED_PREFIX.to_string(),
            }
            .into());
        }

        let resource_path = self.resource_path(&resource.href);
        if !self.resource_paths.insert(resource_path.clone()) {
            return Err(EpubWriterError::ResourceAlreadyExists {
                path: resource_path,
            }
            .into());
        }
        self.resources.push(resource);

        self.zip
            .start_file(resource_path, FileOptions::<()>::default())?;
        Ok(&mut self.zip)
    }

    /// Register a resource and copy its content from a reader
    pub fn add_resource<R: Read>(
        &mut self,
        data: &mut R,
        resource: EpubResource,
    ) -> Result<(), EpubError> {
        let mut sink = self.create_resource(resource)?;
        io::copy(data, &mut sink)?;
        Ok(())
    }

    /// Register the raster cover and return a sink for the image data
    ///
    /// The extension includes the leading dot, e.g. `.jpg`. When
    /// `in_sequence` is set, a generated cover page becomes a readable
    /// spine entry in front of everything else.
    ///
    /// # Return
    /// - `Ok(impl Write)`: Sink for the image data
    /// - `Err(EpubError)`: A cover has already been registered
    pub fn create_raster_cover(
        &mut self,
        extension: &str,
        in_sequence: bool,
    ) -> Result<impl Write + '_, EpubError> {
        if self.cover_href.is_some() {
            return Err(EpubWriterError::CoverAlreadyAdded.into());
        }

        let cover_href = reserved_href(&format!("cover{}", extension));
        let cover_path = self.resource_path(&cover_href);
        self.cover_href = Some(cover_href);
        self.cover_in_sequence = in_sequence;

        self.zip
            .start_file(cover_path, FileOptions::<()>::default())?;
        Ok(&mut self.zip)
    }

    /// Register the raster cover and copy the image data from a reader
    pub fn add_raster_cover<R: Read>(
        &mut self,
        data: &mut R,
        extension: &str,
        in_sequence: bool,
    ) -> Result<(), EpubError> {
        let mut sink = self.create_raster_cover(extension, in_sequence)?;
        io::copy(data, &mut sink)?;
        Ok(())
    }

    /// Register the table-of-contents forest
    ///
    /// When `in_sequence` is set, the generated contents page becomes a
    /// readable spine entry. May be called at most once per writer.
    pub fn add_toc(
        &mut self,
        nav_items: Vec<EpubNavItem>,
        in_sequence: bool,
    ) -> Result<(), EpubError> {
        if self.toc.is_some() {
            return Err(EpubWriterError::TocAlreadyAdded.into());
        }

        self.toc = Some(nav_items);
        self.toc_in_sequence = in_sequence;
        Ok(())
    }

    /// Finalize the publication and close the archive
    ///
    /// Derives all generated documents from the accumulated state and
    /// writes them in a fixed order: cover page, navigation document, NCX,
    /// package document. Consumes the writer; the archive is complete
    /// afterwards and no further registration is possible.
    ///
    /// # Return
    /// - `Ok(W)`: The underlying writer with the archive fully written
    /// - `Err(EpubError)`: Rendering or archive write failure
    pub fn close(mut self) -> Result<W, EpubError> {
        let policy = DocumentPolicy::evaluate(
            self.version,
            self.toc_in_sequence,
            self.include_legacy_features,
            self.include_structural_components,
        )?;

        self.save_changes(&policy);
        self.write_special_documents(&policy)?;

        Ok(self.zip.finish()?)
    }

    fn resource_path(&self, href: &str) -> String {
        let path = format!(
            "{}/{}",
            self.content_directory.trim_matches('/'),
            href.trim_matches('/')
        );
        path.trim_matches('/').to_string()
    }

    fn package_document_path(&self) -> String {
        self.resource_path(&reserved_href("package.opf"))
    }

    fn write_mimetype(&mut self) -> Result<(), EpubError> {
        let options =
            FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
        self.zip.start_file("mimetype", options)?;
        self.zip.write_all(APPLICATION_EPUB_ZIP.as_bytes())?;
        Ok(())
    }

    fn write_container_xml(&mut self) -> Result<(), EpubError> {
        let document =
            meta_inf::container_document(self.version, &self.package_document_path())?;
        self.write_document("META-INF/container.xml", &document)
    }

    /// Mirror the accumulated state into the document builders
    fn save_changes(&mut self, policy: &DocumentPolicy) {
        self.save_metadata();
        self.save_cover();
        self.save_toc(policy);
        self.save_resources();
        self.save_structural_components(policy);

        match self.direction {
            EpubDirection::LeftToRight => self.package.add_left_to_right(),
            EpubDirection::RightToLeft => self.package.add_right_to_left(),
            EpubDirection::Default => {}
        }
    }

    fn save_metadata(&mut self) {
        self.package.add_identifier(&self.identifier);
        self.package.add_title(&self.title);

        if self.languages.is_empty() {
            self.package.add_language("en");
        } else {
            for language in &self.languages {
                self.package.add_language(language);
            }
        }

        for creator in &self.creators {
            self.package.add_creator(&creator.name, &creator.roles);
        }

        if let Some(date) = self.date {
            self.package.add_date(date);
        }
        if self.pre_paginated {
            self.package.add_pre_paginated();
        }
        self.package.add_modified(self.modified);
    }

    fn save_cover(&mut self) {
        let Some(cover_href) = self.cover_href.clone() else {
            return;
        };

        self.package
            .add_item_to_manifest(&cover_href, Some("cover-image"), Some("cover-id"));
        if self.version == EpubVersion::Epub2 {
            // Not in the EPUB 2 specification, but the de facto way to mark a cover.
            self.package.add_cover_meta("cover-id");
        }

        if self.cover_in_sequence {
            self.package.add_item_to_manifest_and_spine(
                &reserved_href("cover.xhtml"),
                None,
                None,
                Some("cover-xhtml-id"),
            );
        }
    }

    fn save_toc(&mut self, policy: &DocumentPolicy) {
        if policy.navigation_document {
            let nav_href = reserved_href("nav.xhtml");
            if self.toc_in_sequence {
                self.package
                    .add_item_to_manifest_and_spine(&nav_href, Some("nav"), None, None);
            } else {
                self.package.add_item_to_manifest(&nav_href, Some("nav"), None);
            }
        }

        if policy.ncx {
            self.ncx.add_identifier(&self.identifier);
            self.ncx.add_title(&self.title);
            self.package
                .add_item_to_manifest(&reserved_href("toc.ncx"), None, Some("ncx-id"));
            self.package.add_ncx("ncx-id");
        }

        if self.cover_in_sequence {
            let cover_nav_item = EpubNavItem::new("Cover", &reserved_href("cover.xhtml"));
            self.save_nav_item(&cover_nav_item, policy);
        }
        if self.toc_in_sequence {
            let toc_nav_item =
                EpubNavItem::new("Table Of Contents", &reserved_href("nav.xhtml"));
            self.save_nav_item(&toc_nav_item, policy);
        }

        let toc = self.toc.take();
        if let Some(nav_items) = &toc {
            for nav_item in nav_items {
                self.save_nav_item(nav_item, policy);
            }
        }
        self.toc = toc;
    }

    fn save_resources(&mut self) {
        for resource in &self.resources {
            let manifest_properties = join_properties(&resource.manifest_properties);

            if resource.is_spine_eligible() {
                let spine_properties = join_properties(&resource.spine_properties);
                self.package.add_item_to_manifest_and_spine(
                    &resource.href,
                    manifest_properties.as_deref(),
                    spine_properties.as_deref(),
                    None,
                );
            } else {
                self.package.add_item_to_manifest(
                    &resource.href,
                    manifest_properties.as_deref(),
                    None,
                );
            }
        }
    }

    fn save_structural_components(&mut self, policy: &DocumentPolicy) {
        // The start of content is the first registered XHTML resource, in
        // registration order. Spine order does not matter here.
        let start_of_content = self
            .resources
            .iter()
            .find(|resource| resource.is_spine_eligible())
            .map(|resource| resource.href.clone());

        if policy.landmarks {
            if self.cover_in_sequence {
                self.navigation.add_item_to_landmarks(
                    "cover",
                    "Cover",
                    &reserved_href("cover.xhtml"),
                );
            }
            if self.toc_in_sequence {
                self.navigation.add_item_to_landmarks(
                    "toc",
                    "Table Of Contents",
                    &reserved_href("nav.xhtml"),
                );
            }
            if let Some(href) = &start_of_content {
                self.navigation
                    .add_item_to_landmarks("bodymatter", "Start Of Content", href);
            }
        }

        if policy.guide {
            if self.cover_in_sequence {
                self.package.add_reference_to_guide(
                    "cover",
                    "Cover",
                    &reserved_href("cover.xhtml"),
                );
            }
            if self.toc_in_sequence {
                self.package.add_reference_to_guide(
                    "toc",
                    "Table Of Contents",
                    &reserved_href("nav.xhtml"),
                );
            }
            if let Some(href) = &start_of_content {
                self.package
                    .add_reference_to_guide("text", "Start Of Content", href);
            }
        }
    }

    fn save_nav_item(&mut self, nav_item: &EpubNavItem, policy: &DocumentPolicy) {
        if policy.navigation_document {
            self.navigation.add_nav_item(nav_item);
        }
        if policy.ncx {
            self.ncx.add_nav_item(nav_item);
        }
    }

    /// Serialize and write the generated documents in their fixed order
    fn write_special_documents(&mut self, policy: &DocumentPolicy) -> Result<(), EpubError> {
        if let Some(cover_href) = self.cover_href.clone() {
            if self.cover_in_sequence {
                let document = cover::raster_document(self.version, &cover_href)?;
                let path = self.resource_path(&reserved_href("cover.xhtml"));
                self.write_document(&path, &document)?;
            }
        }

        if self.toc.is_some() {
            if policy.navigation_document {
                let document = self.navigation.document();
                let path = self.resource_path(&reserved_href("nav.xhtml"));
                self.write_document(&path, &document)?;
            }
            if policy.ncx {
                let document = self.ncx.document();
                let path = self.resource_path(&reserved_href("toc.ncx"));
                self.write_document(&path, &document)?;
            }
        }

        let document = self.package.document();
        let path = self.package_document_path();
        self.write_document(&path, &document)
    }

    fn write_document(&mut self, path: &str, document: &XmlDocument) -> Result<(), EpubError> {
        debug!("writing generated document to {}", path);

        let data = document.render()?;
        self.zip.start_file(path, FileOptions::<()>::default())?;
        self.zip.write_all(&data)?;
        Ok(())
    }
}

#[cfg(feature = "async")]
impl<W: Write + Seek> EpubWriter<W> {
    /// Register a resource and copy its content from an asynchronous reader
    ///
    /// Behaviorally identical to [add_resource](EpubWriter::add_resource);
    /// the reader is drained before the archive entry is written, so entry
    /// writes never overlap.
    pub async fn add_resource_async<R>(
        &mut self,
        data: &mut R,
        resource: EpubResource,
    ) -> Result<(), EpubError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        data.read_to_end(&mut buffer).await?;

        let mut sink = self.create_resource(resource)?;
        sink.write_all(&buffer)?;
        Ok(())
    }

    /// Register the raster cover from an asynchronous reader
    pub async fn add_raster_cover_async<R>(
        &mut self,
        data: &mut R,
        extension: &str,
        in_sequence: bool,
    ) -> Result<(), EpubError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        data.read_to_end(&mut buffer).await?;

        let mut sink = self.create_raster_cover(extension, in_sequence)?;
        sink.write_all(&buffer)?;
        Ok(())
    }

    /// Finalize the publication without blocking the async runtime
    ///
    /// Runs the synchronous [close](EpubWriter::close) on the blocking
    /// thread pool and awaits its completion. The produced archive is
    /// byte-identical to the synchronous path.
    pub async fn close_async(self) -> Result<W, EpubError>
    where
        W: Send + 'static,
    {
        tokio::task::spawn_blocking(move || self.close()).await?
    }
}

fn join_properties(properties: &[String]) -> Option<String> {
    let joined = properties.join(" ");
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}
