//! Package Document Module
//!
//! The package document (OPF) is the central descriptor of the publication:
//! metadata, manifest, spine, and guide. Every other generated document is
//! mirrored here, so all manifest/spine/metadata mutations funnel through
//! this one builder to keep identifiers consistent.

use chrono::{DateTime, Utc};

use crate::{
    error::EpubError,
    mediatype,
    types::EpubVersion,
    writer::{DC_NAMESPACE, OPF_NAMESPACE},
    xml::{XmlDocument, XmlElement},
};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Builder of the package document
///
/// The four subtrees (metadata, manifest, spine, guide) are created on first
/// use, so a publication without e.g. guide references never emits an empty
/// `<guide/>` element. Identifier allocation for manifest items and creators
/// is owned by this instance and resets only with a new instance.
pub(crate) struct PackageDocument {
    version: EpubVersion,
    package_version: &'static str,

    metadata: Option<XmlElement>,
    manifest: Option<XmlElement>,
    spine: Option<XmlElement>,
    guide: Option<XmlElement>,

    creator_count: usize,
    resource_count: usize,
}

impl PackageDocument {
    pub fn new(version: EpubVersion) -> Result<Self, EpubError> {
        let package_version = version.package_version()?;

        Ok(PackageDocument {
            version,
            package_version,

            metadata: None,
            manifest: None,
            spine: None,
            guide: None,

            creator_count: 1,
            resource_count: 1,
        })
    }

    /// The current package document tree
    ///
    /// Subtrees that were never touched are absent from the output.
    pub fn document(&self) -> XmlDocument {
        let mut package = XmlElement::new("package")
            .with_attr("xmlns", OPF_NAMESPACE)
            .with_attr("unique-identifier", "publication-id")
            .with_attr("version", self.package_version);

        for subtree in [&self.metadata, &self.manifest, &self.spine, &self.guide] {
            if let Some(element) = subtree {
                package.push_child(element.clone());
            }
        }

        XmlDocument::new(package)
    }

    pub fn add_identifier(&mut self, identifier: &str) {
        let identifier = XmlElement::new("dc:identifier")
            .with_attr("id", "publication-id")
            .with_text(identifier);
        self.metadata_element().push_child(identifier);
    }

    pub fn add_title(&mut self, title: &str) {
        match self.version {
            EpubVersion::Epub3 => {
                let title = XmlElement::new("dc:title")
                    .with_attr("id", "title-id")
                    .with_text(title);
                let title_type = XmlElement::new("meta")
                    .with_attr("refines", "#title-id")
                    .with_attr("property", "title-type")
                    .with_text("main");

                let metadata = self.metadata_element();
                metadata.push_child(title);
                metadata.push_child(title_type);
            }
            EpubVersion::Epub2 => {
                let title = XmlElement::new("dc:title").with_text(title);
                self.metadata_element().push_child(title);
            }
            EpubVersion::Unknown => {}
        }
    }

    pub fn add_language(&mut self, language: &str) {
        let language = XmlElement::new("dc:language").with_text(language);
        self.metadata_element().push_child(language);
    }

    /// Add a creator with its role codes
    ///
    /// EPUB 3 emits one creator element with a generated sequential id plus
    /// one role refinement per role in the marc:relators scheme. EPUB 2
    /// emits one creator element per role with the role inlined, or a single
    /// roleless element when no roles are given. Emission follows call
    /// order, which governs the id numbering.
    pub fn add_creator(&mut self, name: &str, roles: &[String]) {
        match self.version {
            EpubVersion::Epub3 => {
                let creator_id = format!("creator-id-{}", self.creator_count);
                self.creator_count += 1;

                let creator = XmlElement::new("dc:creator")
                    .with_attr("id", &creator_id)
                    .with_text(name);
                self.metadata_element().push_child(creator);

                for role in roles {
                    let role_meta = XmlElement::new("meta")
                        .with_attr("refines", &format!("#{}", creator_id))
                        .with_attr("property", "role")
                        .with_attr("scheme", "marc:relators")
                        .with_text(role);
                    self.metadata_element().push_child(role_meta);
                }
            }
            EpubVersion::Epub2 => {
                if roles.is_empty() {
                    let creator = XmlElement::new("dc:creator").with_text(name);
                    self.metadata_element().push_child(creator);
                } else {
                    for role in roles {
                        let creator = XmlElement::new("dc:creator")
                            .with_attr("opf:role", role)
                            .with_text(name);
                        self.metadata_element().push_child(creator);
                    }
                }
            }
            EpubVersion::Unknown => {}
        }
    }

    pub fn add_date(&mut self, date: DateTime<Utc>) {
        let date = XmlElement::new("dc:date").with_text(&date.format(DATE_FORMAT).to_string());
        self.metadata_element().push_child(date);
    }

    pub fn add_pre_paginated(&mut self) {
        if self.version == EpubVersion::Epub3 {
            let layout = XmlElement::new("meta")
                .with_attr("property", "rendition:layout")
                .with_text("pre-paginated");
            self.metadata_element().push_child(layout);
        }
    }

    pub fn add_modified(&mut self, modified: DateTime<Utc>) {
        if self.version == EpubVersion::Epub3 {
            let modified = XmlElement::new("meta")
                .with_attr("property", "dcterms:modified")
                .with_text(&modified.format(DATE_FORMAT).to_string());
            self.metadata_element().push_child(modified);
        }
    }

    /// Add the de-facto EPUB 2 cover meta pointing at a manifest item
    ///
    /// EPUB 2 has no formal cover mechanism; reading systems look for a
    /// `meta` entry named `cover` instead.
    pub fn add_cover_meta(&mut self, item_id: &str) {
        let cover = XmlElement::new("meta")
            .with_attr("name", "cover")
            .with_attr("content", item_id);
        self.metadata_element().push_child(cover);
    }

    /// Add a manifest item, allocating an id when none is supplied
    ///
    /// The media type is derived from the href extension. Returns the id
    /// under which the item was registered.
    pub fn add_item_to_manifest(
        &mut self,
        href: &str,
        manifest_properties: Option<&str>,
        item_id: Option<&str>,
    ) -> String {
        let item_id = match item_id {
            Some(item_id) => item_id.to_string(),
            None => self.next_item_id(),
        };

        let mut item = XmlElement::new("item")
            .with_attr("href", href)
            .with_attr("id", &item_id)
            .with_attr("media-type", mediatype::guess_media_type(href));

        if self.version == EpubVersion::Epub3 {
            if let Some(properties) = manifest_properties.filter(|value| !value.is_empty()) {
                item.set_attr("properties", properties);
            }
        }

        self.manifest_element().push_child(item);
        item_id
    }

    pub fn add_item_to_spine(&mut self, spine_properties: Option<&str>, item_id: &str) {
        let mut itemref = XmlElement::new("itemref").with_attr("idref", item_id);

        if self.version == EpubVersion::Epub3 {
            if let Some(properties) = spine_properties.filter(|value| !value.is_empty()) {
                itemref.set_attr("properties", properties);
            }
        }

        self.spine_element().push_child(itemref);
    }

    /// Add a resource to the manifest and the spine under one shared id
    pub fn add_item_to_manifest_and_spine(
        &mut self,
        href: &str,
        manifest_properties: Option<&str>,
        spine_properties: Option<&str>,
        item_id: Option<&str>,
    ) -> String {
        let item_id = match item_id {
            Some(item_id) => item_id.to_string(),
            None => self.next_item_id(),
        };

        self.add_item_to_manifest(href, manifest_properties, Some(&item_id));
        self.add_item_to_spine(spine_properties, &item_id);

        item_id
    }

    /// Link the NCX manifest item from the spine
    ///
    /// An EPUB 3 effect; under EPUB 2 the NCX is identified through its
    /// manifest media type alone and the spine stays untouched.
    pub fn add_ncx(&mut self, item_id: &str) {
        if self.version == EpubVersion::Epub3 {
            self.spine_element().set_attr("toc", item_id);
        }
    }

    pub fn add_left_to_right(&mut self) {
        if self.version == EpubVersion::Epub3 {
            self.spine_element().set_attr("page-progression-direction", "ltr");
        }
    }

    pub fn add_right_to_left(&mut self) {
        if self.version == EpubVersion::Epub3 {
            self.spine_element().set_attr("page-progression-direction", "rtl");
        }
    }

    pub fn add_reference_to_guide(&mut self, reference_type: &str, title: &str, href: &str) {
        let reference = XmlElement::new("reference")
            .with_attr("type", reference_type)
            .with_attr("title", title)
            .with_attr("href", href);
        self.guide_element().push_child(reference);
    }

    fn next_item_id(&mut self) -> String {
        let item_id = format!("item-id-{}", self.resource_count);
        self.resource_count += 1;
        item_id
    }

    fn metadata_element(&mut self) -> &mut XmlElement {
        let version = self.version;
        self.metadata.get_or_insert_with(|| {
            let mut metadata = XmlElement::new("metadata").with_attr("xmlns:dc", DC_NAMESPACE);
            if version == EpubVersion::Epub2 {
                metadata.set_attr("xmlns:opf", OPF_NAMESPACE);
                // Same binding as the package root; the renderer drops it again.
                metadata.set_attr("xmlns", OPF_NAMESPACE);
            }
            metadata
        })
    }

    fn manifest_element(&mut self) -> &mut XmlElement {
        self.manifest
            .get_or_insert_with(|| XmlElement::new("manifest"))
    }

    fn spine_element(&mut self) -> &mut XmlElement {
        self.spine.get_or_insert_with(|| XmlElement::new("spine"))
    }

    fn guide_element(&mut self) -> &mut XmlElement {
        self.guide.get_or_insert_with(|| XmlElement::new("guide"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{
        types::EpubVersion,
        writer::package::PackageDocument,
        xml::XmlElement,
    };

    fn metadata_children(document: &PackageDocument) -> Vec<XmlElement> {
        document
            .document()
            .root
            .find_child("metadata")
            .expect("metadata element")
            .children()
            .to_vec()
    }

    #[test]
    fn test_new_rejects_unknown_version() {
        assert!(PackageDocument::new(EpubVersion::Unknown).is_err());
    }

    #[test]
    fn test_empty_document_has_no_subtrees() {
        let document = PackageDocument::new(EpubVersion::Epub3).unwrap().document();

        assert_eq!(document.root.name(), "package");
        assert_eq!(document.root.attr("version"), Some("3.0"));
        assert_eq!(document.root.attr("unique-identifier"), Some("publication-id"));
        assert!(document.root.children().is_empty());
    }

    #[test]
    fn test_add_identifier() {
        let mut package = PackageDocument::new(EpubVersion::Epub2).unwrap();
        package.add_identifier("urn:uuid:12345678-1234-1234-1234-123456789012");

        let children = metadata_children(&package);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "dc:identifier");
        assert_eq!(children[0].attr("id"), Some("publication-id"));
        assert_eq!(
            children[0].text(),
            Some("urn:uuid:12345678-1234-1234-1234-123456789012")
        );
    }

    #[test]
    fn test_add_title_epub3_refines() {
        let mut package = PackageDocument::new(EpubVersion::Epub3).unwrap();
        package.add_title("Title");

        let children = metadata_children(&package);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name(), "dc:title");
        assert_eq!(children[0].attr("id"), Some("title-id"));
        assert_eq!(children[1].name(), "meta");
        assert_eq!(children[1].attr("refines"), Some("#title-id"));
        assert_eq!(children[1].attr("property"), Some("title-type"));
        assert_eq!(children[1].text(), Some("main"));
    }

    #[test]
    fn test_add_title_epub2_plain() {
        let mut package = PackageDocument::new(EpubVersion::Epub2).unwrap();
        package.add_title("Title");

        let children = metadata_children(&package);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "dc:title");
        assert_eq!(children[0].attr("id"), None);
        assert_eq!(children[0].text(), Some("Title"));
    }

    #[test]
    fn test_add_creator_epub2_without_roles() {
        let mut package = PackageDocument::new(EpubVersion::Epub2).unwrap();
        package.add_creator("Creator", &[]);

        let children = metadata_children(&package);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "dc:creator");
        assert_eq!(children[0].attr("opf:role"), None);
        assert_eq!(children[0].text(), Some("Creator"));
    }

    #[test]
    fn test_add_creator_epub2_role_per_element() {
        let mut package = PackageDocument::new(EpubVersion::Epub2).unwrap();
        package.add_creator("Creator", &["aut".to_string(), "ill".to_string()]);

        let children = metadata_children(&package);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attr("opf:role"), Some("aut"));
        assert_eq!(children[1].attr("opf:role"), Some("ill"));
        assert_eq!(children[0].text(), Some("Creator"));
        assert_eq!(children[1].text(), Some("Creator"));
    }

    #[test]
    fn test_add_creator_epub3_role_refinements() {
        let mut package = PackageDocument::new(EpubVersion::Epub3).unwrap();
        package.add_creator("Creator", &["aut".to_string()]);

        let children = metadata_children(&package);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name(), "dc:creator");
        assert_eq!(children[0].attr("id"), Some("creator-id-1"));
        assert_eq!(children[1].name(), "meta");
        assert_eq!(children[1].attr("refines"), Some("#creator-id-1"));
        assert_eq!(children[1].attr("property"), Some("role"));
        assert_eq!(children[1].attr("scheme"), Some("marc:relators"));
        assert_eq!(children[1].text(), Some("aut"));
    }

    #[test]
    fn test_add_creator_epub3_id_sequence() {
        let mut package = PackageDocument::new(EpubVersion::Epub3).unwrap();
        package.add_creator("First", &["aut".to_string(), "ill".to_string()]);
        package.add_creator("Second", &[]);

        let children = metadata_children(&package);
        assert_eq!(children[0].attr("id"), Some("creator-id-1"));
        assert_eq!(children[3].attr("id"), Some("creator-id-2"));
    }

    #[test]
    fn test_add_date() {
        let mut package = PackageDocument::new(EpubVersion::Epub3).unwrap();
        package.add_date(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());

        let children = metadata_children(&package);
        assert_eq!(children[0].name(), "dc:date");
        assert_eq!(children[0].text(), Some("2000-01-01T00:00:00Z"));
    }

    #[test]
    fn test_add_pre_paginated_is_version_gated() {
        let mut epub3 = PackageDocument::new(EpubVersion::Epub3).unwrap();
        epub3.add_pre_paginated();
        let children = metadata_children(&epub3);
        assert_eq!(children[0].attr("property"), Some("rendition:layout"));
        assert_eq!(children[0].text(), Some("pre-paginated"));

        let mut epub2 = PackageDocument::new(EpubVersion::Epub2).unwrap();
        epub2.add_pre_paginated();
        assert!(epub2.document().root.find_child("metadata").is_none());
    }

    #[test]
    fn test_add_modified_is_version_gated() {
        let timestamp = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();

        let mut epub3 = PackageDocument::new(EpubVersion::Epub3).unwrap();
        epub3.add_modified(timestamp);
        let children = metadata_children(&epub3);
        assert_eq!(children[0].attr("property"), Some("dcterms:modified"));
        assert_eq!(children[0].text(), Some("2000-01-01T00:00:00Z"));

        let mut epub2 = PackageDocument::new(EpubVersion::Epub2).unwrap();
        epub2.add_modified(timestamp);
        assert!(epub2.document().root.find_child("metadata").is_none());
    }

    #[test]
    fn test_add_item_to_manifest_allocates_sequential_ids() {
        let mut package = PackageDocument::new(EpubVersion::Epub3).unwrap();
        let first = package.add_item_to_manifest("chapter-1.xhtml", None, None);
        let second = package.add_item_to_manifest("chapter-2.xhtml", None, None);
        let custom = package.add_item_to_manifest("cover.jpg", None, Some("cover-id"));

        assert_eq!(first, "item-id-1");
        assert_eq!(second, "item-id-2");
        assert_eq!(custom, "cover-id");

        let document = package.document();
        let manifest = document.root.find_child("manifest").unwrap();
        assert_eq!(manifest.children().len(), 3);
        assert_eq!(manifest.children()[0].attr("id"), Some("item-id-1"));
        assert_eq!(manifest.children()[0].attr("href"), Some("chapter-1.xhtml"));
        assert_eq!(
            manifest.children()[0].attr("media-type"),
            Some("application/xhtml+xml")
        );
        assert_eq!(manifest.children()[2].attr("media-type"), Some("image/jpeg"));
    }

    #[test]
    fn test_manifest_properties_are_version_gated() {
        let mut epub3 = PackageDocument::new(EpubVersion::Epub3).unwrap();
        epub3.add_item_to_manifest(".nav.xhtml", Some("nav"), None);
        let document = epub3.document();
        let item = &document.root.find_child("manifest").unwrap().children()[0];
        assert_eq!(item.attr("properties"), Some("nav"));

        let mut epub2 = PackageDocument::new(EpubVersion::Epub2).unwrap();
        epub2.add_item_to_manifest(".nav.xhtml", Some("nav"), None);
        let document = epub2.document();
        let item = &document.root.find_child("manifest").unwrap().children()[0];
        assert_eq!(item.attr("properties"), None);
    }

    #[test]
    fn test_add_item_to_manifest_and_spine_shares_id() {
        let mut package = PackageDocument::new(EpubVersion::Epub3).unwrap();
        package.add_item_to_manifest_and_spine("chapter-1.xhtml", None, Some("page-spread-left"), None);

        let document = package.document();
        let manifest = document.root.find_child("manifest").unwrap();
        let spine = document.root.find_child("spine").unwrap();
        assert_eq!(manifest.children()[0].attr("id"), Some("item-id-1"));
        assert_eq!(spine.children()[0].attr("idref"), Some("item-id-1"));
        assert_eq!(
            spine.children()[0].attr("properties"),
            Some("page-spread-left")
        );
    }

    #[test]
    fn test_spine_attributes_are_version_gated() {
        let mut epub3 = PackageDocument::new(EpubVersion::Epub3).unwrap();
        epub3.add_ncx("ncx-id");
        epub3.add_right_to_left();
        let document = epub3.document();
        let spine = document.root.find_child("spine").unwrap();
        assert_eq!(spine.attr("toc"), Some("ncx-id"));
        assert_eq!(spine.attr("page-progression-direction"), Some("rtl"));

        let mut epub2 = PackageDocument::new(EpubVersion::Epub2).unwrap();
        epub2.add_ncx("ncx-id");
        epub2.add_left_to_right();
        assert!(epub2.document().root.find_child("spine").is_none());
    }

    #[test]
    fn test_add_reference_to_guide() {
        let mut package = PackageDocument::new(EpubVersion::Epub2).unwrap();
        package.add_reference_to_guide("cover", "Cover", ".cover.xhtml");

        let document = package.document();
        let guide = document.root.find_child("guide").unwrap();
        assert_eq!(guide.children().len(), 1);
        assert_eq!(guide.children()[0].attr("type"), Some("cover"));
        assert_eq!(guide.children()[0].attr("title"), Some("Cover"));
        assert_eq!(guide.children()[0].attr("href"), Some(".cover.xhtml"));
    }

    #[test]
    fn test_epub2_metadata_namespace_declarations() {
        let mut package = PackageDocument::new(EpubVersion::Epub2).unwrap();
        package.add_language("en");

        let rendered = String::from_utf8(package.document().render().unwrap()).unwrap();
        assert!(rendered.contains("xmlns:dc=\"http://purl.org/dc/elements/1.1/\""));
        assert!(rendered.contains("xmlns:opf=\"http://www.idpf.org/2007/opf\""));
        // The metadata element repeats the package default namespace;
        // the renderer keeps only the declaration on the root.
        assert_eq!(rendered.matches("xmlns=\"http://www.idpf.org/2007/opf\"").count(), 1);
    }
}
