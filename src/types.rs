use crate::{error::EpubError, mediatype::XHTML_EXTENSION};

/// The format generation of an EPUB publication
///
/// `Unknown` exists only as a classification result when inspecting a
/// third-party publication; it is never a valid operating mode. Every
/// component that needs a concrete generation rejects `Unknown` immediately
/// with [EpubError::InvalidVersion].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpubVersion {
    Epub2,
    Epub3,
    Unknown,
}

impl EpubVersion {
    /// Returns the `version` attribute value of the package document
    pub(crate) fn package_version(self) -> Result<&'static str, EpubError> {
        match self {
            EpubVersion::Epub2 => Ok("2.0"),
            EpubVersion::Epub3 => Ok("3.0"),
            EpubVersion::Unknown => Err(EpubError::InvalidVersion),
        }
    }
}

/// Page progression direction of the publication
///
/// Rendered as the `page-progression-direction` attribute on the spine.
/// This is an EPUB 3 mechanism; under EPUB 2 the hint is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpubDirection {
    #[default]
    Default,
    LeftToRight,
    RightToLeft,
}

/// A creator (author, illustrator, ...) of the publication
///
/// A creator has a display name and an ordered list of MARC relator codes
/// describing its roles, e.g. `aut` or `ill`. The list may be empty.
/// How roles are attributed differs per version: EPUB 3 emits one creator
/// element plus one role refinement per role, EPUB 2 emits one creator
/// element per role with the role inlined as an attribute.
#[derive(Debug, Clone, Default)]
pub struct EpubCreator {
    /// The display name of the creator
    pub name: String,

    /// MARC relator codes describing the creator's roles, in order
    pub roles: Vec<String>,
}

impl EpubCreator {
    /// Create a creator without any roles
    pub fn new(name: &str) -> Self {
        EpubCreator {
            name: name.to_string(),
            roles: vec![],
        }
    }

    /// Append a role code, returning the creator for chaining
    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.push(role.to_string());
        self
    }
}

/// A single entry of the table-of-contents forest
///
/// Each item carries a display label, a reference (an href, optionally with
/// a fragment), and an ordered list of child items of arbitrary depth. The
/// same forest is projected into the navigation document and the NCX; both
/// projections preserve order and nesting exactly, only the encoding
/// differs.
#[derive(Debug, Clone, Default)]
pub struct EpubNavItem {
    /// The display label of this entry
    pub text: String,

    /// The content document this entry references
    pub reference: String,

    /// Child entries (sub-sections)
    pub children: Vec<EpubNavItem>,
}

impl EpubNavItem {
    /// Create a leaf entry
    pub fn new(text: &str, reference: &str) -> Self {
        EpubNavItem {
            text: text.to_string(),
            reference: reference.to_string(),
            children: vec![],
        }
    }

    /// Replace the child entries, returning the item for chaining
    pub fn with_children(mut self, children: Vec<EpubNavItem>) -> Self {
        self.children = children;
        self
    }
}

/// A caller-supplied resource of the publication
///
/// The `href` is the path of the resource relative to the content root and
/// must be unique within the publication. Manifest and spine properties are
/// space-joined token lists on the corresponding package document entries;
/// both are only rendered under EPUB 3 and omitted entirely when empty.
#[derive(Debug, Clone, Default)]
pub struct EpubResource {
    /// The path of the resource relative to the content root
    pub href: String,

    /// Tokens for the `properties` attribute of the manifest item
    pub manifest_properties: Vec<String>,

    /// Tokens for the `properties` attribute of the spine itemref
    pub spine_properties: Vec<String>,
}

impl EpubResource {
    /// Create a resource without any properties
    pub fn new(href: &str) -> Self {
        EpubResource {
            href: href.to_string(),
            ..EpubResource::default()
        }
    }

    /// Append a manifest property token, returning the resource for chaining
    pub fn with_manifest_property(mut self, property: &str) -> Self {
        self.manifest_properties.push(property.to_string());
        self
    }

    /// Append a spine property token, returning the resource for chaining
    pub fn with_spine_property(mut self, property: &str) -> Self {
        self.spine_properties.push(property.to_string());
        self
    }

    /// Whether this resource also becomes a spine entry
    ///
    /// Only XHTML content documents take part in the linear reading
    /// sequence; everything else is manifest-only.
    pub fn is_spine_eligible(&self) -> bool {
        self.href.ends_with(XHTML_EXTENSION)
    }
}
