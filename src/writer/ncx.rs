//! NCX Module
//!
//! The NCX is the EPUB 2 table-of-contents format, also emitted under
//! EPUB 3 when legacy features are requested. It projects the same
//! navigation forest as the navigation document into `navPoint` elements
//! whose ids encode the position of each node within the forest.

use crate::{
    error::EpubError,
    types::{EpubNavItem, EpubVersion},
    writer::NCX_NAMESPACE,
    xml::{XmlDocument, XmlElement},
};

/// Builder of the NCX document
///
/// Navigation point ids are the hyphen-joined 1-based path of positional
/// indices from the top of the forest to the node (`ncx-2-2` is the second
/// child of the second top-level entry). The ids are purely structural and
/// recomputed identically on every generation pass.
pub(crate) struct NcxDocument {
    head: Option<XmlElement>,
    doc_title: Option<XmlElement>,
    nav_map: Option<XmlElement>,
    top_level_nav_item_count: usize,
}

impl NcxDocument {
    pub fn new(version: EpubVersion) -> Result<Self, EpubError> {
        if version == EpubVersion::Unknown {
            return Err(EpubError::InvalidVersion);
        }

        Ok(NcxDocument {
            head: None,
            doc_title: None,
            nav_map: None,
            top_level_nav_item_count: 1,
        })
    }

    pub fn add_identifier(&mut self, identifier: &str) {
        self.head = Some(
            XmlElement::new("head").with_child(
                XmlElement::new("meta")
                    .with_attr("name", "dtb:uid")
                    .with_attr("content", identifier),
            ),
        );
    }

    pub fn add_title(&mut self, title: &str) {
        self.doc_title = Some(
            XmlElement::new("docTitle").with_child(XmlElement::new("text").with_text(title)),
        );
    }

    /// Append a top-level navigation entry and its subtree
    pub fn add_nav_item(&mut self, nav_item: &EpubNavItem) {
        let index_path = vec![self.top_level_nav_item_count];
        self.top_level_nav_item_count += 1;

        let nav_point = Self::nav_point(nav_item, index_path);
        self.nav_map
            .get_or_insert_with(|| XmlElement::new("navMap"))
            .push_child(nav_point);
    }

    /// The current NCX document tree
    pub fn document(&self) -> XmlDocument {
        let mut ncx = XmlElement::new("ncx")
            .with_attr("xmlns", NCX_NAMESPACE)
            .with_attr("version", "2005-1");

        for subtree in [&self.head, &self.doc_title, &self.nav_map] {
            if let Some(element) = subtree {
                ncx.push_child(element.clone());
            }
        }

        XmlDocument::new(ncx)
    }

    /// Build the navigation point of one entry
    ///
    /// The index path is owned by each recursion level; child calls receive
    /// a fresh copy extended by their 1-based sibling position.
    fn nav_point(nav_item: &EpubNavItem, index_path: Vec<usize>) -> XmlElement {
        let id = index_path
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join("-");

        let mut nav_point = XmlElement::new("navPoint")
            .with_attr("id", &format!("ncx-{}", id))
            .with_child(
                XmlElement::new("navLabel")
                    .with_child(XmlElement::new("text").with_text(&nav_item.text)),
            )
            .with_child(XmlElement::new("content").with_attr("src", &nav_item.reference));

        for (index, child) in nav_item.children.iter().enumerate() {
            let mut child_path = index_path.clone();
            child_path.push(index + 1);
            nav_point.push_child(Self::nav_point(child, child_path));
        }

        nav_point
    }
}
