//! Navigation Document Module
//!
//! The navigation document is the XHTML-based table of contents. Under
//! EPUB 3 it also carries the landmarks list of semantic entry points;
//! under EPUB 2 it is a plain XHTML page and landmarks are dropped.

use crate::{
    error::EpubError,
    types::{EpubNavItem, EpubVersion},
    writer::{OPS_NAMESPACE, XHTML_NAMESPACE},
    xml::{Doctype, XmlDocument, XmlElement},
};

const NAVIGATION_CSS: &str = "a { text-decoration: none; }";

/// Builder of the navigation document
///
/// The table-of-contents and landmarks lists are created on first use, so
/// their headers and wrapper elements only appear once content exists.
pub(crate) struct NavigationDocument {
    version: EpubVersion,
    toc_ol: Option<XmlElement>,
    landmarks_ol: Option<XmlElement>,
}

impl NavigationDocument {
    pub fn new(version: EpubVersion) -> Result<Self, EpubError> {
        if version == EpubVersion::Unknown {
            return Err(EpubError::InvalidVersion);
        }

        Ok(NavigationDocument {
            version,
            toc_ol: None,
            landmarks_ol: None,
        })
    }

    /// Append a table-of-contents entry and its subtree
    ///
    /// Every item becomes a list entry holding a hyperlink; children become
    /// a nested ordered list inside that entry, preserving order and
    /// nesting depth exactly.
    pub fn add_nav_item(&mut self, nav_item: &EpubNavItem) {
        let li = Self::nav_li(nav_item);
        self.toc_ol
            .get_or_insert_with(|| XmlElement::new("ol"))
            .push_child(li);
    }

    /// Append a type-tagged landmarks entry
    ///
    /// Landmarks are an EPUB 3 mechanism; under EPUB 2 the call is dropped.
    pub fn add_item_to_landmarks(&mut self, landmark_type: &str, title: &str, href: &str) {
        if self.version != EpubVersion::Epub3 {
            return;
        }

        let li = XmlElement::new("li").with_child(
            XmlElement::new("a")
                .with_attr("epub:type", landmark_type)
                .with_attr("href", href)
                .with_text(title),
        );
        self.landmarks_ol
            .get_or_insert_with(|| XmlElement::new("ol"))
            .push_child(li);
    }

    /// The current navigation document tree
    pub fn document(&self) -> XmlDocument {
        match self.version {
            EpubVersion::Epub3 => self.epub3_document(),
            _ => self.epub2_document(),
        }
    }

    fn epub3_document(&self) -> XmlDocument {
        let mut section = XmlElement::new("section")
            .with_attr("epub:type", "bodymatter chapter")
            .with_child(XmlElement::new("h1").with_text("Navigation"));

        if let Some(toc_ol) = &self.toc_ol {
            section.push_child(
                XmlElement::new("nav")
                    .with_attr("epub:type", "toc")
                    .with_child(XmlElement::new("h2").with_text("Table of Contents"))
                    .with_child(toc_ol.clone()),
            );
        }

        if let Some(landmarks_ol) = &self.landmarks_ol {
            section.push_child(
                XmlElement::new("nav")
                    .with_attr("epub:type", "landmarks")
                    .with_attr("hidden", "hidden")
                    .with_child(XmlElement::new("h2").with_text("Landmarks"))
                    .with_child(landmarks_ol.clone()),
            );
        }

        let html = XmlElement::new("html")
            .with_attr("xmlns", XHTML_NAMESPACE)
            .with_attr("xmlns:epub", OPS_NAMESPACE)
            .with_child(
                XmlElement::new("head")
                    .with_child(XmlElement::new("title").with_text("Navigation"))
                    .with_child(XmlElement::new("meta").with_attr("charset", "utf-8"))
                    .with_child(XmlElement::new("style").with_text(NAVIGATION_CSS)),
            )
            .with_child(XmlElement::new("body").with_child(section));

        XmlDocument::new(html).with_doctype(Doctype::bare("html"))
    }

    fn epub2_document(&self) -> XmlDocument {
        let mut body =
            XmlElement::new("body").with_child(XmlElement::new("h1").with_text("Navigation"));

        if let Some(toc_ol) = &self.toc_ol {
            body.push_child(XmlElement::new("h2").with_text("Table of Contents"));
            body.push_child(toc_ol.clone());
        }

        let html = XmlElement::new("html")
            .with_attr("xmlns", XHTML_NAMESPACE)
            .with_child(
                XmlElement::new("head")
                    .with_child(XmlElement::new("title").with_text("Navigation"))
                    .with_child(
                        XmlElement::new("meta")
                            .with_attr("http-equiv", "content-type")
                            .with_attr("content", "application/xhtml+xml; charset=utf-8"),
                    )
                    .with_child(
                        XmlElement::new("style")
                            .with_attr("type", "text/css")
                            .with_text(NAVIGATION_CSS),
                    ),
            )
            .with_child(body);

        XmlDocument::new(html).with_doctype(Doctype::public(
            "html",
            "-//W3C//DTD XHTML 1.1//EN",
            "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd",
        ))
    }

    fn nav_li(nav_item: &EpubNavItem) -> XmlElement {
        let mut li = XmlElement::new("li").with_child(
            XmlElement::new("a")
                .with_attr("href", &nav_item.reference)
                .with_text(&nav_item.text),
        );

        if !nav_item.children.is_empty() {
            let mut ol = XmlElement::new("ol");
            for child in &nav_item.children {
                ol.push_child(Self::nav_li(child));
            }
            li.push_child(ol);
        }

        li
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        types::{EpubNavItem, EpubVersion},
        writer::navigation::NavigationDocument,
    };

    fn sample_toc() -> Vec<EpubNavItem> {
        vec![
            EpubNavItem::new("Chapter 1", "chapter-1.xhtml"),
            EpubNavItem::new("Chapter 2", "chapter-2.xhtml").with_children(vec![
                EpubNavItem::new("Chapter 2.1", "chapter-2-1.xhtml"),
                EpubNavItem::new("Chapter 2.2", "chapter-2-2.xhtml"),
            ]),
        ]
    }

    #[test]
    fn test_new_rejects_unknown_version() {
        assert!(NavigationDocument::new(EpubVersion::Unknown).is_err());
    }

    #[test]
    fn test_empty_document_has_no_lists() {
        let document = NavigationDocument::new(EpubVersion::Epub3)
            .unwrap()
            .document();

        assert!(document.root.find_elements_by_name("nav").is_empty());
        assert!(document.root.find_elements_by_name("ol").is_empty());
    }

    #[test]
    fn test_epub3_document_structure() {
        let mut navigation = NavigationDocument::new(EpubVersion::Epub3).unwrap();
        for nav_item in sample_toc() {
            navigation.add_nav_item(&nav_item);
        }

        let document = navigation.document();
        assert_eq!(document.doctype.as_ref().unwrap().name, "html");
        assert!(document.doctype.as_ref().unwrap().public_id.is_none());

        let sections = document.root.find_elements_by_name("section");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].attr("epub:type"), Some("bodymatter chapter"));

        let navs = document.root.find_elements_by_name("nav");
        assert_eq!(navs.len(), 1);
        assert_eq!(navs[0].attr("epub:type"), Some("toc"));
    }

    #[test]
    fn test_epub2_document_structure() {
        let mut navigation = NavigationDocument::new(EpubVersion::Epub2).unwrap();
        for nav_item in sample_toc() {
            navigation.add_nav_item(&nav_item);
        }

        let document = navigation.document();
        let doctype = document.doctype.as_ref().unwrap();
        assert_eq!(doctype.public_id.as_deref(), Some("-//W3C//DTD XHTML 1.1//EN"));

        // No nav or section wrapper, the list lives directly in the body.
        assert!(document.root.find_elements_by_name("nav").is_empty());
        assert!(document.root.find_elements_by_name("section").is_empty());

        let body = document.root.find_child("body").unwrap();
        assert_eq!(body.children().len(), 3);
        assert_eq!(body.children()[1].name(), "h2");
        assert_eq!(body.children()[2].name(), "ol");
    }

    #[test]
    fn test_nav_items_preserve_order_and_nesting() {
        let mut navigation = NavigationDocument::new(EpubVersion::Epub3).unwrap();
        for nav_item in sample_toc() {
            navigation.add_nav_item(&nav_item);
        }

        let document = navigation.document();
        let navs = document.root.find_elements_by_name("nav");
        let toc_ol = navs[0].find_child("ol").unwrap();
        assert_eq!(toc_ol.children().len(), 2);

        let first = &toc_ol.children()[0];
        let anchor = first.find_child("a").unwrap();
        assert_eq!(anchor.attr("href"), Some("chapter-1.xhtml"));
        assert_eq!(anchor.text(), Some("Chapter 1"));
        assert!(first.find_child("ol").is_none());

        let second = &toc_ol.children()[1];
        let nested = second.find_child("ol").unwrap();
        assert_eq!(nested.children().len(), 2);
        assert_eq!(
            nested.children()[0].find_child("a").unwrap().text(),
            Some("Chapter 2.1")
        );
        assert_eq!(
            nested.children()[1].find_child("a").unwrap().text(),
            Some("Chapter 2.2")
        );
    }

    #[test]
    fn test_landmarks_epub3() {
        let mut navigation = NavigationDocument::new(EpubVersion::Epub3).unwrap();
        navigation.add_nav_item(&EpubNavItem::new("Chapter 1", "chapter-1.xhtml"));
        navigation.add_item_to_landmarks("cover", "Cover", ".cover.xhtml");
        navigation.add_item_to_landmarks("bodymatter", "Start Of Content", "chapter-1.xhtml");

        let document = navigation.document();
        let navs = document.root.find_elements_by_name("nav");
        assert_eq!(navs.len(), 2);
        assert_eq!(navs[0].attr("epub:type"), Some("toc"));
        assert_eq!(navs[1].attr("epub:type"), Some("landmarks"));
        assert_eq!(navs[1].attr("hidden"), Some("hidden"));

        let landmarks_ol = navs[1].find_child("ol").unwrap();
        assert_eq!(landmarks_ol.children().len(), 2);
        let anchor = landmarks_ol.children()[0].find_child("a").unwrap();
        assert_eq!(anchor.attr("epub:type"), Some("cover"));
        assert_eq!(anchor.attr("href"), Some(".cover.xhtml"));
    }

    #[test]
    fn test_landmarks_dropped_under_epub2() {
        let mut navigation = NavigationDocument::new(EpubVersion::Epub2).unwrap();
        navigation.add_item_to_landmarks("cover", "Cover", ".cover.xhtml");

        let document = navigation.document();
        assert!(document.root.find_elements_by_name("ol").is_empty());
    }
}
