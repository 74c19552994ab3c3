//! Cover Page Module
//!
//! The cover page is a generated XHTML document wrapping the raster cover
//! image. It is a pure function of the target version and the image path;
//! there is no state to accumulate.

use crate::{
    error::EpubError,
    types::EpubVersion,
    writer::{OPS_NAMESPACE, XHTML_NAMESPACE},
    xml::{Doctype, XmlDocument, XmlElement},
};

const COVER_CSS: &str = ".cover-container { height: 100%; padding: 0px; margin: 0px; \
     display: flex; flex-direction: column; justify-content: center; align-items: center; \
     text-align: center; } \
     .cover-container img { max-height: 100%; max-width: 100%; object-fit: contain; }";

/// Build the cover page document for a raster cover image
pub(crate) fn raster_document(
    version: EpubVersion,
    image_src: &str,
) -> Result<XmlDocument, EpubError> {
    match version {
        EpubVersion::Epub3 => Ok(epub3_document(image_src)),
        EpubVersion::Epub2 => Ok(epub2_document(image_src)),
        EpubVersion::Unknown => Err(EpubError::InvalidVersion),
    }
}

fn cover_container(image_src: &str) -> XmlElement {
    XmlElement::new("div")
        .with_attr("class", "cover-container")
        .with_child(
            XmlElement::new("img")
                .with_attr("alt", "Cover")
                .with_attr("src", image_src),
        )
}

fn epub3_document(image_src: &str) -> XmlDocument {
    let html = XmlElement::new("html")
        .with_attr("xmlns", XHTML_NAMESPACE)
        .with_attr("xmlns:epub", OPS_NAMESPACE)
        .with_child(
            XmlElement::new("head")
                .with_child(XmlElement::new("title").with_text("Cover"))
                .with_child(XmlElement::new("meta").with_attr("charset", "utf-8"))
                .with_child(XmlElement::new("style").with_text(COVER_CSS)),
        )
        .with_child(
            XmlElement::new("body").with_child(
                XmlElement::new("section")
                    .with_attr("epub:type", "cover")
                    .with_child(cover_container(image_src)),
            ),
        );

    XmlDocument::new(html).with_doctype(Doctype::bare("html"))
}

fn epub2_document(image_src: &str) -> XmlDocument {
    let html = XmlElement::new("html")
        .with_attr("xmlns", XHTML_NAMESPACE)
        .with_child(
            XmlElement::new("head")
                .with_child(XmlElement::new("title").with_text("Cover"))
                .with_child(
                    XmlElement::new("meta")
                        .with_attr("http-equiv", "content-type")
                        .with_attr("content", "application/xhtml+xml; charset=utf-8"),
                )
                .with_child(
                    XmlElement::new("style")
                        .with_attr("type", "text/css")
                        .with_text(COVER_CSS),
                ),
        )
        .with_child(XmlElement::new("body").with_child(cover_container(image_src)));

    XmlDocument::new(html).with_doctype(Doctype::public(
        "html",
        "-//W3C//DTD XHTML 1.1//EN",
        "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd",
    ))
}
