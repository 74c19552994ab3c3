//! Container Pointer Module
//!
//! `META-INF/container.xml` is the entry point of every EPUB container: it
//! names the full path of the package document. The document is a pure
//! function of that path and never depends on later writer state, which is
//! why it can be written at open time.

use crate::{
    error::EpubError,
    mediatype::APPLICATION_OEBPS_PACKAGE_XML,
    types::EpubVersion,
    writer::CONTAINER_NAMESPACE,
    xml::{XmlDocument, XmlElement},
};

/// Build the container pointer document referencing the package document
pub(crate) fn container_document(
    version: EpubVersion,
    package_document_path: &str,
) -> Result<XmlDocument, EpubError> {
    if version == EpubVersion::Unknown {
        return Err(EpubError::InvalidVersion);
    }

    let container = XmlElement::new("container")
        .with_attr("xmlns", CONTAINER_NAMESPACE)
        .with_attr("version", "1.0")
        .with_child(
            XmlElement::new("rootfiles").with_child(
                XmlElement::new("rootfile")
                    .with_attr("full-path", package_document_path)
                    .with_attr("media-type", APPLICATION_OEBPS_PACKAGE_XML),
            ),
        );

    Ok(XmlDocument::new(container))
}
