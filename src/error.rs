//! Error Type Definition Module
//!
//! This module defines the error types that may be encountered while
//! assembling or inspecting an EPUB publication. All errors are uniformly
//! wrapped in the `EpubError` enumeration for convenient handling by the
//! caller.
//!
//! ## Main Error Types
//!
//! - [EpubError] - Enumeration of main errors during EPUB processing
//! - [EpubWriterError] - Specific violations raised while accumulating state
//!   in an [EpubWriter](crate::writer::EpubWriter)

use thiserror::Error;

/// Types of errors that can occur during EPUB processing
///
/// This enumeration covers both the assembly side (archive writing, XML
/// rendering) and the inspection side (locating and parsing the container
/// pointer and package document of a finished publication).
#[derive(Debug, Error)]
pub enum EpubError {
    /// ZIP archive related errors
    ///
    /// Errors raised by the underlying archive while creating or
    /// reading entries.
    #[error("Archive error: {source}")]
    ArchiveError { source: zip::result::ZipError },

    /// Missing container pointer error
    ///
    /// The publication does not carry a `META-INF/container.xml` entry,
    /// so the package document cannot be located.
    #[error("Non-canonical epub: The \"META-INF/container.xml\" file was not found.")]
    ContainerXmlNotFound,

    #[error("Epub writer error: {source}")]
    EpubWriterError { source: EpubWriterError },

    /// XML parsing failure error
    ///
    /// This error occurs when the event stream of an XML document ends
    /// without ever producing a root element. It usually indicates a
    /// truncated or malformed file.
    #[error(
        "Failed parsing XML error: Unknown problems occurred during XML parsing, causing parsing failure."
    )]
    FailedParsingXml,

    /// Invalid EPUB version error
    ///
    /// Raised whenever `EpubVersion::Unknown` reaches a component that
    /// needs a concrete format generation to operate.
    #[error("Invalid EPUB version: A concrete EPUB version (2 or 3) is required.")]
    InvalidVersion,

    #[error("IO error: {source}")]
    IOError { source: std::io::Error },

    /// Missing package document error
    ///
    /// The container pointer exists but the package document it references
    /// cannot be located or resolved.
    #[error("Non-canonical epub: The package document was not found.")]
    PackageDocumentNotFound,

    /// QuickXml error
    ///
    /// This error occurs when rendering or parsing XML data with the
    /// QuickXml library.
    #[error("QuickXml error: {source}")]
    QuickXmlError { source: quick_xml::Error },

    /// Unable to find the resource error
    ///
    /// This error occurs when an attempt is made to open a resource
    /// that does not exist in the EPUB container.
    #[error("Resource not found: Unable to find resource from \"{resource}\".")]
    ResourceNotFound { resource: String },

    /// Background task error
    ///
    /// This error occurs when the blocking task driving an asynchronous
    /// archive finalization panics or is cancelled.
    #[cfg(feature = "async")]
    #[error("Task error: {source}")]
    TaskJoinError { source: tokio::task::JoinError },

    /// UTF-8 decoding error
    ///
    /// This error occurs when attempting to decode byte data into a UTF-8
    /// string but the data is not formatted correctly.
    #[error("Decode error: {source}")]
    Utf8DecodeError { source: std::string::FromUtf8Error },
}

impl From<zip::result::ZipError> for EpubError {
    fn from(value: zip::result::ZipError) -> Self {
        EpubError::ArchiveError { source: value }
    }
}

impl From<quick_xml::Error> for EpubError {
    fn from(value: quick_xml::Error) -> Self {
        EpubError::QuickXmlError { source: value }
    }
}

impl From<std::io::Error> for EpubError {
    fn from(value: std::io::Error) -> Self {
        EpubError::IOError { source: value }
    }
}

impl From<std::string::FromUtf8Error> for EpubError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        EpubError::Utf8DecodeError { source: value }
    }
}

impl From<EpubWriterError> for EpubError {
    fn from(value: EpubWriterError) -> Self {
        EpubError::EpubWriterError { source: value }
    }
}

#[cfg(feature = "async")]
impl From<tokio::task::JoinError> for EpubError {
    fn from(value: tokio::task::JoinError) -> Self {
        EpubError::TaskJoinError { source: value }
    }
}

#[cfg(test)]
impl PartialEq for EpubError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::ResourceNotFound {
                    resource: l_resource,
                },
                Self::ResourceNotFound {
                    resource: r_resource,
                },
            ) => l_resource == r_resource,
            (
                Self::EpubWriterError { source: l_source },
                Self::EpubWriterError { source: r_source },
            ) => l_source == r_source,

            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

/// Types of violations that can occur while accumulating writer state
///
/// This enumeration defines the conditions under which a registration call
/// on an `EpubWriter` is rejected. Every one of these is raised at the call
/// that caused it; none is deferred to finalization, and none is retried.
#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq))]
pub enum EpubWriterError {
    /// Duplicate cover registration error
    ///
    /// This error is triggered when a raster cover has already been
    /// registered on this writer instance.
    #[error("A cover has already been added.")]
    CoverAlreadyAdded,

    /// Reserved resource name error
    ///
    /// File names starting with the reserved prefix are used for generated
    /// system documents and may not be claimed by caller resources.
    #[error("The resource name '{href}' collides with the reserved '{prefix}' prefix.")]
    ReservedResourceName { href: String, prefix: String },

    /// Duplicate resource registration error
    ///
    /// This error is triggered when a resource resolves to an archive path
    /// that has already been claimed. The earlier registration stays intact.
    #[error("A resource already exists at '{path}'.")]
    ResourceAlreadyExists { path: String },

    /// Duplicate table-of-contents registration error
    ///
    /// This error is triggered when a table of contents has already been
    /// registered on this writer instance.
    #[error("A table of contents has already been added.")]
    TocAlreadyAdded,
}
