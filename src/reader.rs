//! Epub Reader
//!
//! A small inspection facade over a finished publication. It locates the
//! container pointer, resolves the package document, classifies the format
//! generation, and exposes resource access plus a best-effort last-modified
//! resolution. It deliberately does not attempt full conformance parsing.

use std::io::{Read, Seek};

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use zip::{ZipArchive, result::ZipError};

use crate::{
    error::EpubError,
    types::EpubVersion,
    xml::{self, XmlElement},
};

/// EPUB publication inspector
///
/// Parses the two documents needed to classify a publication when it is
/// opened: `META-INF/container.xml` and the package document it points at.
/// Everything else is accessed lazily through the archive.
pub struct EpubReader<R: Read + Seek> {
    archive: ZipArchive<R>,

    /// The archive path of the package document
    package_path: String,

    /// The parsed package document tree
    package: XmlElement,

    /// The classified format generation
    version: EpubVersion,
}

impl<R: Read + Seek> EpubReader<R> {
    /// Open a publication from a reader
    ///
    /// # Return
    /// - `Ok(EpubReader)`: The publication could be located and classified
    /// - `Err(EpubError)`: The container pointer or package document is
    ///   missing, or one of them cannot be parsed
    pub fn new(reader: R) -> Result<Self, EpubError> {
        let mut archive = ZipArchive::new(reader)?;

        let container_data = match read_entry(&mut archive, "META-INF/container.xml") {
            Ok(data) => data,
            Err(EpubError::ArchiveError {
                source: ZipError::FileNotFound,
            }) => return Err(EpubError::ContainerXmlNotFound),
            Err(err) => return Err(err),
        };
        let container = xml::parse_bytes(container_data)?;

        let package_path = container
            .find_elements_by_name("rootfile")
            .first()
            .and_then(|rootfile| rootfile.attr("full-path"))
            .map(str::to_string)
            .ok_or(EpubError::PackageDocumentNotFound)?;

        let package_data = match read_entry(&mut archive, &package_path) {
            Ok(data) => data,
            Err(EpubError::ArchiveError {
                source: ZipError::FileNotFound,
            }) => return Err(EpubError::PackageDocumentNotFound),
            Err(err) => return Err(err),
        };
        let package = xml::parse_bytes(package_data)?;

        let version = match package.attr("version") {
            Some("3.0") => EpubVersion::Epub3,
            Some("2.0") => EpubVersion::Epub2,
            _ => EpubVersion::Unknown,
        };

        Ok(EpubReader {
            archive,
            package_path,
            package,
            version,
        })
    }

    /// The classified format generation of the publication
    pub fn version(&self) -> EpubVersion {
        self.version
    }

    /// The archive path of the package document
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    /// All entry paths of the archive
    pub fn resources(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Read the raw bytes of a resource
    pub fn open_resource(&mut self, resource: &str) -> Result<Vec<u8>, EpubError> {
        match read_entry(&mut self.archive, resource) {
            Err(EpubError::ArchiveError {
                source: ZipError::FileNotFound,
            }) => Err(EpubError::ResourceNotFound {
                resource: resource.to_string(),
            }),
            result => result,
        }
    }

    /// The `dcterms:modified` metadata value
    ///
    /// This is an EPUB 3 mechanism; under every other version the result
    /// is `None`.
    pub fn modified(&self) -> Option<String> {
        if self.version != EpubVersion::Epub3 {
            return None;
        }

        self.package
            .find_elements_by_name("meta")
            .iter()
            .find(|meta| meta.attr("property") == Some("dcterms:modified"))
            .and_then(|meta| meta.text())
            .map(str::to_string)
    }

    /// The `dc:date` metadata value
    pub fn date(&self) -> Option<String> {
        self.package
            .find_elements_by_name("date")
            .first()
            .and_then(|date| date.text())
            .map(str::to_string)
    }

    /// Best-effort resolution of the publication's last modification
    ///
    /// Prefers the EPUB 3 modified metadata; falls back to the maximum of
    /// all archive entry timestamps and the `dc:date` value.
    pub fn guess_last_modified(&mut self) -> DateTime<Utc> {
        if let Some(modified) = self.modified().as_deref().and_then(parse_timestamp) {
            return modified;
        }

        let mut latest = self
            .date()
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH);

        for index in 0..self.archive.len() {
            let Ok(file) = self.archive.by_index(index) else {
                continue;
            };
            if let Some(timestamp) = file.last_modified().and_then(entry_timestamp) {
                latest = latest.max(timestamp);
            }
        }

        latest
    }
}

/// Extracts the contents of a specified entry from the archive
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, EpubError> {
    let mut buffer = Vec::new();
    match archive.by_name(name) {
        Ok(mut file) => {
            file.read_to_end(&mut buffer).map_err(EpubError::from)?;
            Ok(buffer)
        }
        Err(err) => Err(EpubError::from(err)),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn entry_timestamp(datetime: zip::DateTime) -> Option<DateTime<Utc>> {
    let timestamp = NaiveDate::from_ymd_opt(
        datetime.year() as i32,
        datetime.month() as u32,
        datetime.day() as u32,
    )
    .and_then(|date| {
        date.and_hms_opt(
            datetime.hour() as u32,
            datetime.minute() as u32,
            datetime.second() as u32,
        )
    })
    .map(|naive| naive.and_utc());

    if timestamp.is_none() {
        warn!("skipping unrepresentable entry timestamp in archive");
    }

    timestamp
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use chrono::{TimeZone, Utc};
    use zip::{ZipWriter, write::FileOptions};

    use crate::{
        error::EpubError,
        reader::EpubReader,
        types::{EpubResource, EpubVersion},
        writer::EpubWriter,
    };

    const IDENTIFIER: &str = "urn:uuid:12345678-1234-1234-1234-123456789012";

    fn assemble(version: EpubVersion, date: Option<chrono::DateTime<Utc>>) -> Vec<u8> {
        let mut writer = EpubWriter::create(Cursor::new(Vec::new()), version).unwrap();
        writer.identifier = IDENTIFIER.to_string();
        writer.modified = Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).unwrap();
        writer.date = date;
        writer
            .add_resource(
                &mut "<html><body/></html>".as_bytes(),
                EpubResource::new("chapter-1.xhtml"),
            )
            .unwrap();
        writer.close().unwrap().into_inner()
    }

    #[test]
    fn test_classifies_epub3() {
        let reader = EpubReader::new(Cursor::new(assemble(EpubVersion::Epub3, None))).unwrap();

        assert_eq!(reader.version(), EpubVersion::Epub3);
        assert_eq!(reader.package_path(), "OEBPS/.package.opf");
    }

    #[test]
    fn test_classifies_epub2() {
        let reader = EpubReader::new(Cursor::new(assemble(EpubVersion::Epub2, None))).unwrap();

        assert_eq!(reader.version(), EpubVersion::Epub2);
    }

    #[test]
    fn test_resource_enumeration_and_access() {
        let mut reader =
            EpubReader::new(Cursor::new(assemble(EpubVersion::Epub3, None))).unwrap();

        let resources = reader.resources();
        assert!(resources.contains(&"mimetype".to_string()));
        assert!(resources.contains(&"OEBPS/chapter-1.xhtml".to_string()));

        let content = reader.open_resource("OEBPS/chapter-1.xhtml").unwrap();
        assert_eq!(content, b"<html><body/></html>");

        let result = reader.open_resource("OEBPS/missing.xhtml");
        assert!(matches!(result, Err(EpubError::ResourceNotFound { .. })));
    }

    #[test]
    fn test_modified_metadata_epub3_only() {
        let epub3 = EpubReader::new(Cursor::new(assemble(EpubVersion::Epub3, None))).unwrap();
        assert_eq!(epub3.modified().as_deref(), Some("2001-02-03T04:05:06Z"));

        let epub2 = EpubReader::new(Cursor::new(assemble(EpubVersion::Epub2, None))).unwrap();
        assert_eq!(epub2.modified(), None);
    }

    #[test]
    fn test_guess_last_modified_prefers_modified_meta() {
        let mut reader =
            EpubReader::new(Cursor::new(assemble(EpubVersion::Epub3, None))).unwrap();

        assert_eq!(
            reader.guess_last_modified(),
            Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).unwrap()
        );
    }

    #[test]
    fn test_guess_last_modified_falls_back_to_date() {
        let date = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let mut reader =
            EpubReader::new(Cursor::new(assemble(EpubVersion::Epub2, Some(date)))).unwrap();

        // No modified meta under EPUB 2; the dc:date value wins over the
        // archive entry timestamps.
        assert_eq!(reader.guess_last_modified(), date);
    }

    #[test]
    fn test_missing_container_xml() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("mimetype", FileOptions::<()>::default())
            .unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        let buffer = zip.finish().unwrap().into_inner();

        let result = EpubReader::new(Cursor::new(buffer));
        assert!(matches!(result, Err(EpubError::ContainerXmlNotFound)));
    }

    #[test]
    fn test_unresolvable_package_document() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("META-INF/container.xml", FileOptions::<()>::default())
            .unwrap();
        zip.write_all(
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
              <container version=\"1.0\"><rootfiles><rootfile/></rootfiles></container>",
        )
        .unwrap();
        let buffer = zip.finish().unwrap().into_inner();

        let result = EpubReader::new(Cursor::new(buffer));
        assert!(matches!(result, Err(EpubError::PackageDocumentNotFound)));
    }

    #[test]
    fn test_dangling_package_document_reference() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("META-INF/container.xml", FileOptions::<()>::default())
            .unwrap();
        zip.write_all(
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
              <container version=\"1.0\"><rootfiles>\
              <rootfile full-path=\"OEBPS/.package.opf\"/>\
              </rootfiles></container>",
        )
        .unwrap();
        let buffer = zip.finish().unwrap().into_inner();

        let result = EpubReader::new(Cursor::new(buffer));
        assert!(matches!(result, Err(EpubError::PackageDocumentNotFound)));
    }

    #[test]
    fn test_unrecognized_version_is_classified_unknown() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("META-INF/container.xml", FileOptions::<()>::default())
            .unwrap();
        zip.write_all(
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
              <container version=\"1.0\"><rootfiles>\
              <rootfile full-path=\"OEBPS/.package.opf\"/>\
              </rootfiles></container>",
        )
        .unwrap();
        zip.start_file("OEBPS/.package.opf", FileOptions::<()>::default())
            .unwrap();
        zip.write_all(b"<package version=\"1.0\"/>").unwrap();
        let buffer = zip.finish().unwrap().into_inner();

        let reader = EpubReader::new(Cursor::new(buffer)).unwrap();
        assert_eq!(reader.version(), EpubVersion::Unknown);
    }
}
