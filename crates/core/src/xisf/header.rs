//! XML header construction.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::error::EncodeError;
use super::types::{Codec, SampleFormat};
use crate::metadata::MetadataRecord;

const XISF_NAMESPACE: &str = "http://www.pixinsight.com/xisf";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str = "http://www.pixinsight.com/xisf http://pixinsight.com/xisf/xisf-1.0.xsd";

type XmlResult = Result<(), Box<dyn std::error::Error>>;

/// Everything the header says about the attached pixel block.
#[derive(Debug, Clone)]
pub(crate) struct ImageDescriptor {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub sample_format: SampleFormat,
    /// Sample range of a floating point image.
    pub bounds: Option<(f64, f64)>,
    /// Byte offset of the block from the start of the file.
    pub position: usize,
    /// Stored (possibly compressed) block size.
    pub size: usize,
    pub compression: Option<BlockCompression>,
}

#[derive(Debug, Clone)]
pub(crate) struct BlockCompression {
    pub codec: Codec,
    pub uncompressed_size: usize,
    /// Item size when the block was byte-shuffled.
    pub shuffle_item_size: Option<usize>,
}

impl BlockCompression {
    /// `zlib+sh:1048576:2` or `zstd:1048576`.
    pub fn attribute(&self) -> String {
        match self.shuffle_item_size {
            Some(item) => format!("{}+sh:{}:{}", self.codec, self.uncompressed_size, item),
            None => format!("{}:{}", self.codec, self.uncompressed_size),
        }
    }
}

/// File-level properties written to the `Metadata` element.
#[derive(Debug, Clone)]
pub(crate) struct FileProperties<'a> {
    pub creator_app: &'a str,
    pub creation_time: String,
    pub codec: Option<(Codec, i32)>,
}

/// Rejects keyword text that XML 1.0 cannot carry in an attribute.
pub(crate) fn check_metadata(record: &MetadataRecord) -> Result<(), EncodeError> {
    for (keyword, entries) in record.iter() {
        if let Some(c) = keyword.chars().find(|c| !c.is_ascii() || c.is_ascii_control()) {
            return Err(EncodeError::metadata_incompatible(
                keyword,
                format!("keyword name contains {c:?}"),
            ));
        }
        for entry in entries {
            for (field, text) in [("value", &entry.value), ("comment", &entry.comment)] {
                if let Some(c) = text.chars().find(|c| !is_xml_char(*c)) {
                    return Err(EncodeError::metadata_incompatible(
                        keyword,
                        format!("{field} contains {c:?}"),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Characters allowed in XML 1.0 attribute values without being normalized away.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Serializes the XML header.
pub(crate) fn build_header(
    image: &ImageDescriptor,
    metadata: Option<&MetadataRecord>,
    properties: &FileProperties<'_>,
) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);
    write_document(&mut writer, image, metadata, properties).map_err(|e| EncodeError::Header {
        reason: e.to_string(),
    })?;
    Ok(writer.into_inner())
}

fn write_document(
    writer: &mut Writer<Vec<u8>>,
    image: &ImageDescriptor,
    metadata: Option<&MetadataRecord>,
    properties: &FileProperties<'_>,
) -> XmlResult {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("xisf");
    root.push_attribute(("version", "1.0"));
    root.push_attribute(("xmlns", XISF_NAMESPACE));
    root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
    root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(root))?;

    let geometry = format!("{}:{}:{}", image.width, image.height, image.channels);
    let location = format!("attachment:{}:{}", image.position, image.size);
    let color_space = if image.channels == 3 { "RGB" } else { "Gray" };

    let mut element = BytesStart::new("Image");
    element.push_attribute(("geometry", geometry.as_str()));
    element.push_attribute(("sampleFormat", image.sample_format.as_str()));
    let bounds = image.bounds.map(|(low, high)| format!("{low}:{high}"));
    if let Some(bounds) = &bounds {
        element.push_attribute(("bounds", bounds.as_str()));
    }
    element.push_attribute(("colorSpace", color_space));
    element.push_attribute(("location", location.as_str()));
    let compression = image.compression.as_ref().map(BlockCompression::attribute);
    if let Some(compression) = &compression {
        element.push_attribute(("compression", compression.as_str()));
    }

    match metadata.filter(|m| !m.is_empty()) {
        Some(record) => {
            writer.write_event(Event::Start(element))?;
            for (keyword, entries) in record.iter() {
                for entry in entries {
                    let mut card = BytesStart::new("FITSKeyword");
                    card.push_attribute(("name", keyword));
                    card.push_attribute(("value", entry.value.as_str()));
                    card.push_attribute(("comment", entry.comment.as_str()));
                    writer.write_event(Event::Empty(card))?;
                }
            }
            writer.write_event(Event::End(BytesEnd::new("Image")))?;
        }
        None => writer.write_event(Event::Empty(element))?,
    }

    writer.write_event(Event::Start(BytesStart::new("Metadata")))?;
    write_property(writer, "XISF:CreationTime", "TimePoint", &properties.creation_time)?;
    write_property(writer, "XISF:CreatorApplication", "String", properties.creator_app)?;
    if let Some((codec, level)) = properties.codec {
        write_property(writer, "XISF:CompressionCodecs", "String", codec.as_str())?;
        write_property(writer, "XISF:CompressionLevel", "Int32", &level.to_string())?;
    }
    writer.write_event(Event::End(BytesEnd::new("Metadata")))?;

    writer.write_event(Event::End(BytesEnd::new("xisf")))?;
    Ok(())
}

fn write_property(
    writer: &mut Writer<Vec<u8>>,
    id: &str,
    kind: &str,
    value: &str,
) -> XmlResult {
    let mut property = BytesStart::new("Property");
    property.push_attribute(("id", id));
    property.push_attribute(("type", kind));
    property.push_attribute(("value", value));
    writer.write_event(Event::Empty(property))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::KeywordEntry;

    fn descriptor() -> ImageDescriptor {
        ImageDescriptor {
            width: 640,
            height: 480,
            channels: 1,
            sample_format: SampleFormat::UInt16,
            bounds: None,
            position: 4096,
            size: 1234,
            compression: Some(BlockCompression {
                codec: Codec::Zlib,
                uncompressed_size: 614_400,
                shuffle_item_size: Some(2),
            }),
        }
    }

    fn properties() -> FileProperties<'static> {
        FileProperties {
            creator_app: "fitsbatch",
            creation_time: "2024-03-01T02:00:00Z".to_string(),
            codec: Some((Codec::Zlib, 6)),
        }
    }

    #[test]
    fn test_header_describes_image() {
        let xml = build_header(&descriptor(), None, &properties()).unwrap();
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("geometry=\"640:480:1\""));
        assert!(xml.contains("sampleFormat=\"UInt16\""));
        assert!(xml.contains("colorSpace=\"Gray\""));
        assert!(xml.contains("location=\"attachment:4096:1234\""));
        assert!(xml.contains("compression=\"zlib+sh:614400:2\""));
        assert!(xml.contains("id=\"XISF:CreatorApplication\" type=\"String\" value=\"fitsbatch\""));
        assert!(!xml.contains("FITSKeyword"));
        assert!(!xml.contains("bounds="));
    }

    #[test]
    fn test_float_bounds_attribute() {
        let image = ImageDescriptor {
            sample_format: SampleFormat::Float32,
            bounds: Some((-32768.0, 1.0)),
            ..descriptor()
        };
        let xml = String::from_utf8(build_header(&image, None, &properties()).unwrap()).unwrap();
        assert!(xml.contains("bounds=\"-32768:1\""));
    }

    #[test]
    fn test_keywords_are_escaped() {
        let mut record = MetadataRecord::new();
        record.push("OBJECT", KeywordEntry::new("M51 <\"Whirlpool\">", "a & b"));
        let xml = build_header(&descriptor(), Some(&record), &properties()).unwrap();
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.contains("name=\"OBJECT\""));
        assert!(xml.contains("value=\"M51 &lt;&quot;Whirlpool&quot;&gt;\""));
        assert!(xml.contains("comment=\"a &amp; b\""));
    }

    #[test]
    fn test_check_metadata_rejects_control_characters() {
        let mut record = MetadataRecord::new();
        record.push("OBJECT", KeywordEntry::new("M31", ""));
        assert!(check_metadata(&record).is_ok());

        record.push("NOTE", KeywordEntry::new("bell\u{7}", ""));
        let err = check_metadata(&record).unwrap_err();
        assert!(err.is_metadata_incompatible());

        let mut record = MetadataRecord::new();
        record.push("DATE\u{e9}", KeywordEntry::new("", ""));
        assert!(check_metadata(&record).unwrap_err().is_metadata_incompatible());
    }
}
