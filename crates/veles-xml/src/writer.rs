//! Document-to-XML rendering.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use veles_export::{DocumentCodec, ExportError};
use veles_model::Entry;

use crate::error::{Result, XmlError};

/// Renders nested documents as indented XML.
///
/// Entry attributes become XML attributes in order; child-list keys become
/// element tags. The codec knows nothing about the model the document came
/// from.
#[derive(Debug, Default)]
pub struct XmlCodec;

impl XmlCodec {
    /// Create a codec.
    pub fn new() -> Self {
        Self
    }

    /// Render a document under the given root tag.
    pub fn render(&self, root_tag: &str, document: &Entry) -> Result<String> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| XmlError::Write(e.to_string()))?;

        write_entry(&mut writer, root_tag, document)?;

        String::from_utf8(buffer).map_err(|e| XmlError::Utf8(e.to_string()))
    }
}

impl DocumentCodec for XmlCodec {
    fn serialize(&self, root_tag: &str, document: &Entry) -> veles_export::Result<String> {
        self.render(root_tag, document)
            .map_err(|e| ExportError::Codec(e.to_string()))
    }
}

fn write_entry<W: Write>(writer: &mut Writer<W>, tag: &str, entry: &Entry) -> Result<()> {
    let name = encode_xml_name(tag);

    let mut element = BytesStart::new(name.as_str());
    for (key, value) in entry.attributes() {
        element.push_attribute((encode_xml_name(key).as_str(), value));
    }

    if !entry.has_children() {
        return writer
            .write_event(Event::Empty(element))
            .map_err(|e| XmlError::Write(e.to_string()));
    }

    writer
        .write_event(Event::Start(element))
        .map_err(|e| XmlError::Write(e.to_string()))?;

    for (relation, children) in entry.child_lists() {
        for child in children {
            write_entry(writer, relation, child)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(|e| XmlError::Write(e.to_string()))
}

/// Encode a string as a valid XML name, keeping namespace colons.
fn encode_xml_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());

    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            // First character must be a letter or underscore.
            if c.is_ascii_alphabetic() || c == '_' {
                result.push(c);
            } else {
                result.push('_');
                if c.is_ascii_alphanumeric() {
                    result.push(c);
                }
            }
        } else if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') {
            result.push(c);
        } else {
            result.push('_');
        }
    }

    if result.is_empty() {
        result.push_str("Element");
    }

    result
}
