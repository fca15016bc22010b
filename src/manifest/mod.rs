//! Smooth Streaming manifest writers.
//!
//! - [`client`]: the `.ismc` document players fetch (`SmoothStreamingMedia`)
//! - [`server`]: the `.ism` SMIL document the origin uses to locate tracks
//!
//! Both are rendered with quick-xml using two-space indentation.

pub mod client;
pub mod server;

pub use client::generate_client_manifest;
pub use server::generate_server_manifest;

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// File name of the server manifest for an asset.
pub fn server_manifest_name(name: &str) -> String {
    format!("{}.ism", name)
}

/// File name of the client manifest for an asset.
pub fn client_manifest_name(name: &str) -> String {
    format!("{}.ismc", name)
}

/// Thin wrapper over an indenting quick-xml writer.
pub(crate) struct XmlDocument {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlDocument {
    pub(crate) fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    pub(crate) fn declaration(&mut self) -> Result<()> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
    }

    pub(crate) fn open(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.write(Event::Start(element))
    }

    pub(crate) fn close(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    pub(crate) fn empty(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.write(Event::Empty(element))
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .context("Failed to write manifest XML")
    }

    pub(crate) fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner().into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).context("Manifest XML is not UTF-8")
    }
}

/// Start tag with the given attributes, in order.
pub(crate) fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for &attr in attributes {
        start.push_attribute(attr);
    }
    start
}
