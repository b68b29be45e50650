//! In-memory ZIP fixtures for unit tests

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

enum FixtureEntry {
    File(String, Vec<u8>),
    Dir(String),
}

/// Builder for small ZIP archives held in memory
pub struct ZipBuilder {
    entries: Vec<FixtureEntry>,
    method: CompressionMethod,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            method: CompressionMethod::Deflated,
        }
    }

    /// Store entries uncompressed (needed by [`encrypt_flags`]).
    pub fn stored(mut self) -> Self {
        self.method = CompressionMethod::Stored;
        self
    }

    pub fn file(mut self, name: &str, contents: &[u8]) -> Self {
        self.entries
            .push(FixtureEntry::File(name.to_string(), contents.to_vec()));
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.entries.push(FixtureEntry::Dir(name.to_string()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(self.method);
        for entry in self.entries {
            match entry {
                FixtureEntry::File(name, contents) => {
                    zip.start_file(name, options).expect("start file");
                    zip.write_all(&contents).expect("write contents");
                }
                FixtureEntry::Dir(name) => {
                    zip.add_directory(name, options).expect("add directory");
                }
            }
        }
        zip.finish().expect("finish zip").into_inner()
    }
}

/// Set the "encrypted" general purpose flag on every local and central header.
///
/// Only meaningful for stored archives whose payloads contain no `PK` header
/// signatures.
pub fn encrypt_flags(mut bytes: Vec<u8>) -> Vec<u8> {
    const LOCAL: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
    const CENTRAL: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];

    let mut i = 0;
    while i + 4 <= bytes.len() {
        if bytes[i..i + 4] == LOCAL && i + 6 < bytes.len() {
            bytes[i + 6] |= 0x01;
        } else if bytes[i..i + 4] == CENTRAL && i + 8 < bytes.len() {
            bytes[i + 8] |= 0x01;
        }
        i += 1;
    }
    bytes
}

/// Build `depth` levels of nesting: `level1.zip` contains `level2.zip`, and
/// so on. The innermost archive holds `innermost` as `(name, contents)`.
pub fn nested_chain(depth: usize, innermost: (&str, &[u8])) -> Vec<u8> {
    let mut current = ZipBuilder::new()
        .file(innermost.0, innermost.1)
        .build();
    for level in (1..=depth).rev() {
        current = ZipBuilder::new()
            .file(&format!("level{level}.zip"), &current)
            .build();
    }
    current
}
