use std::io::BufRead;

use crate::{Error, LineHashes, MetaHeader, MetaLine, MwrmVersion, Stat};

/// Streaming manifest reader. Parses the header on construction, then
/// yields one [`MetaLine`] per call to [`read_meta_line`](Self::read_meta_line).
#[derive(Debug)]
pub struct MwrmReader<R: BufRead> {
    inner: R,
    header: MetaHeader,
    line_number: u64,
}

impl<R: BufRead> MwrmReader<R> {
    pub fn new(inner: R) -> Result<Self, Error> {
        let mut reader = Self {
            inner,
            header: MetaHeader {
                version: MwrmVersion::V1,
                has_checksum: false,
            },
            line_number: 0,
        };
        reader.header = reader.parse_header()?;
        tracing::debug!(header = ?reader.header, "parsed manifest header");
        Ok(reader)
    }

    pub fn header(&self) -> &MetaHeader {
        &self.header
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Next manifest entry, or `None` at end of file.
    pub fn read_meta_line(&mut self) -> Result<Option<MetaLine>, Error> {
        loop {
            let mut raw = String::new();
            if self.inner.read_line(&mut raw)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let line = raw.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            return match self.parse_line(line) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(error) => {
                    tracing::warn!(line = self.line_number, %error, "malformed manifest line");
                    Err(error)
                }
            };
        }
    }

    /// A v2 manifest opens with a version line, a dimensions line and a
    /// checksum marker; v1 opens with the dimensions line alone. Two
    /// separator lines follow either header.
    fn parse_header(&mut self) -> Result<MetaHeader, Error> {
        let first = self.required_line()?;
        let header = if first.starts_with('v') {
            let _dimensions = self.required_line()?;
            let marker = self.required_line()?;
            MetaHeader {
                version: MwrmVersion::V2,
                has_checksum: marker.starts_with('c'),
            }
        } else {
            MetaHeader {
                version: MwrmVersion::V1,
                has_checksum: false,
            }
        };
        self.required_line()?;
        self.required_line()?;
        Ok(header)
    }

    fn required_line(&mut self) -> Result<String, Error> {
        let mut raw = String::new();
        if self.inner.read_line(&mut raw)? == 0 {
            return Err(Error::TruncatedHeader);
        }
        self.line_number += 1;
        Ok(raw.trim_end_matches(['\n', '\r']).to_owned())
    }

    fn parse_line(&self, line: &str) -> Result<MetaLine, Error> {
        let malformed = |reason| Error::MalformedLine {
            line: self.line_number,
            reason,
        };

        let with_hashes =
            self.header.version == MwrmVersion::V1 || self.header.has_checksum;
        let trailing = match self.header.version {
            MwrmVersion::V1 => 4,
            MwrmVersion::V2 => 10 + if with_hashes { 2 } else { 0 },
        };

        // Filenames may contain spaces, so the fixed-count tail is peeled
        // off from the right and whatever remains is the filename.
        let mut filename = line;
        let mut tail = Vec::with_capacity(trailing);
        for _ in 0..trailing {
            let split = filename.rfind(' ').ok_or_else(|| malformed("too few fields"))?;
            tail.push(&filename[split + 1..]);
            filename = &filename[..split];
        }
        tail.reverse();
        if filename.is_empty() {
            return Err(malformed("empty filename"));
        }

        let mut fields = tail.into_iter();
        let mut number = || -> Result<i64, Error> {
            fields
                .next()
                .ok_or_else(|| malformed("too few fields"))?
                .parse()
                .map_err(|_| malformed("invalid number"))
        };

        let stat = match self.header.version {
            MwrmVersion::V1 => None,
            MwrmVersion::V2 => Some(Stat {
                size: number()?,
                mode: number()?,
                uid: number()?,
                gid: number()?,
                dev: number()?,
                ino: number()?,
                mtime: number()?,
                ctime: number()?,
            }),
        };

        let start_time = number()?;
        let stop_time = number()?;

        let hashes = if with_hashes {
            let hash1 = parse_hash(fields.next()).ok_or_else(|| malformed("invalid hash"))?;
            let hash2 = parse_hash(fields.next()).ok_or_else(|| malformed("invalid hash"))?;
            Some(LineHashes { hash1, hash2 })
        } else {
            None
        };

        Ok(MetaLine {
            filename: filename.to_owned(),
            stat,
            start_time,
            stop_time,
            hashes,
        })
    }
}

fn parse_hash(field: Option<&str>) -> Option<[u8; 32]> {
    let field = field?;
    if field.len() != 64 {
        return None;
    }
    hex::decode(field).ok()?.try_into().ok()
}
