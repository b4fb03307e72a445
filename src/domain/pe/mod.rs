//! PE (Portable Executable) security directory access.
//!
//! Locates the attribute certificate table through data directory 4,
//! iterates its `WIN_CERTIFICATE` entries and computes the Authenticode
//! image digest. Header validation is delegated to goblin; the field offsets
//! needed for digesting are read directly.

use crate::domain::asn1::ByteWindow;
use crate::domain::constants::{
    PE32_DATA_DIRECTORIES_OFFSET, PE32_MAGIC, PE32_PLUS_DATA_DIRECTORIES_OFFSET, PE32_PLUS_MAGIC,
    PE_CHECKSUM_OFFSET, PE_OPTIONAL_HEADER_OFFSET, SECURITY_DIRECTORY_INDEX,
    WIN_CERTIFICATE_ALIGNMENT, WIN_CERTIFICATE_HEADER_SIZE, WIN_CERT_REVISION_1_0,
    WIN_CERT_REVISION_2_0, WIN_CERT_TYPE_PKCS_SIGNED_DATA,
};
use crate::domain::crypto::block_hash::digest_ranges;
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;
use std::ops::Range;
use std::sync::Arc;

/// One `WIN_CERTIFICATE` entry of the attribute certificate table.
#[derive(Debug, Clone)]
pub struct WinCertificate {
    revision: u16,
    certificate_type: u16,
    data: ByteWindow,
}

impl WinCertificate {
    #[must_use]
    pub fn revision(&self) -> u16 {
        self.revision
    }

    #[must_use]
    pub fn certificate_type(&self) -> u16 {
        self.certificate_type
    }

    /// Certificate payload without the 8-byte header.
    #[must_use]
    pub fn data(&self) -> &ByteWindow {
        &self.data
    }

    #[must_use]
    pub fn is_pkcs_signed_data(&self) -> bool {
        self.certificate_type == WIN_CERT_TYPE_PKCS_SIGNED_DATA
    }
}

/// A validated PE image held in a shared buffer.
#[derive(Debug, Clone)]
pub struct PeImage {
    bytes: Arc<[u8]>,
    pe32_plus: bool,
    checksum_offset: usize,
    security_entry_offset: usize,
    certificate_table: Option<Range<usize>>,
}

impl PeImage {
    pub fn parse(bytes: impl Into<Arc<[u8]>>) -> VerifyResult<Self> {
        let bytes: Arc<[u8]> = bytes.into();
        let header = goblin::pe::header::Header::parse(&bytes)?;
        let optional = header.optional_header.ok_or_else(|| {
            VerifyError::PeParsingError("image has no optional header".to_string())
        })?;

        let pe_offset = header.dos_header.pe_pointer as usize;
        let optional_offset = pe_offset + PE_OPTIONAL_HEADER_OFFSET;
        let directories_offset = match optional.standard_fields.magic {
            PE32_MAGIC => optional_offset + PE32_DATA_DIRECTORIES_OFFSET,
            PE32_PLUS_MAGIC => optional_offset + PE32_PLUS_DATA_DIRECTORIES_OFFSET,
            magic => {
                return Err(VerifyError::PeParsingError(format!(
                    "unknown optional header magic 0x{magic:04x}"
                )))
            }
        };
        let pe32_plus = optional.standard_fields.magic == PE32_PLUS_MAGIC;
        let checksum_offset = optional_offset + PE_CHECKSUM_OFFSET;
        let security_entry_offset = directories_offset + SECURITY_DIRECTORY_INDEX * 8;

        let table_offset = read_u32(&bytes, security_entry_offset)? as usize;
        let table_size = read_u32(&bytes, security_entry_offset + 4)? as usize;
        let certificate_table = if table_offset == 0 || table_size == 0 {
            None
        } else {
            let end = table_offset.checked_add(table_size).ok_or_else(|| {
                VerifyError::PeParsingError("certificate table length overflow".to_string())
            })?;
            if end > bytes.len() {
                return Err(VerifyError::PeParsingError(format!(
                    "certificate table {table_offset}..{end} extends past end of file ({} bytes)",
                    bytes.len()
                )));
            }
            Some(table_offset..end)
        };

        log::debug!(
            "PE image: {} bytes, {}, certificate table {:?}",
            bytes.len(),
            if pe32_plus { "PE32+" } else { "PE32" },
            certificate_table
        );

        Ok(Self {
            bytes,
            pe32_plus,
            checksum_offset,
            security_entry_offset,
            certificate_table,
        })
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn is_pe32_plus(&self) -> bool {
        self.pe32_plus
    }

    #[must_use]
    pub fn checksum_offset(&self) -> usize {
        self.checksum_offset
    }

    /// File offset of the security data directory entry.
    #[must_use]
    pub fn security_entry_offset(&self) -> usize {
        self.security_entry_offset
    }

    #[must_use]
    pub fn certificate_table(&self) -> Option<Range<usize>> {
        self.certificate_table.clone()
    }

    /// All `WIN_CERTIFICATE` entries in table order.
    pub fn certificates(&self) -> VerifyResult<Vec<WinCertificate>> {
        let Some(table) = self.certificate_table.clone() else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        let mut offset = table.start;
        while offset < table.end {
            if offset + WIN_CERTIFICATE_HEADER_SIZE > table.end {
                return Err(VerifyError::PeParsingError(format!(
                    "truncated WIN_CERTIFICATE header at offset {offset}"
                )));
            }
            let length = read_u32(&self.bytes, offset)? as usize;
            let revision = read_u16(&self.bytes, offset + 4)?;
            let certificate_type = read_u16(&self.bytes, offset + 6)?;
            if length < WIN_CERTIFICATE_HEADER_SIZE || offset + length > table.end {
                return Err(VerifyError::PeParsingError(format!(
                    "WIN_CERTIFICATE at offset {offset} has invalid length {length}"
                )));
            }
            if revision != WIN_CERT_REVISION_1_0 && revision != WIN_CERT_REVISION_2_0 {
                return Err(VerifyError::PeParsingError(format!(
                    "unsupported WIN_CERTIFICATE revision 0x{revision:04x}"
                )));
            }

            let data = ByteWindow::with_range(
                Arc::clone(&self.bytes),
                offset + WIN_CERTIFICATE_HEADER_SIZE,
                length - WIN_CERTIFICATE_HEADER_SIZE,
            )?;
            entries.push(WinCertificate {
                revision,
                certificate_type,
                data,
            });

            offset = align_up(offset + length, WIN_CERTIFICATE_ALIGNMENT);
        }
        Ok(entries)
    }

    /// Payloads of the PKCS#7 signed-data entries. Other certificate types
    /// are skipped.
    pub fn signatures(&self) -> VerifyResult<Vec<ByteWindow>> {
        Ok(self
            .certificates()?
            .into_iter()
            .filter(|entry| {
                let keep = entry.is_pkcs_signed_data();
                if !keep {
                    log::debug!(
                        "Skipping WIN_CERTIFICATE of type 0x{:04x}",
                        entry.certificate_type
                    );
                }
                keep
            })
            .map(|entry| entry.data)
            .collect())
    }

    /// Byte ranges covered by the Authenticode image digest: everything except
    /// the checksum field, the security directory entry and the certificate
    /// table.
    #[must_use]
    pub fn digest_ranges(&self) -> Vec<Range<usize>> {
        let len = self.bytes.len();
        let (table_start, table_end) = match &self.certificate_table {
            Some(table) => (table.start, table.end),
            None => (len, len),
        };
        let mut ranges = vec![
            0..self.checksum_offset,
            self.checksum_offset + 4..self.security_entry_offset,
            self.security_entry_offset + 8..table_start,
        ];
        if table_end < len {
            ranges.push(table_end..len);
        }
        ranges.retain(|range| range.start < range.end);
        ranges
    }

    /// Authenticode image digest, streamed through the block hash stream.
    pub fn image_digest(&self, algorithm: HashAlgorithm, block_size: usize) -> VerifyResult<Vec<u8>> {
        digest_ranges(algorithm, &self.bytes, &self.digest_ranges(), block_size)
    }
}

fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

fn read_u16(bytes: &[u8], offset: usize) -> VerifyResult<u16> {
    bytes
        .get(offset..offset + 2)
        .map(|field| u16::from_le_bytes([field[0], field[1]]))
        .ok_or_else(|| VerifyError::PeParsingError(format!("read past end of file at {offset}")))
}

fn read_u32(bytes: &[u8], offset: usize) -> VerifyResult<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|field| u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
        .ok_or_else(|| VerifyError::PeParsingError(format!("read past end of file at {offset}")))
}
