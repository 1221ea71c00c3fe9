// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Text encodings for in-memory strings.

use crate::error::{Error, Result};

/// Encoding of a string stored in a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// Little-endian UTF-16 code units.
    Utf16,
    /// One byte per character, U+0000..=U+00FF.
    Latin1,
}

impl Encoding {
    /// Width of one code unit (and of the null terminator) in bytes.
    pub fn unit_size(&self) -> usize {
        match self {
            Self::Utf8 | Self::Latin1 => 1,
            Self::Utf16 => 2,
        }
    }

    /// Encode `text` without terminator.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Utf16 => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Self::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c))
                        .map_err(|_| Error::Encoding(format!("'{}' is not latin-1", c)))
                })
                .collect(),
        }
    }

    /// Decode raw code units (no terminator).
    pub fn decode(&self, raw: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => {
                String::from_utf8(raw.to_vec()).map_err(|e| Error::Encoding(e.to_string()))
            }
            Self::Utf16 => {
                let units: Vec<u16> = raw
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|e| Error::Encoding(e.to_string()))
            }
            Self::Latin1 => Ok(raw.iter().map(|b| char::from(*b)).collect()),
        }
    }
}
