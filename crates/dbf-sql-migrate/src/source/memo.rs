//! Memo file access (`.fpt` for FoxPro, `.dbt` for dBase).
//!
//! Memo columns in the table file only hold a block number; the text lives in
//! a companion file with the same stem:
//!
//! - FPT: 512-byte header with a big-endian block size at offset 6; each block
//!   starts with a big-endian type and length (8 bytes) followed by the data
//! - DBT (dBase III): 512-byte blocks, data terminated by `0x1A 0x1A`
//! - DBT (dBase IV): block size at offset 20 (little-endian); each block
//!   starts with `FF FF 08 00` and a little-endian length that includes the
//!   8-byte block header

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Buf;

use crate::error::{MigrateError, Result};

/// Block size used by dBase III memo files and as a fallback.
const DEFAULT_BLOCK_SIZE: u64 = 512;

/// dBase III memo terminator.
const DBT_TERMINATOR: [u8; 2] = [0x1A, 0x1A];

/// dBase IV block header signature.
const DBT4_SIGNATURE: [u8; 4] = [0xFF, 0xFF, 0x08, 0x00];

/// dBase III table version byte with memo.
const DBASE3_WITH_MEMO: u8 = 0x83;

/// Memo file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoFormat {
    Fpt,
    Dbt3,
    Dbt4,
}

/// An open memo file.
#[derive(Debug)]
pub struct MemoFile {
    path: PathBuf,
    file: BufReader<File>,
    format: MemoFormat,
    block_size: u64,
    len: u64,
}

impl MemoFile {
    /// Open a memo file and read its block size from the header.
    pub fn open(path: &Path, format: MemoFormat) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut file = BufReader::new(file);

        let block_size = match format {
            MemoFormat::Fpt => {
                let mut header = [0u8; 8];
                file.read_exact(&mut header)
                    .map_err(|_| MemoFile::malformed_at(path, "memo header is truncated"))?;
                let mut buf = &header[6..];
                u64::from(buf.get_u16())
            }
            MemoFormat::Dbt4 => {
                let mut header = [0u8; 22];
                file.read_exact(&mut header)
                    .map_err(|_| MemoFile::malformed_at(path, "memo header is truncated"))?;
                let mut buf = &header[20..];
                u64::from(buf.get_u16_le())
            }
            MemoFormat::Dbt3 => DEFAULT_BLOCK_SIZE,
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            format,
            block_size: if block_size == 0 {
                DEFAULT_BLOCK_SIZE
            } else {
                block_size
            },
            len,
        })
    }

    pub fn format(&self) -> MemoFormat {
        self.format
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Read the memo stored at `block`.
    pub fn read_block(&mut self, block: u32) -> Result<Vec<u8>> {
        let offset = u64::from(block) * self.block_size;
        if offset >= self.len {
            return Err(self.malformed(format!(
                "memo block {} is past the end of the file",
                block
            )));
        }
        self.file.seek(SeekFrom::Start(offset))?;

        match self.format {
            MemoFormat::Fpt => {
                let mut header = [0u8; 8];
                self.read_block_header(&mut header, block)?;
                let mut buf = &header[..];
                let _block_type = buf.get_u32();
                let length = u64::from(buf.get_u32());
                self.read_exact_len(offset + 8, length, block)
            }
            MemoFormat::Dbt4 => {
                let mut header = [0u8; 8];
                self.read_block_header(&mut header, block)?;
                if header[..4] != DBT4_SIGNATURE {
                    self.file.seek(SeekFrom::Start(offset))?;
                    return self.read_terminated(offset);
                }
                let mut buf = &header[4..];
                let length = u64::from(buf.get_u32_le()).saturating_sub(8);
                self.read_exact_len(offset + 8, length, block)
            }
            MemoFormat::Dbt3 => self.read_terminated(offset),
        }
    }

    fn read_block_header(&mut self, header: &mut [u8], block: u32) -> Result<()> {
        self.file
            .read_exact(header)
            .map_err(|_| self.malformed(format!("memo block {} header is truncated", block)))
    }

    fn read_exact_len(&mut self, start: u64, length: u64, block: u32) -> Result<Vec<u8>> {
        if start + length > self.len {
            return Err(self.malformed(format!(
                "memo block {} declares {} bytes but the file ends first",
                block, length
            )));
        }
        let mut data = vec![0u8; length as usize];
        self.file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Read until the dBase III terminator or the end of the file.
    fn read_terminated(&mut self, start: u64) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let mut chunk = vec![0u8; self.block_size as usize];
        let mut remaining = self.len - start;

        while remaining > 0 {
            let want = remaining.min(self.block_size) as usize;
            self.file.read_exact(&mut chunk[..want])?;
            remaining -= want as u64;

            // A terminator may straddle two chunks.
            let scan_from = data.len().saturating_sub(1);
            data.extend_from_slice(&chunk[..want]);
            if let Some(pos) = data[scan_from..]
                .windows(2)
                .position(|w| w == DBT_TERMINATOR)
            {
                data.truncate(scan_from + pos);
                return Ok(data);
            }
        }

        // Single trailing terminator or none at all.
        if data.last() == Some(&DBT_TERMINATOR[0]) {
            data.pop();
        }
        Ok(data)
    }

    fn malformed(&self, message: impl Into<String>) -> MigrateError {
        Self::malformed_at(&self.path, message)
    }

    fn malformed_at(path: &Path, message: impl Into<String>) -> MigrateError {
        MigrateError::malformed(path.display().to_string(), message)
    }
}

/// Locate the memo file that belongs to `table_path`.
///
/// Matches the table's stem case-insensitively against `.fpt` and `.dbt`
/// files in the same directory. FPT wins when both exist.
pub fn find_memo_file(table_path: &Path, version: u8) -> Result<Option<(PathBuf, MemoFormat)>> {
    let Some(stem) = table_path.file_stem().and_then(|s| s.to_str()) else {
        return Ok(None);
    };
    let dir = match table_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut fpt = None;
    let mut dbt = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let same_stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.eq_ignore_ascii_case(stem));
        if !same_stem || !path.is_file() {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("fpt") => fpt = Some(path),
            Some(ext) if ext.eq_ignore_ascii_case("dbt") => dbt = Some(path),
            _ => {}
        }
    }

    if let Some(path) = fpt {
        return Ok(Some((path, MemoFormat::Fpt)));
    }
    Ok(dbt.map(|path| {
        let format = if version == DBASE3_WITH_MEMO {
            MemoFormat::Dbt3
        } else {
            MemoFormat::Dbt4
        };
        (path, format)
    }))
}
