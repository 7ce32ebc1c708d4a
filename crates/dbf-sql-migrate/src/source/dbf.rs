//! dBase / FoxPro table file reader.
//!
//! File layout:
//!
//! - 32-byte header: version, last update (YMD), record count (u32 LE),
//!   header length (u16 LE), record length (u16 LE), table flags at 28,
//!   code page mark at 29
//! - 32-byte field descriptors until a `0x0D` terminator: name (11 bytes,
//!   NUL padded), type code, displacement, length, decimal count, flags
//! - records starting at the header length, each a one-byte deletion flag
//!   followed by the fixed-width fields; an optional `0x1A` ends the file
//!
//! Visual FoxPro adds a 263-byte backlink after the terminator (covered by the
//! header length) and a hidden `_NullFlags` column whose bits mark NULL values
//! of nullable columns.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Buf;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::core::schema::{FieldDescriptor, FieldType};
use crate::core::traits::{Record, Records, TableReader};
use crate::core::value::RawValue;
use crate::error::{MigrateError, Result};

use super::memo::{find_memo_file, MemoFile};

const HEADER_SIZE: usize = 32;
const FIELD_DESCRIPTOR_SIZE: usize = 32;
const FIELD_NAME_SIZE: usize = 11;
const FIELD_TERMINATOR: u8 = 0x0D;
const EOF_MARKER: u8 = 0x1A;
const DELETED_FLAG: u8 = b'*';

/// Visual FoxPro table flag: table has a memo file.
const VFP_FLAG_MEMO: u8 = 0x02;

/// Julian day number of 0000-12-31, the day before chrono's CE day 1.
const JULIAN_DAY_CE_OFFSET: i64 = 1_721_425;

const MILLIS_PER_DAY: u32 = 86_400_000;

/// Parsed table file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfHeader {
    pub version: u8,
    pub last_update: Option<NaiveDate>,
    pub record_count: u32,
    pub header_length: u16,
    pub record_length: u16,
    pub table_flags: u8,
    pub code_page: u8,
}

impl DbfHeader {
    /// Parse the fixed 32-byte header.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_SIZE {
            return None;
        }
        let mut buf = &data[..HEADER_SIZE];
        let version = buf.get_u8();
        let (yy, mm, dd) = (buf.get_u8(), buf.get_u8(), buf.get_u8());
        let record_count = buf.get_u32_le();
        let header_length = buf.get_u16_le();
        let record_length = buf.get_u16_le();
        buf.advance(16);
        let table_flags = buf.get_u8();
        let code_page = buf.get_u8();

        Some(Self {
            version,
            last_update: NaiveDate::from_ymd_opt(1900 + i32::from(yy), u32::from(mm), u32::from(dd)),
            record_count,
            header_length,
            record_length,
            table_flags,
            code_page,
        })
    }

    /// Visual FoxPro table (with or without autoincrement/varchar support).
    pub fn is_visual_foxpro(&self) -> bool {
        matches!(self.version, 0x30..=0x32)
    }

    /// Whether the header announces a companion memo file.
    pub fn has_memo(&self) -> bool {
        if self.is_visual_foxpro() {
            return self.table_flags & VFP_FLAG_MEMO != 0;
        }
        matches!(self.version, 0x83 | 0x8B | 0xCB | 0xE5 | 0xF5)
    }
}

/// Byte layout of one column inside a record.
#[derive(Debug, Clone)]
struct FieldLayout {
    offset: usize,
    length: usize,
    kind: char,
    decimal_count: u8,
    null_bit: Option<usize>,
}

/// An open legacy table.
///
/// The table file and its memo file stay open until the value is dropped.
#[derive(Debug)]
pub struct DbfTable {
    name: String,
    path: PathBuf,
    header: DbfHeader,
    fields: Vec<FieldDescriptor>,
    layout: Vec<FieldLayout>,
    null_flags: Option<(usize, usize)>,
    file: BufReader<File>,
    memo: Option<MemoFile>,
}

impl DbfTable {
    /// Open a table file, parse its header and attach its memo file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MigrateError::malformed(path.display().to_string(), "file name is not valid UTF-8"))?
            .to_string();
        let malformed = |message: String| MigrateError::malformed(path.display().to_string(), message);

        let mut file = BufReader::new(File::open(path)?);
        let mut fixed = [0u8; HEADER_SIZE];
        read_exact_or(&mut file, &mut fixed, || malformed("header is truncated".into()))?;
        let header = DbfHeader::parse(&fixed).ok_or_else(|| malformed("header is truncated".into()))?;

        let header_length = usize::from(header.header_length);
        if header_length <= HEADER_SIZE {
            return Err(malformed(format!("invalid header length {}", header_length)));
        }
        let mut descriptors = vec![0u8; header_length - HEADER_SIZE];
        read_exact_or(&mut file, &mut descriptors, || {
            malformed("field descriptors are truncated".into())
        })?;

        let all_fields =
            parse_field_descriptors(&descriptors, header.is_visual_foxpro()).map_err(malformed)?;

        let mut fields = Vec::with_capacity(all_fields.len());
        let mut layout = Vec::with_capacity(all_fields.len());
        let mut null_flags = None;
        let mut offset = 1;
        let mut next_null_bit = 0;
        for field in all_fields {
            let length = usize::from(field.field_type.length);
            if field.is_system() {
                if field.name.eq_ignore_ascii_case("_NullFlags") {
                    null_flags = Some((offset, length));
                }
            } else {
                let null_bit = if field.is_nullable() {
                    next_null_bit += 1;
                    Some(next_null_bit - 1)
                } else {
                    None
                };
                layout.push(FieldLayout {
                    offset,
                    length,
                    kind: field.field_type.kind,
                    decimal_count: field.field_type.decimal_count,
                    null_bit,
                });
                fields.push(field);
            }
            offset += length;
        }

        if offset > usize::from(header.record_length) {
            return Err(malformed(format!(
                "fields need {} bytes per record but the header declares {}",
                offset, header.record_length
            )));
        }

        let needs_memo = layout.iter().any(|l| l.kind == 'M');
        let memo = if needs_memo || header.has_memo() {
            match find_memo_file(path, header.version)? {
                Some((memo_path, format)) => {
                    let memo = MemoFile::open(&memo_path, format)?;
                    debug!(
                        "Table {}: using memo file {:?} ({:?}, {}-byte blocks)",
                        name,
                        memo_path,
                        memo.format(),
                        memo.block_size()
                    );
                    Some(memo)
                }
                None if needs_memo => {
                    return Err(malformed("table has memo columns but no .fpt/.dbt file".into()));
                }
                None => None,
            }
        } else {
            None
        };

        debug!(
            "Opened {}: version 0x{:02X}, code page 0x{:02X}, {} records, {} fields",
            path.display(),
            header.version,
            header.code_page,
            header.record_count,
            fields.len()
        );

        Ok(Self {
            name,
            path: path.to_path_buf(),
            header,
            fields,
            layout,
            null_flags,
            file,
            memo,
        })
    }

    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn malformed(&self, message: impl Into<String>) -> MigrateError {
        MigrateError::malformed(self.path.display().to_string(), message)
    }
}

impl TableReader for DbfTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn row_count(&self) -> u64 {
        u64::from(self.header.record_count)
    }

    fn records(&mut self) -> Records<'_> {
        let record_length = usize::from(self.header.record_length);
        Box::new(DbfRecords {
            table: self,
            buf: vec![0u8; record_length],
            next: 0,
            started: false,
            done: false,
        })
    }
}

/// Sequential record iterator over a [`DbfTable`].
struct DbfRecords<'a> {
    table: &'a mut DbfTable,
    buf: Vec<u8>,
    next: u32,
    started: bool,
    done: bool,
}

impl DbfRecords<'_> {
    fn read_next(&mut self) -> Result<Option<Record>> {
        if !self.started {
            let start = u64::from(self.table.header.header_length);
            self.table.file.seek(SeekFrom::Start(start))?;
            self.started = true;
        }
        if self.next >= self.table.header.record_count {
            return Ok(None);
        }

        let number = u64::from(self.next) + 1;
        let (flag, rest) = self.buf.split_at_mut(1);
        match self.table.file.read_exact(flag) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(self.table.malformed(format!(
                    "file ends at record {} of {}",
                    number, self.table.header.record_count
                )));
            }
            Err(e) => return Err(e.into()),
        }
        if flag[0] == EOF_MARKER {
            debug!(
                "Table {}: end-of-file marker after {} of {} records",
                self.table.name,
                number - 1,
                self.table.header.record_count
            );
            return Ok(None);
        }
        let table = &mut *self.table;
        read_exact_or(&mut table.file, rest, || {
            table_malformed(&table.path, format!("record {} is truncated", number))
        })?;
        self.next += 1;

        let record = &self.buf[..];
        let null_flags = table
            .null_flags
            .map(|(offset, length)| &record[offset..offset + length]);

        let mut values = Vec::with_capacity(table.layout.len());
        for field in &table.layout {
            let data = &record[field.offset..field.offset + field.length];
            values.push(decode_field(field, data, null_flags, &mut table.memo, &table.path)?);
        }

        Ok(Some(Record {
            number,
            deleted: record[0] == DELETED_FLAG,
            values,
        }))
    }
}

impl Iterator for DbfRecords<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.read_next().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}

fn table_malformed(path: &Path, message: impl Into<String>) -> MigrateError {
    MigrateError::malformed(path.display().to_string(), message)
}

fn read_exact_or(
    reader: &mut impl Read,
    buf: &mut [u8],
    on_eof: impl FnOnce() -> MigrateError,
) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(on_eof()),
        Err(e) => Err(e.into()),
    }
}

/// Parse descriptors up to the terminator byte.
///
/// Byte 18 only holds field flags in Visual FoxPro tables; older versions
/// reserve it, so it reads as 0 there.
fn parse_field_descriptors(
    data: &[u8],
    visual_foxpro: bool,
) -> std::result::Result<Vec<FieldDescriptor>, String> {
    let mut fields = Vec::new();
    let mut rest = data;

    loop {
        match rest.first() {
            Some(&FIELD_TERMINATOR) => return Ok(fields),
            None => return Err("field descriptor list is not terminated".to_string()),
            Some(_) if rest.len() < FIELD_DESCRIPTOR_SIZE => {
                return Err("field descriptor is truncated".to_string())
            }
            Some(_) => {}
        }

        let (descriptor, tail) = rest.split_at(FIELD_DESCRIPTOR_SIZE);
        rest = tail;

        let name_bytes = &descriptor[..FIELD_NAME_SIZE];
        let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(FIELD_NAME_SIZE);
        let name = String::from_utf8_lossy(&name_bytes[..name_end]).trim().to_string();
        if name.is_empty() {
            return Err(format!("field {} has an empty name", fields.len() + 1));
        }

        let mut buf = &descriptor[FIELD_NAME_SIZE..];
        let kind = char::from(buf.get_u8());
        buf.advance(4);
        let length = u16::from(buf.get_u8());
        let decimal_count = buf.get_u8();
        let flags = if visual_foxpro { buf.get_u8() } else { 0 };

        fields.push(
            FieldDescriptor::new(name, FieldType::new(kind, length, decimal_count)).with_flags(flags),
        );
    }
}

fn decode_field(
    field: &FieldLayout,
    data: &[u8],
    null_flags: Option<&[u8]>,
    memo: &mut Option<MemoFile>,
    path: &Path,
) -> Result<RawValue> {
    if let (Some(bit), Some(flags)) = (field.null_bit, null_flags) {
        if flags.get(bit / 8).is_some_and(|b| b & (1 << (bit % 8)) != 0) {
            return Ok(RawValue::Null);
        }
    }

    let value = match field.kind {
        'C' => RawValue::Bytes(trim_padding(data).to_vec()),
        'N' | 'F' => decode_numeric(data, field.decimal_count),
        'L' => match data.first() {
            Some(b'T' | b't' | b'Y' | b'y') => RawValue::Bool(true),
            Some(b'F' | b'f' | b'N' | b'n') => RawValue::Bool(false),
            _ => RawValue::Null,
        },
        'T' => decode_datetime(data),
        'M' => {
            let block = memo_block(data)
                .ok_or_else(|| table_malformed(path, format!("invalid memo pointer {:?}", data)))?;
            if block == 0 {
                RawValue::Bytes(Vec::new())
            } else {
                let memo = memo
                    .as_mut()
                    .ok_or_else(|| table_malformed(path, "memo file is not open"))?;
                RawValue::Bytes(memo.read_block(block)?)
            }
        }
        _ => RawValue::Bytes(data.to_vec()),
    };
    Ok(value)
}

fn trim_padding(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |p| p + 1);
    &data[..end]
}

fn decode_numeric(data: &[u8], decimal_count: u8) -> RawValue {
    let Ok(text) = std::str::from_utf8(data) else {
        return RawValue::Bytes(data.to_vec());
    };
    let text = text.trim_matches(|c| c == ' ' || c == '\0');
    if text.is_empty() {
        return RawValue::Null;
    }

    if decimal_count == 0 {
        if let Ok(v) = text.parse::<i64>() {
            return RawValue::Integer(v);
        }
    } else if let Ok(v) = text.parse::<f64>() {
        return RawValue::Float(v);
    }
    RawValue::Text(text.to_string())
}

/// Decode an 8-byte Visual FoxPro datetime (Julian day + milliseconds).
fn decode_datetime(data: &[u8]) -> RawValue {
    if data.len() != 8 {
        return RawValue::Bytes(data.to_vec());
    }
    if data.iter().all(|&b| b == 0) || data.iter().all(|&b| b == b' ') {
        return RawValue::Null;
    }

    let mut buf = data;
    let julian_day = i64::from(buf.get_u32_le());
    let millis = buf.get_u32_le();

    let date = i32::try_from(julian_day - JULIAN_DAY_CE_OFFSET)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt);
    let time = (millis < MILLIS_PER_DAY)
        .then(|| {
            NaiveTime::from_num_seconds_from_midnight_opt(millis / 1000, (millis % 1000) * 1_000_000)
        })
        .flatten();

    match (date, time) {
        (Some(date), Some(time)) => RawValue::DateTime(NaiveDateTime::new(date, time)),
        _ => RawValue::Bytes(data.to_vec()),
    }
}

/// Memo block number: 4-byte little-endian in Visual FoxPro, ASCII digits otherwise.
fn memo_block(data: &[u8]) -> Option<u32> {
    if data.len() == 4 {
        let mut buf = data;
        return Some(buf.get_u32_le());
    }
    let text = std::str::from_utf8(data).ok()?.trim_matches(|c| c == ' ' || c == '\0');
    if text.is_empty() {
        return Some(0);
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{FIELD_FLAG_NULLABLE, FIELD_FLAG_SYSTEM};
    use std::io::Write;

    /// Field spec for the fixture writer: name, kind, length, decimals, flags.
    type Spec = (&'static str, char, u8, u8, u8);

    fn table_bytes(version: u8, specs: &[Spec], records: &[Vec<u8>], vfp_backlink: bool) -> Vec<u8> {
        let record_length: usize = 1 + specs.iter().map(|s| usize::from(s.2)).sum::<usize>();
        let backlink = if vfp_backlink { 263 } else { 0 };
        let header_length = HEADER_SIZE + FIELD_DESCRIPTOR_SIZE * specs.len() + 1 + backlink;

        let mut data = vec![0u8; HEADER_SIZE];
        data[0] = version;
        data[1..4].copy_from_slice(&[124, 3, 15]);
        data[4..8].copy_from_slice(&(records.len() as u32).to_le_bytes());
        data[8..10].copy_from_slice(&(header_length as u16).to_le_bytes());
        data[10..12].copy_from_slice(&(record_length as u16).to_le_bytes());

        for (name, kind, length, decimals, flags) in specs {
            let mut descriptor = [0u8; FIELD_DESCRIPTOR_SIZE];
            descriptor[..name.len()].copy_from_slice(name.as_bytes());
            descriptor[11] = *kind as u8;
            descriptor[16] = *length;
            descriptor[17] = *decimals;
            descriptor[18] = *flags;
            data.extend_from_slice(&descriptor);
        }
        data.push(FIELD_TERMINATOR);
        data.resize(header_length, 0);

        for record in records {
            assert_eq!(record.len(), record_length, "fixture record has wrong width");
            data.extend_from_slice(record);
        }
        data.push(EOF_MARKER);
        data
    }

    fn write_table(dir: &Path, file: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(file);
        File::create(&path).unwrap().write_all(data).unwrap();
        path
    }

    fn padded(value: &[u8], width: usize) -> Vec<u8> {
        let mut out = value.to_vec();
        out.resize(width, b' ');
        out
    }

    fn left_padded(value: &str, width: usize) -> Vec<u8> {
        format!("{:>width$}", value, width = width).into_bytes()
    }

    fn vfp_datetime(date: NaiveDate, millis: u32) -> Vec<u8> {
        let julian = date.num_days_from_ce() as u32 + JULIAN_DAY_CE_OFFSET as u32;
        let mut out = julian.to_le_bytes().to_vec();
        out.extend_from_slice(&millis.to_le_bytes());
        out
    }

    use chrono::Datelike;

    fn sample_specs() -> Vec<Spec> {
        vec![
            ("ID", 'N', 5, 0, 0),
            ("NAME", 'C', 20, 0, 0),
            ("ACTIVE", 'L', 1, 0, 0),
            ("JOINED", 'T', 8, 0, 0),
        ]
    }

    fn sample_record(deleted: bool, id: &str, name: &[u8], active: u8, joined: Vec<u8>) -> Vec<u8> {
        let mut record = vec![if deleted { DELETED_FLAG } else { b' ' }];
        record.extend(left_padded(id, 5));
        record.extend(padded(name, 20));
        record.push(active);
        record.extend(joined);
        record
    }

    fn new_year() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn test_header_parse() {
        let data = table_bytes(0x30, &sample_specs(), &[], true);
        let header = DbfHeader::parse(&data).unwrap();
        assert_eq!(header.version, 0x30);
        assert_eq!(header.last_update, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(header.record_count, 0);
        assert_eq!(header.record_length, 35);
        assert!(header.is_visual_foxpro());
        assert!(!header.has_memo());
        assert!(DbfHeader::parse(&data[..10]).is_none());
    }

    #[test]
    fn test_read_fields_and_records() {
        let records = vec![
            sample_record(false, "42", b"Alice", b'T', vfp_datetime(new_year(), 0)),
            sample_record(false, "7", b"Bob", b'F', vfp_datetime(new_year(), 45_296_500)),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "CLIENTS.DBF", &table_bytes(0x30, &sample_specs(), &records, true));

        let mut table = DbfTable::open(&path).unwrap();
        assert_eq!(table.name(), "CLIENTS");
        assert_eq!(table.row_count(), 2);
        let names: Vec<_> = table.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "NAME", "ACTIVE", "JOINED"]);
        assert_eq!(table.fields()[0].field_type, FieldType::new('N', 5, 0));

        let rows: Vec<Record> = table.records().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 1);
        assert_eq!(
            rows[0].values,
            vec![
                RawValue::Integer(42),
                RawValue::Bytes(b"Alice".to_vec()),
                RawValue::Bool(true),
                RawValue::DateTime(new_year().and_hms_opt(0, 0, 0).unwrap()),
            ]
        );
        assert_eq!(
            rows[1].values[3],
            RawValue::DateTime(new_year().and_hms_milli_opt(12, 34, 56, 500).unwrap())
        );
    }

    #[test]
    fn test_records_can_be_iterated_twice() {
        let records = vec![sample_record(false, "1", b"A", b'T', vec![0; 8])];
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "t.dbf", &table_bytes(0x03, &sample_specs(), &records, false));

        let mut table = DbfTable::open(&path).unwrap();
        assert_eq!(table.records().count(), 1);
        assert_eq!(table.records().count(), 1);
    }

    #[test]
    fn test_blank_values_are_null() {
        let record = sample_record(false, "", b"", b'?', vec![0; 8]);
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "blank.dbf", &table_bytes(0x03, &sample_specs(), &[record], false));

        let mut table = DbfTable::open(&path).unwrap();
        let row = table.records().next().unwrap().unwrap();
        assert_eq!(
            row.values,
            vec![
                RawValue::Null,
                RawValue::Bytes(Vec::new()),
                RawValue::Null,
                RawValue::Null
            ]
        );
    }

    #[test]
    fn test_deleted_flag_and_non_utf8_text_are_kept() {
        let record = sample_record(true, "3", b"M\xfcller", b'N', vec![0; 8]);
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "del.dbf", &table_bytes(0x03, &sample_specs(), &[record], false));

        let mut table = DbfTable::open(&path).unwrap();
        let row = table.records().next().unwrap().unwrap();
        assert!(row.deleted);
        assert_eq!(row.values[1], RawValue::Bytes(b"M\xfcller".to_vec()));
        assert_eq!(row.values[2], RawValue::Bool(false));
    }

    #[test]
    fn test_numeric_decoding() {
        assert_eq!(decode_numeric(b"   12.50", 2), RawValue::Float(12.5));
        assert_eq!(decode_numeric(b"  -17", 0), RawValue::Integer(-17));
        assert_eq!(decode_numeric(b"     ", 0), RawValue::Null);
        assert_eq!(decode_numeric(b"*****", 0), RawValue::Text("*****".to_string()));
        assert_eq!(decode_numeric(b"\xff", 0), RawValue::Bytes(vec![0xff]));
    }

    #[test]
    fn test_invalid_datetime_is_kept_as_bytes() {
        let mut data = 2_458_850u32.to_le_bytes().to_vec();
        data.extend_from_slice(&MILLIS_PER_DAY.to_le_bytes());
        assert_eq!(decode_datetime(&data), RawValue::Bytes(data.clone()));
        assert_eq!(decode_datetime(b"        "), RawValue::Null);
    }

    #[test]
    fn test_julian_day_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let mut data = 2_440_588u32.to_le_bytes().to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(
            decode_datetime(&data),
            RawValue::DateTime(epoch.and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_vfp_null_flags() {
        let specs: Vec<Spec> = vec![
            ("ID", 'N', 3, 0, 0),
            ("NICK", 'C', 4, 0, FIELD_FLAG_NULLABLE),
            ("SCORE", 'N', 3, 0, FIELD_FLAG_NULLABLE),
            ("_NullFlags", '0', 1, 0, FIELD_FLAG_SYSTEM),
        ];
        let mut first = vec![b' '];
        first.extend(left_padded("1", 3));
        first.extend(padded(b"abc", 4));
        first.extend(left_padded("9", 3));
        first.push(0b0000_0010);
        let mut second = vec![b' '];
        second.extend(left_padded("2", 3));
        second.extend(padded(b"", 4));
        second.extend(left_padded("5", 3));
        second.push(0b0000_0001);

        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "nulls.dbf", &table_bytes(0x30, &specs, &[first, second], true));

        let mut table = DbfTable::open(&path).unwrap();
        assert_eq!(table.fields().len(), 3);
        let rows: Vec<Record> = table.records().collect::<Result<_>>().unwrap();
        assert_eq!(
            rows[0].values,
            vec![RawValue::Integer(1), RawValue::Bytes(b"abc".to_vec()), RawValue::Null]
        );
        assert_eq!(
            rows[1].values,
            vec![RawValue::Integer(2), RawValue::Null, RawValue::Integer(5)]
        );
    }

    #[test]
    fn test_reserved_descriptor_byte_ignored_outside_visual_foxpro() {
        let specs: Vec<Spec> = vec![("ID", 'N', 3, 0, 0), ("NAME", 'C', 5, 0, FIELD_FLAG_SYSTEM)];
        let mut record = vec![b' '];
        record.extend(left_padded("7", 3));
        record.extend(padded(b"Ann", 5));

        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "old.dbf", &table_bytes(0x03, &specs, &[record], false));

        let mut table = DbfTable::open(&path).unwrap();
        let names: Vec<_> = table.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "NAME"]);
        assert_eq!(table.fields()[1].flags, 0);
        let row = table.records().next().unwrap().unwrap();
        assert_eq!(
            row.values,
            vec![RawValue::Integer(7), RawValue::Bytes(b"Ann".to_vec())]
        );
    }

    #[test]
    fn test_memo_columns_read_from_fpt() {
        let specs: Vec<Spec> = vec![("ID", 'N', 3, 0, 0), ("NOTES", 'M', 4, 0, 0)];
        let mut with_memo = vec![b' '];
        with_memo.extend(left_padded("1", 3));
        with_memo.extend(8u32.to_le_bytes());
        let mut without_memo = vec![b' '];
        without_memo.extend(left_padded("2", 3));
        without_memo.extend(0u32.to_le_bytes());

        let mut table_data = table_bytes(0x30, &specs, &[with_memo, without_memo], true);
        table_data[28] = VFP_FLAG_MEMO;

        let mut fpt = vec![0u8; 512];
        fpt[6..8].copy_from_slice(&64u16.to_be_bytes());
        fpt.extend_from_slice(&1u32.to_be_bytes());
        fpt.extend_from_slice(&5u32.to_be_bytes());
        fpt.extend_from_slice(b"notes");

        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "memo.dbf", &table_data);
        write_table(dir.path(), "MEMO.FPT", &fpt);

        let mut table = DbfTable::open(&path).unwrap();
        assert!(table.header().has_memo());
        let rows: Vec<Record> = table.records().collect::<Result<_>>().unwrap();
        assert_eq!(rows[0].values[1], RawValue::Bytes(b"notes".to_vec()));
        assert_eq!(rows[1].values[1], RawValue::Bytes(Vec::new()));
    }

    #[test]
    fn test_memo_columns_without_memo_file_fail() {
        let specs: Vec<Spec> = vec![("NOTES", 'M', 10, 0, 0)];
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "nomemo.dbf", &table_bytes(0x83, &specs, &[], false));

        let err = DbfTable::open(&path).unwrap_err();
        assert!(matches!(err, MigrateError::Source { .. }));
        assert!(err.to_string().contains("no .fpt/.dbt"));
    }

    #[test]
    fn test_eof_marker_ends_early() {
        let records = vec![sample_record(false, "1", b"A", b'T', vec![0; 8])];
        let mut data = table_bytes(0x03, &sample_specs(), &records, false);
        // Header claims three records; the file holds one plus the EOF marker.
        data[4..8].copy_from_slice(&3u32.to_le_bytes());

        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "short.dbf", &data);
        let mut table = DbfTable::open(&path).unwrap();
        let rows: Vec<Record> = table.records().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_truncated_record_is_an_error() {
        let records = vec![sample_record(false, "1", b"A", b'T', vec![0; 8])];
        let mut data = table_bytes(0x03, &sample_specs(), &records, false);
        data.truncate(data.len() - 10);

        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "cut.dbf", &data);
        let mut table = DbfTable::open(&path).unwrap();
        let mut records = table.records();
        let err = records.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("record 1 is truncated"));
        assert!(records.next().is_none());
    }

    #[test]
    fn test_unterminated_descriptors_are_an_error() {
        let mut data = table_bytes(0x03, &sample_specs(), &[], false);
        let terminator = HEADER_SIZE + FIELD_DESCRIPTOR_SIZE * 4;
        data[terminator] = 0;
        // Shrink the header so the missing terminator is not masked by padding.
        data[8..10].copy_from_slice(&(terminator as u16 + 1).to_le_bytes());

        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "bad.dbf", &data);
        assert!(matches!(
            DbfTable::open(&path),
            Err(MigrateError::Source { .. })
        ));
    }

    #[test]
    fn test_short_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "tiny.dbf", &[0x03, 0, 0]);
        let err = DbfTable::open(&path).unwrap_err();
        assert!(err.to_string().contains("header is truncated"));
    }

    #[test]
    fn test_memo_block_pointer() {
        assert_eq!(memo_block(&[8, 0, 0, 0]), Some(8));
        assert_eq!(memo_block(b"        12"), Some(12));
        assert_eq!(memo_block(b"          "), Some(0));
        assert_eq!(memo_block(b"      abcd"), None);
    }

    #[test]
    fn test_trim_padding() {
        assert_eq!(trim_padding(b"abc   "), b"abc");
        assert_eq!(trim_padding(b"abc\0\0"), b"abc");
        assert_eq!(trim_padding(b"  a b "), b"  a b");
        assert_eq!(trim_padding(b"    "), b"");
    }
}
