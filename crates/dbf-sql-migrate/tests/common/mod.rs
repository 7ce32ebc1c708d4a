//! Fixture writer for legacy table files.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Builds a Visual FoxPro (0x30) table file in memory.
pub struct DbfBuilder {
    fields: Vec<(String, char, u8, u8)>,
    records: Vec<(bool, Vec<Vec<u8>>)>,
}

impl DbfBuilder {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, kind: char, length: u8, decimals: u8) -> Self {
        self.fields.push((name.to_string(), kind, length, decimals));
        self
    }

    /// Add a record; each value is padded or trimmed to its field width.
    pub fn record(mut self, values: Vec<Vec<u8>>) -> Self {
        self.records.push((false, values));
        self
    }

    pub fn deleted_record(mut self, values: Vec<Vec<u8>>) -> Self {
        self.records.push((true, values));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let record_length = 1 + self.fields.iter().map(|f| f.2 as usize).sum::<usize>();
        let header_length = 32 + 32 * self.fields.len() + 1 + 263;

        let mut data = vec![0u8; 32];
        data[0] = 0x30;
        data[1..4].copy_from_slice(&[124, 1, 1]);
        data[4..8].copy_from_slice(&(self.records.len() as u32).to_le_bytes());
        data[8..10].copy_from_slice(&(header_length as u16).to_le_bytes());
        data[10..12].copy_from_slice(&(record_length as u16).to_le_bytes());

        for (name, kind, length, decimals) in &self.fields {
            let mut descriptor = [0u8; 32];
            descriptor[..name.len()].copy_from_slice(name.as_bytes());
            descriptor[11] = *kind as u8;
            descriptor[16] = *length;
            descriptor[17] = *decimals;
            data.extend_from_slice(&descriptor);
        }
        data.push(0x0D);
        data.resize(header_length, 0);

        for (deleted, values) in &self.records {
            data.push(if *deleted { b'*' } else { b' ' });
            for ((_, kind, length, _), value) in self.fields.iter().zip(values) {
                let width = *length as usize;
                let mut cell = value.clone();
                if matches!(kind, 'N' | 'F') && cell.len() < width {
                    let mut padded = vec![b' '; width - cell.len()];
                    padded.extend(cell);
                    cell = padded;
                }
                cell.resize(width, b' ');
                data.extend(cell);
            }
        }
        data.push(0x1A);
        data
    }

    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        fs::write(&path, self.build()).unwrap();
        path
    }
}

pub fn num(value: impl ToString) -> Vec<u8> {
    value.to_string().into_bytes()
}

pub fn text(value: &[u8]) -> Vec<u8> {
    value.to_vec()
}

pub fn logical(value: bool) -> Vec<u8> {
    vec![if value { b'T' } else { b'F' }]
}

/// 8-byte Julian day + milliseconds encoding.
pub fn datetime(value: NaiveDateTime) -> Vec<u8> {
    let julian = value.date().num_days_from_ce() as u32 + 1_721_425;
    let millis = value.time().num_seconds_from_midnight() * 1000
        + value.time().nanosecond() / 1_000_000;
    let mut out = julian.to_le_bytes().to_vec();
    out.extend_from_slice(&millis.to_le_bytes());
    out
}

/// The four-column client table used across tests.
pub fn clients() -> DbfBuilder {
    DbfBuilder::new()
        .field("ID", 'N', 5, 0)
        .field("NAME", 'C', 20, 0)
        .field("ACTIVE", 'L', 1, 0)
        .field("JOINED", 'T', 8, 0)
}
