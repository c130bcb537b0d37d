//! Fixture builders shared by the unit tests.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Cursor, Write};

/// One file to place in a fixture archive
pub(crate) struct ArchiveMember<'a> {
    name: &'a str,
    data: &'a [u8],
    method: ::zip::CompressionMethod,
}

impl<'a> ArchiveMember<'a> {
    pub(crate) fn stored(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            method: ::zip::CompressionMethod::Stored,
        }
    }

    pub(crate) fn deflated(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            method: ::zip::CompressionMethod::Deflated,
        }
    }
}

/// Build an in-memory ZIP archive
pub(crate) fn zip_bytes(members: &[ArchiveMember<'_>]) -> Vec<u8> {
    let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
    for member in members {
        let options = ::zip::write::FileOptions::default().compression_method(member.method);
        writer.start_file(member.name, options).unwrap();
        writer.write_all(member.data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Minimal dBASE III table writer
#[derive(Default)]
pub(crate) struct DbfBuilder {
    fields: Vec<(String, u8, u8, u8)>,
    records: Vec<(bool, Vec<String>)>,
}

impl DbfBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn field(mut self, name: &str, kind: char, length: u8, decimals: u8) -> Self {
        self.fields
            .push((name.to_string(), kind as u8, length, decimals));
        self
    }

    pub(crate) fn record(mut self, values: &[&str]) -> Self {
        self.records
            .push((false, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub(crate) fn deleted_record(mut self, values: &[&str]) -> Self {
        self.records
            .push((true, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let header_len = 32 + 32 * self.fields.len() + 1;
        let record_len = 1 + self.fields.iter().map(|f| f.2 as usize).sum::<usize>();

        let mut out = Vec::new();
        out.push(0x03);
        out.extend_from_slice(&[124, 7, 15]);
        out.write_u32::<LittleEndian>(self.records.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(header_len as u16).unwrap();
        out.write_u16::<LittleEndian>(record_len as u16).unwrap();
        out.extend_from_slice(&[0u8; 20]);

        for (name, kind, length, decimals) in &self.fields {
            let mut name_bytes = [0u8; 11];
            name_bytes[..name.len()].copy_from_slice(name.as_bytes());
            out.extend_from_slice(&name_bytes);
            out.push(*kind);
            out.extend_from_slice(&[0u8; 4]);
            out.push(*length);
            out.push(*decimals);
            out.extend_from_slice(&[0u8; 14]);
        }
        out.push(0x0D);

        for (deleted, values) in &self.records {
            out.push(if *deleted { b'*' } else { b' ' });
            for ((_, kind, length, _), value) in self.fields.iter().zip(values) {
                let width = *length as usize;
                let cell = if matches!(kind, b'N' | b'F') {
                    format!("{value:>width$}")
                } else {
                    format!("{value:<width$}")
                };
                out.extend_from_slice(&cell.as_bytes()[..width]);
            }
        }
        out.push(0x1A);
        out
    }
}

/// Descriptive table for a single fire
pub(crate) fn desc_table(fire_id: &str, name: &str, acres: &str, ymd: (&str, &str, &str)) -> Vec<u8> {
    DbfBuilder::new()
        .field("FIRE_ID", 'C', 25, 0)
        .field("FIRENAME", 'C', 40, 0)
        .field("HUC4_NAME", 'C', 40, 0)
        .field("ACRES", 'N', 12, 2)
        .field("YEAR", 'N', 4, 0)
        .field("STARTMONTH", 'N', 2, 0)
        .field("STARTDAY", 'N', 2, 0)
        .field("UNBURNED", 'N', 12, 2)
        .field("LOW", 'N', 12, 2)
        .field("MODERATE", 'N', 12, 2)
        .field("HIGH", 'N', 12, 2)
        .field("INC_GREEN", 'N', 12, 2)
        .field("NON_MAPPED", 'N', 12, 2)
        .field("LONG", 'N', 12, 5)
        .field("LAT", 'N', 12, 5)
        .record(&[
            fire_id,
            name,
            "Lower Columbia",
            acres,
            ymd.0,
            ymd.1,
            ymd.2,
            "100.50",
            "200.25",
            "50.00",
            "10.00",
            "1.00",
            "0.00",
            "-121.50000",
            "44.25000",
        ])
        .build()
}

/// Land-cover summary table from `(class, acres)` pairs
pub(crate) fn rep_table(rows: &[(&str, &str)]) -> Vec<u8> {
    rows.iter()
        .fold(
            DbfBuilder::new()
                .field("LC_TYPE", 'C', 30, 0)
                .field("ACRES", 'N', 12, 2),
            |builder, (class, acres)| builder.record(&[class, acres]),
        )
        .build()
}
