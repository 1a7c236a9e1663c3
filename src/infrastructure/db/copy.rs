//! Encoder for PostgreSQL's binary `COPY ... FROM STDIN (FORMAT binary)` stream.

use chrono::{DateTime, Utc};
use uuid::Uuid;

const SIGNATURE: &[u8; 11] = b"PGCOPY\n\xff\r\n\0";

/// Microseconds between the Unix epoch and the PostgreSQL epoch (2000-01-01 UTC).
const POSTGRES_EPOCH_OFFSET_MICROS: i64 = 946_684_800_000_000;

/// Builds one binary COPY payload, row by row.
///
/// Every row must write exactly `columns` fields, in table column order.
pub struct BinaryCopyEncoder {
    buf: Vec<u8>,
    columns: i16,
    rows: usize,
}

impl BinaryCopyEncoder {
    pub fn new(columns: i16) -> Self {
        let mut buf = Vec::with_capacity(1024);
        buf.extend_from_slice(SIGNATURE);
        // flags, then header extension length
        buf.extend_from_slice(&0i32.to_be_bytes());
        buf.extend_from_slice(&0i32.to_be_bytes());

        Self {
            buf,
            columns,
            rows: 0,
        }
    }

    pub fn start_row(&mut self) {
        self.buf.extend_from_slice(&self.columns.to_be_bytes());
        self.rows += 1;
    }

    pub fn write_uuid(&mut self, value: &Uuid) {
        self.write_field(value.as_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_field(&value.to_be_bytes());
    }

    /// `None` is written as SQL NULL, never as an empty string.
    pub fn write_text(&mut self, value: Option<&str>) {
        match value {
            Some(text) => self.write_field(text.as_bytes()),
            None => self.write_null(),
        }
    }

    pub fn write_timestamptz(&mut self, value: &DateTime<Utc>) {
        let micros = value.timestamp_micros() - POSTGRES_EPOCH_OFFSET_MICROS;
        self.write_field(&micros.to_be_bytes());
    }

    pub fn write_null(&mut self) {
        self.buf.extend_from_slice(&(-1i32).to_be_bytes());
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append the trailer and return the payload.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.extend_from_slice(&(-1i16).to_be_bytes());
        self.buf
    }

    fn write_field(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
        self.buf.extend_from_slice(bytes);
    }
}
