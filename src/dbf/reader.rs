use super::{DbfError, DbfHeader, FieldValue, Row};

const DELETED_FLAG: u8 = b'*';
const END_OF_FILE: u8 = 0x1A;

/// Single-pass iterator over the live records of one table
pub struct DbfReader {
    data: Vec<u8>,
    header: DbfHeader,
    remaining: u32,
    offset: usize,
    done: bool,
}

impl DbfReader {
    pub fn new(data: Vec<u8>) -> Result<Self, DbfError> {
        let header = DbfHeader::parse(&data)?;
        Ok(Self {
            remaining: header.record_count,
            offset: header.header_len,
            data,
            header,
            done: false,
        })
    }

    fn decode_record(&self, record: &[u8]) -> Row {
        // Skip the deletion flag
        let mut pos = 1;
        let mut row = Row::new();
        for field in &self.header.fields {
            let raw = &record[pos..pos + field.length];
            row.insert(field.name.as_str(), FieldValue::decode(field.field_type, raw));
            pos += field.length;
        }
        row
    }
}

impl Iterator for DbfReader {
    type Item = Result<Row, DbfError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.remaining > 0 {
            let end = self.offset + self.header.record_len;
            if self.data.get(self.offset) == Some(&END_OF_FILE) {
                self.done = true;
                break;
            }
            if end > self.data.len() {
                self.done = true;
                return Some(Err(DbfError::Truncated(format!(
                    "{} records still expected at byte {}",
                    self.remaining, self.offset
                ))));
            }

            let start = self.offset;
            self.offset = end;
            self.remaining -= 1;

            if self.data[start] == DELETED_FLAG {
                continue;
            }
            return Some(Ok(self.decode_record(&self.data[start..end])));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::DbfBuilder;

    fn table() -> DbfBuilder {
        DbfBuilder::new()
            .field("LC_TYPE", 'C', 12, 0)
            .field("ACRES", 'N', 8, 2)
    }

    #[test]
    fn yields_rows_in_order() {
        let bytes = table()
            .record(&["Forest", "10.00"])
            .record(&["Water", "3.00"])
            .build();

        let rows: Vec<Row> = DbfReader::new(bytes)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("LC_TYPE"),
            Some(&FieldValue::Text("Forest".to_string()))
        );
        assert_eq!(rows[1].get("ACRES"), Some(&FieldValue::Number(3.0)));
    }

    #[test]
    fn skips_deleted_records() {
        let bytes = table()
            .record(&["Forest", "1.00"])
            .deleted_record(&["Shrub", "2.00"])
            .record(&["Grass", "3.00"])
            .build();

        let classes: Vec<FieldValue> = DbfReader::new(bytes)
            .unwrap()
            .map(|row| row.unwrap().get("lc_type").cloned().unwrap())
            .collect();

        assert_eq!(
            classes,
            [
                FieldValue::Text("Forest".to_string()),
                FieldValue::Text("Grass".to_string()),
            ]
        );
    }

    #[test]
    fn empty_table_yields_nothing() {
        let mut reader = DbfReader::new(table().build()).unwrap();
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
    }

    #[test]
    fn truncated_records_error_once() {
        let mut bytes = table()
            .record(&["Forest", "1.00"])
            .record(&["Water", "2.00"])
            .build();
        // drop the EOF marker and half of the last record
        bytes.truncate(bytes.len() - 12);

        let mut reader = DbfReader::new(bytes).unwrap();
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(reader.next(), Some(Err(DbfError::Truncated(_)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn stops_at_end_of_file_marker() {
        let mut bytes = table().record(&["Forest", "1.00"]).build();
        // claim more records than are present
        bytes[4] = 5;

        let rows: Vec<_> = DbfReader::new(bytes).unwrap().collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_ok());
    }
}
