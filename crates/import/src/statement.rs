use std::collections::HashMap;
use std::io::{self, Cursor, Read};

use outlay_core::{Record, RecordError};
use thiserror::Error;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("statement: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("statement: {0}")]
    Io(#[from] io::Error),
}

/// Reader over a semicolon-delimited bank statement export. Yields one
/// parsed [`Record`] per data row; the header row determines field names.
pub struct StatementReader<R: Read> {
    reader: csv::Reader<io::Chain<Cursor<Vec<u8>>, R>>,
    headers: csv::StringRecord,
    row: csv::StringRecord,
}

impl<R: Read> StatementReader<R> {
    pub fn new(input: R) -> Result<Self, ImportError> {
        let input = skip_bom(input)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .from_reader(input);
        let headers = reader.headers()?.clone();
        Ok(StatementReader {
            reader,
            headers,
            row: csv::StringRecord::new(),
        })
    }

    /// Next parsed record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Option<Result<Record, ImportError>> {
        match self.reader.read_record(&mut self.row) {
            Err(err) => Some(Err(err.into())),
            Ok(false) => None,
            Ok(true) => {
                let line = self.row.position().map(|p| p.line()).unwrap_or_default();
                let fields: HashMap<&str, &str> =
                    self.headers.iter().zip(self.row.iter()).collect();
                Some(Record::from_fields(&fields, line).map_err(ImportError::from))
            }
        }
    }
}

impl<R: Read> Iterator for StatementReader<R> {
    type Item = Result<Record, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// Consumes a leading UTF-8 BOM, pushing back whatever else was read.
fn skip_bom<R: Read>(mut input: R) -> io::Result<io::Chain<Cursor<Vec<u8>>, R>> {
    let mut head = [0u8; 3];
    let mut filled = 0;
    while filled < head.len() {
        let n = input.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let rest = if head[..filled] == UTF8_BOM {
        Vec::new()
    } else {
        head[..filled].to_vec()
    };
    Ok(Cursor::new(rest).chain(input))
}
