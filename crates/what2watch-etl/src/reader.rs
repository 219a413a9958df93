//! Streaming reader for IMDB's tab-separated dataset dumps.
//!
//! The dumps have a header line, one record per `\n`-terminated line, `\t`
//! as delimiter and no quoting or escaping at all. `\N` marks a missing
//! value. Files run into tens of millions of lines, so the reader never
//! holds more than one record and a fixed-size read buffer.

use std::io::{BufReader, Read};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Terminator};

use crate::error::DatasetError;

/// Size of the read buffer wrapped around unbuffered streams.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// The value used to indicate that a value is missing.
pub const MISSING_VALUE: &str = "\\N";

/// Column names of a dataset, taken from its first line.
#[derive(Debug, Clone)]
pub struct Header {
    names: StringRecord,
}

impl Header {
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.index(column).is_some()
    }

    /// Column names in file order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.names.iter()
    }

    fn index(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|name| name == column)
    }
}

/// One data line, addressable by column name.
#[derive(Debug)]
pub struct Row<'a> {
    header: &'a Header,
    record: &'a StringRecord,
    line: u64,
}

impl<'a> Row<'a> {
    /// The value of a column, or `None` when it is `\N`, empty or the
    /// column does not exist.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let value = self.record.get(self.header.index(column)?)?;
        if value.is_empty() || value == MISSING_VALUE {
            None
        } else {
            Some(value)
        }
    }

    /// Convert a present value, treating a malformed one as a broken dataset.
    pub fn parse<T: FromStr>(&self, column: &'static str, value: &str) -> Result<T, DatasetError> {
        value.parse().map_err(|_| self.invalid(column, value))
    }

    /// Like [`get`](Self::get) followed by [`parse`](Self::parse).
    pub fn parse_optional<T: FromStr>(
        &self,
        column: &'static str,
    ) -> Result<Option<T>, DatasetError> {
        self.get(column)
            .map(|value| self.parse(column, value))
            .transpose()
    }

    #[must_use]
    pub fn invalid(&self, column: &'static str, value: &str) -> DatasetError {
        DatasetError::InvalidValue {
            line: self.line,
            column,
            value: value.to_string(),
        }
    }

    /// 1-based line number within the file, the header being line 1.
    #[must_use]
    pub const fn line(&self) -> u64 {
        self.line
    }
}

/// A typed record decoded from one dataset row.
pub trait DatasetRecord: Sized {
    /// Columns the header must contain.
    const COLUMNS: &'static [&'static str];

    /// Decode a row. `Ok(None)` skips a row that lacks required values;
    /// `Err` aborts the whole read.
    fn from_row(row: &Row<'_>) -> Result<Option<Self>, DatasetError>;
}

/// A lazy, single-pass iterator over the records of one dataset.
///
/// Rows missing required values are dropped silently. The first fatal
/// error is yielded once and ends the iteration.
#[derive(Debug)]
pub struct DatasetReader<R, T> {
    reader: csv::Reader<R>,
    header: Header,
    record: StringRecord,
    done: bool,
    _record: PhantomData<fn() -> T>,
}

impl<R: Read, T: DatasetRecord> DatasetReader<BufReader<R>, T> {
    /// Wrap an unbuffered stream in a [`READ_BUFFER_SIZE`] buffer.
    pub fn from_read(reader: R) -> Result<Self, DatasetError> {
        Self::new(BufReader::with_capacity(READ_BUFFER_SIZE, reader))
    }
}

impl<R: Read, T: DatasetRecord> DatasetReader<R, T> {
    /// Read the header line and check it has every column `T` needs.
    pub fn new(reader: R) -> Result<Self, DatasetError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .terminator(Terminator::Any(b'\n'))
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let names = reader.headers().map_err(|e| dataset_error(e, 1))?.clone();
        if names.is_empty() {
            return Err(DatasetError::MissingHeader);
        }
        let header = Header { names };
        if let Some(missing) = T::COLUMNS.iter().find(|column| !header.contains(column)) {
            return Err(DatasetError::MissingColumn(*missing));
        }

        Ok(Self {
            reader,
            header,
            record: StringRecord::new(),
            done: false,
            _record: PhantomData,
        })
    }

    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    fn blank_line(&self, line: u64) -> DatasetError {
        DatasetError::BrokenRow {
            line,
            expected: self.header.names.len(),
            found: 0,
        }
    }

    fn fail(&mut self, error: DatasetError) -> Option<Result<T, DatasetError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl<R: Read, T: DatasetRecord> Iterator for DatasetReader<R, T> {
    type Item = Result<T, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            // The reader's line count is the number of the line it reads next.
            let line = self.reader.position().line();
            match self.reader.read_record(&mut self.record) {
                Ok(true) => {}
                Ok(false) => {
                    // Only blank lines can be consumed without producing a record.
                    if self.reader.position().line() > line {
                        return self.fail(self.blank_line(line));
                    }
                    self.done = true;
                    return None;
                }
                Err(e) => return self.fail(dataset_error(e, line)),
            }
            // A record spans exactly one line; more means blank lines came first.
            if self.reader.position().line() > line + 1 {
                return self.fail(self.blank_line(line));
            }

            let row = Row {
                header: &self.header,
                record: &self.record,
                line,
            };
            match T::from_row(&row) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {}
                Err(e) => return self.fail(e),
            }
        }
        None
    }
}

impl<R: Read, T: DatasetRecord> FusedIterator for DatasetReader<R, T> {}

fn dataset_error(error: csv::Error, line: u64) -> DatasetError {
    match error.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => DatasetError::BrokenRow {
            line,
            expected: *expected_len as usize,
            found: *len as usize,
        },
        csv::ErrorKind::Io(_) => DatasetError::Io(error.into()),
        _ => DatasetError::Malformed {
            line,
            source: error,
        },
    }
}
