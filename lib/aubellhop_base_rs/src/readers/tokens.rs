// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::BellhopError;

/// One non-blank line of a Bellhop text file, split into fields.
///
/// Fields are separated by blanks or commas; a single-quoted string is one
/// field; `!` starts a comment; a `/` ends the record, dropping what follows.
#[derive(Debug, Clone)]
pub struct Record {
    path: PathBuf,
    number: usize,
    fields: Vec<String>,
    terminated: bool,
}

impl Record {
    fn parse(path: &Path, number: usize, line: &str) -> Record {
        let mut fields = Vec::new();
        let mut terminated = false;
        let mut chars = line.chars();
        let mut current = String::new();

        let flush = |current: &mut String, fields: &mut Vec<String>| {
            if !current.is_empty() {
                fields.push(std::mem::take(current));
            }
        };

        while let Some(c) = chars.next() {
            match c {
                '\'' | '"' => {
                    flush(&mut current, &mut fields);
                    let mut quoted = String::new();
                    for q in chars.by_ref() {
                        if q == c { break; }
                        quoted.push(q);
                    }
                    fields.push(quoted);
                },
                '!' => break,
                '/' => {
                    terminated = true;
                    break;
                },
                ' ' | '\t' | ',' | '\r' => flush(&mut current, &mut fields),
                _ => current.push(c),
            }
        }
        flush(&mut current, &mut fields);

        Record { path: path.to_path_buf(), number, fields, terminated }
    }

    /// 1-based line number in the source file
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A `/` ended the record
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn error<S: Into<String>>(&self, reason: S) -> BellhopError {
        BellhopError::parse(&self.path, self.number, reason)
    }

    pub fn text(&self, i: usize) -> Result<&str, BellhopError> {
        self.fields.get(i)
            .map(|s| s.as_str())
            .ok_or_else(|| self.error(format!("expected at least {} field(s), found {}", i + 1, self.fields.len())))
    }

    pub fn real(&self, i: usize) -> Result<f64, BellhopError> {
        let field = self.text(i)?;
        parse_real(field).ok_or_else(|| self.error(format!("`{}` is not a number", field)))
    }

    pub fn opt_real(&self, i: usize) -> Result<Option<f64>, BellhopError> {
        if i < self.fields.len() { self.real(i).map(Some) } else { Ok(None) }
    }

    pub fn count(&self, i: usize) -> Result<usize, BellhopError> {
        let field = self.text(i)?;
        parse_count(field).ok_or_else(|| self.error(format!("`{}` is not a non-negative integer", field)))
    }

    pub fn reals(&self) -> Result<Vec<f64>, BellhopError> {
        (0..self.fields.len()).map(|i| self.real(i)).collect()
    }

    /// Parse exactly `n` reals
    pub fn exact_reals(&self, n: usize) -> Result<Vec<f64>, BellhopError> {
        if self.fields.len() != n {
            return Err(self.error(format!("expected {} values, found {}", n, self.fields.len())));
        }
        self.reals()
    }
}

/// Fortran-style real: accepts `D` exponents
pub fn parse_real(s: &str) -> Option<f64> {
    let normalised = s.replace(|c: char| c == 'D' || c == 'd', "E");
    normalised.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer count, also accepting integral reals such as `5.0`
pub fn parse_count(s: &str) -> Option<usize> {
    if let Ok(n) = s.parse::<usize>() {
        return Some(n);
    }
    parse_real(s).filter(|v| *v >= 0.0 && v.fract() == 0.0).map(|v| v as usize)
}

/// Sequential reader over the non-blank records of a file
#[derive(Debug)]
pub struct RecordReader {
    path: PathBuf,
    records: Vec<Record>,
    pos: usize,
}

impl RecordReader {
    /// A missing or unreadable file is reported as a parse error at line 0
    pub fn open(path: &Path) -> Result<RecordReader, BellhopError> {
        let text = fs::read_to_string(path)
            .map_err(|e| BellhopError::parse(path, 0, format!("cannot read file: {}", e)))?;
        Ok(RecordReader::from_text(path, &text))
    }

    pub fn from_text(path: &Path, text: &str) -> RecordReader {
        let records = text.lines()
            .enumerate()
            .map(|(i, line)| Record::parse(path, i + 1, line))
            .filter(|r| !r.is_empty() || r.is_terminated())
            .collect();
        RecordReader { path: path.to_path_buf(), records, pos: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn next_record(&mut self) -> Result<Record, BellhopError> {
        let record = self.peek()
            .cloned()
            .ok_or_else(|| self.eof_error())?;
        self.pos += 1;
        Ok(record)
    }

    pub fn peek(&self) -> Option<&Record> {
        self.records.get(self.pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.records.len()
    }

    /// Read a count record followed by that many reals. The values may
    /// continue on the count record or on the following records, and a `/`
    /// may end the list early.
    pub fn counted_reals(&mut self) -> Result<(usize, Vec<f64>), BellhopError> {
        let record = self.next_record()?;
        let n = record.count(0)?;
        let mut values = (1..record.len()).map(|i| record.real(i)).collect::<Result<Vec<f64>, _>>()?;
        let mut terminated = record.is_terminated();
        while values.len() < n && !terminated {
            let more = self.next_record()?;
            values.extend(more.reals()?);
            terminated = more.is_terminated();
        }
        if values.len() > n {
            return Err(record.error(format!("expected {} values, found {}", n, values.len())));
        }
        Ok((n, values))
    }

    /// Read reals across records until `n` are collected or a `/` is seen
    pub fn reals_until(&mut self, n: usize) -> Result<Vec<f64>, BellhopError> {
        let mut values = Vec::new();
        loop {
            let record = self.next_record()?;
            values.extend(record.reals()?);
            if values.len() >= n || record.is_terminated() {
                return Ok(values);
            }
        }
    }

    pub fn error<S: Into<String>>(&self, reason: S) -> BellhopError {
        let line = self.records.get(self.pos.saturating_sub(1)).map_or(0, |r| r.number);
        BellhopError::parse(&self.path, line, reason)
    }

    fn eof_error(&self) -> BellhopError {
        self.error("unexpected end of file")
    }

    /// Fail if records remain that the grammar does not account for
    pub fn expect_end(&self) -> Result<(), BellhopError> {
        match self.peek() {
            Some(extra) => Err(extra.error("unexpected trailing data")),
            None => Ok(()),
        }
    }
}
