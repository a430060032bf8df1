use crate::graph::mutations::{MutationSet, SegmentMutations};
use crate::graph::segments::Segments;
use crate::make_error;
use crate::utils::error::NetworkError;
use csv::{ReaderBuilder, StringRecord, Trim};
use eyre::{Report, WrapErr};
use std::io::Read;

/// One data row of the mutations table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
  pub date: String,
  pub id: String,
  pub mutations: SegmentMutations,
}

/// Streaming reader for the mutations table.
///
/// The header declares `date,id,<seg_1>,…,<seg_N>`; the first two labels are
/// not interpreted, the rest fix the segment list for the run. Every data row
/// must have exactly the header's column count; each segment field is a
/// possibly-empty colon-separated mutation list.
pub struct MutationsTableReader<R: Read> {
  reader: csv::Reader<R>,
  segments: Segments,
  n_columns: usize,
  row: usize,
  record: StringRecord,
}

impl<'a> MutationsTableReader<&'a [u8]> {
  pub fn from_str(data: &'a str) -> Result<Self, Report> {
    Self::new(data.as_bytes())
  }
}

impl<R: Read> MutationsTableReader<R> {
  pub fn new(reader: R) -> Result<Self, Report> {
    let mut reader = ReaderBuilder::new()
      .has_headers(false)
      .flexible(true)
      .trim(Trim::All)
      .from_reader(reader);

    let mut header = StringRecord::new();
    let has_header = reader
      .read_record(&mut header)
      .wrap_err("When reading the mutations table header")?;
    if !has_header {
      return make_error!("The mutations table is empty: expected a header row `date,id,<segments>`");
    }
    if header.len() < 3 {
      return make_error!(
        "The mutations table header declares no segment columns: expected `date,id,<segments>`, found {} columns",
        header.len()
      );
    }

    let names: Vec<String> = header.iter().skip(2).map(str::to_owned).collect();
    for (i, name) in names.iter().enumerate() {
      if names[..i].contains(name) {
        return make_error!("Segment '{name}' is declared more than once in the mutations table header");
      }
    }

    Ok(Self {
      n_columns: header.len(),
      reader,
      segments: Segments::new(names),
      row: 1,
      record: StringRecord::new(),
    })
  }

  /// The segment list declared by the header.
  pub fn segments(&self) -> &Segments {
    &self.segments
  }

  /// Next data row, or `None` at end of input. Row numbers in errors are
  /// 1-based record numbers; the header is record 1.
  pub fn next_row(&mut self) -> Result<Option<SampleRow>, Report> {
    let has_record = self
      .reader
      .read_record(&mut self.record)
      .wrap_err_with(|| format!("When reading mutations table row {}", self.row + 1))?;
    if !has_record {
      return Ok(None);
    }
    self.row += 1;

    if self.record.len() != self.n_columns {
      return Err(
        NetworkError::MalformedRow {
          row: self.row,
          expected: self.n_columns,
          found: self.record.len(),
        }
        .into(),
      );
    }

    let date = self.record[0].to_owned();
    let id = self.record[1].to_owned();
    let sets = (2..self.n_columns).map(|i| parse_mutation_list(&self.record[i])).collect();

    Ok(Some(SampleRow {
      date,
      id,
      mutations: SegmentMutations::from_sets(sets),
    }))
  }
}

/// Parses a colon-separated mutation list. Whitespace around tokens is
/// insignificant; tokens that trim to nothing are dropped.
pub fn parse_mutation_list(field: &str) -> MutationSet {
  field
    .split(':')
    .map(str::trim)
    .filter(|token| !token.is_empty())
    .map(str::to_owned)
    .collect()
}
