//! In-memory tabular data: ordered, named, homogeneously typed columns.
//!
//! A [`Dataset`] keeps its columns in insertion order and does not reject
//! duplicate names; duplicate detection belongs to the conformance engine so
//! it can report them against metadata. Every column must hold exactly
//! [`Dataset::row_count`] cells.

use anyhow::{Context, anyhow, bail};
use chrono::NaiveDateTime;

use crate::{
    data::{Value, normalize_column_name, parse_boolean, parse_date_like},
    error::{ConformanceError, Result},
    types::ValueType,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    /// A column of `len` missing values.
    pub fn nulls(value_type: ValueType, len: usize) -> Self {
        match value_type {
            ValueType::Int64 => ColumnData::Int64(vec![None; len]),
            ValueType::Float64 => ColumnData::Float64(vec![None; len]),
            ValueType::String => ColumnData::String(vec![None; len]),
            ValueType::Boolean => ColumnData::Boolean(vec![None; len]),
            ValueType::DateTime => ColumnData::DateTime(vec![None; len]),
        }
    }

    /// Builds a column from typed cells, failing if any cell has another type.
    pub fn from_values<I>(value_type: ValueType, values: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = Option<Value>>,
    {
        let values = values.into_iter();
        let mut column = ColumnData::nulls(value_type, 0);
        for (idx, value) in values.enumerate() {
            match (&mut column, value) {
                (ColumnData::Int64(cells), Some(Value::Integer(v))) => cells.push(Some(v)),
                (ColumnData::Float64(cells), Some(Value::Float(v))) => cells.push(Some(v)),
                (ColumnData::String(cells), Some(Value::String(v))) => cells.push(Some(v)),
                (ColumnData::Boolean(cells), Some(Value::Boolean(v))) => cells.push(Some(v)),
                (ColumnData::DateTime(cells), Some(Value::DateTime(v))) => cells.push(Some(v)),
                (column, None) => column.push_null(),
                (_, Some(other)) => bail!(
                    "Row {}: {} value '{}' cannot be stored in a {} column",
                    idx + 1,
                    other.value_type(),
                    other,
                    value_type
                ),
            }
        }
        Ok(column)
    }

    fn push_null(&mut self) {
        match self {
            ColumnData::Int64(cells) => cells.push(None),
            ColumnData::Float64(cells) => cells.push(None),
            ColumnData::String(cells) => cells.push(None),
            ColumnData::Boolean(cells) => cells.push(None),
            ColumnData::DateTime(cells) => cells.push(None),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ColumnData::Int64(_) => ValueType::Int64,
            ColumnData::Float64(_) => ValueType::Float64,
            ColumnData::String(_) => ValueType::String,
            ColumnData::Boolean(_) => ValueType::Boolean,
            ColumnData::DateTime(_) => ValueType::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int64(cells) => cells.len(),
            ColumnData::Float64(cells) => cells.len(),
            ColumnData::String(cells) => cells.len(),
            ColumnData::Boolean(cells) => cells.len(),
            ColumnData::DateTime(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, idx: usize) -> Option<Value> {
        match self {
            ColumnData::Int64(cells) => cells.get(idx).copied().flatten().map(Value::Integer),
            ColumnData::Float64(cells) => cells.get(idx).copied().flatten().map(Value::Float),
            ColumnData::String(cells) => cells.get(idx).cloned().flatten().map(Value::String),
            ColumnData::Boolean(cells) => cells.get(idx).copied().flatten().map(Value::Boolean),
            ColumnData::DateTime(cells) => cells.get(idx).copied().flatten().map(Value::DateTime),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = Option<Value>> + '_ {
        (0..self.len()).map(|idx| self.get(idx))
    }

    /// Casts every cell to `target`. The first cell that cannot be cast fails
    /// the whole column.
    pub fn cast(&self, target: ValueType) -> anyhow::Result<ColumnData> {
        if self.value_type() == target {
            return Ok(self.clone());
        }
        let cast = self
            .values()
            .enumerate()
            .map(|(idx, value)| match value {
                Some(value) => cast_value(value, target).with_context(|| format!("Row {}", idx + 1)),
                None => Ok(None),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        ColumnData::from_values(target, cast)
    }

    /// Parses every cell as a date or datetime. With `lenient` set, cells that
    /// fail to parse become missing; the returned count says how many did.
    pub fn to_datetimes(&self, lenient: bool) -> anyhow::Result<(ColumnData, usize)> {
        if let ColumnData::DateTime(_) = self {
            return Ok((self.clone(), 0));
        }
        let mut failures = 0usize;
        let mut cells = Vec::with_capacity(self.len());
        for (idx, value) in self.values().enumerate() {
            let Some(value) = value else {
                cells.push(None);
                continue;
            };
            let text = value.as_display();
            if text.trim().is_empty() {
                cells.push(None);
                continue;
            }
            match parse_date_like(&text) {
                Ok(parsed) => cells.push(Some(parsed)),
                Err(_) if lenient => {
                    failures += 1;
                    cells.push(None);
                }
                Err(err) => return Err(err.context(format!("Row {}", idx + 1))),
            }
        }
        Ok((ColumnData::DateTime(cells), failures))
    }
}

/// Parses a raw text cell as `target`. Blank input is a missing value.
pub fn parse_cell(raw: &str, target: ValueType) -> anyhow::Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed = match target {
        ValueType::String => Value::String(raw.to_string()),
        ValueType::Int64 => Value::Integer(
            trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as integer"))?,
        ),
        ValueType::Float64 => Value::Float(
            trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as float"))?,
        ),
        ValueType::Boolean => Value::Boolean(parse_boolean(trimmed)?),
        ValueType::DateTime => Value::DateTime(parse_date_like(trimmed)?),
    };
    Ok(Some(parsed))
}

fn cast_value(value: Value, target: ValueType) -> anyhow::Result<Option<Value>> {
    if value.value_type() == target {
        return Ok(Some(value));
    }
    match (value, target) {
        (value, ValueType::String) => Ok(Some(Value::String(value.as_display()))),
        (Value::String(text), target) => parse_cell(&text, target),
        (Value::Integer(i), ValueType::Float64) => Ok(Some(Value::Float(i as f64))),
        (Value::Integer(i), ValueType::Boolean) => match i {
            0 => Ok(Some(Value::Boolean(false))),
            1 => Ok(Some(Value::Boolean(true))),
            other => Err(anyhow!("Integer {other} is not a boolean")),
        },
        (Value::Float(f), ValueType::Int64) => {
            if !f.is_finite() || f.fract() != 0.0 {
                Err(anyhow!("Float {f} is not a whole number"))
            } else if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(Some(Value::Integer(f as i64)))
            } else {
                Err(anyhow!("Float {f} does not fit a 64-bit integer"))
            }
        }
        (Value::Float(f), ValueType::Boolean) => {
            if f == 0.0 {
                Ok(Some(Value::Boolean(false)))
            } else if f == 1.0 {
                Ok(Some(Value::Boolean(true)))
            } else {
                Err(anyhow!("Float {f} is not a boolean"))
            }
        }
        (Value::Boolean(b), ValueType::Int64) => Ok(Some(Value::Integer(i64::from(b)))),
        (Value::Boolean(b), ValueType::Float64) => {
            Ok(Some(Value::Float(if b { 1.0 } else { 0.0 })))
        }
        (value, target) => Err(anyhow!(
            "Cannot cast {} value '{}' to {}",
            value.value_type(),
            value,
            target
        )),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn value_type(&self) -> ValueType {
        self.data.value_type()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(row_count: usize) -> Self {
        Dataset {
            columns: Vec::new(),
            row_count,
        }
    }

    /// Builds a dataset whose row count is taken from the first column.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnData)>,
        S: Into<String>,
    {
        let mut columns = columns.into_iter().peekable();
        let row_count = columns.peek().map(|(_, data)| data.len()).unwrap_or(0);
        let mut dataset = Dataset::new(row_count);
        for (name, data) in columns {
            dataset.push_column(name, data)?;
        }
        Ok(dataset)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn push_column(&mut self, name: impl Into<String>, data: ColumnData) -> Result<()> {
        let name = name.into();
        if data.len() != self.row_count {
            return Err(ConformanceError::LengthMismatch {
                column: name,
                expected: self.row_count,
                actual: data.len(),
            });
        }
        self.columns.push(Column { name, data });
        Ok(())
    }

    pub fn replace_column(&mut self, name: &str, data: ColumnData) -> Result<()> {
        if data.len() != self.row_count {
            return Err(ConformanceError::LengthMismatch {
                column: name.to_string(),
                expected: self.row_count,
                actual: data.len(),
            });
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| ConformanceError::ColumnNotFound(name.to_string()))?;
        column.data = data;
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Keeps exactly the named columns, in the given order.
    pub fn select(&mut self, order: &[String]) -> Result<()> {
        if let Some(missing) = order.iter().find(|name| !self.contains(name)) {
            return Err(ConformanceError::ColumnNotFound(missing.clone()));
        }
        let mut remaining: Vec<Option<Column>> =
            std::mem::take(&mut self.columns).into_iter().map(Some).collect();
        for name in order {
            let taken = remaining
                .iter_mut()
                .find(|slot| matches!(slot, Some(c) if &c.name == name))
                .and_then(Option::take);
            if let Some(column) = taken {
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// Cells of row `idx` in column order.
    pub fn row(&self, idx: usize) -> Vec<Option<Value>> {
        self.columns.iter().map(|c| c.data.get(idx)).collect()
    }

    pub fn normalize_column_names(&mut self) {
        for column in &mut self.columns {
            column.name = normalize_column_name(&column.name);
        }
    }
}
