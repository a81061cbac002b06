//! Pause-then-reveal delivery of a record's secrets.
//!
//! Identity fields (name, group, info) are printed. The user name and
//! password are never printed: each one is sent to the `Sink` on its
//! own, and only after the user acknowledges that specific field.

pub mod sink;

use std::io::{self, BufRead, Write};

use crate::errors::Result;
use crate::vault::Record;

pub use sink::{ClipboardSink, CommandSink, Sink};

/// Blocks until the user allows the next field to be revealed.
pub trait Acknowledger {
    /// `Ok(true)` once acknowledged, `Ok(false)` if input ended instead.
    fn wait(&mut self) -> Result<bool>;
}

/// Waits for a line (usually just Enter) on stdin.
#[derive(Debug, Default)]
pub struct StdinAcknowledger;

impl Acknowledger for StdinAcknowledger {
    fn wait(&mut self) -> Result<bool> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok(read > 0)
    }
}

/// The secret fields, in delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretField {
    Username,
    Password,
}

impl SecretField {
    pub const ALL: [SecretField; 2] = [SecretField::Username, SecretField::Password];

    pub fn label(self) -> &'static str {
        match self {
            SecretField::Username => "user name",
            SecretField::Password => "password",
        }
    }

    fn value(self, record: &Record) -> &str {
        match self {
            SecretField::Username => &record.username,
            SecretField::Password => &record.password,
        }
    }
}

/// What happened to one secret field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Delivered,
    /// The field was empty; the sink was not called.
    Empty,
    /// Input ended before the acknowledgement; the sink was not called.
    Skipped,
    /// The sink failed with this message.
    Failed(String),
}

/// Result of one `deliver` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    /// `false` when there was no record to deliver.
    pub matched: bool,
    pub fields: Vec<(SecretField, FieldOutcome)>,
}

impl DeliveryReport {
    pub fn outcome(&self, field: SecretField) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, outcome)| outcome)
    }

    pub fn delivered(&self) -> usize {
        self.fields
            .iter()
            .filter(|(_, o)| *o == FieldOutcome::Delivered)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.fields
            .iter()
            .filter(|(_, o)| matches!(o, FieldOutcome::Failed(_)))
            .count()
    }
}

/// Reveals records through a sink, one acknowledged field at a time.
pub struct DeliveryChannel<S, A> {
    sink: S,
    ack: A,
}

impl<S: Sink, A: Acknowledger> DeliveryChannel<S, A> {
    pub fn new(sink: S, ack: A) -> Self {
        Self { sink, ack }
    }

    /// Show `record` on `out` and deliver its secrets.
    ///
    /// A sink failure on one field is written to `out` and recorded in
    /// the report; the next field is still attempted.
    pub fn deliver<W: Write>(&mut self, record: Option<&Record>, out: &mut W) -> Result<DeliveryReport> {
        let Some(record) = record else {
            writeln!(out, "No matches found")?;
            return Ok(DeliveryReport::default());
        };

        writeln!(out, "Name  : {}", record.name)?;
        writeln!(out, "Group : {}", record.group)?;
        if !record.info.is_empty() {
            writeln!(out, "Info  : {}", record.info)?;
        }
        writeln!(out, "----")?;

        let mut report = DeliveryReport {
            matched: true,
            fields: Vec::with_capacity(SecretField::ALL.len()),
        };
        for field in SecretField::ALL {
            let outcome = self.deliver_field(field, field.value(record), out)?;
            report.fields.push((field, outcome));
        }
        Ok(report)
    }

    fn deliver_field<W: Write>(
        &mut self,
        field: SecretField,
        value: &str,
        out: &mut W,
    ) -> Result<FieldOutcome> {
        let label = field.label();

        if value.is_empty() {
            writeln!(out, "No {label} found")?;
            return Ok(FieldOutcome::Empty);
        }

        writeln!(out, "Press enter to deliver {label}")?;
        out.flush()?;
        if !self.ack.wait()? {
            writeln!(out, "Input closed, {label} not delivered")?;
            return Ok(FieldOutcome::Skipped);
        }

        match self.sink.send(value) {
            Ok(()) => {
                tracing::debug!(field = label, "secret delivered");
                Ok(FieldOutcome::Delivered)
            }
            Err(e) => {
                tracing::warn!(field = label, error = %e, "delivery failed");
                writeln!(out, "{e}")?;
                Ok(FieldOutcome::Failed(e.to_string()))
            }
        }
    }
}
