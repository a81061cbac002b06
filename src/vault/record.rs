//! The `Record` type and its CSV row codec.
//!
//! A row has five columns in fixed order:
//! Name, Username, Password, Group, Info. Rows written by older tools
//! may stop after Password or Group; decoding fills the gaps:
//!
//! | column   | when absent           |
//! |----------|-----------------------|
//! | Username | `""`                  |
//! | Password | `""`                  |
//! | Group    | configured default    |
//! | Info     | `""`                  |
//!
//! Encoding always writes all five columns.

use std::fmt;

use zeroize::Zeroizing;

use crate::errors::{CredVaultError, Result};

/// Column names, in storage order.
pub const COLUMNS: [&str; 5] = ["Name", "Username", "Password", "Group", "Info"];

/// One named credential entry.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Lookup key. Never empty once persisted.
    pub name: String,
    pub username: String,
    /// The secret. Redacted from `Debug` output.
    pub password: String,
    pub group: String,
    /// Free text shown next to the name.
    pub info: String,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        group: impl Into<String>,
        info: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            password: password.into(),
            group: group.into(),
            info: info.into(),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &password)
            .field("group", &self.group)
            .field("info", &self.info)
            .finish()
    }
}

/// Build a `Record` from the fields of one row.
///
/// Fails with `MalformedRow` when there are no fields or the name is blank.
pub fn decode_row<S: AsRef<str>>(fields: &[S], default_group: &str) -> Result<Record> {
    decode_fields(fields, default_group).map_err(|reason| CredVaultError::malformed(0, reason))
}

fn decode_fields<S: AsRef<str>>(
    fields: &[S],
    default_group: &str,
) -> std::result::Result<Record, &'static str> {
    let field = |i: usize| fields.get(i).map(|f| f.as_ref());

    let name = field(0).ok_or("row has no fields")?;
    if name.is_empty() {
        return Err("record name is empty");
    }

    let group = match field(3) {
        Some(g) if !g.trim().is_empty() => g,
        _ => default_group,
    };

    Ok(Record::new(
        name,
        field(1).unwrap_or_default(),
        field(2).unwrap_or_default(),
        group,
        field(4).unwrap_or_default(),
    ))
}

/// The fields of `record` in column order. Empty trailing fields are kept.
pub fn encode_record(record: &Record) -> [&str; 5] {
    [
        record.name.as_str(),
        record.username.as_str(),
        record.password.as_str(),
        record.group.as_str(),
        record.info.as_str(),
    ]
}

/// Decode a whole plaintext table, in file order.
///
/// Blank lines are skipped. Any other row that fails to decode fails the
/// whole table, so a damaged vault is never partially loaded.
pub fn decode_table(plaintext: &[u8], default_group: &str) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(plaintext);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| {
            let line = e.position().map_or(0, |p| p.line());
            CredVaultError::malformed(line, e.to_string())
        })?;

        if row.len() == 1 && row[0].trim().is_empty() {
            continue;
        }

        let line = row.position().map_or(0, |p| p.line());
        let fields: Vec<&str> = row.iter().collect();
        let record = decode_fields(&fields, default_group)
            .map_err(|reason| CredVaultError::malformed(line, reason))?;
        records.push(record);
    }
    Ok(records)
}

/// Encode one record as a `\n`-terminated CSV line, quoting as needed.
pub fn encode_row(record: &Record) -> Result<Zeroizing<Vec<u8>>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(encode_record(record))
        .map_err(|e| CredVaultError::Io(e.into()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| CredVaultError::Io(e.into_error()))?;

    Ok(Zeroizing::new(bytes))
}
