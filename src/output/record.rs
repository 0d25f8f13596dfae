//! Article records and their tab-separated row form

/// One parsed article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Article headline
    pub title: String,

    /// Publication time as shown by the site
    pub timestamp: String,

    /// Absolute article URL
    pub url: String,

    /// Normalised article text
    pub body: String,
}

impl Record {
    /// Formats the record as one newline-terminated TSV row
    ///
    /// Column order is title, timestamp, url, body. Tabs and line breaks
    /// inside fields are replaced by spaces so a row never spans lines.
    pub fn to_tsv_row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\n",
            clean_field(&self.title),
            clean_field(&self.timestamp),
            clean_field(&self.url),
            clean_field(&self.body)
        )
    }

    /// Parses a row written by [`Record::to_tsv_row`]
    ///
    /// Returns None if the row does not have four columns.
    pub fn from_tsv_row(row: &str) -> Option<Self> {
        let row = row.strip_suffix('\n').unwrap_or(row);
        let row = row.strip_suffix('\r').unwrap_or(row);
        let mut columns = row.splitn(4, '\t');

        let title = columns.next()?;
        let timestamp = columns.next()?;
        let url = columns.next()?;
        let body = columns.next()?;

        Some(Self {
            title: title.to_string(),
            timestamp: timestamp.to_string(),
            url: url.to_string(),
            body: body.to_string(),
        })
    }
}

fn clean_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}
