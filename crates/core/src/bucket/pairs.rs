//! The hstore-style `"key"=>"value"` pair encoding.
//!
//! The legacy registry tables store buckets as quoted key-arrow-value
//! pair lists inside a SQL string literal. Values must not carry
//! characters that break either the pair quoting or the enclosing
//! literal, so every value passes through [`sanitize_value`].

/// Escape a text value for pair storage: double quotes degrade to single
/// quotes, single quotes are doubled for the SQL literal, semicolons and
/// double dashes are defanged.
pub fn sanitize_value(value: &str) -> String {
    value
        .replace('"', "'")
        .replace('\'', "''")
        .replace(';', "|")
        .replace("--", "-")
}

/// Incremental builder for a pair list.
#[derive(Debug, Default)]
pub struct PairsBuilder {
    out: String,
}

impl PairsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one key/value pair, sanitizing the value.
    pub fn push(&mut self, key: &str, value: &str) -> &mut Self {
        if !self.out.is_empty() {
            self.out.push(',');
        }
        self.out.push('"');
        self.out.push_str(key);
        self.out.push_str("\"=>\"");
        self.out.push_str(&sanitize_value(value));
        self.out.push('"');
        self
    }

    /// Append a pair only when the value is present.
    pub fn push_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}
