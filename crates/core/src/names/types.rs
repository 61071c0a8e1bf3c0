use serde::{Deserialize, Serialize};

/// Which name field of an authority a lookup should query.
///
/// Names carrying a variety or subspecies indicator ("var.", "ssp.") only
/// match the indicator-bearing field; plain binomials match the field
/// without indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupField {
    NameWithoutIndicator,
    NameWithIndicator,
}

/// A classified search term produced from a normalized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// Normalization left nothing searchable. Callers must short-circuit
    /// to a "Not Matched" result without contacting the authority.
    Empty,
    /// The normalized string is purely numeric and should be treated as a
    /// direct identifier lookup rather than a name search.
    Identifier(String),
    /// A searchable name plus the field it should be matched against.
    Name { value: String, field: LookupField },
}

impl SearchTerm {
    /// Classify a normalized name into a search term.
    pub fn classify(normalized: &str) -> SearchTerm {
        if normalized.is_empty() {
            return SearchTerm::Empty;
        }
        if normalized.chars().all(|c| c.is_ascii_digit()) {
            return SearchTerm::Identifier(normalized.to_string());
        }
        let field = if normalized.contains("var.") || normalized.contains("ssp.") {
            LookupField::NameWithIndicator
        } else {
            LookupField::NameWithoutIndicator
        };
        SearchTerm::Name {
            value: normalized.to_string(),
            field,
        }
    }

    /// The string that will be sent to the authority, if any.
    pub fn as_query(&self) -> Option<&str> {
        match self {
            SearchTerm::Empty => None,
            SearchTerm::Identifier(id) => Some(id),
            SearchTerm::Name { value, .. } => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty() {
        assert_eq!(SearchTerm::classify(""), SearchTerm::Empty);
    }

    #[test]
    fn test_classify_numeric_as_identifier() {
        assert_eq!(
            SearchTerm::classify("202423"),
            SearchTerm::Identifier("202423".to_string())
        );
    }

    #[test]
    fn test_classify_plain_binomial() {
        let term = SearchTerm::classify("Ursus arctos");
        assert_eq!(
            term,
            SearchTerm::Name {
                value: "Ursus arctos".to_string(),
                field: LookupField::NameWithoutIndicator,
            }
        );
    }

    #[test]
    fn test_classify_subspecies_uses_indicator_field() {
        let term = SearchTerm::classify("Canis lupus ssp. baileyi");
        match term {
            SearchTerm::Name { field, .. } => {
                assert_eq!(field, LookupField::NameWithIndicator)
            }
            other => panic!("expected name term, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_variety_uses_indicator_field() {
        let term = SearchTerm::classify("Castilleja christii var. alpina");
        match term {
            SearchTerm::Name { field, .. } => {
                assert_eq!(field, LookupField::NameWithIndicator)
            }
            other => panic!("expected name term, got {:?}", other),
        }
    }
}
