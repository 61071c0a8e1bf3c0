//! SGCN source annotations.
//!
//! Records registered from the State Wildlife Action Plan process carry
//! two pieces of context no authority can supply: a preferred taxonomic
//! group aligned through a configured mapping, and membership in the
//! original 2005 SWAP national list. The latter keeps taxa that predate
//! the current authorities from looking like they were never checked.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::bucket::SgcnBucket;

/// Group used when a provided name maps to nothing.
const OTHER_GROUP: &str = "Other";

/// Provided-name to preferred-name taxonomic group alignment.
#[derive(Debug, Clone, Default)]
pub struct TaxonomicGroupMap {
    provided_to_preferred: HashMap<String, String>,
    preferred: HashSet<String>,
}

impl TaxonomicGroupMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a two-column "ProvidedName,PreferredName" mapping file.
    /// The first line is assumed to be a header and skipped.
    pub fn from_csv(text: &str) -> Self {
        let mut map = Self::new();
        for line in text.lines().skip(1) {
            if let Some((provided, preferred)) = line.split_once(',') {
                map.insert(provided.trim(), preferred.trim());
            }
        }
        map
    }

    pub fn insert(&mut self, provided: &str, preferred: &str) {
        self.provided_to_preferred
            .insert(provided.to_string(), preferred.to_string());
        self.preferred.insert(preferred.to_string());
    }

    /// Align a provided group name: mapped names resolve to their
    /// preferred form, names already preferred pass through, everything
    /// else lands in "Other".
    pub fn resolve(&self, provided: Option<&str>) -> String {
        let Some(provided) = provided else {
            return OTHER_GROUP.to_string();
        };
        if let Some(preferred) = self.provided_to_preferred.get(provided) {
            return preferred.clone();
        }
        if self.preferred.contains(provided) {
            return provided.to_string();
        }
        OTHER_GROUP.to_string()
    }
}

/// A flat reference list of scientific names, used for the 2005 SWAP
/// national list membership check.
#[derive(Debug, Clone, Default)]
pub struct ReferenceList {
    names: HashSet<String>,
}

impl ReferenceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// One name per line; blank lines and a leading "scientificname"
    /// header are ignored.
    pub fn from_lines(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != "scientificname")
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether any of the record's known names appears in the list.
    pub fn contains_any<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names.into_iter().any(|name| self.contains(name))
    }
}

/// Builds SGCN annotation buckets from the configured reference data.
#[derive(Debug, Clone, Default)]
pub struct SgcnAnnotator {
    pub groups: TaxonomicGroupMap,
    pub swap2005: ReferenceList,
}

impl SgcnAnnotator {
    pub fn new(groups: TaxonomicGroupMap, swap2005: ReferenceList) -> Self {
        Self { groups, swap2005 }
    }

    /// Build the annotation bucket for one record.
    ///
    /// `names` are all names the record is known by (submitted plus any
    /// authority-matched names); `provided_group` is the group the
    /// source submitted, if any.
    pub fn annotate(
        &self,
        names: &[String],
        provided_group: Option<&str>,
        state_lists: BTreeMap<String, Vec<String>>,
    ) -> SgcnBucket {
        let group = self.groups.resolve(provided_group);
        let swap2005 = self
            .swap2005
            .contains_any(names.iter().map(String::as_str));
        SgcnBucket::new(group, swap2005, state_lists)
    }
}
