//! Shared test fixtures.

use crate::authority::{AphiaRecord, ItisDoc};
use crate::testing::MockRecord;

/// An accepted-form ITIS document with the common Species-rank shape.
pub fn itis_doc(tsn: &str, name: &str, usage: &str) -> ItisDoc {
    ItisDoc {
        tsn: tsn.to_string(),
        name_w_ind: name.to_string(),
        name_wo_ind: name.to_string(),
        usage: usage.to_string(),
        rank: "Species".to_string(),
        accepted_tsn: vec![],
        create_date: Some("1996-06-13 14:51:08".to_string()),
        update_date: Some("2014-03-25".to_string()),
        hierarchy_so_far_w_ranks: vec![format!(
            "{}:$Kingdom:Animalia$Phylum:Chordata$Species:{}$",
            tsn, name
        )],
        vernacular: vec![],
    }
}

/// A non-accepted ITIS document pointing at its accepted counterpart.
pub fn itis_doc_with_accepted(tsn: &str, name: &str, usage: &str, accepted: &str) -> ItisDoc {
    let mut doc = itis_doc(tsn, name, usage);
    doc.accepted_tsn = vec![accepted.to_string()];
    doc
}

/// An accepted WoRMS record.
pub fn aphia_record(aphia_id: i64, name: &str, status: &str) -> AphiaRecord {
    AphiaRecord {
        aphia_id,
        scientificname: name.to_string(),
        status: status.to_string(),
        rank: Some("Species".to_string()),
        valid_name: Some(name.to_string()),
        valid_aphia_id: Some(aphia_id),
        kingdom: Some("Animalia".to_string()),
        phylum: None,
        class: None,
        order: None,
        family: None,
        genus: None,
        lsid: Some(format!("urn:lsid:marinespecies.org:taxname:{}", aphia_id)),
        is_marine: Some(1),
        is_brackish: None,
        is_freshwater: None,
        is_terrestrial: None,
        is_extinct: None,
        match_type: Some("exact".to_string()),
        modified: None,
    }
}

/// An unaccepted WoRMS record pointing at its valid counterpart.
pub fn aphia_record_with_valid(
    aphia_id: i64,
    name: &str,
    valid_id: i64,
    valid_name: &str,
) -> AphiaRecord {
    let mut record = aphia_record(aphia_id, name, "unaccepted");
    record.valid_aphia_id = Some(valid_id);
    record.valid_name = Some(valid_name.to_string());
    record
}

/// A bare registration awaiting all pipeline steps.
pub fn registration(id: i64, source: &str, name: &str) -> MockRecord {
    MockRecord {
        id,
        source: Some(source.to_string()),
        scientificname: Some(name.to_string()),
        ..Default::default()
    }
}
