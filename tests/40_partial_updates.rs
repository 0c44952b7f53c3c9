use anyhow::Result;
use pactum_api::models::{
    to_set_document, ActivityUpdate, ClientUpdate, CompanyUpdate, PaymentUpdate, PhaseUpdate,
    ProjectUpdate, TaskUpdate,
};
use serde_json::json;

#[test]
fn client_payload_with_extra_fields_cannot_smuggle_ownership() -> Result<()> {
    // A hostile payload naming protected fields: the typed update struct
    // simply has nowhere to put them.
    let update: ClientUpdate = serde_json::from_value(json!({
        "name": "Renamed",
        "company_id": "another-tenant",
        "created_by": "someone-else",
        "id": "forged",
    }))?;

    let set = to_set_document(&update)?;
    assert_eq!(set.get_str("name")?, "Renamed");
    for protected in ["id", "company_id", "created_by", "created_at"] {
        assert!(!set.contains_key(protected), "{protected} leaked into $set");
    }
    Ok(())
}

#[test]
fn unset_fields_stay_out_of_the_set_document() -> Result<()> {
    let update: TaskUpdate = serde_json::from_value(json!({ "status": "en_progreso" }))?;
    let set = to_set_document(&update)?;

    assert_eq!(set.get_str("status")?, "en_progreso");
    assert!(!set.contains_key("title"));
    assert!(!set.contains_key("assigned_to"));
    // updated_at is always refreshed
    assert!(set.contains_key("updated_at"));
    Ok(())
}

#[test]
fn every_update_struct_lowers_defaults_to_timestamp_only() -> Result<()> {
    assert_eq!(to_set_document(&ClientUpdate::default())?.len(), 1);
    assert_eq!(to_set_document(&ActivityUpdate::default())?.len(), 1);
    assert_eq!(to_set_document(&ProjectUpdate::default())?.len(), 1);
    assert_eq!(to_set_document(&TaskUpdate::default())?.len(), 1);
    assert_eq!(to_set_document(&PhaseUpdate::default())?.len(), 1);
    assert_eq!(to_set_document(&PaymentUpdate::default())?.len(), 1);
    assert_eq!(to_set_document(&CompanyUpdate::default())?.len(), 1);
    Ok(())
}

#[test]
fn activity_update_keeps_the_type_wire_name() -> Result<()> {
    let update: ActivityUpdate = serde_json::from_value(json!({ "type": "reunion" }))?;
    let set = to_set_document(&update)?;
    assert_eq!(set.get_str("type")?, "reunion");
    assert!(!set.contains_key("kind"));
    Ok(())
}
