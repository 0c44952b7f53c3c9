use anyhow::Result;
use bson::doc;
use pactum_api::scope::{EntityKind, Scope};

const TENANT_KINDS: [EntityKind; 6] = [
    EntityKind::Client,
    EntityKind::Activity,
    EntityKind::Project,
    EntityKind::Task,
    EntityKind::Phase,
    EntityKind::Payment,
];

#[test]
fn cross_tenant_access_without_company_is_a_400() {
    for kind in TENANT_KINDS {
        let err = Scope::Unrestricted.filter_for(kind).unwrap_err();
        assert_eq!(err.status_code(), 400, "{kind:?}");
    }
}

#[test]
fn platform_audit_reads_are_the_only_unrestricted_filter() -> Result<()> {
    let filter = Scope::Unrestricted.filter_for(EntityKind::AuditLog)?;
    assert_eq!(filter, doc! {});
    Ok(())
}

#[test]
fn every_tenant_scope_pins_the_company_key() -> Result<()> {
    let scopes = [
        Scope::Tenant { company_id: "c-1".into() },
        Scope::TenantAssigned { company_id: "c-1".into(), user_id: "u-1".into() },
        Scope::ProjectSubset {
            company_id: "c-1".into(),
            user_id: "u-1".into(),
            project_ids: vec!["p-1".into()],
            client_ids: vec!["cl-1".into()],
        },
    ];
    for scope in &scopes {
        for kind in TENANT_KINDS {
            let filter = scope.filter_for(kind)?;
            assert_eq!(filter.get_str("company_id")?, "c-1", "{kind:?}");
        }
    }
    Ok(())
}

#[test]
fn team_member_filters_are_strictly_narrower_than_tenant_filters() -> Result<()> {
    // A ProjectSubset filter must always add a constraint on top of the
    // company key, so it can never match more than the tenant-wide filter.
    let subset = Scope::ProjectSubset {
        company_id: "c-1".into(),
        user_id: "u-1".into(),
        project_ids: vec!["p-1".into(), "p-2".into()],
        client_ids: vec!["cl-1".into()],
    };
    for kind in TENANT_KINDS {
        let filter = subset.filter_for(kind)?;
        assert!(
            filter.len() > 1,
            "{kind:?} filter must carry more than the company key: {filter:?}"
        );
    }
    Ok(())
}

#[test]
fn id_lookup_composes_with_the_scope_instead_of_replacing_it() -> Result<()> {
    let subset = Scope::ProjectSubset {
        company_id: "c-1".into(),
        user_id: "u-1".into(),
        project_ids: vec!["p-1".into()],
        client_ids: vec![],
    };
    let filter = subset.scoped_id_filter(EntityKind::Project, "p-999")?;

    let clauses = filter.get_array("$and")?;
    let base = clauses[0].as_document().unwrap();
    assert!(base.get_document("id")?.contains_key("$in"));
    assert_eq!(clauses[1].as_document().unwrap().get_str("id")?, "p-999");
    Ok(())
}

#[test]
fn request_filters_cannot_widen_a_subset_scope() -> Result<()> {
    // Query-string filters land in a second $and clause, so repeating a
    // key the scope already constrains only narrows the result.
    let subset = Scope::ProjectSubset {
        company_id: "c-1".into(),
        user_id: "u-1".into(),
        project_ids: vec!["p-1".into()],
        client_ids: vec![],
    };
    let filter = subset.scoped_filter(EntityKind::Task, doc! { "project_id": "p-outside" })?;

    let clauses = filter.get_array("$and")?;
    let base = clauses[0].as_document().unwrap();
    assert!(base.get_document("project_id")?.contains_key("$in"));
    Ok(())
}
