//! Per-request visibility scope.
//!
//! A scope is derived once from the authenticated user and gated tenant,
//! then rendered into a query filter per entity kind. Every tenant-scoped
//! read and mutation goes through the same filter, so a caller can never
//! widen their reach by hitting a different endpoint.

use bson::{doc, Document};
use futures::TryStreamExt;

use crate::db::Store;
use crate::error::ApiError;
use crate::models::{Company, Project, Role, User};

/// Entity families that scope filters are rendered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Client,
    Activity,
    Project,
    Task,
    Phase,
    Payment,
    AuditLog,
}

/// Visibility scope for one request.
#[derive(Debug, Clone)]
pub enum Scope {
    /// SUPER_ADMIN outside any tenant. Tenant-scoped entity access must
    /// name a concrete company through a dedicated admin endpoint instead.
    Unrestricted,
    /// Everything inside one company.
    Tenant { company_id: String },
    /// Company-wide reads narrowed to records assigned to or created by
    /// the user where the entity supports assignment.
    TenantAssigned { company_id: String, user_id: String },
    /// External collaborator: only the projects they are assigned to and
    /// the records hanging off those projects.
    ProjectSubset {
        company_id: String,
        user_id: String,
        project_ids: Vec<String>,
        client_ids: Vec<String>,
    },
}

impl Scope {
    /// Derive the scope for an authenticated, tenant-gated request.
    ///
    /// TEAM_MEMBER resolution queries the project collection once; the
    /// resulting id sets are fixed for the rest of the request.
    pub async fn resolve(
        store: &Store,
        user: &User,
        tenant: Option<&Company>,
    ) -> Result<Self, ApiError> {
        if user.role.is_super_admin() {
            return Ok(match tenant {
                Some(company) => Scope::Tenant {
                    company_id: company.id.clone(),
                },
                None => Scope::Unrestricted,
            });
        }

        let company = tenant.ok_or_else(|| {
            tracing::error!(user_id = %user.id, "scope resolution without a gated tenant");
            ApiError::bad_request("User does not belong to any company")
        })?;

        match user.role {
            Role::CompanyAdmin => Ok(Scope::Tenant {
                company_id: company.id.clone(),
            }),
            Role::User => Ok(Scope::TenantAssigned {
                company_id: company.id.clone(),
                user_id: user.id.clone(),
            }),
            Role::TeamMember => {
                let projects: Vec<Project> = store
                    .projects()
                    .find(
                        doc! { "company_id": company.id.as_str(), "assigned_users": user.id.as_str() },
                        None,
                    )
                    .await?
                    .try_collect()
                    .await?;

                let project_ids: Vec<String> = projects.iter().map(|p| p.id.clone()).collect();
                let client_ids: Vec<String> =
                    projects.iter().filter_map(|p| p.client_id.clone()).collect();

                Ok(Scope::ProjectSubset {
                    company_id: company.id.clone(),
                    user_id: user.id.clone(),
                    project_ids,
                    client_ids,
                })
            }
            Role::SuperAdmin => unreachable!("handled above"),
        }
    }

    /// Render the scope into a query filter for one entity kind.
    ///
    /// The same document is used for reads and as the match half of
    /// updates and deletes.
    pub fn filter_for(&self, kind: EntityKind) -> Result<Document, ApiError> {
        match self {
            Scope::Unrestricted => match kind {
                // Platform-wide audit reads are the one cross-tenant view.
                EntityKind::AuditLog => Ok(doc! {}),
                _ => Err(ApiError::bad_request(
                    "Cross-tenant access requires an explicit company context",
                )),
            },
            Scope::Tenant { company_id } => Ok(doc! { "company_id": company_id.as_str() }),
            Scope::TenantAssigned {
                company_id,
                user_id,
            } => {
                let mut filter = doc! { "company_id": company_id.as_str() };
                match kind {
                    EntityKind::Task | EntityKind::Activity => {
                        filter.insert(
                            "$or",
                            vec![
                                doc! { "assigned_to": user_id.as_str() },
                                doc! { "created_by": user_id.as_str() },
                            ],
                        );
                    }
                    EntityKind::Project => {
                        filter.insert(
                            "$or",
                            vec![
                                doc! { "assigned_users": user_id.as_str() },
                                doc! { "created_by": user_id.as_str() },
                            ],
                        );
                    }
                    // Clients, phases, payments and audit reads stay
                    // company-wide for internal users.
                    _ => {}
                }
                Ok(filter)
            }
            Scope::ProjectSubset {
                company_id,
                user_id,
                project_ids,
                client_ids,
            } => {
                let mut filter = doc! { "company_id": company_id.as_str() };
                match kind {
                    EntityKind::Project => {
                        filter.insert("id", doc! { "$in": project_ids.clone() });
                    }
                    EntityKind::Task | EntityKind::Phase | EntityKind::Payment => {
                        filter.insert("project_id", doc! { "$in": project_ids.clone() });
                    }
                    EntityKind::Client => {
                        filter.insert("id", doc! { "$in": client_ids.clone() });
                    }
                    EntityKind::Activity => {
                        filter.insert(
                            "$or",
                            vec![
                                doc! { "assigned_to": user_id.as_str() },
                                doc! { "created_by": user_id.as_str() },
                                doc! { "client_id": { "$in": client_ids.clone() } },
                            ],
                        );
                    }
                    EntityKind::AuditLog => {}
                }
                Ok(filter)
            }
        }
    }

    /// Scope filter conjoined with extra request criteria. `$and` keeps the
    /// scope's own keys intact even when the extra filter repeats one.
    pub fn scoped_filter(&self, kind: EntityKind, extra: Document) -> Result<Document, ApiError> {
        let base = self.filter_for(kind)?;
        if extra.is_empty() {
            return Ok(base);
        }
        Ok(doc! { "$and": [base, extra] })
    }

    /// Match one record by id without widening the scope.
    pub fn scoped_id_filter(&self, kind: EntityKind, id: &str) -> Result<Document, ApiError> {
        self.scoped_filter(kind, doc! { "id": id })
    }

    /// The concrete company this scope writes into, if any.
    pub fn company_id(&self) -> Option<&str> {
        match self {
            Scope::Unrestricted => None,
            Scope::Tenant { company_id }
            | Scope::TenantAssigned { company_id, .. }
            | Scope::ProjectSubset { company_id, .. } => Some(company_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;

    const ALL_KINDS: [EntityKind; 7] = [
        EntityKind::Client,
        EntityKind::Activity,
        EntityKind::Project,
        EntityKind::Task,
        EntityKind::Phase,
        EntityKind::Payment,
        EntityKind::AuditLog,
    ];

    #[test]
    fn unrestricted_rejects_tenant_entities() {
        for kind in ALL_KINDS {
            let result = Scope::Unrestricted.filter_for(kind);
            if kind == EntityKind::AuditLog {
                assert_eq!(result.unwrap(), doc! {});
            } else {
                assert_eq!(result.unwrap_err().status_code(), 400);
            }
        }
    }

    #[test]
    fn tenant_scope_pins_company_on_every_kind() {
        let scope = Scope::Tenant {
            company_id: "c-1".into(),
        };
        for kind in ALL_KINDS {
            let filter = scope.filter_for(kind).unwrap();
            assert_eq!(filter.get_str("company_id").unwrap(), "c-1");
        }
    }

    #[test]
    fn assigned_scope_narrows_tasks_and_activities() {
        let scope = Scope::TenantAssigned {
            company_id: "c-1".into(),
            user_id: "u-9".into(),
        };

        for kind in [EntityKind::Task, EntityKind::Activity, EntityKind::Project] {
            let filter = scope.filter_for(kind).unwrap();
            assert_eq!(filter.get_str("company_id").unwrap(), "c-1");
            assert!(filter.get_array("$or").unwrap().len() == 2);
        }

        // Reference data stays company-wide
        let clients = scope.filter_for(EntityKind::Client).unwrap();
        assert_eq!(clients, doc! { "company_id": "c-1" });
    }

    #[test]
    fn project_subset_constrains_every_kind_to_assignments() {
        let scope = Scope::ProjectSubset {
            company_id: "c-1".into(),
            user_id: "u-9".into(),
            project_ids: vec!["p-1".into(), "p-2".into()],
            client_ids: vec!["cl-1".into()],
        };

        let projects = scope.filter_for(EntityKind::Project).unwrap();
        assert_eq!(
            projects.get_document("id").unwrap().get_array("$in").unwrap(),
            &vec![Bson::from("p-1"), Bson::from("p-2")]
        );

        for kind in [EntityKind::Task, EntityKind::Phase, EntityKind::Payment] {
            let filter = scope.filter_for(kind).unwrap();
            assert!(filter.get_document("project_id").unwrap().contains_key("$in"));
        }

        let clients = scope.filter_for(EntityKind::Client).unwrap();
        assert_eq!(
            clients.get_document("id").unwrap().get_array("$in").unwrap(),
            &vec![Bson::from("cl-1")]
        );
    }

    #[test]
    fn subset_filters_always_carry_the_company_key() {
        // Every non-unrestricted scope must include the tenant key, so a
        // stale or forged id list can never cross companies.
        let scopes = [
            Scope::Tenant {
                company_id: "c-1".into(),
            },
            Scope::TenantAssigned {
                company_id: "c-1".into(),
                user_id: "u-1".into(),
            },
            Scope::ProjectSubset {
                company_id: "c-1".into(),
                user_id: "u-1".into(),
                project_ids: vec![],
                client_ids: vec![],
            },
        ];
        for scope in &scopes {
            for kind in ALL_KINDS {
                let filter = scope.filter_for(kind).unwrap();
                assert_eq!(filter.get_str("company_id").unwrap(), "c-1");
            }
        }
    }

    #[test]
    fn id_lookup_never_displaces_subset_constraints() {
        let scope = Scope::ProjectSubset {
            company_id: "c-1".into(),
            user_id: "u-9".into(),
            project_ids: vec!["p-1".into()],
            client_ids: vec!["cl-1".into()],
        };
        let filter = scope.scoped_id_filter(EntityKind::Client, "cl-2").unwrap();
        let clauses = filter.get_array("$and").unwrap();
        assert_eq!(clauses.len(), 2);
        // First clause still carries the $in restriction
        let base = clauses[0].as_document().unwrap();
        assert!(base.get_document("id").unwrap().contains_key("$in"));
        let extra = clauses[1].as_document().unwrap();
        assert_eq!(extra.get_str("id").unwrap(), "cl-2");
    }

    #[test]
    fn empty_extra_filter_is_not_wrapped() {
        let scope = Scope::Tenant {
            company_id: "c-1".into(),
        };
        let filter = scope.scoped_filter(EntityKind::Client, doc! {}).unwrap();
        assert_eq!(filter, doc! { "company_id": "c-1" });
    }

    #[test]
    fn empty_assignment_list_matches_nothing() {
        let scope = Scope::ProjectSubset {
            company_id: "c-1".into(),
            user_id: "u-1".into(),
            project_ids: vec![],
            client_ids: vec![],
        };
        let filter = scope.filter_for(EntityKind::Task).unwrap();
        let ids = filter.get_document("project_id").unwrap().get_array("$in").unwrap();
        assert!(ids.is_empty());
    }
}
