//! Human-readable rendering of a mutation plan.
//!
//! The statement is what an operator reviews before approving. It is never
//! executed by the gateway.

use crate::shape::MutationPlan;
use warden_core::{PolicyInfo, PolicyType, PolicyUpdate, Scope, SecurableType};

/// Render the equivalent policy statement.
pub fn render_statement(plan: &MutationPlan) -> String {
    match plan {
        MutationPlan::Create(info) => render_create(info),
        MutationPlan::Update {
            name,
            scope,
            update,
        } => render_update(name, scope, update),
        MutationPlan::Delete { name, scope } => format!("DROP POLICY {} ON {};", name, scope),
    }
}

/// One-paragraph description of the plan's effect.
pub fn describe(plan: &MutationPlan) -> String {
    match plan {
        MutationPlan::Create(info) => {
            let mut text = format!(
                "Create {} policy '{}' on {} using {} for {} on {}",
                kind(info.policy_type),
                info.name,
                info.scope,
                info.function_name,
                info.to_principals.join(", "),
                plural(info.for_securable_type).to_lowercase(),
            );
            if !info.except_principals.is_empty() {
                text.push_str(&format!(", except {}", info.except_principals.join(", ")));
            }
            if let Some(selector) = &info.match_columns {
                text.push_str(&format!(", matching columns {}", selector));
            }
            text.push('.');
            text
        }
        MutationPlan::Update {
            name,
            scope,
            update,
        } => {
            let mut changes = Vec::new();
            if let Some(to) = &update.to_principals {
                changes.push(format!("apply to {}", to.join(", ")));
            }
            if let Some(except) = &update.except_principals {
                if except.is_empty() {
                    changes.push("remove all exceptions".to_string());
                } else {
                    changes.push(format!("exempt {}", except.join(", ")));
                }
            }
            if let Some(comment) = &update.comment {
                changes.push(format!("set comment to '{}'", comment));
            }
            format!("Update policy '{}' on {}: {}.", name, scope, changes.join("; "))
        }
        MutationPlan::Delete { name, scope } => format!(
            "Delete policy '{}' from {}. Columns and rows it protects become visible to everyone with access.",
            name, scope
        ),
    }
}

fn render_create(info: &PolicyInfo) -> String {
    let mut lines = vec![format!("CREATE POLICY {}", info.name), format!("ON {}", info.scope)];
    if let Some(comment) = &info.comment {
        lines.push(format!("COMMENT {}", quote_literal(comment)));
    }
    lines.push(format!("{} {}", kind(info.policy_type), info.function_name));
    lines.push(format!("TO {}", principal_list(&info.to_principals)));
    if !info.except_principals.is_empty() {
        lines.push(format!("EXCEPT {}", principal_list(&info.except_principals)));
    }
    lines.push(format!("FOR {}", plural(info.for_securable_type)));
    if let Some(condition) = &info.when_condition {
        lines.push(format!("WHEN {}", condition));
    }
    if let Some(selector) = &info.match_columns {
        lines.push(format!("MATCH COLUMNS {} AS col", selector));
        lines.push(match info.policy_type {
            PolicyType::ColumnMask => "ON COLUMN col".to_string(),
            PolicyType::RowFilter => "USING COLUMNS (col)".to_string(),
        });
    }

    let mut statement = lines.join("\n");
    statement.push(';');
    statement
}

fn render_update(name: &str, scope: &Scope, update: &PolicyUpdate) -> String {
    let mut lines = vec![format!("ALTER POLICY {}", name), format!("ON {}", scope)];
    if let Some(to) = &update.to_principals {
        lines.push(format!("TO {}", principal_list(to)));
    }
    if let Some(except) = &update.except_principals {
        if except.is_empty() {
            lines.push("EXCEPT NONE".to_string());
        } else {
            lines.push(format!("EXCEPT {}", principal_list(except)));
        }
    }
    if let Some(comment) = &update.comment {
        lines.push(format!("COMMENT {}", quote_literal(comment)));
    }

    let mut statement = lines.join("\n");
    statement.push(';');
    statement
}

fn kind(policy_type: PolicyType) -> &'static str {
    match policy_type {
        PolicyType::ColumnMask => "COLUMN MASK",
        PolicyType::RowFilter => "ROW FILTER",
    }
}

fn plural(securable: SecurableType) -> &'static str {
    match securable {
        SecurableType::Catalog => "CATALOGS",
        SecurableType::Schema => "SCHEMAS",
        SecurableType::Table => "TABLES",
    }
}

fn principal_list(principals: &[String]) -> String {
    principals
        .iter()
        .map(|p| format!("`{}`", p.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn finance() -> Scope {
        Scope::schema("prod.finance").unwrap()
    }

    fn mask_ssn() -> PolicyInfo {
        PolicyInfo {
            name: "mask_ssn_finance".into(),
            scope: finance(),
            policy_type: PolicyType::ColumnMask,
            function_name: "prod.governance.mask_ssn".into(),
            to_principals: vec!["analysts".into()],
            except_principals: vec!["finance_admins".into()],
            for_securable_type: SecurableType::Table,
            match_columns: Some("hasTagValue('pii', 'ssn')".into()),
            when_condition: None,
            comment: Some("Mask SSNs for analysts".into()),
        }
    }

    #[test]
    fn test_render_create_column_mask() {
        let statement = render_statement(&MutationPlan::Create(mask_ssn()));
        assert_eq!(
            statement,
            "CREATE POLICY mask_ssn_finance\n\
             ON SCHEMA prod.finance\n\
             COMMENT 'Mask SSNs for analysts'\n\
             COLUMN MASK prod.governance.mask_ssn\n\
             TO `analysts`\n\
             EXCEPT `finance_admins`\n\
             FOR TABLES\n\
             MATCH COLUMNS hasTagValue('pii', 'ssn') AS col\n\
             ON COLUMN col;"
        );
    }

    #[test]
    fn test_render_create_row_filter_with_condition() {
        let info = PolicyInfo {
            name: "eu_only".into(),
            policy_type: PolicyType::RowFilter,
            function_name: "prod.governance.eu_rows".into(),
            except_principals: vec![],
            match_columns: None,
            when_condition: Some("hasTag('gdpr')".into()),
            comment: Some("it's regional".into()),
            ..mask_ssn()
        };
        assert_eq!(
            render_statement(&MutationPlan::Create(info)),
            "CREATE POLICY eu_only\n\
             ON SCHEMA prod.finance\n\
             COMMENT 'it''s regional'\n\
             ROW FILTER prod.governance.eu_rows\n\
             TO `analysts`\n\
             FOR TABLES\n\
             WHEN hasTag('gdpr');"
        );
    }

    #[test]
    fn test_render_update_only_set_fields() {
        let plan = MutationPlan::Update {
            name: "mask_ssn_finance".into(),
            scope: finance(),
            update: PolicyUpdate {
                except_principals: Some(vec![]),
                comment: Some("widened".into()),
                ..Default::default()
            },
        };
        assert_eq!(
            render_statement(&plan),
            "ALTER POLICY mask_ssn_finance\nON SCHEMA prod.finance\nEXCEPT NONE\nCOMMENT 'widened';"
        );
        assert_eq!(
            describe(&plan),
            "Update policy 'mask_ssn_finance' on SCHEMA prod.finance: remove all exceptions; set comment to 'widened'."
        );
    }

    #[test]
    fn test_render_delete() {
        let plan = MutationPlan::Delete {
            name: "mask_ssn_finance".into(),
            scope: finance(),
        };
        assert_eq!(
            render_statement(&plan),
            "DROP POLICY mask_ssn_finance ON SCHEMA prod.finance;"
        );
        assert!(describe(&plan).starts_with("Delete policy 'mask_ssn_finance' from SCHEMA prod.finance."));
    }

    #[test]
    fn test_describe_create() {
        assert_eq!(
            describe(&MutationPlan::Create(mask_ssn())),
            "Create COLUMN MASK policy 'mask_ssn_finance' on SCHEMA prod.finance using \
             prod.governance.mask_ssn for analysts on tables, except finance_admins, \
             matching columns hasTagValue('pii', 'ssn')."
        );
    }
}
