//! Keyword-driven natural language search and update.
//!
//! There is no language model behind this: a search phrase is mapped onto a
//! table plus an encoded query using a small vocabulary, and an update
//! instruction must follow the shape
//! `<record> ... set <field> to <value> [and <field> to <value>]`,
//! where `<record>` is a record number such as `INC0010001` or a sys_id.

use super::{is_sys_id, validate_table, RecordQuery};
use crate::client::ServiceNowClient;
use crate::error::{ServiceNowError, ServiceNowResult};
use crate::types::{
    NaturalLanguageSearchParams, NaturalLanguageSearchResult, NaturalLanguageUpdateParams,
    NaturalLanguageUpdateResult, Record,
};

/// Default number of records returned by a natural language search.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

const TABLE_KEYWORDS: &[(&str, &str)] = &[
    ("incident", "incident"),
    ("incidents", "incident"),
    ("ticket", "incident"),
    ("tickets", "incident"),
    ("outage", "incident"),
    ("outages", "incident"),
    ("problem", "problem"),
    ("problems", "problem"),
    ("change", "change_request"),
    ("changes", "change_request"),
    ("user", "sys_user"),
    ("users", "sys_user"),
    ("people", "sys_user"),
    ("group", "sys_user_group"),
    ("groups", "sys_user_group"),
    ("team", "sys_user_group"),
    ("teams", "sys_user_group"),
    ("server", "cmdb_ci"),
    ("servers", "cmdb_ci"),
    ("ci", "cmdb_ci"),
    ("cis", "cmdb_ci"),
    ("cmdb", "cmdb_ci"),
    ("asset", "cmdb_ci"),
    ("assets", "cmdb_ci"),
];

const TASK_TABLES: &[&str] = &["incident", "problem", "change_request"];

const STOP_WORDS: &[&str] = &[
    "a", "all", "an", "and", "any", "are", "as", "by", "find", "for", "from", "get", "give",
    "in", "is", "list", "me", "my", "of", "on", "or", "please", "priority", "search", "show",
    "that", "the", "to", "what", "which", "with",
];

/// How a search phrase maps onto the Table API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    pub table: &'static str,
    pub encoded_query: String,
}

/// Translate a free-text search into a table and encoded query.
pub fn plan_search(phrase: &str) -> SearchPlan {
    let words: Vec<String> = phrase
        .split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '@')))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect();

    let table = words
        .iter()
        .find_map(|w| {
            TABLE_KEYWORDS
                .iter()
                .find(|(keyword, _)| keyword == w)
                .map(|(_, table)| *table)
        })
        .unwrap_or("incident");
    let is_task = TASK_TABLES.contains(&table);

    let mut clauses: Vec<String> = Vec::new();
    let mut text = Vec::new();

    for (i, word) in words.iter().enumerate() {
        let next = words.get(i + 1).map(String::as_str);
        match word.as_str() {
            w if TABLE_KEYWORDS.iter().any(|(keyword, _)| *keyword == w) => {}
            "open" | "active" => {
                let clause = if table == "cmdb_ci" {
                    "operational_status=1"
                } else {
                    "active=true"
                };
                push_unique(&mut clauses, clause);
            }
            "critical" | "p1" | "urgent" if is_task => push_unique(&mut clauses, "priority=1"),
            "high" if is_task && next == Some("priority") => {
                push_unique(&mut clauses, "priority<=2")
            }
            w if STOP_WORDS.contains(&w) => {}
            w => text.push(w.to_string()),
        }
    }

    if !text.is_empty() {
        clauses.push(format!("123TEXTQUERY321={}", text.join(" ")));
    }
    if is_task {
        clauses.push("ORDERBYDESCsys_created_on".to_string());
    }

    SearchPlan {
        table,
        encoded_query: clauses.join("^"),
    }
}

fn push_unique(clauses: &mut Vec<String>, clause: &str) {
    if !clauses.iter().any(|c| c == clause) {
        clauses.push(clause.to_string());
    }
}

/// Which record an update instruction targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    SysId(String),
    Number(String),
}

/// A parsed update instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub target: RecordRef,
    pub assignments: Vec<(String, String)>,
}

/// Parse `<record> ... set <field> to <value> [and <field> to <value>]`.
pub fn plan_update(instruction: &str) -> ServiceNowResult<UpdatePlan> {
    let lower = instruction.to_ascii_lowercase();
    let set_at = if lower.starts_with("set ") {
        Some(0)
    } else {
        lower.find(" set ").map(|i| i + 1)
    };

    let Some(set_at) = set_at else {
        return Err(ServiceNowError::InvalidRequest(
            "Instruction must contain at least one \"set <field> to <value>\" clause".to_string(),
        ));
    };

    let (head, tail) = instruction.split_at(set_at);
    let tail = &tail[4..];

    let target = find_record_ref(head)
        .or_else(|| find_record_ref(tail))
        .ok_or_else(|| {
            ServiceNowError::InvalidRequest(
                "Instruction must name a record number (e.g. INC0010001) or a sys_id".to_string(),
            )
        })?;

    let mut assignments: Vec<(String, String)> = Vec::new();
    for clause in tail.split(',').flat_map(|part| split_ignore_case(part, " and ")) {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let clause = strip_prefix_ignore_case(clause, "set ").unwrap_or(clause);

        match parse_assignment(clause)? {
            Some(assignment) => assignments.push(assignment),
            // "... to Restarted and verified" keeps its "and".
            None => match assignments.last_mut() {
                Some((_, value)) => {
                    value.push_str(" and ");
                    value.push_str(clause);
                }
                None => {
                    return Err(ServiceNowError::InvalidRequest(format!(
                        "Could not understand \"{}\": expected \"<field> to <value>\"",
                        clause
                    )))
                }
            },
        }
    }

    if assignments.is_empty() {
        return Err(ServiceNowError::InvalidRequest(
            "Instruction must contain at least one \"set <field> to <value>\" clause".to_string(),
        ));
    }

    Ok(UpdatePlan {
        target,
        assignments: assignments
            .into_iter()
            .map(|(field, value)| (field, clean_value(&value)))
            .collect(),
    })
}

fn find_record_ref(text: &str) -> Option<RecordRef> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find_map(|token| {
            if is_sys_id(token) {
                Some(RecordRef::SysId(token.to_ascii_lowercase()))
            } else if is_record_number(token) {
                Some(RecordRef::Number(token.to_ascii_uppercase()))
            } else {
                None
            }
        })
}

/// Record numbers look like `INC0010001` or `CHG0000123`.
fn is_record_number(token: &str) -> bool {
    let letters = token.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let digits = &token[letters..];
    letters >= 2 && digits.len() >= 3 && digits.chars().all(|c| c.is_ascii_digit())
}

fn split_ignore_case<'s>(text: &'s str, separator: &str) -> Vec<&'s str> {
    let lower = text.to_ascii_lowercase();
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(pos) = lower[start..].find(separator) {
        parts.push(&text[start..start + pos]);
        start += pos + separator.len();
    }
    parts.push(&text[start..]);
    parts
}

fn strip_prefix_ignore_case<'s>(text: &'s str, prefix: &str) -> Option<&'s str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn parse_assignment(clause: &str) -> ServiceNowResult<Option<(String, String)>> {
    let lower = clause.to_ascii_lowercase();
    let (field, value) = match lower.find(" to ") {
        Some(pos) => (&clause[..pos], &clause[pos + 4..]),
        None => match clause.find('=') {
            Some(pos) => (&clause[..pos], &clause[pos + 1..]),
            None => return Ok(None),
        },
    };

    let field = field.trim().to_ascii_lowercase().replace(' ', "_");
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ServiceNowError::InvalidRequest(format!(
            "Invalid field name \"{}\" in instruction",
            field
        )));
    }

    Ok(Some((field, value.trim().to_string())))
}

fn clean_value(value: &str) -> String {
    let value = value.trim().trim_end_matches('.').trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
        .to_string()
}

/// Natural language API.
pub struct NaturalLanguageApi<'a> {
    client: &'a ServiceNowClient,
}

impl<'a> NaturalLanguageApi<'a> {
    pub(crate) fn new(client: &'a ServiceNowClient) -> Self {
        Self { client }
    }

    /// Run a free-text search.
    pub async fn search(&self, params: &NaturalLanguageSearchParams) -> ServiceNowResult<NaturalLanguageSearchResult> {
        let plan = plan_search(&params.query);
        let query = RecordQuery::new(plan.table)
            .query(plan.encoded_query.clone())
            .limit(params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .display_value();
        let records = self.client.table().list(&query).await?;

        Ok(NaturalLanguageSearchResult {
            table: plan.table.to_string(),
            encoded_query: plan.encoded_query,
            count: records.len(),
            records,
        })
    }

    /// Apply an update instruction to one record.
    pub async fn update(&self, params: &NaturalLanguageUpdateParams) -> ServiceNowResult<NaturalLanguageUpdateResult> {
        validate_table(&params.table)?;
        let plan = plan_update(&params.instruction)?;

        let (sys_id, number) = match plan.target {
            RecordRef::SysId(sys_id) => (sys_id, None),
            RecordRef::Number(number) => {
                let query = RecordQuery::new(&params.table)
                    .query(format!("number={}", number))
                    .fields("sys_id,number")
                    .limit(1);
                let found = self.client.table().list(&query).await?;
                let sys_id = found
                    .first()
                    .and_then(|r| r.get("sys_id"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ServiceNowError::NotFound(format!(
                            "No record {} in table \"{}\"",
                            number, params.table
                        ))
                    })?;
                (sys_id, Some(number))
            }
        };

        let updated_fields: Record = plan
            .assignments
            .into_iter()
            .map(|(field, value)| (field, serde_json::Value::String(value)))
            .collect();

        let record = self
            .client
            .table()
            .update(&params.table, &sys_id, &updated_fields)
            .await?;

        let number = record
            .get("number")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or(number);

        Ok(NaturalLanguageUpdateResult {
            table: params.table.clone(),
            sys_id,
            number,
            updated_fields,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_client;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_plan_search_open_critical_incidents() {
        let plan = plan_search("Show me open critical incidents about email");
        assert_eq!(plan.table, "incident");
        assert_eq!(
            plan.encoded_query,
            "active=true^priority=1^123TEXTQUERY321=about email^ORDERBYDESCsys_created_on"
        );
    }

    #[test]
    fn test_plan_search_servers() {
        let plan = plan_search("active linux servers");
        assert_eq!(plan.table, "cmdb_ci");
        assert_eq!(plan.encoded_query, "operational_status=1^123TEXTQUERY321=linux");
    }

    #[test]
    fn test_plan_search_defaults_to_incidents() {
        let plan = plan_search("vpn");
        assert_eq!(plan.table, "incident");
        assert_eq!(plan.encoded_query, "123TEXTQUERY321=vpn^ORDERBYDESCsys_created_on");
    }

    #[test]
    fn test_plan_search_high_priority_changes() {
        let plan = plan_search("high priority changes");
        assert_eq!(plan.table, "change_request");
        assert_eq!(plan.encoded_query, "priority<=2^ORDERBYDESCsys_created_on");
    }

    #[test]
    fn test_plan_update_number_and_fields() {
        let plan = plan_update("Update inc0010001: set state to 2 and Close Notes = Rebooted host").unwrap();
        assert_eq!(plan.target, RecordRef::Number("INC0010001".to_string()));
        assert_eq!(
            plan.assignments,
            vec![
                ("state".to_string(), "2".to_string()),
                ("close_notes".to_string(), "Rebooted host".to_string()),
            ]
        );
    }

    #[test]
    fn test_plan_update_keeps_and_inside_values() {
        let plan = plan_update(
            "For 46d44a23a9fe19810012d100cca80666 set work_notes to \"Restarted and verified\", urgency to 1.",
        )
        .unwrap();
        assert_eq!(
            plan.target,
            RecordRef::SysId("46d44a23a9fe19810012d100cca80666".to_string())
        );
        assert_eq!(
            plan.assignments,
            vec![
                ("work_notes".to_string(), "Restarted and verified".to_string()),
                ("urgency".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_plan_update_rejects_missing_parts() {
        assert!(matches!(
            plan_update("close INC0010001"),
            Err(ServiceNowError::InvalidRequest(_))
        ));
        assert!(matches!(
            plan_update("set state to 2"),
            Err(ServiceNowError::InvalidRequest(_))
        ));
        assert!(matches!(
            plan_update("INC0010001 set sys_id/../x to 1"),
            Err(ServiceNowError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_search_runs_planned_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/problem"))
            .and(query_param(
                "sysparm_query",
                "active=true^123TEXTQUERY321=database^ORDERBYDESCsys_created_on",
            ))
            .and(query_param("sysparm_limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{"number": "PRB0000011"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let result = client
            .natural_language()
            .search(&NaturalLanguageSearchParams {
                query: "open database problems".to_string(),
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(result.table, "problem");
        assert_eq!(result.count, 1);
    }

    #[tokio::test]
    async fn test_update_resolves_number_then_patches() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/incident"))
            .and(query_param("sysparm_query", "number=INC0010001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{"sys_id": "abc123", "number": "INC0010001"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/api/now/table/incident/abc123"))
            .and(body_json(serde_json::json!({"state": "6", "close_notes": "Fixed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"sys_id": "abc123", "number": "INC0010001", "state": "6"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let result = client
            .natural_language()
            .update(&NaturalLanguageUpdateParams {
                instruction: "INC0010001 set state to 6 and close_notes to Fixed".to_string(),
                table: "incident".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.sys_id, "abc123");
        assert_eq!(result.number.as_deref(), Some("INC0010001"));
        assert_eq!(result.updated_fields["state"], "6");
    }

    #[tokio::test]
    async fn test_update_unknown_number_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/now/table/incident"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": []})))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let result = client
            .natural_language()
            .update(&NaturalLanguageUpdateParams {
                instruction: "INC0099999 set state to 2".to_string(),
                table: "incident".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceNowError::NotFound(_))));
    }
}
