mod common;

use common::{FakeTransport, client};
use serde::Deserialize;
use serde_json::json;
use vtiger_cli::api::{ApiError, Condition, HttpMethod, Record};

#[derive(Debug, Deserialize, PartialEq)]
struct Lead {
    id: String,
    lastname: String,
}

fn logged_in() -> std::sync::Arc<FakeTransport> {
    let transport = FakeTransport::new();
    transport.script_login();
    transport
}

#[tokio::test]
async fn test_fetch_many_sends_compiled_query_over_get() {
    let transport = logged_in();
    transport.respond_result(
        "query",
        json!([{"id": "10x1", "lastname": "Smith"}, {"id": "10x2", "lastname": "Jones"}]),
    );
    let client = client(&transport);

    let leads: Vec<Lead> = client
        .query("Leads")
        .select(["id", "firstname", "lastname", "company"])
        .filter_in("leadstatus", ["Cold", "Contacted", "Hot", "Warm"])
        .or_filter(Condition::contains("company", "Ltd"))
        .order_by_desc(["lead_no"])
        .unwrap()
        .take(10)
        .skip(2)
        .fetch_many(&client)
        .await
        .unwrap();

    assert_eq!(leads.len(), 2);
    assert_eq!(leads[1].lastname, "Jones");

    let request = &transport.requests_for("query")[0];
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(
        request.param("query").as_deref(),
        Some(
            "SELECT id, firstname, lastname, company FROM Leads WHERE leadstatus IN ('Cold', 'Contacted', 'Hot', 'Warm') OR company LIKE '%Ltd%' ORDER BY lead_no DESC LIMIT 2, 10;"
        )
    );
}

#[tokio::test]
async fn test_fetch_one_limits_to_a_single_row() {
    let transport = logged_in();
    transport.respond_result("query", json!([{"id": "10x1", "lastname": "Smith"}]));
    let client = client(&transport);

    let lead: Option<Record> = client
        .query("Leads")
        .filter(Condition::eq("lastname", "Smith"))
        .fetch_one(&client)
        .await
        .unwrap();

    assert_eq!(lead.unwrap().numeric_id(), 1);
    assert_eq!(
        transport.requests_for("query")[0].param("query").as_deref(),
        Some("SELECT * FROM Leads WHERE lastname = 'Smith' LIMIT 1;")
    );
}

#[tokio::test]
async fn test_fetch_one_without_match() {
    let transport = logged_in();
    transport.respond_result("query", json!([]));
    let client = client(&transport);

    let lead: Option<Lead> = client.query("Leads").fetch_one(&client).await.unwrap();
    assert_eq!(lead, None);
}

#[tokio::test]
async fn test_count_uses_count_form_and_coerces_result() {
    let transport = logged_in();
    transport.respond_result("query", json!([{"count": "42"}]));
    let client = client(&transport);

    let total = client
        .query("Leads")
        .select(["firstname"])
        .filter(Condition::eq("leadstatus", "Hot"))
        .order_by(["lastname"])
        .unwrap()
        .take(5)
        .count(&client)
        .await
        .unwrap();

    assert_eq!(total, 42);
    assert_eq!(
        transport.requests_for("query")[0].param("query").as_deref(),
        Some("SELECT COUNT(*) FROM Leads WHERE leadstatus = 'Hot';")
    );
}

#[tokio::test]
async fn test_count_without_rows_is_shape_error() {
    let transport = logged_in();
    transport.respond_result("query", json!([]));
    let client = client(&transport);

    let err = client.query("Leads").count(&client).await.unwrap_err();
    assert!(matches!(err, ApiError::ResponseShape { .. }));
}

#[tokio::test]
async fn test_invalid_conditions_never_reach_the_network() {
    let transport = logged_in();
    let client = client(&transport);

    let empty_group = client.query("Leads").filter_group(Vec::<Condition>::new());
    assert!(matches!(empty_group, Err(ApiError::InvalidArgument { .. })));

    let empty_in = client
        .query("Leads")
        .filter_in("leadstatus", Vec::<String>::new())
        .fetch_many::<Lead>(&client)
        .await;
    assert!(matches!(empty_in, Err(ApiError::InvalidArgument { .. })));

    let null_contains = client
        .query("Leads")
        .filter(Condition::new("company", vtiger_cli::api::ComparisonKind::Contains, None))
        .count(&client)
        .await;
    assert!(matches!(null_contains, Err(ApiError::InvalidArgument { .. })));

    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn test_blank_module_is_rejected_before_sending() {
    let transport = logged_in();
    let client = client(&transport);

    let err = client.query("  ").fetch_many::<Record>(&client).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument { name, .. } if name == "module"));
    let err = client.query("").count(&client).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument { .. }));

    assert_eq!(transport.total_calls(), 0);
}
