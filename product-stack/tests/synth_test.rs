//! Template rendering of the product API stack.

mod common;

use product_stack::stack::{self, TrustModeKind};
use product_stack::synth::synthesize;
use serde_json::json;

#[test]
fn template_lists_every_resource_and_output() {
    let composition = stack::declare(&common::props()).expect("stack should declare");
    let template = synthesize(&composition);

    let resources = template["Resources"].as_object().expect("resources map");
    // one execution role per compute handler
    assert_eq!(resources.len(), composition.resources().len() + 1);
    assert_eq!(template["Outputs"].as_object().map(|o| o.len()), Some(5));

    assert_eq!(resources[stack::TABLE_ID]["Type"], "AWS::DynamoDB::Table");
    assert_eq!(resources[stack::HANDLER_ID]["Type"], "AWS::Lambda::Function");
    assert_eq!(resources[stack::API_ID]["Type"], "AWS::AppSync::GraphQLApi");
}

#[test]
fn table_renders_on_demand_with_category_index() {
    let composition = stack::declare(&common::props()).expect("stack should declare");
    let table = &synthesize(&composition)["Resources"][stack::TABLE_ID]["Properties"];

    assert_eq!(table["BillingMode"], "PAY_PER_REQUEST");
    assert_eq!(
        table["KeySchema"],
        json!([{ "AttributeName": "id", "KeyType": "HASH" }])
    );
    assert_eq!(table["GlobalSecondaryIndexes"][0]["IndexName"], "productsByCategory");
    assert_eq!(
        table["AttributeDefinitions"],
        json!([
            { "AttributeName": "id", "AttributeType": "S" },
            { "AttributeName": "category", "AttributeType": "S" },
        ])
    );
}

#[test]
fn references_render_as_intrinsics() {
    let composition = stack::declare(&common::props()).expect("stack should declare");
    let template = synthesize(&composition);

    assert_eq!(
        template["Resources"][stack::HANDLER_ID]["Properties"]["Environment"]["Variables"]
            [stack::TABLE_ENV_VAR],
        json!({ "Fn::GetAtt": [stack::TABLE_ID, "TableName"] })
    );
    assert_eq!(
        template["Outputs"]["ProjectRegion"]["Value"],
        json!({ "Ref": "AWS::Region" })
    );
    assert_eq!(
        template["Outputs"]["GraphQLAPIURL"]["Value"],
        json!({ "Fn::GetAtt": [stack::API_ID, "GraphQLUrl"] })
    );
}

#[test]
fn resolvers_depend_on_their_data_source() {
    let composition = stack::declare(&common::props()).expect("stack should declare");
    let template = synthesize(&composition);

    let resolver =
        &template["Resources"]["cdk-product-applambdaDatasourceQuerylistProductsResolver"];
    assert_eq!(resolver["Type"], "AWS::AppSync::Resolver");
    assert_eq!(resolver["Properties"]["DataSourceName"], stack::DATA_SOURCE_NAME);
    assert_eq!(resolver["Properties"]["TypeName"], "Query");

    let depends_on = resolver["DependsOn"].as_array().expect("depends on list");
    assert!(depends_on.contains(&json!("cdk-product-applambdaDatasource")));
    assert!(depends_on.contains(&json!(stack::API_ID)));
}

#[test]
fn api_lists_both_trust_modes_and_key_expiry() {
    let composition = stack::declare(&common::props()).expect("stack should declare");
    let template = synthesize(&composition);

    let api = &template["Resources"][stack::API_ID]["Properties"];
    assert_eq!(api["AuthenticationType"], "API_KEY");
    assert_eq!(
        api["AdditionalAuthenticationProviders"][0]["AuthenticationType"],
        "AMAZON_COGNITO_USER_POOLS"
    );
    assert_eq!(api["LogConfig"]["FieldLogLevel"], "ALL");

    let expires = (common::declared_at() + chrono::Duration::days(365)).timestamp();
    assert_eq!(
        template["Resources"]["cdk-product-appDefaultApiKey"]["Properties"]["Expires"],
        json!(expires)
    );
}

#[test]
fn key_output_renders_empty_without_key_trust_mode() {
    let mut props = common::props();
    props.trust_modes = vec![TrustModeKind::UserPool];
    let template = synthesize(&stack::declare(&props).expect("stack should declare"));

    assert_eq!(template["Outputs"]["AppSychAPIKey"]["Value"], "");
    assert!(template["Resources"]
        .get("cdk-product-appDefaultApiKey")
        .is_none());
}

#[test]
fn handler_runs_under_a_role_that_carries_the_table_grant() {
    let composition = stack::declare(&common::props()).expect("stack should declare");
    let template = synthesize(&composition);
    let resources = &template["Resources"];
    let role_id = format!("{}ServiceRole", stack::HANDLER_ID);

    assert_eq!(resources[&role_id]["Type"], "AWS::IAM::Role");
    assert_eq!(
        resources[&role_id]["Properties"]["AssumeRolePolicyDocument"]["Statement"][0]["Principal"],
        json!({ "Service": "lambda.amazonaws.com" })
    );

    let handler = &resources[stack::HANDLER_ID];
    assert_eq!(
        handler["Properties"]["Role"],
        json!({ "Fn::GetAtt": [role_id, "Arn"] })
    );
    assert!(handler["DependsOn"]
        .as_array()
        .expect("depends on list")
        .contains(&json!(role_id)));

    let grant = &resources[format!("{}{}Grant", stack::HANDLER_ID, stack::TABLE_ID).as_str()];
    assert_eq!(grant["Type"], "AWS::IAM::Policy");
    assert_eq!(grant["Properties"]["Roles"], json!([{ "Ref": role_id }]));
    assert!(grant["Properties"].get("Subject").is_none());
    assert_eq!(
        grant["Properties"]["PolicyDocument"]["Statement"][0]["Action"],
        json!(["dynamodb:*"])
    );
}
