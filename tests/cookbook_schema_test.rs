use cookbook::config::RelayConfig;
use cookbook::graphql::{create_cookbook_schema, CookbookSchema};
use cookbook::storage::{InMemoryStorage, Storage};
use serde_json::{json, Value};
use std::sync::Arc;

fn schema() -> CookbookSchema {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    create_cookbook_schema(storage, &RelayConfig::default())
}

async fn run(schema: &CookbookSchema, query: &str) -> Value {
    let response = schema.execute(query).await;
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

#[tokio::test]
async fn test_create_category_and_look_it_up_by_name() {
    let schema = schema();

    let created = run(
        &schema,
        r#"mutation { createCategory(name: "Dairy") { category { id name } } }"#,
    )
    .await;
    assert_eq!(
        created,
        json!({"createCategory": {"category": {"id": "1", "name": "Dairy"}}})
    );

    let found = run(
        &schema,
        r#"{ categoryByName(name: "Dairy") { id name ingredients { name } } }"#,
    )
    .await;
    assert_eq!(
        found,
        json!({"categoryByName": {"id": "1", "name": "Dairy", "ingredients": []}})
    );
}

#[tokio::test]
async fn test_category_by_name_miss_is_null() {
    let schema = schema();
    let data = run(&schema, r#"{ categoryByName(name: "Nope") { id } }"#).await;
    assert_eq!(data, json!({"categoryByName": null}));
}

#[tokio::test]
async fn test_create_ingredient_and_list_with_category() {
    let schema = schema();
    run(&schema, r#"mutation { createCategory(name: "Meat") { category { id } } }"#).await;

    let created = run(
        &schema,
        r#"mutation {
            createIngredient(name: "Beef", notes: "Much like milk, this comes from a cow", category: 1) {
                ingredient { id name category { name } }
            }
        }"#,
    )
    .await;
    assert_eq!(
        created["createIngredient"]["ingredient"],
        json!({"id": "1", "name": "Beef", "category": {"name": "Meat"}})
    );

    let data = run(
        &schema,
        "{ allIngredients { name notes category { id name } } }",
    )
    .await;
    assert_eq!(
        data,
        json!({"allIngredients": [{
            "name": "Beef",
            "notes": "Much like milk, this comes from a cow",
            "category": {"id": "1", "name": "Meat"}
        }]})
    );

    let data = run(
        &schema,
        r#"{ categoryByName(name: "Meat") { ingredients { name } } }"#,
    )
    .await;
    assert_eq!(
        data["categoryByName"]["ingredients"],
        json!([{"name": "Beef"}])
    );
}

#[tokio::test]
async fn test_create_ingredient_in_missing_category_fails() {
    let schema = schema();

    let response = schema
        .execute(r#"mutation { createIngredient(name: "Tofu", notes: "", category: 42) { ingredient { id } } }"#)
        .await;
    assert_eq!(response.errors.len(), 1);

    let data = run(&schema, "{ allIngredients { id } }").await;
    assert_eq!(data, json!({"allIngredients": []}));
}

#[tokio::test]
async fn test_categories_connection() {
    let schema = schema();
    for name in ["Dairy", "Meat", "Produce"] {
        run(
            &schema,
            &format!(r#"mutation {{ createCategory(name: "{name}") {{ category {{ id }} }} }}"#),
        )
        .await;
    }

    let data = run(
        &schema,
        r#"{
            categories(first: 2) {
                totalCount
                pageInfo { hasNextPage hasPreviousPage endCursor }
                edges { cursor node { id categoryName } }
            }
        }"#,
    )
    .await;
    let categories = &data["categories"];
    assert_eq!(categories["totalCount"], 3);
    assert_eq!(categories["pageInfo"]["hasNextPage"], true);
    assert_eq!(categories["pageInfo"]["hasPreviousPage"], false);
    assert_eq!(categories["pageInfo"]["endCursor"], "YXJyYXljb25uZWN0aW9uOjE=");
    assert_eq!(
        categories["edges"][0],
        json!({
            "cursor": "YXJyYXljb25uZWN0aW9uOjA=",
            "node": {"id": "Q2F0ZWdvcnlOb2RlOjE=", "categoryName": "Dairy"}
        })
    );

    let data = run(
        &schema,
        r#"{
            categories(after: "YXJyYXljb25uZWN0aW9uOjE=") {
                totalCount
                pageInfo { hasNextPage }
                edges { node { ... on Node { id } categoryName } }
            }
        }"#,
    )
    .await;
    let categories = &data["categories"];
    assert_eq!(categories["totalCount"], 3);
    assert_eq!(categories["pageInfo"]["hasNextPage"], false);
    assert_eq!(
        categories["edges"],
        json!([{"node": {"id": "Q2F0ZWdvcnlOb2RlOjM=", "categoryName": "Produce"}}])
    );
}

#[tokio::test]
async fn test_categories_ignores_cursors_past_the_end() {
    let schema = schema();
    for name in ["A", "B", "C"] {
        run(
            &schema,
            &format!(r#"mutation {{ createCategory(name: "{name}") {{ category {{ id }} }} }}"#),
        )
        .await;
    }

    // base64("arrayconnection:9")
    let data = run(
        &schema,
        r#"{
            categories(after: "YXJyYXljb25uZWN0aW9uOjk=", first: 2) {
                pageInfo { hasNextPage }
                edges { node { categoryName } }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data,
        json!({"categories": {
            "pageInfo": {"hasNextPage": true},
            "edges": [
                {"node": {"categoryName": "A"}},
                {"node": {"categoryName": "B"}}
            ]
        }})
    );
}

#[tokio::test]
async fn test_cookbook_sdl_names() {
    let sdl = schema().sdl();
    assert!(sdl.contains("type MyMutation"));
    assert!(sdl.contains("type CategoryConnection"));
    assert!(sdl.contains("interface Node"));
}
