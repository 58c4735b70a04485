mod common;

use std::sync::Arc;
use std::time::Duration;

use common::client;
use serde_json::json;
use stash_core::model::{CreateTodoRequest, UpdateTodoRequest};
use stash_resources::{
    HttpConfig, HttpMealTransport, HttpTodoTransport, MealTransport, TodoQueries, TodoTransport,
};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> HttpConfig {
    HttpConfig {
        todos_url: format!("{}/todos", server.uri()),
        meals_url: format!("{}/api/json/v1/1", server.uri()),
        timeout: Duration::from_secs(5),
    }
}

fn todo_json(id: i64, completed: bool) -> serde_json::Value {
    json!({ "id": id, "todo": format!("Todo {}", id), "completed": completed, "userId": 3 })
}

// ========== todos ==========

#[tokio::test]
async fn list_sends_limit_and_skip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .and(query_param("limit", "30"))
        .and(query_param("skip", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "todos": [todo_json(31, false), todo_json(32, true)],
            "total": 254,
            "skip": 30,
            "limit": 30
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTodoTransport::new(&config(&server)).unwrap();
    let page = transport.list(30, 30).await.unwrap();

    assert_eq!(page.todos.len(), 2);
    assert_eq!(page.total, 254);
    assert!(page.find(32).unwrap().completed);
}

#[tokio::test]
async fn missing_todo_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Todo with id '999' not found"
        })))
        .mount(&server)
        .await;

    let transport = HttpTodoTransport::new(&config(&server)).unwrap();
    let err = transport.get(999).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("999"));
}

#[tokio::test]
async fn server_error_is_retried_by_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let (client, _) = client();
    let transport = Arc::new(HttpTodoTransport::new(&config(&server)).unwrap());
    let queries = TodoQueries::new(transport);

    let err = client.fetch_query(&queries.page(1).retry(1)).await.unwrap_err();

    assert!(err.is_transport_error());
    assert!(err.is_transient());
}

#[tokio::test]
async fn client_error_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/todos/4"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let transport = HttpTodoTransport::new(&config(&server)).unwrap();
    let err = transport
        .update(4, &UpdateTodoRequest::completed(true))
        .await
        .unwrap_err();

    assert!(err.is_transport_error());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn create_posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/todos/add"))
        .and(body_json(json!({ "todo": "Buy milk", "completed": false, "userId": 1 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 255, "todo": "Buy milk", "completed": false, "userId": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTodoTransport::new(&config(&server)).unwrap();
    let created = transport
        .create(&CreateTodoRequest::new("Buy milk", 1))
        .await
        .unwrap();

    assert_eq!(created.id, 255);
}

#[tokio::test]
async fn delete_decodes_flattened_response() {
    let server = MockServer::start().await;
    let mut body = todo_json(7, true);
    body["isDeleted"] = json!(true);
    body["deletedOn"] = json!("2026-10-17T09:00:00.000Z");
    Mock::given(method("DELETE"))
        .and(path("/todos/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let transport = HttpTodoTransport::new(&config(&server)).unwrap();
    let deleted = transport.delete(7).await.unwrap();

    assert_eq!(deleted.todo.id, 7);
    assert!(deleted.is_deleted);
}

#[tokio::test]
async fn undecodable_body_is_a_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/random"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let transport = HttpTodoTransport::new(&config(&server)).unwrap();
    let err = transport.random().await.unwrap_err();

    assert!(err.is_validation_error());
}

// ========== meals ==========

fn meal_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "idMeal": id,
        "strMeal": name,
        "strCategory": "Beef",
        "strArea": "British",
        "strInstructions": "Bake until golden.",
        "strMealThumb": "https://www.themealdb.com/images/media/meals/sytuqu1511553755.jpg",
        "strTags": "Meat, Pie",
        "strYoutube": "",
        "strIngredient1": "Beef",
        "strMeasure1": "1kg",
        "strIngredient2": "",
        "strMeasure2": ""
    })
}

#[tokio::test]
async fn meal_listing_searches_letter_a() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/json/v1/1/search.php"))
        .and(query_param("f", "a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meals": [meal_json("52768", "Apple Frangipan Tart"), meal_json("52893", "Apple & Blackberry Crumble")]
        })))
        .mount(&server)
        .await;

    let transport = HttpMealTransport::new(&config(&server)).unwrap();
    let meals = transport.all().await.unwrap();

    assert_eq!(meals.len(), 2);
    assert_eq!(meals[0].tags, vec!["Meat", "Pie"]);
    assert_eq!(meals[0].ingredients.len(), 1);
    assert!(meals[0].youtube.is_none());
}

#[tokio::test]
async fn meal_lookup_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/json/v1/1/lookup.php"))
        .and(query_param("i", "52874"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meals": [meal_json("52874", "Beef and Mustard Pie")]
        })))
        .mount(&server)
        .await;

    let transport = HttpMealTransport::new(&config(&server)).unwrap();
    let meal = transport.by_id(" 52874 ").await.unwrap();

    assert_eq!(meal.id, "52874");
    assert_eq!(meal.name, "Beef and Mustard Pie");
}

#[tokio::test]
async fn null_meal_lookup_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/json/v1/1/lookup.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "meals": null })))
        .mount(&server)
        .await;

    let transport = HttpMealTransport::new(&config(&server)).unwrap();
    let err = transport.by_id("1").await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn blank_meal_id_is_rejected_before_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = HttpMealTransport::new(&config(&server)).unwrap();
    let err = transport.by_id("  ").await.unwrap_err();

    assert!(err.is_validation_error());
}
