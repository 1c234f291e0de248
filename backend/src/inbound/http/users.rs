//! User service RPC handlers.
//!
//! ```text
//! POST   /rpc/users        {"username":"ada","email":"ada@example.com"}
//! GET    /rpc/users/{id}
//! PATCH  /rpc/users/{id}   {"full_name":"Ada Lovelace"}
//! DELETE /rpc/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};

use crate::domain::{EntityId, NewUser, User, UserPatch, UserService};
use crate::inbound::http::ApiResult;

/// Register a user.
#[post("/rpc/users")]
pub async fn create_user(
    service: web::Data<UserService>,
    payload: web::Json<NewUser>,
) -> ApiResult<HttpResponse> {
    let user = service.create_user(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Fetch a user by id.
#[get("/rpc/users/{id}")]
pub async fn get_user(
    service: web::Data<UserService>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let id = EntityId::parse_field("id", &path)?;
    Ok(web::Json(service.get_user(&id).await?))
}

/// Partially update a user.
#[patch("/rpc/users/{id}")]
pub async fn update_user(
    service: web::Data<UserService>,
    path: web::Path<String>,
    payload: web::Json<UserPatch>,
) -> ApiResult<web::Json<User>> {
    let id = EntityId::parse_field("id", &path)?;
    Ok(web::Json(
        service.update_user(&id, payload.into_inner()).await?,
    ))
}

/// Remove a user.
#[delete("/rpc/users/{id}")]
pub async fn delete_user(
    service: web::Data<UserService>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = EntityId::parse_field("id", &path)?;
    service.delete_user(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};

    use crate::inbound::http::routes;
    use crate::inbound::http::test_utils::{in_memory_services, read_json};

    #[actix_web::test]
    async fn user_lifecycle_round_trips_over_http() {
        let services = in_memory_services();
        let app = actix_test::init_service(
            App::new()
                .app_data(services.users.clone())
                .app_data(services.health.clone())
                .configure(routes::user_service),
        )
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/rpc/users")
                .set_json(json!({"username": "ada", "email": "ada@example.com"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Value = read_json(response).await;
        let id = created["id"].as_str().expect("id").to_owned();

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri(&format!("/rpc/users/{id}"))
                .set_json(json!({"full_name": "Ada Lovelace"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Value = read_json(response).await;
        assert_eq!(updated["full_name"], "Ada Lovelace");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/rpc/users/{id}"))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/rpc/users/{id}"))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn duplicate_email_is_a_conflict() {
        let services = in_memory_services();
        let app = actix_test::init_service(
            App::new()
                .app_data(services.users.clone())
                .app_data(services.health.clone())
                .configure(routes::user_service),
        )
        .await;

        for (username, expected) in [("ada", StatusCode::CREATED), ("grace", StatusCode::CONFLICT)] {
            let response = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/rpc/users")
                    .set_json(json!({"username": username, "email": "shared@example.com"}))
                    .to_request(),
            )
            .await;
            assert_eq!(response.status(), expected);
        }
    }

    #[actix_web::test]
    async fn malformed_bodies_use_error_envelope() {
        let services = in_memory_services();
        let app = actix_test::init_service(
            App::new()
                .app_data(services.users.clone())
                .app_data(services.health.clone())
                .configure(routes::user_service),
        )
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/rpc/users")
                .insert_header(("content-type", "application/json"))
                .set_payload("{not json")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_json(response).await;
        assert_eq!(body["code"], "invalid_request");
    }
}
