//! Pet service RPC handlers.
//!
//! ```text
//! POST   /rpc/pets                      {"name":"Rex","species":"dog","age":3}
//! GET    /rpc/pets?page=1&limit=10&species=dog&adoption_status=AVAILABLE
//! GET    /rpc/pets/{id}
//! PATCH  /rpc/pets/{id}                 {"description":"Loves walks"}
//! DELETE /rpc/pets/{id}
//! PUT    /rpc/pets/{id}/adoption-status {"status":"ADOPTED","adopted_by_user_id":"user123"}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::Deserialize;

use crate::domain::{
    EntityId, Error, NewPet, Page, Pet, PetAdoptionStatus, PetFilter, PetPatch, PetService,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::routes::lenient_number;

/// Query string for `GET /rpc/pets`.
///
/// Paging values that are not positive integers fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListPetsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub species: Option<String>,
    pub adoption_status: Option<String>,
    pub listed_by_user_id: Option<String>,
}

/// Body for `PUT /rpc/pets/{id}/adoption-status`.
#[derive(Debug, Deserialize)]
pub struct AdoptionStatusRequest {
    pub status: String,
    #[serde(default)]
    pub adopted_by_user_id: Option<String>,
}

fn optional_id(field: &str, raw: Option<String>) -> Result<Option<EntityId>, Error> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| EntityId::parse_field(field, value.trim()))
        .transpose()
}

/// List a pet for adoption.
#[post("/rpc/pets")]
pub async fn create_pet(
    service: web::Data<PetService>,
    payload: web::Json<NewPet>,
) -> ApiResult<HttpResponse> {
    let pet = service.create_pet(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(pet))
}

/// Page through pet listings.
#[get("/rpc/pets")]
pub async fn list_pets(
    service: web::Data<PetService>,
    query: web::Query<ListPetsQuery>,
) -> ApiResult<web::Json<Page<Pet>>> {
    let query = query.into_inner();
    let filter = PetFilter {
        species: query.species,
        adoption_status: query
            .adoption_status
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.parse::<PetAdoptionStatus>())
            .transpose()?,
        listed_by_user_id: optional_id("listed_by_user_id", query.listed_by_user_id)?,
    };
    let page = service
        .list_pets(
            lenient_number(query.page.as_deref()),
            lenient_number(query.limit.as_deref()),
            filter,
        )
        .await?;
    Ok(web::Json(page))
}

/// Fetch a pet by id.
#[get("/rpc/pets/{id}")]
pub async fn get_pet(
    service: web::Data<PetService>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Pet>> {
    let id = EntityId::parse_field("id", &path)?;
    Ok(web::Json(service.get_pet(&id).await?))
}

/// Partially update a listing.
#[patch("/rpc/pets/{id}")]
pub async fn update_pet(
    service: web::Data<PetService>,
    path: web::Path<String>,
    payload: web::Json<PetPatch>,
) -> ApiResult<web::Json<Pet>> {
    let id = EntityId::parse_field("id", &path)?;
    Ok(web::Json(service.update_pet(&id, payload.into_inner()).await?))
}

/// Remove a listing.
#[delete("/rpc/pets/{id}")]
pub async fn delete_pet(
    service: web::Data<PetService>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = EntityId::parse_field("id", &path)?;
    service.delete_pet(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Move a pet through the adoption process.
#[put("/rpc/pets/{id}/adoption-status")]
pub async fn update_adoption_status(
    service: web::Data<PetService>,
    path: web::Path<String>,
    payload: web::Json<AdoptionStatusRequest>,
) -> ApiResult<web::Json<Pet>> {
    let id = EntityId::parse_field("id", &path)?;
    let AdoptionStatusRequest {
        status,
        adopted_by_user_id,
    } = payload.into_inner();
    let status = status.parse::<PetAdoptionStatus>()?;
    let adopter = optional_id("adopted_by_user_id", adopted_by_user_id)?;
    Ok(web::Json(
        service.update_adoption_status(&id, status, adopter).await?,
    ))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::inbound::http::routes::{self, lenient_number};
    use crate::inbound::http::test_utils::{in_memory_services, read_json};

    #[rstest]
    #[case(None, None)]
    #[case(Some("abc"), None)]
    #[case(Some(" 4 "), Some(4))]
    #[case(Some("-2"), Some(-2))]
    fn paging_values_parse_leniently(#[case] raw: Option<&str>, #[case] expected: Option<i64>) {
        assert_eq!(lenient_number(raw), expected);
    }

    #[actix_web::test]
    async fn adoption_flow_over_http() {
        let services = in_memory_services();
        let app = actix_test::init_service(
            App::new()
                .app_data(services.pets.clone())
                .app_data(services.health.clone())
                .configure(routes::pet_service),
        )
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/rpc/pets")
                .set_json(json!({"name": "Rex", "species": "dog", "age": 3}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let pet: Value = read_json(response).await;
        assert_eq!(pet["adoption_status"], "AVAILABLE");
        let id = pet["id"].as_str().expect("id").to_owned();

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/rpc/pets/{id}/adoption-status"))
                .set_json(json!({"status": "ADOPTED"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/rpc/pets/{id}/adoption-status"))
                .set_json(json!({"status": "ADOPTED", "adopted_by_user_id": "user123"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let adopted: Value = read_json(response).await;
        assert_eq!(adopted["adopted_by_user_id"], "user123");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/rpc/pets?species=dog&adoption_status=adopted&page=zero")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let page: Value = read_json(response).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["page"], 1);
        assert_eq!(page["limit"], 10);
    }

    #[actix_web::test]
    async fn unknown_adoption_status_is_rejected() {
        let services = in_memory_services();
        let app = actix_test::init_service(
            App::new()
                .app_data(services.pets.clone())
                .app_data(services.health.clone())
                .configure(routes::pet_service),
        )
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/rpc/pets?adoption_status=sold")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
