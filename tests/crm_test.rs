use realty_crm::editor::NumericField;
use realty_crm::error::GENERIC_FAILURE;
use realty_crm::filter::{AnyOf, FilterState, RangeFilter};
use realty_crm::models::{Category, Client, Details, Status};
use realty_crm::store::{Document, MemoryCollaborator};
use realty_crm::taxonomy::Facet;
use realty_crm::{Crm, CrmError};
use serde_json::json;
use std::sync::Arc;

fn listing(id: &str, district: &str) -> serde_json::Value {
    json!({
        "id": id,
        "category": "apartments",
        "type": "Secondary",
        "price": 50000,
        "district": district,
        "address": format!("ул. Дерибасовская, {}", id),
        "ownerPhone": "+380501112233",
        "totalArea": 50,
        "imageUrls": []
    })
}

fn seeded() -> Document {
    serde_json::from_value(json!({
        "properties": [
            listing("p1", "Таирова"),
            listing("p2", "Таирова"),
            listing("p3", "Приморский")
        ],
        "clients": [],
        "customOptions": { "districts": ["Таирова"], "heatingOptions": ["Газ"] }
    }))
    .unwrap()
}

async fn setup(doc: Document) -> (Arc<MemoryCollaborator>, Crm) {
    let store = Arc::new(MemoryCollaborator::with_document(doc));
    let mut crm = Crm::new(store.clone()).with_share_origin("http://crm.test/");
    crm.load().await.unwrap();
    (store, crm)
}

fn district_of<'a>(crm: &'a Crm, id: &str) -> &'a str {
    crm.get(id).map(|p| p.district.as_str()).unwrap()
}

#[tokio::test]
async fn test_land_listing_end_to_end() {
    let (_store, mut crm) = setup(Document::default()).await;

    let mut draft = crm.new_draft();
    draft.set_category(Category::Land, crm.taxonomy(), crm.listings());
    assert!(draft.set_number(NumericField::LandArea, "10"));
    if let Details::Land(land) = &mut draft.details {
        land.land_type = "Сельхоз".into();
    }
    draft.district = "Киевский".into();
    draft.address = "Овидиопольская дорога".into();
    draft.owner_phone = "+380671234567".into();
    draft.set_number(NumericField::Price, "12000");

    let saved = crm.save_property(draft).await.unwrap();
    assert_eq!(crm.listings().len(), 1);
    assert_eq!(saved.category(), Category::Land);

    let mut criteria = FilterState::for_category(Category::Land);
    criteria.land.land_area = RangeFilter::from_bounds("5", "");
    criteria.land.land_type = AnyOf::of(["Сельхоз"]);
    assert_eq!(crm.visible(&criteria).len(), 1);

    criteria.land.land_type = AnyOf::of(["Коммерческое"]);
    assert!(crm.visible(&criteria).is_empty());

    // category gate
    criteria.reset();
    criteria.category = Category::Apartments;
    assert!(crm.visible(&criteria).is_empty());
}

#[tokio::test]
async fn test_failed_save_leaves_state_untouched() {
    let (store, mut crm) = setup(seeded()).await;
    store.set_simulate_write_error(true);

    let mut draft = crm.edit_draft("p3").unwrap();
    draft.address = "Новый адрес".into();
    let err = crm.save_property(draft).await.unwrap_err();

    assert_eq!(err.user_message(), GENERIC_FAILURE);
    assert_eq!(crm.listings().len(), 3);
    assert_ne!(crm.get("p3").unwrap().address, "Новый адрес");
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_before_saving() {
    let (store, mut crm) = setup(seeded()).await;

    let mut draft = crm.new_draft();
    draft.address = "Без района".into();
    let err = crm.save_property(draft).await.unwrap_err();

    assert!(matches!(err, CrmError::Validation(_)));
    assert_ne!(err.user_message(), GENERIC_FAILURE);
    assert_eq!(store.document().list(realty_crm::store::Collection::Properties).len(), 3);
}

#[tokio::test]
async fn test_edit_replaces_existing_listing() {
    let (_store, mut crm) = setup(seeded()).await;

    let mut draft = crm.edit_draft("p1").unwrap();
    draft.set_number(NumericField::Price, "61000");
    crm.save_property(draft).await.unwrap();

    assert_eq!(crm.listings().len(), 3);
    assert_eq!(crm.get("p1").unwrap().price, 61000.0);
}

#[tokio::test]
async fn test_protected_district_cannot_be_removed() {
    let (_store, mut crm) = setup(seeded()).await;

    let err = crm
        .remove_custom_option(Facet::Districts, "Приморский")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::ProtectedValue { .. }));
    assert_eq!(crm.taxonomy().custom().list(Facet::Districts), vec!["Таирова"]);
}

#[tokio::test]
async fn test_removing_district_clears_it_on_listings() {
    let (store, mut crm) = setup(seeded()).await;

    assert!(crm
        .remove_custom_option(Facet::Districts, "Таирова")
        .await
        .unwrap());

    assert_eq!(district_of(&crm, "p1"), "");
    assert_eq!(district_of(&crm, "p2"), "");
    assert_eq!(district_of(&crm, "p3"), "Приморский");
    assert!(!crm.options(Facet::Districts).contains(&"Таирова".to_string()));
    assert!(store
        .document()
        .custom_options()
        .unwrap()
        .list(Facet::Districts)
        .is_empty());
}

#[tokio::test]
async fn test_partial_district_fan_out_is_reported() {
    let (store, mut crm) = setup(seeded()).await;
    store.fail_writes_for("p2");

    let err = crm
        .remove_custom_option(Facet::Districts, "Таирова")
        .await
        .unwrap_err();
    match &err {
        CrmError::PartialFanOut { failed, total } => {
            assert_eq!(failed, &vec!["p2".to_string()]);
            assert_eq!(*total, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), GENERIC_FAILURE);

    // listings are re-fetched regardless
    assert_eq!(district_of(&crm, "p1"), "");
    assert_eq!(district_of(&crm, "p2"), "Таирова");
    // still offered while a record carries it
    assert!(crm.options(Facet::Districts).contains(&"Таирова".to_string()));
}

#[tokio::test]
async fn test_custom_options_round_trip_through_store() {
    let (store, mut crm) = setup(seeded()).await;

    assert!(crm.add_custom_option(Facet::HeatingOptions, " Электро ").await.unwrap());
    assert!(!crm.add_custom_option(Facet::HeatingOptions, "Газ").await.unwrap());
    assert_eq!(crm.options(Facet::HeatingOptions), vec!["Газ", "Электро"]);

    let stored = store.document().custom_options().unwrap();
    assert_eq!(stored.list(Facet::HeatingOptions), vec!["Газ", "Электро"]);
    assert_eq!(stored.list(Facet::Districts), vec!["Таирова"]);

    store.set_simulate_write_error(true);
    assert!(crm.add_custom_option(Facet::HeatingOptions, "Котёл").await.is_err());
    assert_eq!(crm.options(Facet::HeatingOptions), vec!["Газ", "Электро"]);
}

#[tokio::test]
async fn test_status_and_share_link_are_persisted() {
    let (store, mut crm) = setup(seeded()).await;

    crm.set_status("p1", Status::Sold).await.unwrap();
    assert_eq!(crm.get("p1").unwrap().status, Status::Sold);

    let link = crm.share_link("p1").await.unwrap();
    assert_eq!(link, "http://crm.test/property/p1?clientMode=true");
    assert_eq!(crm.get("p1").unwrap().public_link.as_deref(), Some(link.as_str()));

    let raw = store.document().list(realty_crm::store::Collection::Properties);
    assert_eq!(raw[0]["status"], "sold");
    assert_eq!(raw[0]["publicLink"], link.as_str());

    let err = crm.set_status("missing", Status::Sold).await.unwrap_err();
    assert!(matches!(err, CrmError::NotFound { .. }));
}

#[tokio::test]
async fn test_upload_then_attach_image() {
    let (store, mut crm) = setup(seeded()).await;

    let url = crm.upload_image("front.jpg", vec![0xff, 0xd8]).await.unwrap();
    let mut draft = crm.edit_draft("p3").unwrap();
    draft.add_image(url.clone());
    crm.save_property(draft).await.unwrap();

    assert_eq!(crm.get("p3").unwrap().cover_image(), Some(url.as_str()));
    assert_eq!(store.uploads(), vec![("front.jpg".to_string(), 2)]);
}

#[tokio::test]
async fn test_delete_property() {
    let (_store, mut crm) = setup(seeded()).await;

    crm.delete_property("p2").await.unwrap();
    assert!(crm.get("p2").is_none());
    assert_eq!(crm.listings().len(), 2);

    let err = crm.delete_property("p2").await.unwrap_err();
    assert!(matches!(err, CrmError::NotFound { .. }));
}

#[tokio::test]
async fn test_clients_lifecycle() {
    let (_store, mut crm) = setup(seeded()).await;

    let saved = crm
        .save_client(Client::new("+380931112233", "2к квартира у моря"))
        .await
        .unwrap();
    assert!(!saved.id.is_empty());
    assert_eq!(crm.clients().len(), 1);

    let err = crm.save_client(Client::new("", "дом")).await.unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    crm.delete_client(&saved.id).await.unwrap();
    assert!(crm.clients().is_empty());
}

#[tokio::test]
async fn test_malformed_records_are_skipped_on_load() {
    let doc: Document = serde_json::from_value(json!({
        "properties": [listing("ok", "Приморский"), { "id": "bad", "category": "castle" }]
    }))
    .unwrap();
    let (_store, crm) = setup(doc).await;

    assert_eq!(crm.listings().len(), 1);
    assert!(crm.get("ok").is_some());
}

fn legacy_listing(id: serde_json::Value) -> serde_json::Value {
    let mut record = listing("tmp", "Приморский");
    record["id"] = id;
    record["houseType"] = json!("Дом");
    record["createdAt"] = json!("2024-01-01");
    record
}

fn stored(store: &MemoryCollaborator, id: &str) -> serde_json::Value {
    store
        .document()
        .list(realty_crm::store::Collection::Properties)
        .into_iter()
        .find(|r| r["id"] == id || r["id"].to_string() == id)
        .unwrap()
}

#[tokio::test]
async fn test_status_change_keeps_unknown_keys() {
    let doc: Document =
        serde_json::from_value(json!({ "properties": [legacy_listing(json!("old"))] })).unwrap();
    let (store, mut crm) = setup(doc).await;

    crm.set_status("old", Status::Sold).await.unwrap();
    crm.share_link("old").await.unwrap();

    let raw = stored(&store, "old");
    assert_eq!(raw["status"], "sold");
    assert_eq!(raw["houseType"], "Дом");
    assert_eq!(raw["createdAt"], "2024-01-01");
    // nothing the record did not have
    assert!(raw.get("floor").is_none());
    assert!(raw.get("description").is_none());
}

#[tokio::test]
async fn test_district_clearing_keeps_unknown_keys() {
    let mut record = legacy_listing(json!("old"));
    record["district"] = json!("Таирова");
    let doc: Document = serde_json::from_value(json!({
        "properties": [record],
        "customOptions": { "districts": ["Таирова"] }
    }))
    .unwrap();
    let (store, mut crm) = setup(doc).await;

    assert!(crm.remove_custom_option(Facet::Districts, "Таирова").await.unwrap());

    let raw = stored(&store, "old");
    assert_eq!(raw["district"], "");
    assert_eq!(raw["createdAt"], "2024-01-01");
    assert!(raw.get("kitchenArea").is_none());
}

#[tokio::test]
async fn test_edit_keeps_unknown_keys_and_drops_stale_details() {
    let doc: Document =
        serde_json::from_value(json!({ "properties": [legacy_listing(json!("old"))] })).unwrap();
    let (store, mut crm) = setup(doc).await;

    let mut draft = crm.edit_draft("old").unwrap();
    draft.set_number(NumericField::Price, "61000");
    crm.save_property(draft).await.unwrap();

    let raw = stored(&store, "old");
    assert_eq!(raw["price"], 61000.0);
    assert_eq!(raw["houseType"], "Дом");
    assert_eq!(raw["createdAt"], "2024-01-01");

    let mut draft = crm.edit_draft("old").unwrap();
    draft.set_category(Category::Land, crm.taxonomy(), crm.listings());
    assert!(draft.set_number(NumericField::LandArea, "6"));
    if let Details::Land(land) = &mut draft.details {
        land.land_type = "Сельхоз".into();
    }
    crm.save_property(draft).await.unwrap();

    let raw = stored(&store, "old");
    assert_eq!(raw["category"], "land");
    assert_eq!(raw["createdAt"], "2024-01-01");
    assert!(raw.get("totalArea").is_none());
}

#[tokio::test]
async fn test_numeric_ids_load_and_update() {
    let doc: Document =
        serde_json::from_value(json!({ "properties": [legacy_listing(json!(7))] })).unwrap();
    let (store, mut crm) = setup(doc).await;

    assert_eq!(crm.listings().len(), 1);
    assert_eq!(crm.get("7").unwrap().price, 50000.0);

    crm.set_status("7", Status::Advance).await.unwrap();
    assert_eq!(crm.get("7").unwrap().status, Status::Advance);
    assert_eq!(stored(&store, "7")["houseType"], "Дом");

    crm.delete_property("7").await.unwrap();
    assert!(crm.listings().is_empty());
}

#[tokio::test]
async fn test_clients_with_form_or_missing_call_time_load() {
    let doc: Document = serde_json::from_value(json!({
        "clients": [
            { "id": "c1", "phoneNumber": "+380931112233", "lastCalled": "2024-05-01T14:30", "request": "2к" },
            { "id": 2, "phoneNumber": "+380671112233", "request": "дом" }
        ]
    }))
    .unwrap();
    let (_store, crm) = setup(doc).await;

    assert_eq!(crm.clients().len(), 2);
    assert!(crm.clients()[0].last_called.is_some());
    assert_eq!(crm.clients()[1].id, "2");
    assert!(crm.clients()[1].last_called.is_none());
}
