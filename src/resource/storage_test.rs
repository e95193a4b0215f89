use super::*;
use crate::resource::types::ResourceDocument;

fn sample(id: &str, uri: &str) -> Resource {
    let document = ResourceDocument::parse(&format!(
        r#"{{
            "name": "Sum", "description": "Adds numbers", "appid": "1",
            "method": "GET", "uri": "{}", "ttl": 30,
            "process": {{"id": 1, "processor": "var_int", "value": 3}}
        }}"#,
        uri
    ))
    .unwrap();
    Resource::from_document(id.to_string(), document)
}

#[tokio::test]
async fn save_get_and_delete() {
    let storage = ResourceStorage::in_memory().await.unwrap();
    let resource = sample("r1", "math/sum");
    storage.save_resource(&resource).await.unwrap();

    let loaded = storage.get_resource("r1").await.unwrap().unwrap();
    assert_eq!(loaded.uri, "math/sum");
    assert_eq!(loaded.method, "get");
    assert_eq!(loaded.ttl, 30);
    assert_eq!(loaded.meta, resource.meta);

    assert_eq!(
        storage.find_route("1", "get", "math/sum").await.unwrap(),
        Some("r1".to_string())
    );

    assert!(storage.delete_resource("r1").await.unwrap());
    assert!(!storage.delete_resource("r1").await.unwrap());
    assert!(storage.get_resource("r1").await.unwrap().is_none());
}

#[tokio::test]
async fn save_is_an_upsert() {
    let storage = ResourceStorage::in_memory().await.unwrap();
    storage.save_resource(&sample("r1", "a")).await.unwrap();

    let mut updated = sample("r1", "a");
    updated.ttl = 0;
    storage.save_resource(&updated).await.unwrap();

    let all = storage.load_all_resources().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all["r1"].ttl, 0);
}

#[tokio::test]
async fn routes_are_unique() {
    let storage = ResourceStorage::in_memory().await.unwrap();
    storage.save_resource(&sample("r1", "a")).await.unwrap();
    assert!(storage.save_resource(&sample("r2", "a")).await.is_err());

    storage.save_resource(&sample("r2", "b")).await.unwrap();
    let listed = storage.list_resources().await.unwrap();
    let uris: Vec<&str> = listed.iter().map(|r| r.uri.as_str()).collect();
    assert_eq!(uris, vec!["a", "b"]);
}
