//! Product API client tests against a local mock server

use httpmock::prelude::*;
use serde_json::json;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use xlsxlinks::{extract_nutrition, Error, ProductClient, StatusPolicy, API_KEY_HEADER};

fn client_for(server: &MockServer) -> ProductClient {
    ProductClient::new("test-key")
        .unwrap()
        .with_search_url(server.url("/grocery/products"))
        .with_product_url(server.url("/product"))
}

/// Collects formatted log output for assertions
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_product_search_returns_body() {
    let server = MockServer::start();
    let body = json!({
        "results": [
            {"id": 254656543, "name": "Tesco British Semi Skimmed Milk 2.272L"},
            {"id": 299831234, "name": "Tesco Wholemeal Bread 800G"}
        ]
    });
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/grocery/products")
            .header(API_KEY_HEADER, "test-key")
            .query_param("query", "milk")
            .query_param("limit", "5")
            .query_param("offset", "10");
        then.status(200).json_body(body.clone());
    });

    let result = client_for(&server).product_search("milk", 5, 10).unwrap();

    mock.assert();
    assert_eq!(result, body);
}

#[test]
fn test_product_data_returns_first_product() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/product")
            .header(API_KEY_HEADER, "test-key")
            .query_param("tpnc", "254656543");
        then.status(200).json_body(json!({
            "products": [{"tpnc": "254656543", "description": "Semi Skimmed Milk"}]
        }));
    });

    let product = client_for(&server).product_data("254656543").unwrap();

    mock.assert();
    assert_eq!(product["description"], "Semi Skimmed Milk");
}

#[test]
fn test_product_data_warns_on_multiple_products() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/product").query_param("tpnc", "1");
        then.status(200).json_body(json!({
            "products": [{"tpnc": "first"}, {"tpnc": "second"}]
        }));
    });

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let client = client_for(&server);
    let product = tracing::subscriber::with_default(subscriber, || client.product_data("1")).unwrap();

    assert_eq!(product["tpnc"], "first");
    let output = logs.contents();
    assert!(output.contains("WARN"));
    assert!(output.contains("More than one product returned for item 1"));
}

#[test]
fn test_product_data_without_products() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/product");
        then.status(200).json_body(json!({"products": []}));
    });

    let result = client_for(&server).product_data("1");
    assert!(matches!(result, Err(Error::UnexpectedResponse(_))));

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/product");
        then.status(200).json_body(json!({"message": "nothing here"}));
    });

    let result = client_for(&server).product_data("1");
    assert!(matches!(result, Err(Error::UnexpectedResponse(_))));
}

#[test]
fn test_error_status_is_raised_by_default() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/grocery/products");
        then.status(401)
            .json_body(json!({"statusCode": 401, "message": "Access denied"}));
    });

    match client_for(&server).product_search("milk", 10, 0) {
        Err(Error::Status { status, url }) => {
            assert_eq!(status, 401);
            assert!(url.contains("/grocery/products"));
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[test]
fn test_error_status_passthrough() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/grocery/products");
        then.status(401)
            .json_body(json!({"statusCode": 401, "message": "Access denied"}));
    });

    let client = client_for(&server).with_status_policy(StatusPolicy::Passthrough);
    let body = client.product_search("milk", 10, 0).unwrap();
    assert_eq!(body["statusCode"], 401);
}

#[test]
fn test_non_json_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/grocery/products");
        then.status(200).body("<html>maintenance</html>");
    });

    let result = client_for(&server).product_search("milk", 10, 0);
    assert!(matches!(result, Err(Error::Http(_))));
}

#[test]
fn test_product_nutrition_table() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/product").query_param("tpnc", "254656543");
        then.status(200).json_body(json!({
            "products": [{
                "tpnc": "254656543",
                "calcNutrition": {
                    "per100Header": "100ml",
                    "calcNutrients": [
                        {"name": "Energy (kcal)", "valuePer100": "50"},
                        {"name": "Fat (g)", "valuePer100": "1.8"}
                    ]
                }
            }]
        }));
    });

    let product = client_for(&server).product_data("254656543").unwrap();
    let table = extract_nutrition(&product).unwrap();
    assert_eq!(table.columns(), &["name", "valuePer100"]);
    assert_eq!(table.len(), 2);
}
